//! Animated scene nodes.
//!
//! Every visual entity is one [`AnimatedSceneNode`]: a static
//! [`EntityConfig`], the update rule for its kind, a shared shape, and the
//! transform / material / state the rule rewrites each frame.
//!
//! Rules are pure: the output depends only on the config, the telemetry
//! snapshot and the frame time. A node never reads a sibling and keeps no
//! history, so any frame can be reproduced from `(config, snapshot, t)`.
//!
//! The command-center rules (core, defense ring, tower, data node, threat
//! marker) live here. Flow paths, world-map and radar rules live next to
//! their own geometry in `flow`, `world_map` and `radar`.

use std::sync::Arc;

use glam::Vec3;

use crate::fast_math::{
    oscillate, ray_segment, ray_sphere, saw, transform_point, wrap_angle, INV_10, INV_100,
};
use crate::scene::clock::FrameTime;
use crate::scene::config::EntityConfig;
use crate::scene::flow::FlowPath;
use crate::scene::geometry::{ShapeDescriptor, ShapeKind};
use crate::scene::radar::{RadarBlipRule, RadarSweepRule, RangeRingRule};
use crate::scene::telemetry::{FaultTally, TelemetrySnapshot};
use crate::scene::world_map::{ConnectionArc, ContinentRule, DataCenterRule, ThreatSourceRule};
use crate::visual::color::Rgba;
use crate::visual::mapping::{
    status_class, tech_tier_class, threat_class, throughput_class, EntityStatus, TechTier,
    VisualClass,
};

/// Tower alert ring is shown strictly above this threat level.
pub const TOWER_ALERT_THRESHOLD: f32 = 3.0;

/// Max gap between a pick ray and a wireframe edge that still counts.
pub const PICK_TOLERANCE: f32 = 0.35;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Per-frame output
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler XYZ, radians
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }

    /// Local → world.
    #[inline]
    pub fn apply(&self, local: Vec3) -> Vec3 {
        transform_point(local, self.scale, self.rotation, self.position)
    }

    /// Largest scale component (for bounding spheres).
    pub fn max_scale(&self) -> f32 {
        self.scale.abs().max_element()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgba,
    /// Secondary color (indicators, alert rings, bursts)
    pub accent: Rgba,
    pub emissive_intensity: f32,
    /// 0–1
    pub opacity: f32,
    pub visible: bool,
}

impl Material {
    pub fn from_class(class: VisualClass) -> Self {
        let swatch = class.swatch();
        Self {
            color: swatch.color,
            accent: swatch.color,
            emissive_intensity: swatch.emissive_intensity,
            opacity: 1.0,
            visible: true,
        }
    }

    pub fn with_accent(mut self, class: VisualClass) -> Self {
        self.accent = class.color();
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Body color with opacity folded into alpha.
    pub fn display_color(&self) -> Rgba {
        self.color.with_opacity(self.opacity)
    }

    pub fn display_accent(&self) -> Rgba {
        self.accent.with_opacity(self.opacity)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::from_class(VisualClass::Fallback)
    }
}

/// Two-state alert machine. Re-derived every frame from the current
/// flag or threshold; there is no transition memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertState {
    #[default]
    Idle,
    Active,
}

impl AlertState {
    #[inline]
    pub fn from_flag(active: bool) -> Self {
        if active {
            Self::Active
        } else {
            Self::Idle
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Expanding burst ring around an active threat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub radius: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeState {
    pub alert: AlertState,
    /// Lit throughput indicators (data nodes, 0..=4)
    pub lit_indicators: u8,
    pub burst: Option<Burst>,
    /// World-space marker (flow marker, arc pulse)
    pub marker: Option<Vec3>,
}

/// Everything a rule writes in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub transform: Transform,
    pub material: Material,
    pub state: NodeState,
}

impl Pose {
    /// Configured position, identity rotation and scale, fallback swatch.
    pub fn rest(config: &EntityConfig) -> Self {
        Self {
            transform: Transform::at(config.position),
            material: Material::default(),
            state: NodeState::default(),
        }
    }
}

/// Frame-wide inputs, resolved once and shared by every node.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub time: FrameTime,
    pub snapshot: &'a TelemetrySnapshot,
    /// Global threat level, clamped 0–10
    pub threat_level: f32,
    /// System health, clamped 0–100
    pub system_health: f32,
}

impl<'a> FrameInputs<'a> {
    pub fn resolve(time: FrameTime, snapshot: &'a TelemetrySnapshot, tally: &mut FaultTally) -> Self {
        Self {
            time,
            snapshot,
            threat_level: snapshot.threat_level(tally),
            system_health: snapshot.system_health(tally),
        }
    }

    #[inline]
    pub fn t(&self) -> f32 {
        self.time.elapsed
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Command-center rules
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq)]
pub struct CoreRule {
    pub rotation_speed: f32,
    pub pulse_speed: f32,
    pub pulse_amplitude: f32,
}

impl CoreRule {
    pub fn apply(&self, inputs: &FrameInputs, pose: &mut Pose) {
        let t = inputs.t();
        pose.transform.rotation.y = wrap_angle(t * self.rotation_speed);
        pose.transform.scale =
            Vec3::splat(oscillate(t, self.pulse_speed, 0.0, 1.0, self.pulse_amplitude));
        pose.material = Material::from_class(threat_class(inputs.threat_level));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefenseRingRule {
    pub layer_index: usize,
    pub rotation_speed: f32,
    pub color: Rgba,
    /// Alert decorations in ring-local space, fixed at construction
    pub alert_points: Vec<Vec3>,
}

impl DefenseRingRule {
    pub fn apply(&self, inputs: &FrameInputs, pose: &mut Pose) {
        let level = inputs.threat_level;
        let class = threat_class(level);
        pose.transform.rotation.y = wrap_angle(inputs.t() * self.rotation_speed);

        let mut material = Material::from_class(class);
        material.color = self.color.mix(class.color(), level * INV_10);
        material.accent = class.color();
        pose.material = material.with_opacity(0.8 - self.layer_index as f32 * 0.15);
        pose.state.alert = AlertState::from_flag(class.heat().unwrap_or(0) >= 2);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TowerRule {
    pub bob_frequency: f32,
    pub bob_amplitude: f32,
    pub phase_offset: f32,
}

impl TowerRule {
    pub fn apply(&self, config: &EntityConfig, inputs: &FrameInputs, tally: &mut FaultTally, pose: &mut Pose) {
        let reading = inputs.snapshot.tower(&config.id, tally);
        pose.transform.position.y += oscillate(
            inputs.t(),
            self.bob_frequency,
            self.phase_offset,
            0.0,
            self.bob_amplitude,
        );
        pose.material =
            Material::from_class(status_class(reading.status)).with_accent(threat_class(reading.threat_level));
        pose.state.alert = AlertState::from_flag(reading.threat_level > TOWER_ALERT_THRESHOLD);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataNodeRule {
    /// Position in the node array; desynchronizes identical nodes
    pub index: usize,
    pub base_spin: f32,
    pub tier: TechTier,
}

impl DataNodeRule {
    pub fn apply(&self, config: &EntityConfig, inputs: &FrameInputs, tally: &mut FaultTally, pose: &mut Pose) {
        let reading = inputs.snapshot.data_node(&config.id, tally);
        let spin = self.base_spin * (1.0 + self.index as f32 * 0.1);
        let angle = wrap_angle(inputs.t() * spin);
        pose.transform.rotation = Vec3::new(angle * 0.5, angle, 0.0);
        pose.transform.scale = Vec3::splat(config.params.size_class.scale());

        let mut material = Material::from_class(tech_tier_class(self.tier))
            .with_accent(throughput_class(reading.throughput));
        if reading.status == EntityStatus::Offline {
            material.emissive_intensity *= 0.2;
            material.opacity = 0.35;
        }
        pose.material = material;
        pose.state.lit_indicators = lit_indicators(reading.throughput);
    }
}

/// Quartile steps: 0–24 → 0 lit, …, 100 → 4 lit.
#[inline]
pub fn lit_indicators(throughput: f32) -> u8 {
    if throughput.is_nan() {
        return 0;
    }
    (throughput.clamp(0.0, 100.0) * INV_100 * 4.0).floor() as u8
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreatMarkerRule {
    /// Burst cycles per second while active
    pub burst_rate: f32,
    pub radius: f32,
}

impl ThreatMarkerRule {
    pub fn apply(&self, config: &EntityConfig, inputs: &FrameInputs, tally: &mut FaultTally, pose: &mut Pose) {
        let reading = inputs.snapshot.threat(&config.id, tally);
        let t = inputs.t();
        let material = Material::from_class(threat_class(reading.severity));

        if reading.active {
            pose.transform.rotation = Vec3::new(
                wrap_angle(t * 2.0),
                wrap_angle(t * 3.0),
                wrap_angle(t * 1.5),
            );
            pose.transform.scale = Vec3::splat(oscillate(t, 6.0, 0.0, 1.0, 0.2));
            let cycle = saw(t, self.burst_rate, 0.0);
            pose.state.burst = Some(Burst {
                radius: self.radius * (1.0 + 2.0 * cycle),
                opacity: 1.0 - cycle,
            });
            pose.material = material;
        } else {
            pose.transform.rotation.y = wrap_angle(t * 0.3);
            pose.material = material.with_opacity(0.6);
        }
        pose.state.alert = AlertState::from_flag(reading.active);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Node
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Update rule and its parameters, one variant per entity kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Core(CoreRule),
    DefenseRing(DefenseRingRule),
    Tower(TowerRule),
    DataNode(DataNodeRule),
    ThreatMarker(ThreatMarkerRule),
    FlowPath(FlowPath),
    Continent(ContinentRule),
    DataCenter(DataCenterRule),
    ConnectionArc(ConnectionArc),
    ThreatSource(ThreatSourceRule),
    RadarSweep(RadarSweepRule),
    RadarBlip(RadarBlipRule),
    RangeRing(RangeRingRule),
}

#[derive(Debug, Clone)]
pub struct AnimatedSceneNode {
    pub config: EntityConfig,
    pub kind: NodeKind,
    pub shape: Arc<ShapeDescriptor>,
    pub transform: Transform,
    pub material: Material,
    pub state: NodeState,
}

impl AnimatedSceneNode {
    pub fn new(config: EntityConfig, kind: NodeKind, shape: Arc<ShapeDescriptor>) -> Self {
        let rest = Pose::rest(&config);
        Self {
            config,
            kind,
            shape,
            transform: rest.transform,
            material: rest.material,
            state: rest.state,
        }
    }

    /// Recompute this node's pose for the frame.
    ///
    /// A non-finite transform degrades the node to its rest pose with the
    /// fallback swatch for this frame only.
    pub fn update(&mut self, inputs: &FrameInputs, tally: &mut FaultTally) {
        let config = &self.config;
        let mut pose = Pose::rest(config);
        match &self.kind {
            NodeKind::Core(rule) => rule.apply(inputs, &mut pose),
            NodeKind::DefenseRing(rule) => rule.apply(inputs, &mut pose),
            NodeKind::Tower(rule) => rule.apply(config, inputs, tally, &mut pose),
            NodeKind::DataNode(rule) => rule.apply(config, inputs, tally, &mut pose),
            NodeKind::ThreatMarker(rule) => rule.apply(config, inputs, tally, &mut pose),
            NodeKind::FlowPath(path) => path.apply(config, inputs, tally, &mut pose),
            NodeKind::Continent(rule) => rule.apply(inputs, &mut pose),
            NodeKind::DataCenter(rule) => rule.apply(config, inputs, tally, &mut pose),
            NodeKind::ConnectionArc(arc) => arc.apply(config, inputs, tally, &mut pose),
            NodeKind::ThreatSource(rule) => rule.apply(config, inputs, tally, &mut pose),
            NodeKind::RadarSweep(rule) => rule.apply(inputs, &mut pose),
            NodeKind::RadarBlip(rule) => rule.apply(inputs, tally, &mut pose),
            NodeKind::RangeRing(rule) => rule.apply(&mut pose),
        }

        let marker_ok = pose.state.marker.map_or(true, |m| m.is_finite());
        if pose.transform.is_finite() && marker_ok {
            self.transform = pose.transform;
            self.material = pose.material;
            self.state = pose.state;
        } else {
            log::debug!("node `{}` produced a non-finite transform, degrading", config.id);
            let rest = Pose::rest(config);
            self.transform = rest.transform;
            self.material = rest.material;
            self.state = rest.state;
            tally.degraded_nodes += 1;
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// World-space bounding sphere for picking, `None` while hidden.
    pub fn bounds(&self) -> Option<(Vec3, f32)> {
        if !self.material.visible || self.material.opacity <= 0.0 {
            return None;
        }
        Some((
            self.transform.position,
            self.shape.bounding_radius * self.transform.max_scale(),
        ))
    }

    /// Distance along a unit ray to this node, if the ray hits it.
    ///
    /// Solid shapes are hit on their bounding sphere. Rings and polylines
    /// are hollow, so the ray has to pass within [`PICK_TOLERANCE`] of an
    /// edge.
    pub fn pick_distance(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let (center, radius) = self.bounds()?;
        let t = ray_sphere(origin, dir, center, radius + PICK_TOLERANCE)?;
        match self.shape.kind {
            ShapeKind::Ring | ShapeKind::Polyline => {
                let verts = &self.shape.mesh.vertices;
                self.shape
                    .mesh
                    .edges
                    .iter()
                    .filter_map(|&[a, b]| {
                        let a = self.transform.apply(*verts.get(a as usize)?);
                        let b = self.transform.apply(*verts.get(b as usize)?);
                        let (s, gap) = ray_segment(origin, dir, a, b);
                        (gap <= PICK_TOLERANCE).then_some(s)
                    })
                    .min_by(f32::total_cmp)
            }
            _ => Some(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::config::Category;
    use crate::scene::geometry::{build, ShapeParams};

    fn node(kind: NodeKind, category: Category, id: &str) -> AnimatedSceneNode {
        let shape = Arc::new(build(&ShapeParams::Octahedron { radius: 1.0 }));
        let config = EntityConfig::new(id, category, id, Vec3::new(1.0, 0.0, 2.0));
        AnimatedSceneNode::new(config, kind, shape)
    }

    fn tower(id: &str) -> AnimatedSceneNode {
        node(
            NodeKind::Tower(TowerRule {
                bob_frequency: 1.5,
                bob_amplitude: 0.15,
                phase_offset: 0.4,
            }),
            Category::Tower,
            id,
        )
    }

    fn run(n: &mut AnimatedSceneNode, t: f32, snap: &TelemetrySnapshot) -> FaultTally {
        let mut tally = FaultTally::default();
        let inputs = FrameInputs::resolve(FrameTime::at(t), snap, &mut tally);
        n.update(&inputs, &mut tally);
        tally
    }

    #[test]
    fn tower_alert_is_a_strict_threshold() {
        let mut n = tower("tower-1");
        for (level, expected) in [
            (5.0, AlertState::Active),
            (2.0, AlertState::Idle),
            (3.0, AlertState::Idle),
            (3.01, AlertState::Active),
        ] {
            let snap = TelemetrySnapshot::default().with_tower("tower-1", EntityStatus::Active, level);
            run(&mut n, 1.0, &snap);
            assert_eq!(n.state.alert, expected, "threat {}", level);
        }
    }

    #[test]
    fn alert_toggles_instantly_without_memory() {
        let mut n = tower("tower-1");
        let hot = TelemetrySnapshot::default().with_tower("tower-1", EntityStatus::Active, 9.0);
        let cold = TelemetrySnapshot::default().with_tower("tower-1", EntityStatus::Active, 1.0);
        for _ in 0..3 {
            run(&mut n, 0.5, &hot);
            assert!(n.state.alert.is_active());
            run(&mut n, 0.5, &cold);
            assert!(!n.state.alert.is_active());
        }
    }

    #[test]
    fn update_is_a_pure_function_of_inputs() {
        let snap = TelemetrySnapshot::new(70.0, 6.0).with_tower("tower-1", EntityStatus::Warning, 4.0);
        let mut a = tower("tower-1");
        let mut b = tower("tower-1");
        run(&mut a, 0.1, &snap);
        run(&mut a, 7.3, &snap);
        run(&mut b, 7.3, &snap);
        assert_eq!(a.transform, b.transform);
        assert_eq!(a.material, b.material);
        assert_eq!(a.state, b.state);
    }

    #[test]
    fn core_pulses_and_wraps_rotation() {
        let mut n = node(
            NodeKind::Core(CoreRule {
                rotation_speed: 0.5,
                pulse_speed: 2.0,
                pulse_amplitude: 0.1,
            }),
            Category::Core,
            "core",
        );
        let snap = TelemetrySnapshot::new(100.0, 8.0);
        run(&mut n, 1000.0, &snap);
        assert!(n.transform.rotation.y >= 0.0 && n.transform.rotation.y < std::f32::consts::TAU);
        let s = n.transform.scale.x;
        assert!((0.9 - 1e-5..=1.1 + 1e-5).contains(&s));
        assert_eq!(n.material.color, VisualClass::Critical.color());
    }

    #[test]
    fn data_node_indicators_step_by_quartile() {
        assert_eq!(lit_indicators(0.0), 0);
        assert_eq!(lit_indicators(24.9), 0);
        assert_eq!(lit_indicators(25.0), 1);
        assert_eq!(lit_indicators(74.0), 2);
        assert_eq!(lit_indicators(99.0), 3);
        assert_eq!(lit_indicators(100.0), 4);
        assert_eq!(lit_indicators(250.0), 4);
        assert_eq!(lit_indicators(f32::NAN), 0);
    }

    #[test]
    fn data_nodes_desynchronize_by_index() {
        let rule = |index| {
            NodeKind::DataNode(DataNodeRule {
                index,
                base_spin: 0.4,
                tier: TechTier::Quantum,
            })
        };
        let snap = TelemetrySnapshot::default()
            .with_data_node("a", EntityStatus::Active, 60.0)
            .with_data_node("b", EntityStatus::Active, 60.0);
        let mut a = node(rule(0), Category::DataNode, "a");
        let mut b = node(rule(3), Category::DataNode, "b");
        run(&mut a, 2.0, &snap);
        run(&mut b, 2.0, &snap);
        assert!((a.transform.rotation.y - 0.8).abs() < 1e-5);
        assert!((b.transform.rotation.y - 0.8 * 1.3).abs() < 1e-5);
        assert_eq!(a.state.lit_indicators, 2);
        assert_eq!(a.material.color, VisualClass::Quantum.color());
        assert_eq!(a.material.accent, VisualClass::Elevated.color());
    }

    #[test]
    fn threat_marker_states() {
        let mut n = node(
            NodeKind::ThreatMarker(ThreatMarkerRule {
                burst_rate: 0.8,
                radius: 0.5,
            }),
            Category::ThreatMarker,
            "threat-1",
        );
        let active = TelemetrySnapshot::default().with_threat("threat-1", true, 9.0);
        run(&mut n, 1.25, &active);
        assert_eq!(n.state.alert, AlertState::Active);
        let burst = n.state.burst.expect("active markers burst");
        assert!(burst.radius >= 0.5 && burst.radius <= 1.5);
        assert!((0.0..=1.0).contains(&burst.opacity));
        assert_eq!(n.material.color, VisualClass::Critical.color());

        let idle = TelemetrySnapshot::default().with_threat("threat-1", false, 9.0);
        run(&mut n, 1.25, &idle);
        assert_eq!(n.state.alert, AlertState::Idle);
        assert!(n.state.burst.is_none());
        assert_eq!(n.transform.rotation.x, 0.0);
    }

    #[test]
    fn missing_telemetry_uses_defaults_and_is_counted() {
        let mut n = tower("tower-9");
        let tally = run(&mut n, 1.0, &TelemetrySnapshot::default());
        assert_eq!(tally.missing_telemetry, 1);
        assert_eq!(n.state.alert, AlertState::Idle);
        assert_eq!(n.material.color, VisualClass::Fallback.color());
    }

    #[test]
    fn non_finite_transform_degrades_only_that_node() {
        let mut bad = node(
            NodeKind::Core(CoreRule {
                rotation_speed: f32::NAN,
                pulse_speed: 2.0,
                pulse_amplitude: f32::INFINITY,
            }),
            Category::Core,
            "core",
        );
        let mut good = tower("tower-1");
        let snap = TelemetrySnapshot::new(90.0, 5.0).with_tower("tower-1", EntityStatus::Active, 1.0);

        let mut tally = FaultTally::default();
        let inputs = FrameInputs::resolve(FrameTime::at(2.0), &snap, &mut tally);
        bad.update(&inputs, &mut tally);
        good.update(&inputs, &mut tally);

        assert_eq!(tally.degraded_nodes, 1);
        assert_eq!(bad.transform, Transform::at(bad.config.position));
        assert_eq!(bad.material, Material::from_class(VisualClass::Fallback));
        assert!(good.transform.is_finite());
        assert_eq!(good.material.color, VisualClass::Healthy.color());
    }
}
