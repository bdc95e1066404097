//! Scene composer.
//!
//! Builds the node registry for one [`SceneVariant`] once, then assembles a
//! [`FrameView`] per frame: every node updated in place against the same
//! `(FrameTime, &TelemetrySnapshot)`, the particle field's bulk transform,
//! and the environment's telemetry-driven globals.
//!
//! ```text
//! key_intensity = key_base + (threat_level / 10) · key_span
//! accent color  = threat_class(threat_level)
//! fog far       = lerp(fog_far_min, fog_far, system_health / 100)
//! ```

use std::sync::Arc;

use glam::Vec3;

use crate::fast_math::{circle_point, fma, lerp, lerp3, INV_10, INV_100};
use crate::scene::clock::FrameTime;
use crate::scene::config::{Category, EntityConfig, EntityParams, SceneConfig, SizeClass};
use crate::scene::flow::FlowPath;
use crate::scene::geometry::{polyline, GeometryCache, ShapeDescriptor, ShapeParams};
use crate::scene::node::{
    AnimatedSceneNode, CoreRule, DataNodeRule, DefenseRingRule, FrameInputs, NodeKind,
    ThreatMarkerRule, TowerRule,
};
use crate::scene::particles::{ParticleField, ParticleSeed};
use crate::scene::radar::{blip_position, RadarBlipRule, RadarSweepRule, RangeRingRule};
use crate::scene::telemetry::{FaultTally, TelemetrySnapshot};
use crate::scene::world_map::{
    continent_outline, ConnectionArc, ContinentRule, DataCenterRule, ThreatSourceRule,
};
use crate::visual::color::Rgba;
use crate::visual::mapping::threat_class;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Variants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SceneVariant {
    #[default]
    CommandCenter,
    ThreatRadar,
    WorldMap,
}

impl SceneVariant {
    pub const ALL: [SceneVariant; 3] = [Self::CommandCenter, Self::ThreatRadar, Self::WorldMap];

    pub fn label(self) -> &'static str {
        match self {
            Self::CommandCenter => "Command Center",
            Self::ThreatRadar => "Threat Radar",
            Self::WorldMap => "World Map",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Environment
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub background: Rgba,
    pub ambient_color: Rgba,
    pub ambient_intensity: f32,
    pub key_direction: Vec3,
    pub key_color: Rgba,
    pub key_base: f32,
    pub key_span: f32,
    pub accent_positions: Vec<Vec3>,
    pub accent_intensity: f32,
    pub fog_color: Rgba,
    pub fog_near: f32,
    /// Far distance at full health
    pub fog_far: f32,
    /// Far distance at zero health
    pub fog_far_min: f32,
    pub ground_size: f32,
    pub ground_divisions: u32,
    /// Ground plane height
    pub ground_level: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            background: Rgba::from_hex(0x000814),
            ambient_color: Rgba::from_hex(0x223355),
            ambient_intensity: 0.35,
            key_direction: Vec3::new(0.5, 1.0, 0.3),
            key_color: Rgba::WHITE,
            key_base: 0.6,
            key_span: 0.9,
            accent_positions: vec![
                Vec3::new(10.0, 6.0, 10.0),
                Vec3::new(-10.0, 6.0, 10.0),
                Vec3::new(10.0, 6.0, -10.0),
                Vec3::new(-10.0, 6.0, -10.0),
            ],
            accent_intensity: 1.2,
            fog_color: Rgba::from_hex(0x000814),
            fog_near: 20.0,
            fog_far: 120.0,
            fog_far_min: 45.0,
            ground_size: 60.0,
            ground_divisions: 24,
            ground_level: -2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Rgba,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Unit vector toward the light
    pub direction: Vec3,
    pub color: Rgba,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Rgba,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Rgba,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// Fog blend factor at `distance`: 0 before `near`, 1 past `far`.
    pub fn factor(&self, distance: f32) -> f32 {
        let span = self.far - self.near;
        if span <= 0.0 {
            return if distance >= self.far { 1.0 } else { 0.0 };
        }
        ((distance - self.near) / span).clamp(0.0, 1.0)
    }
}

/// Lights, fog and ground for the current frame.
#[derive(Debug, Clone)]
pub struct Environment {
    pub background: Rgba,
    pub ambient: AmbientLight,
    pub key_light: DirectionalLight,
    pub accent_lights: Vec<PointLight>,
    pub fog: Fog,
    pub ground: Arc<ShapeDescriptor>,
    pub ground_level: f32,
    key_base: f32,
    key_span: f32,
    accent_intensity: f32,
    fog_far: f32,
    fog_far_min: f32,
}

impl Environment {
    pub fn new(config: &EnvironmentConfig, ground: Arc<ShapeDescriptor>) -> Self {
        let accent = threat_class(0.0).color();
        Self {
            background: config.background,
            ambient: AmbientLight {
                color: config.ambient_color,
                intensity: config.ambient_intensity,
            },
            key_light: DirectionalLight {
                direction: config.key_direction.normalize_or_zero(),
                color: config.key_color,
                intensity: config.key_base,
            },
            accent_lights: config
                .accent_positions
                .iter()
                .map(|&position| PointLight {
                    position,
                    color: accent,
                    intensity: config.accent_intensity,
                })
                .collect(),
            fog: Fog {
                color: config.fog_color,
                near: config.fog_near,
                far: config.fog_far,
            },
            ground,
            ground_level: config.ground_level,
            key_base: config.key_base,
            key_span: config.key_span,
            accent_intensity: config.accent_intensity,
            fog_far: config.fog_far,
            fog_far_min: config.fog_far_min,
        }
    }

    /// Re-derive the telemetry-driven globals in place.
    pub fn update(&mut self, inputs: &FrameInputs) {
        let threat = inputs.threat_level * INV_10;
        self.key_light.intensity = key_intensity(self.key_base, self.key_span, inputs.threat_level);

        let accent = threat_class(inputs.threat_level).color();
        let intensity = self.accent_intensity * (1.0 + threat);
        for light in &mut self.accent_lights {
            light.color = accent;
            light.intensity = intensity;
        }

        let far = lerp(self.fog_far_min, self.fog_far, inputs.system_health * INV_100);
        self.fog.far = far.max(self.fog.near);
    }
}

/// `base + (threat_level / 10) · span`
#[inline]
pub fn key_intensity(base: f32, span: f32, threat_level: f32) -> f32 {
    fma(threat_level * INV_10, span, base)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Frame output
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-frame counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub frame: u64,
    pub elapsed: f32,
    pub nodes: usize,
    pub particles: usize,
    pub missing_telemetry: u32,
    pub out_of_range: u32,
    pub unknown_labels: u32,
    pub degraded_nodes: u32,
}

impl FrameStats {
    fn from_tally(time: FrameTime, nodes: usize, particles: usize, tally: FaultTally) -> Self {
        Self {
            frame: time.frame,
            elapsed: time.elapsed,
            nodes,
            particles,
            missing_telemetry: tally.missing_telemetry,
            out_of_range: tally.out_of_range,
            unknown_labels: tally.unknown_labels,
            degraded_nodes: tally.degraded_nodes,
        }
    }

    pub fn faults(&self) -> u32 {
        self.missing_telemetry + self.out_of_range + self.unknown_labels + self.degraded_nodes
    }
}

/// Borrowed view of one composed frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub variant: SceneVariant,
    pub time: FrameTime,
    pub nodes: &'a [AnimatedSceneNode],
    pub particles: &'a ParticleField,
    pub environment: &'a Environment,
    pub stats: FrameStats,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Composer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SceneComposer {
    variant: SceneVariant,
    nodes: Vec<AnimatedSceneNode>,
    particles: ParticleField,
    environment: Environment,
    stats: FrameStats,
}

impl SceneComposer {
    pub fn new(
        variant: SceneVariant,
        config: &SceneConfig,
        seed: ParticleSeed,
        cache: &mut GeometryCache,
    ) -> Self {
        let mut nodes = Vec::new();
        let ground = match variant {
            SceneVariant::CommandCenter => {
                command_center(config, cache, &mut nodes);
                ground_plane(config.environment.ground_size, config.environment.ground_size, config, cache)
            }
            SceneVariant::ThreatRadar => {
                threat_radar(config, cache, &mut nodes);
                let size = config.radar.radius * 2.4;
                ground_plane(size, size, config, cache)
            }
            SceneVariant::WorldMap => {
                world_map(config, cache, &mut nodes);
                ground_plane(config.world_map.width, config.world_map.depth, config, cache)
            }
        };

        let particles = ParticleField::generate(&config.particles, seed);
        log::info!(
            "composed {} scene: {} nodes, {} particles",
            variant.label(),
            nodes.len(),
            particles.len()
        );

        Self {
            variant,
            nodes,
            environment: Environment::new(&config.environment, ground),
            particles,
            stats: FrameStats::default(),
        }
    }

    /// Update every node, the particle field and the environment for one
    /// frame. All of them see the same `time` and `snapshot`.
    pub fn compose(&mut self, time: FrameTime, snapshot: &TelemetrySnapshot) -> FrameView<'_> {
        let mut tally = FaultTally::default();
        let inputs = FrameInputs::resolve(time, snapshot, &mut tally);
        for node in &mut self.nodes {
            node.update(&inputs, &mut tally);
        }
        self.particles.animate(time.elapsed);
        self.environment.update(&inputs);
        self.stats = FrameStats::from_tally(time, self.nodes.len(), self.particles.len(), tally);
        self.view(time)
    }

    fn view(&self, time: FrameTime) -> FrameView<'_> {
        FrameView {
            variant: self.variant,
            time,
            nodes: &self.nodes,
            particles: &self.particles,
            environment: &self.environment,
            stats: self.stats,
        }
    }

    pub fn variant(&self) -> SceneVariant {
        self.variant
    }

    pub fn nodes(&self) -> &[AnimatedSceneNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&AnimatedSceneNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Nearest node whose bounding sphere the ray hits.
    pub fn pick(&self, origin: Vec3, direction: Vec3) -> Option<&AnimatedSceneNode> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        self.nodes
            .iter()
            .filter_map(|n| n.pick_distance(origin, dir).map(|t| (t, n)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, n)| n)
    }

    /// Drop nodes (and their shared shapes) and the particle buffer.
    pub fn release(&mut self) {
        self.nodes = Vec::new();
        self.particles.release();
    }
}

// ── Variant builders ──

/// Mesh resolution of defense and range rings.
pub const RING_MESH_SEGMENTS: u32 = 64;

fn ground_plane(width: f32, depth: f32, config: &SceneConfig, cache: &mut GeometryCache) -> Arc<ShapeDescriptor> {
    cache.get(&ShapeParams::Plane {
        width,
        depth,
        divisions: config.environment.ground_divisions,
    })
}

fn params(radius: f32, height: f32, segments: u32, size_class: SizeClass) -> EntityParams {
    EntityParams {
        radius,
        height,
        segments,
        size_class,
    }
}

fn command_center(config: &SceneConfig, cache: &mut GeometryCache, nodes: &mut Vec<AnimatedSceneNode>) {
    let core = &config.core;
    nodes.push(AnimatedSceneNode::new(
        EntityConfig::new("core", Category::Core, "Energy Core", Vec3::ZERO)
            .with_params(params(core.radius, 0.0, core.segments, SizeClass::Large)),
        NodeKind::Core(CoreRule {
            rotation_speed: core.rotation_speed,
            pulse_speed: core.pulse_speed,
            pulse_amplitude: core.pulse_amplitude,
        }),
        cache.get(&ShapeParams::LatticeSphere {
            radius: core.radius,
            width_segments: core.segments,
            height_segments: (core.segments / 2).max(3),
        }),
    ));

    for (index, layer) in config.defense_layers.iter().enumerate() {
        let count = layer.segments.max(1);
        let alert_points = (0..count)
            .map(|k| circle_point(layer.radius, k as f32 * std::f32::consts::TAU / count as f32, 0.0))
            .collect();
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(&layer.id, Category::DefenseLayer, &layer.name, Vec3::ZERO)
                .with_params(params(layer.radius, 0.0, layer.segments, SizeClass::Large)),
            NodeKind::DefenseRing(DefenseRingRule {
                layer_index: index,
                rotation_speed: layer.rotation_speed,
                color: layer.color,
                alert_points,
            }),
            cache.get(&ShapeParams::Ring {
                radius: layer.radius,
                tube: layer.tube,
                segments: RING_MESH_SEGMENTS,
            }),
        ));
    }

    for tower in &config.towers {
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(&tower.id, Category::Tower, &tower.name, tower.position)
                .with_params(params(tower.base_radius, tower.height, 6, SizeClass::Medium)),
            NodeKind::Tower(TowerRule {
                bob_frequency: tower.bob_frequency,
                bob_amplitude: tower.bob_amplitude,
                phase_offset: tower.phase_offset,
            }),
            cache.get(&ShapeParams::Tower {
                height: tower.height,
                base_radius: tower.base_radius,
                segments: 6,
                tiers: 3,
            }),
        ));
    }

    for (index, node) in config.data_nodes.iter().enumerate() {
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(&node.id, Category::DataNode, &node.name, node.position)
                .with_params(params(node.size, node.size, 0, node.size_class)),
            NodeKind::DataNode(DataNodeRule {
                index,
                base_spin: 0.4,
                tier: node.tier,
            }),
            cache.get(&ShapeParams::Cube { size: node.size }),
        ));
    }

    for marker in &config.threat_markers {
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(&marker.id, Category::ThreatMarker, &marker.name, marker.position)
                .with_params(params(marker.radius, 0.0, 0, SizeClass::Small)),
            NodeKind::ThreatMarker(ThreatMarkerRule {
                burst_rate: 0.8,
                radius: marker.radius,
            }),
            cache.get(&ShapeParams::Octahedron {
                radius: marker.radius,
            }),
        ));
    }

    for path in &config.data_paths {
        let flow = FlowPath::new(path.from, path.to, path.speed, path.phase_offset);
        let mid = flow.midpoint();
        let shape = Arc::new(polyline(&[path.from - mid, path.to - mid], false));
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(&path.id, Category::DataPath, &path.name, mid)
                .with_params(params(0.0, 0.0, 1, SizeClass::Small)),
            NodeKind::FlowPath(flow),
            shape,
        ));
    }
}

fn threat_radar(config: &SceneConfig, cache: &mut GeometryCache, nodes: &mut Vec<AnimatedSceneNode>) {
    let radar = &config.radar;
    let rings = radar.range_rings.max(1);

    nodes.push(AnimatedSceneNode::new(
        EntityConfig::new("radar-sweep", Category::RadarSweep, "Sweep", Vec3::ZERO)
            .with_params(params(radar.radius, 0.0, 1, SizeClass::Large)),
        NodeKind::RadarSweep(RadarSweepRule {
            sweep_speed: radar.sweep_speed,
        }),
        Arc::new(polyline(&[Vec3::ZERO, Vec3::new(radar.radius, 0.0, 0.0)], false)),
    ));

    for k in 0..rings {
        let radius = radar.radius * (k + 1) as f32 / rings as f32;
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(
                &format!("range-ring-{}", k + 1),
                Category::RangeRing,
                &format!("Range {}", k + 1),
                Vec3::ZERO,
            )
            .with_params(params(radius, 0.0, RING_MESH_SEGMENTS, SizeClass::Large)),
            NodeKind::RangeRing(RangeRingRule {
                index: k as usize,
                count: rings as usize,
            }),
            cache.get(&ShapeParams::Ring {
                radius,
                tube: 0.02,
                segments: RING_MESH_SEGMENTS,
            }),
        ));
    }

    for blip in &radar.blips {
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(
                &format!("blip-{}", blip.threat_id),
                Category::RadarBlip,
                &blip.threat_id,
                blip_position(blip.bearing, blip.range),
            )
            .with_params(params(0.3, 0.0, 0, SizeClass::Small)),
            NodeKind::RadarBlip(RadarBlipRule {
                threat_id: blip.threat_id.clone(),
                bearing: blip.bearing,
                sweep_speed: radar.sweep_speed,
                fade_fraction: radar.fade_fraction,
            }),
            cache.get(&ShapeParams::Octahedron { radius: 0.3 }),
        ));
    }
}

fn world_map(config: &SceneConfig, cache: &mut GeometryCache, nodes: &mut Vec<AnimatedSceneNode>) {
    let map = &config.world_map;

    for (k, continent) in map.continents.iter().enumerate() {
        let (centroid, outline) = continent_outline(map, continent);
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(&continent.id, Category::Continent, &continent.name, centroid)
                .with_params(params(0.0, 0.0, outline.len() as u32, SizeClass::Large)),
            NodeKind::Continent(ContinentRule {
                tint: continent.tint,
                phase: k as f32 * 0.9,
            }),
            Arc::new(polyline(&outline, true)),
        ));
    }

    for (k, dc) in map.data_centers.iter().enumerate() {
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(
                &dc.id,
                Category::DataCenter,
                &dc.name,
                map.project(dc.lon, dc.lat) + Vec3::Y * 0.1,
            )
            .with_params(params(0.35, 0.35, 0, dc.size_class)),
            NodeKind::DataCenter(DataCenterRule {
                phase: k as f32 * 0.7,
            }),
            cache.get(&ShapeParams::Cube { size: 0.35 }),
        ));
    }

    for (k, conn) in map.connections.iter().enumerate() {
        let (Some(from), Some(to)) = (map.data_center(&conn.from), map.data_center(&conn.to)) else {
            log::warn!("connection `{}` references an unknown data center, skipped", conn.id);
            continue;
        };
        let from = map.project(from.lon, from.lat);
        let to = map.project(to.lon, to.lat);
        let arc = ConnectionArc::new(from, to, map, conn.speed, k as f32 * 0.37);
        let mid = lerp3(from, to, 0.5);
        let local: Vec<Vec3> = arc.samples.iter().map(|p| *p - mid).collect();
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(&conn.id, Category::Connection, &format!("{} → {}", conn.from, conn.to), mid)
                .with_params(params(0.0, 0.0, map.arc_samples as u32, SizeClass::Small)),
            NodeKind::ConnectionArc(arc),
            Arc::new(polyline(&local, false)),
        ));
    }

    for (k, src) in map.threat_sources.iter().enumerate() {
        nodes.push(AnimatedSceneNode::new(
            EntityConfig::new(
                &src.id,
                Category::ThreatSource,
                &src.name,
                map.project(src.lon, src.lat) + Vec3::Y * 0.2,
            )
            .with_params(params(0.3, 0.0, 0, SizeClass::Small)),
            NodeKind::ThreatSource(ThreatSourceRule {
                phase: k as f32 * 1.3,
            }),
            cache.get(&ShapeParams::Octahedron { radius: 0.3 }),
        ));
    }
}
