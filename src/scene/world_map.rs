//! World-map variant: continent outlines, data centers, connection arcs
//! and threat sources laid out on an equirectangular plane.
//!
//! Arcs are quadratic curves through `(start, elevated midpoint, end)`,
//! elevated by `distance · arc_height_factor`, sampled once when the scene
//! is built. A pulse travels one way along each active arc.

use glam::Vec3;

use crate::fast_math::{lerp3, oscillate, ping_pong, quadratic_bezier, saw};
use crate::scene::config::{ContinentConfig, EntityConfig, WorldMapConfig};
use crate::scene::node::{AlertState, FrameInputs, Material, Pose};
use crate::scene::telemetry::FaultTally;
use crate::visual::mapping::{
    bandwidth_class, severity_class, status_class, throughput_class, EntityStatus, VisualClass,
};

/// Minimum samples per arc (start, apex, end).
pub const MIN_ARC_SAMPLES: usize = 3;

/// Sample a connection arc between two map points.
pub fn arc_samples(from: Vec3, to: Vec3, height_factor: f32, samples: usize) -> Vec<Vec3> {
    let n = samples.max(MIN_ARC_SAMPLES);
    let height = from.distance(to) * height_factor.max(0.0);
    let ctrl = lerp3(from, to, 0.5) + Vec3::Y * (2.0 * height);
    let last = (n - 1) as f32;
    (0..n)
        .map(|i| quadratic_bezier(from, ctrl, to, i as f32 / last))
        .collect()
}

/// Projected outline and its centroid. The outline is returned relative to
/// the centroid so the node's bounding sphere hugs the landmass.
pub fn continent_outline(map: &WorldMapConfig, continent: &ContinentConfig) -> (Vec3, Vec<Vec3>) {
    let points: Vec<Vec3> = continent
        .outline
        .iter()
        .map(|&(lon, lat)| map.project(lon, lat))
        .collect();
    if points.is_empty() {
        return (Vec3::ZERO, points);
    }
    let centroid = points.iter().copied().sum::<Vec3>() / points.len() as f32;
    let local = points.iter().map(|p| *p - centroid).collect();
    (centroid, local)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Rules
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq)]
pub struct ContinentRule {
    pub tint: VisualClass,
    pub phase: f32,
}

impl ContinentRule {
    pub fn apply(&self, inputs: &FrameInputs, pose: &mut Pose) {
        let t = inputs.t();
        pose.transform.position.y += oscillate(t, 0.4, self.phase, 0.0, 0.02);
        pose.material =
            Material::from_class(self.tint).with_opacity(oscillate(t, 0.5, self.phase, 0.45, 0.1));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataCenterRule {
    pub phase: f32,
}

impl DataCenterRule {
    pub fn apply(&self, config: &EntityConfig, inputs: &FrameInputs, tally: &mut FaultTally, pose: &mut Pose) {
        let reading = inputs.snapshot.data_center(&config.id, tally);
        let load = reading.load * 0.01;
        // busier sites pulse harder
        let pulse = ping_pong(inputs.t(), 3.0, self.phase) * 0.3 * load;
        pose.transform.scale = Vec3::splat(config.params.size_class.scale() * (1.0 + pulse));
        pose.material =
            Material::from_class(status_class(reading.status)).with_accent(throughput_class(reading.load));
        if reading.status == EntityStatus::Offline {
            pose.material.opacity = 0.4;
        }
        pose.state.alert = AlertState::from_flag(reading.status == EntityStatus::Critical);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionArc {
    /// World-space samples, fixed at construction
    pub samples: Vec<Vec3>,
    /// Trips per second
    pub speed: f32,
    pub phase: f32,
}

impl ConnectionArc {
    pub fn new(from: Vec3, to: Vec3, map: &WorldMapConfig, speed: f32, phase: f32) -> Self {
        Self {
            samples: arc_samples(from, to, map.arc_height_factor, map.arc_samples),
            speed,
            phase,
        }
    }

    /// Point at arc parameter `p` in `[0, 1]`, interpolated between samples.
    pub fn point_at(&self, p: f32) -> Vec3 {
        let n = self.samples.len();
        match n {
            0 => Vec3::ZERO,
            1 => self.samples[0],
            _ => {
                let f = p.clamp(0.0, 1.0) * (n - 1) as f32;
                let i = (f.floor() as usize).min(n - 2);
                lerp3(self.samples[i], self.samples[i + 1], f - i as f32)
            }
        }
    }

    pub fn pulse_progress(&self, t: f32) -> f32 {
        saw(t, self.speed, self.phase)
    }

    pub fn apply(&self, config: &EntityConfig, inputs: &FrameInputs, tally: &mut FaultTally, pose: &mut Pose) {
        let reading = inputs.snapshot.connection(&config.id, tally);
        let material = Material::from_class(bandwidth_class(reading.bandwidth));
        if reading.active {
            pose.material = material.with_opacity(0.8);
            pose.state.marker = Some(self.point_at(self.pulse_progress(inputs.t())));
        } else {
            pose.material = material.with_opacity(0.15);
        }
        pose.state.alert = AlertState::from_flag(reading.active);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreatSourceRule {
    pub phase: f32,
}

impl ThreatSourceRule {
    pub fn apply(&self, config: &EntityConfig, inputs: &FrameInputs, tally: &mut FaultTally, pose: &mut Pose) {
        let reading = inputs.snapshot.threat_source(&config.id, tally);
        let material = Material::from_class(severity_class(reading.severity));
        if reading.active {
            pose.transform.scale = Vec3::splat(1.0 + ping_pong(inputs.t(), 4.0, self.phase) * 0.5);
            pose.material = material;
        } else {
            pose.material = material.with_opacity(0.3);
        }
        pose.state.alert = AlertState::from_flag(reading.active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::clock::FrameTime;
    use crate::scene::config::{Category, SceneConfig};
    use crate::scene::telemetry::TelemetrySnapshot;
    use crate::visual::mapping::{BandwidthClass, Severity};

    fn run<F: FnOnce(&FrameInputs, &mut FaultTally, &mut Pose)>(
        snap: &TelemetrySnapshot,
        config: &EntityConfig,
        t: f32,
        f: F,
    ) -> (Pose, FaultTally) {
        let mut tally = FaultTally::default();
        let inputs = FrameInputs::resolve(FrameTime::at(t), snap, &mut tally);
        let mut pose = Pose::rest(config);
        f(&inputs, &mut tally, &mut pose);
        (pose, tally)
    }

    #[test]
    fn arc_endpoints_and_apex() {
        let from = Vec3::new(-5.0, 0.0, 1.0);
        let to = Vec3::new(5.0, 0.0, 1.0);
        let samples = arc_samples(from, to, 0.3, 25);
        assert_eq!(samples.len(), 25);
        assert!(samples[0].distance(from) < 1e-5);
        assert!(samples[24].distance(to) < 1e-5);
        // apex of a symmetric quadratic sits at t = 0.5, height = distance * factor
        assert!((samples[12].y - 3.0).abs() < 1e-4);
        assert!(samples.iter().all(|p| p.y >= -1e-6));
    }

    #[test]
    fn degenerate_arc_is_still_sampled() {
        let p = Vec3::new(1.0, 0.0, 1.0);
        let samples = arc_samples(p, p, 0.3, 0);
        assert_eq!(samples.len(), MIN_ARC_SAMPLES);
        assert!(samples.iter().all(|s| s.distance(p) < 1e-6));
    }

    #[test]
    fn arc_pulse_runs_only_while_active() {
        let map = SceneConfig::default().world_map;
        let arc = ConnectionArc::new(Vec3::new(-4.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0), &map, 0.5, 0.0);
        let config = EntityConfig::new("link-1", Category::Connection, "link", Vec3::ZERO);

        let on = TelemetrySnapshot::default().with_connection("link-1", BandwidthClass::High, true);
        let (pose, _) = run(&on, &config, 1.0, |i, t, p| arc.apply(&config, i, t, p));
        let marker = pose.state.marker.expect("active arcs carry a pulse");
        assert!(marker.distance(arc.point_at(0.5)) < 1e-4);
        assert_eq!(pose.material.color, VisualClass::Calm.color());

        let off = TelemetrySnapshot::default().with_connection("link-1", BandwidthClass::High, false);
        let (pose, _) = run(&off, &config, 1.0, |i, t, p| arc.apply(&config, i, t, p));
        assert!(pose.state.marker.is_none());
    }

    #[test]
    fn data_center_alerts_on_critical_only() {
        let rule = DataCenterRule { phase: 0.0 };
        let config = EntityConfig::new("dc-1", Category::DataCenter, "dc", Vec3::ZERO);
        for (status, alert) in [
            (EntityStatus::Critical, AlertState::Active),
            (EntityStatus::Warning, AlertState::Idle),
            (EntityStatus::Active, AlertState::Idle),
        ] {
            let snap = TelemetrySnapshot::default().with_data_center("dc-1", status, 80.0);
            let (pose, _) = run(&snap, &config, 0.7, |i, t, p| rule.apply(&config, i, t, p));
            assert_eq!(pose.state.alert, alert);
        }
    }

    #[test]
    fn idle_data_center_does_not_pulse() {
        let rule = DataCenterRule { phase: 0.0 };
        let config = EntityConfig::new("dc-1", Category::DataCenter, "dc", Vec3::ZERO);
        let snap = TelemetrySnapshot::default().with_data_center("dc-1", EntityStatus::Active, 0.0);
        for t in [0.0, 0.4, 2.2] {
            let (pose, _) = run(&snap, &config, t, |i, tl, p| rule.apply(&config, i, tl, p));
            assert!((pose.transform.scale.x - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn threat_source_uses_severity_palette() {
        let rule = ThreatSourceRule { phase: 0.0 };
        let config = EntityConfig::new("src-1", Category::ThreatSource, "src", Vec3::ZERO);
        let snap = TelemetrySnapshot::default().with_threat_source("src-1", Severity::High, true);
        let (pose, tally) = run(&snap, &config, 0.3, |i, t, p| rule.apply(&config, i, t, p));
        assert_eq!(pose.material.color, VisualClass::High.color());
        assert!(pose.state.alert.is_active());
        assert!(tally.is_clean());

        let (pose, tally) = run(&TelemetrySnapshot::default(), &config, 0.3, |i, t, p| {
            rule.apply(&config, i, t, p)
        });
        assert_eq!(pose.material.color, VisualClass::Fallback.color());
        assert!(!pose.state.alert.is_active());
        assert_eq!(tally.missing_telemetry, 1);
    }

    #[test]
    fn continent_outline_is_centered() {
        let map = SceneConfig::default().world_map;
        for continent in &map.continents {
            let (centroid, local) = continent_outline(&map, continent);
            assert_eq!(local.len(), continent.outline.len());
            let mean = local.iter().copied().sum::<Vec3>() / local.len() as f32;
            assert!(mean.length() < 1e-4);
            assert!(centroid.x.abs() <= map.width * 0.5);
        }
    }
}
