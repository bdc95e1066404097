//! Threat-radar variant: rotating sweep, fading blips, range rings.

use glam::Vec3;

use crate::fast_math::{circle_point, wrap_angle, INV_TAU};
use crate::scene::node::{AlertState, FrameInputs, Material, Pose};
use crate::scene::telemetry::FaultTally;
use crate::visual::mapping::{threat_class, VisualClass};

/// Sweep bearing at time `t`, in `[0, 2π)`.
#[inline]
pub fn sweep_angle(t: f32, sweep_speed: f32) -> f32 {
    wrap_angle(t * sweep_speed)
}

/// Blip opacity: 1 right after the sweep passes, falling linearly to 0 over
/// `fade_fraction` of a turn.
pub fn blip_opacity(sweep: f32, bearing: f32, sweep_speed: f32, fade_fraction: f32) -> f32 {
    let since = wrap_angle((sweep - bearing) * sweep_speed.signum());
    let fade = fade_fraction.clamp(0.01, 1.0);
    (1.0 - since * INV_TAU / fade).max(0.0)
}

/// Blip position on the radar plane.
pub fn blip_position(bearing: f32, range: f32) -> Vec3 {
    circle_point(range, bearing, 0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarSweepRule {
    pub sweep_speed: f32,
}

impl RadarSweepRule {
    pub fn apply(&self, inputs: &FrameInputs, pose: &mut Pose) {
        let sweep = sweep_angle(inputs.t(), self.sweep_speed);
        // mesh yaw turns the opposite way to circle bearings
        pose.transform.rotation.y = wrap_angle(-sweep);
        pose.material = Material::from_class(threat_class(inputs.threat_level)).with_opacity(0.9);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarBlipRule {
    /// Threat entry the blip reports
    pub threat_id: String,
    pub bearing: f32,
    pub sweep_speed: f32,
    pub fade_fraction: f32,
}

impl RadarBlipRule {
    pub fn apply(&self, inputs: &FrameInputs, tally: &mut FaultTally, pose: &mut Pose) {
        let reading = inputs.snapshot.threat(&self.threat_id, tally);
        let mut material = Material::from_class(threat_class(reading.severity));
        if reading.active {
            let sweep = sweep_angle(inputs.t(), self.sweep_speed);
            material.opacity = blip_opacity(sweep, self.bearing, self.sweep_speed, self.fade_fraction);
        } else {
            material.visible = false;
            material.opacity = 0.0;
        }
        pose.material = material;
        pose.state.alert = AlertState::from_flag(reading.active);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeRingRule {
    pub index: usize,
    pub count: usize,
}

impl RangeRingRule {
    pub fn apply(&self, pose: &mut Pose) {
        // outer rings fainter
        let k = self.index as f32 / self.count.max(1) as f32;
        pose.material = Material::from_class(VisualClass::Calm).with_opacity(0.45 - 0.25 * k);
    }
}
