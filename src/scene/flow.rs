//! Flow paths: a line between two points with a marker that ping-pongs
//! along it.
//!
//! ```text
//! progress(t) = (sin(t · speed + phase) + 1) / 2      ∈ [0, 1]
//! period      = 2π / speed
//! marker      = from · (1 − p) + to · p
//! ```
//!
//! Paths whose status is not `Active` keep moving at `speed · idle_factor`.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::fast_math::{lerp3, ping_pong};
use crate::scene::config::EntityConfig;
use crate::scene::node::{FrameInputs, Material, Pose};
use crate::scene::telemetry::FaultTally;
use crate::visual::mapping::encryption_class;

/// Speed multiplier for paths that are not active.
pub const IDLE_FACTOR: f32 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowPath {
    pub from: Vec3,
    pub to: Vec3,
    /// rad/s
    pub speed: f32,
    pub phase: f32,
    pub idle_factor: f32,
}

impl FlowPath {
    pub fn new(from: Vec3, to: Vec3, speed: f32, phase: f32) -> Self {
        Self {
            from,
            to,
            speed,
            phase,
            idle_factor: IDLE_FACTOR,
        }
    }

    #[inline]
    fn effective_speed(&self, active: bool) -> f32 {
        if active {
            self.speed
        } else {
            self.speed * self.idle_factor
        }
    }

    /// Marker progress in `[0, 1]` at time `t`.
    #[inline]
    pub fn progress(&self, t: f32, active: bool) -> f32 {
        ping_pong(t, self.effective_speed(active), self.phase)
    }

    /// Seconds per full there-and-back cycle; `None` for a stalled path.
    pub fn period(&self, active: bool) -> Option<f32> {
        let speed = self.effective_speed(active).abs();
        (speed > 0.0 && speed.is_finite()).then(|| TAU / speed)
    }

    /// Exactly `from` at `p = 0` and exactly `to` at `p = 1`.
    #[inline]
    pub fn marker_at_progress(&self, p: f32) -> Vec3 {
        lerp3(self.from, self.to, p)
    }

    pub fn marker(&self, t: f32, active: bool) -> Vec3 {
        self.marker_at_progress(self.progress(t, active))
    }

    /// Midpoint; the node sits here and its line is built around it.
    pub fn midpoint(&self) -> Vec3 {
        lerp3(self.from, self.to, 0.5)
    }

    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }

    pub fn apply(&self, config: &EntityConfig, inputs: &FrameInputs, tally: &mut FaultTally, pose: &mut Pose) {
        let reading = inputs.snapshot.path(&config.id, tally);
        let active = reading.status.is_active();
        let material = Material::from_class(encryption_class(reading.encryption));
        pose.material = material.with_opacity(if active { 0.85 } else { 0.3 });
        pose.state.marker = Some(self.marker(inputs.t(), active));
    }
}
