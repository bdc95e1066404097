//! Error types surfaced to callers.
//!
//! Presentation faults (missing telemetry, out-of-range values, unknown
//! labels) are never raised: they degrade to a default visual and are
//! counted in [`crate::scene::composer::FrameStats`]. Only strict geometry
//! validation and host calls against an unmounted scene return errors.

use thiserror::Error;

/// A geometry parameter that would produce a malformed shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{param} must be a positive finite number, got {value}")]
    NonPositiveExtent { param: &'static str, value: f32 },

    #[error("{param} must be at most {max}, got {value}")]
    ExtentTooLarge {
        param: &'static str,
        value: f32,
        max: f32,
    },

    #[error("{param} needs at least {min} segments, got {value}")]
    TooFewSegments {
        param: &'static str,
        value: u32,
        min: u32,
    },
}

/// Host-side misuse of a scene mount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene is not mounted")]
    Unmounted,

    #[error("no entity with id `{0}` in this scene")]
    UnknownEntity(String),
}
