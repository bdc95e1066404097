//! Threatscape: procedural 3D scenes for security-operations dashboards.
//!
//! Telemetry snapshots drive colors, alerts and motion of a fixed set of
//! procedurally built primitives. The library is renderer-agnostic; the
//! `viewer` feature adds an egui painter and the demo host binary.

pub mod error;
pub mod fast_math;
pub mod render;
pub mod scene;
pub mod visual;

pub use error::{GeometryError, SceneError};
pub use scene::{SceneMount, SceneVariant, TelemetrySnapshot};
