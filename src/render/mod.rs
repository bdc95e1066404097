//! Viewer-side rendering: orbit camera and the egui wireframe painter.

pub mod camera;

#[cfg(feature = "viewer")]
pub mod painter;

pub use camera::{Camera, CameraParams};
