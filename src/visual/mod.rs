//! Telemetry → palette mapping.

pub mod color;
pub mod mapping;

pub use color::Rgba;
pub use mapping::{Swatch, VisualClass};
