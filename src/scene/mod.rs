//! Scene engine: config and telemetry in, animated primitives out.
//!
//! ```text
//! SceneConfig ──► SceneComposer::new ──► nodes + particles + environment
//!                                              │
//! TelemetrySnapshot + FrameTime ──► compose ───┴──► FrameView
//! ```
//!
//! [`SceneMount`] wraps a composer with the frame clock, picking and the
//! host callbacks.

pub mod clock;
pub mod composer;
pub mod config;
pub mod flow;
pub mod geometry;
pub mod mount;
pub mod node;
pub mod particles;
pub mod radar;
pub mod telemetry;
pub mod world_map;

pub use clock::{FrameTime, SceneClock};
pub use composer::{FrameStats, FrameView, SceneComposer, SceneVariant};
pub use config::{Category, EntityConfig, SceneConfig};
pub use geometry::{GeometryCache, ShapeDescriptor, ShapeParams};
pub use mount::{MountOptions, PointerEvent, SceneMount};
pub use node::AnimatedSceneNode;
pub use particles::{ParticleField, ParticleSeed};
pub use telemetry::{FaultTally, TelemetrySnapshot};
