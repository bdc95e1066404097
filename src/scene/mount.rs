//! Mount point between a host and one live scene.
//!
//! The host owns the frame scheduler. Each callback it calls
//! [`SceneMount::advance`] with the frame delta and the latest telemetry,
//! and draws the returned [`FrameView`]. Pointer rays go in through
//! [`SceneMount::pointer`]; hit entities come back out through the hover and
//! click callbacks, uninterpreted. After [`SceneMount::unmount`] the mount
//! holds no buffers, no callbacks, and [`SceneMount::wants_frame`] is false.

use glam::Vec3;

use crate::error::SceneError;
use crate::scene::clock::SceneClock;
use crate::scene::composer::{FrameStats, FrameView, SceneComposer, SceneVariant};
use crate::scene::config::{EntityConfig, SceneConfig};
use crate::scene::geometry::GeometryCache;
use crate::scene::particles::ParticleSeed;
use crate::scene::telemetry::TelemetrySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MountOptions {
    pub seed: ParticleSeed,
    /// Reject configs with dangling references instead of warning
    pub strict: bool,
}

/// Pointer input, already turned into a world-space ray by the host camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move { origin: Vec3, direction: Vec3 },
    Click { origin: Vec3, direction: Vec3 },
    /// Pointer left the render surface
    Leave,
}

type HoverCallback = Box<dyn FnMut(Option<&EntityConfig>)>;
type ClickCallback = Box<dyn FnMut(&EntityConfig)>;

pub struct SceneMount {
    variant: SceneVariant,
    clock: SceneClock,
    composer: Option<SceneComposer>,
    cache: GeometryCache,
    on_hover: Option<HoverCallback>,
    on_click: Option<ClickCallback>,
    hovered: Option<String>,
}

impl SceneMount {
    pub fn mount(variant: SceneVariant, config: &SceneConfig, options: MountOptions) -> Result<Self, SceneError> {
        if let Err(err) = config.validate() {
            if options.strict {
                return Err(err);
            }
            log::warn!("mounting with inconsistent config: {}", err);
        }
        let mut cache = GeometryCache::new();
        let composer = SceneComposer::new(variant, config, options.seed, &mut cache);
        let (hits, misses) = cache.stats();
        log::info!(
            "mounted {} ({} shapes built, {} shared)",
            variant.label(),
            misses,
            hits
        );
        Ok(Self {
            variant,
            clock: SceneClock::new(),
            composer: Some(composer),
            cache,
            on_hover: None,
            on_click: None,
            hovered: None,
        })
    }

    /// Run exactly one frame. `None` once unmounted.
    pub fn advance(&mut self, dt: f32, snapshot: &TelemetrySnapshot) -> Option<FrameView<'_>> {
        let composer = self.composer.as_mut()?;
        let time = self.clock.tick(dt);
        Some(composer.compose(time, snapshot))
    }

    pub fn on_entity_hover(&mut self, callback: impl FnMut(Option<&EntityConfig>) + 'static) {
        self.on_hover = Some(Box::new(callback));
    }

    pub fn on_entity_click(&mut self, callback: impl FnMut(&EntityConfig) + 'static) {
        self.on_click = Some(Box::new(callback));
    }

    /// Ray-pick against the current frame and forward the hit.
    ///
    /// Hover fires only when the hovered entity changes (including to none).
    pub fn pointer(&mut self, event: PointerEvent) -> Result<(), SceneError> {
        let composer = self.composer.as_ref().ok_or(SceneError::Unmounted)?;
        match event {
            PointerEvent::Move { origin, direction } => {
                let hit = composer.pick(origin, direction).map(|n| &n.config);
                let id = hit.map(|c| c.id.as_str());
                if id != self.hovered.as_deref() {
                    self.hovered = id.map(str::to_string);
                    if let Some(callback) = self.on_hover.as_mut() {
                        callback(hit);
                    }
                }
            }
            PointerEvent::Click { origin, direction } => {
                if let Some(hit) = composer.pick(origin, direction) {
                    if let Some(callback) = self.on_click.as_mut() {
                        callback(&hit.config);
                    }
                }
            }
            PointerEvent::Leave => {
                if self.hovered.take().is_some() {
                    if let Some(callback) = self.on_hover.as_mut() {
                        callback(None);
                    }
                }
            }
        }
        Ok(())
    }

    /// Static config of a mounted entity.
    pub fn entity(&self, id: &str) -> Result<&EntityConfig, SceneError> {
        let composer = self.composer.as_ref().ok_or(SceneError::Unmounted)?;
        composer
            .node(id)
            .map(|n| &n.config)
            .ok_or_else(|| SceneError::UnknownEntity(id.to_string()))
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Release nodes, particle buffer and shared shapes, drop callbacks.
    pub fn unmount(&mut self) {
        if let Some(mut composer) = self.composer.take() {
            composer.release();
            log::info!(
                "unmounted {} after {} frames",
                self.variant.label(),
                self.clock.frame()
            );
        }
        self.cache.clear();
        self.on_hover = None;
        self.on_click = None;
        self.hovered = None;
    }

    /// Whether the host should keep scheduling frames.
    pub fn wants_frame(&self) -> bool {
        self.composer.is_some()
    }

    pub fn variant(&self) -> SceneVariant {
        self.variant
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    pub fn stats(&self) -> Option<FrameStats> {
        self.composer.as_ref().map(SceneComposer::stats)
    }

    /// Cached shapes still held by the mount.
    pub fn cached_shapes(&self) -> usize {
        self.cache.len()
    }
}

impl Drop for SceneMount {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mount(variant: SceneVariant) -> SceneMount {
        let options = MountOptions {
            seed: ParticleSeed::Fixed(9),
            strict: true,
        };
        SceneMount::mount(variant, &SceneConfig::default(), options).expect("default config mounts")
    }

    #[test]
    fn advance_runs_one_frame_per_call() {
        let mut m = mount(SceneVariant::CommandCenter);
        let snap = TelemetrySnapshot::new(90.0, 3.0);
        for i in 1..=3u64 {
            let view = m.advance(0.016, &snap).expect("mounted");
            assert_eq!(view.time.frame, i);
            assert_eq!(view.stats.frame, i);
        }
        assert!((m.elapsed() - 0.048).abs() < 1e-5);
    }

    #[test]
    fn unmount_stops_frames_and_releases() {
        let mut m = mount(SceneVariant::WorldMap);
        assert!(m.wants_frame());
        assert!(m.cached_shapes() > 0);
        m.unmount();
        assert!(!m.wants_frame());
        assert_eq!(m.cached_shapes(), 0);
        assert!(m.advance(0.016, &TelemetrySnapshot::default()).is_none());
        assert_eq!(m.pointer(PointerEvent::Leave), Err(SceneError::Unmounted));
        assert!(m.stats().is_none());
        // idempotent
        m.unmount();
    }

    #[test]
    fn hover_fires_on_change_only() {
        let mut m = mount(SceneVariant::CommandCenter);
        m.advance(0.0, &TelemetrySnapshot::default());

        let seen: Rc<RefCell<Vec<Option<String>>>> = Rc::default();
        let sink = Rc::clone(&seen);
        m.on_entity_hover(move |hit| sink.borrow_mut().push(hit.map(|c| c.id.clone())));

        let at_core = PointerEvent::Move {
            origin: Vec3::new(0.0, -50.0, 0.0),
            direction: Vec3::Y,
        };
        let nowhere = PointerEvent::Move {
            origin: Vec3::new(0.0, -50.0, 0.0),
            direction: Vec3::NEG_Y,
        };
        m.pointer(at_core).unwrap();
        m.pointer(at_core).unwrap();
        assert_eq!(m.hovered(), Some("core"));
        m.pointer(nowhere).unwrap();
        m.pointer(PointerEvent::Leave).unwrap();

        assert_eq!(*seen.borrow(), vec![Some("core".to_string()), None]);
    }

    #[test]
    fn click_forwards_the_entity() {
        let mut m = mount(SceneVariant::CommandCenter);
        m.advance(0.0, &TelemetrySnapshot::default());

        let clicked: Rc<RefCell<Vec<String>>> = Rc::default();
        let sink = Rc::clone(&clicked);
        m.on_entity_click(move |cfg| sink.borrow_mut().push(format!("{}:{}", cfg.category.label(), cfg.id)));

        m.pointer(PointerEvent::Click {
            origin: Vec3::new(0.0, -50.0, 0.0),
            direction: Vec3::Y,
        })
        .unwrap();
        // miss: nothing forwarded
        m.pointer(PointerEvent::Click {
            origin: Vec3::new(0.0, -50.0, 0.0),
            direction: Vec3::NEG_Y,
        })
        .unwrap();
        assert_eq!(*clicked.borrow(), vec!["core:core".to_string()]);
    }

    #[test]
    fn entity_lookup() {
        let m = mount(SceneVariant::ThreatRadar);
        assert!(m.entity("radar-sweep").is_ok());
        assert_eq!(
            m.entity("tower-01").map(|c| c.id.clone()),
            Err(SceneError::UnknownEntity("tower-01".to_string()))
        );
    }

    #[test]
    fn strict_mount_rejects_dangling_references() {
        let mut config = SceneConfig::default();
        config.radar.blips[0].threat_id = "threat-99".to_string();
        let strict = SceneMount::mount(
            SceneVariant::ThreatRadar,
            &config,
            MountOptions {
                seed: ParticleSeed::Fixed(1),
                strict: true,
            },
        );
        assert_eq!(strict.err(), Some(SceneError::UnknownEntity("threat-99".to_string())));

        let lenient = SceneMount::mount(
            SceneVariant::ThreatRadar,
            &config,
            MountOptions {
                seed: ParticleSeed::Fixed(1),
                strict: false,
            },
        );
        assert!(lenient.is_ok());
    }
}
