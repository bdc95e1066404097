use eframe::egui;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use threatscape::render::painter::{ScenePainter, Viewport};
use threatscape::render::CameraParams;
use threatscape::scene::config::SceneConfig;
use threatscape::scene::{MountOptions, ParticleSeed, PointerEvent, SceneMount, SceneVariant, TelemetrySnapshot};
use threatscape::visual::mapping::{BandwidthClass, EncryptionClass, EntityStatus, Severity};

/// Clicked entities kept in the side panel
const CLICK_HISTORY: usize = 8;

fn main() {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Threatscape",
        options,
        Box::new(|_cc| Ok(Box::new(ThreatscapeApp::new()))),
    )
    .expect("Failed to start Threatscape");
}

/// `THREATSCAPE_SEED=<u64>` pins the particle field for reproducible sessions.
fn seed_from_env() -> ParticleSeed {
    match std::env::var("THREATSCAPE_SEED") {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(seed) => ParticleSeed::Fixed(seed),
            Err(_) => {
                log::warn!("THREATSCAPE_SEED={:?} is not a u64, using a fresh seed", raw);
                ParticleSeed::Entropy
            }
        },
        Err(_) => ParticleSeed::Entropy,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Demo telemetry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Synthetic feed standing in for a live telemetry source.
struct DemoFeed {
    towers: Vec<String>,
    data_nodes: Vec<String>,
    threats: Vec<String>,
    paths: Vec<String>,
    data_centers: Vec<String>,
    connections: Vec<String>,
    threat_sources: Vec<String>,
    /// Sliders drive the global levels instead of the wave
    manual: bool,
    threat_level: f32,
    system_health: f32,
}

impl DemoFeed {
    fn new(config: &SceneConfig) -> Self {
        let map = &config.world_map;
        Self {
            towers: config.towers.iter().map(|c| c.id.clone()).collect(),
            data_nodes: config.data_nodes.iter().map(|c| c.id.clone()).collect(),
            threats: config.threat_markers.iter().map(|c| c.id.clone()).collect(),
            paths: config.data_paths.iter().map(|c| c.id.clone()).collect(),
            data_centers: map.data_centers.iter().map(|c| c.id.clone()).collect(),
            connections: map.connections.iter().map(|c| c.id.clone()).collect(),
            threat_sources: map.threat_sources.iter().map(|c| c.id.clone()).collect(),
            manual: false,
            threat_level: 3.0,
            system_health: 92.0,
        }
    }

    fn snapshot(&mut self, t: f32) -> TelemetrySnapshot {
        if !self.manual {
            self.threat_level = 5.0 + 4.5 * (t * 0.15).sin();
            self.system_health = (98.0 - self.threat_level * 4.0).clamp(0.0, 100.0);
        }
        let threat = self.threat_level;
        let mut snap = TelemetrySnapshot::new(self.system_health, threat);

        for (i, id) in self.towers.iter().enumerate() {
            let local = (threat + 2.0 * (t * 0.7 + i as f32).sin()).clamp(0.0, 10.0);
            let status = if local > 8.0 { EntityStatus::Warning } else { EntityStatus::Active };
            snap = snap.with_tower(id, status, local);
        }
        for (i, id) in self.data_nodes.iter().enumerate() {
            let throughput = 50.0 + 50.0 * (t * 0.4 + i as f32 * 0.9).sin();
            let status = if i % 7 == 3 && (t * 0.1).cos() > 0.8 {
                EntityStatus::Offline
            } else {
                EntityStatus::Active
            };
            snap = snap.with_data_node(id, status, throughput);
        }
        for (i, id) in self.threats.iter().enumerate() {
            let active = (t * 0.5 + i as f32 * 1.3).sin() > 0.2;
            snap = snap.with_threat(id, active, (threat + (i % 3) as f32).min(10.0));
        }
        const CIPHERS: [EncryptionClass; 4] = [
            EncryptionClass::QuantumResistant,
            EncryptionClass::Aes256,
            EncryptionClass::Rsa4096,
            EncryptionClass::Tls13,
        ];
        for (i, id) in self.paths.iter().enumerate() {
            let status = if (t * 0.3 + i as f32).sin() > -0.7 {
                EntityStatus::Active
            } else {
                EntityStatus::Warning
            };
            snap = snap.with_path(id, status, CIPHERS[i % CIPHERS.len()]);
        }
        for (i, id) in self.data_centers.iter().enumerate() {
            let load = 55.0 + 40.0 * (t * 0.25 + i as f32 * 0.8).sin();
            let status = if load > 92.0 { EntityStatus::Critical } else { EntityStatus::Active };
            snap = snap.with_data_center(id, status, load);
        }
        const BANDS: [BandwidthClass; 3] = [BandwidthClass::High, BandwidthClass::Medium, BandwidthClass::Low];
        for (i, id) in self.connections.iter().enumerate() {
            let active = (t * 0.35 + i as f32 * 0.6).sin() > -0.3;
            snap = snap.with_connection(id, BANDS[i % BANDS.len()], active);
        }
        const SEVERITIES: [Severity; 4] = [Severity::Critical, Severity::High, Severity::Medium, Severity::Low];
        for (i, id) in self.threat_sources.iter().enumerate() {
            let active = threat > 2.0 + i as f32 * 1.5;
            snap = snap.with_threat_source(id, SEVERITIES[i % SEVERITIES.len()], active);
        }
        snap
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  App
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct ThreatscapeApp {
    config: SceneConfig,
    variant: SceneVariant,
    mount: Option<SceneMount>,
    mount_error: Option<String>,
    seed: ParticleSeed,
    cam_params: CameraParams,
    scene_painter: ScenePainter,
    feed: DemoFeed,
    paused: bool,
    pointer_inside: bool,
    hover_label: Rc<RefCell<Option<String>>>,
    clicks: Rc<RefCell<VecDeque<String>>>,
}

impl ThreatscapeApp {
    fn new() -> Self {
        let config = SceneConfig::default();
        let mut app = Self {
            feed: DemoFeed::new(&config),
            config,
            variant: SceneVariant::default(),
            mount: None,
            mount_error: None,
            seed: seed_from_env(),
            cam_params: CameraParams::default(),
            scene_painter: ScenePainter::new(),
            paused: false,
            pointer_inside: false,
            hover_label: Rc::default(),
            clicks: Rc::default(),
        };
        app.remount(app.variant);
        app
    }

    /// Tear down the live scene (if any) and mount `variant` in its place.
    fn remount(&mut self, variant: SceneVariant) {
        if let Some(mut old) = self.mount.take() {
            old.unmount();
        }
        self.variant = variant;
        self.cam_params = CameraParams::for_variant(variant);
        *self.hover_label.borrow_mut() = None;

        let options = MountOptions {
            seed: self.seed,
            strict: false,
        };
        match SceneMount::mount(variant, &self.config, options) {
            Ok(mut mount) => {
                let hover = Rc::clone(&self.hover_label);
                mount.on_entity_hover(move |hit| {
                    *hover.borrow_mut() = hit.map(|c| format!("{} ({})", c.name, c.category.label()));
                });
                let clicks = Rc::clone(&self.clicks);
                mount.on_entity_click(move |entity| {
                    log::info!("clicked {} `{}`", entity.category.label(), entity.id);
                    let mut clicks = clicks.borrow_mut();
                    clicks.push_front(format!("{}: {} [{}]", entity.category.label(), entity.name, entity.id));
                    clicks.truncate(CLICK_HISTORY);
                });
                self.mount = Some(mount);
                self.mount_error = None;
            }
            Err(err) => {
                log::error!("mount {} failed: {}", variant.label(), err);
                self.mount_error = Some(err.to_string());
            }
        }
    }

    fn unmount(&mut self) {
        if let Some(mut mount) = self.mount.take() {
            mount.unmount();
        }
        *self.hover_label.borrow_mut() = None;
        self.pointer_inside = false;
    }

    fn controls(&mut self, ui: &mut egui::Ui) -> Option<SceneVariant> {
        let mut next = None;
        ui.horizontal(|ui| {
            ui.strong("Threatscape");
            ui.separator();
            for variant in SceneVariant::ALL {
                let selected = self.mount.is_some() && self.variant == variant;
                if ui.selectable_label(selected, variant.label()).clicked() && !selected {
                    next = Some(variant);
                }
            }
            ui.separator();
            ui.checkbox(&mut self.feed.manual, "Manual");
            ui.add_enabled(
                self.feed.manual,
                egui::Slider::new(&mut self.feed.threat_level, 0.0..=10.0).text("Threat"),
            );
            ui.add_enabled(
                self.feed.manual,
                egui::Slider::new(&mut self.feed.system_health, 0.0..=100.0).text("Health"),
            );
            ui.separator();
            ui.checkbox(&mut self.paused, "Pause");
            if ui.add_enabled(self.mount.is_some(), egui::Button::new("Unmount")).clicked() {
                self.unmount();
            }
        });
        next
    }

    fn side_panel(&self, ui: &mut egui::Ui) {
        ui.heading("Frame");
        match self.mount.as_ref().and_then(SceneMount::stats) {
            Some(stats) => {
                ui.label(format!("Frame: {}", stats.frame));
                ui.label(format!("Elapsed: {:.1}s", stats.elapsed));
                ui.label(format!("Nodes: {}", stats.nodes));
                ui.label(format!("Particles: {}", stats.particles));
                ui.label(format!("Threat: {:.1}", self.feed.threat_level));
                ui.label(format!("Health: {:.0}%", self.feed.system_health));
                if stats.faults() > 0 {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(255, 170, 0), "Degraded inputs");
                    ui.label(format!("Missing telemetry: {}", stats.missing_telemetry));
                    ui.label(format!("Out of range: {}", stats.out_of_range));
                    ui.label(format!("Unknown labels: {}", stats.unknown_labels));
                    ui.label(format!("Degraded nodes: {}", stats.degraded_nodes));
                }
            }
            None => {
                ui.label("Unmounted");
            }
        }
        if let Some(err) = &self.mount_error {
            ui.colored_label(egui::Color32::from_rgb(220, 60, 60), err);
        }
        ui.label(format!("Cam dist: {:.1}", self.cam_params.distance));

        ui.separator();
        ui.heading("Hover");
        match self.hover_label.borrow().as_deref() {
            Some(label) => ui.label(label),
            None => ui.weak("nothing"),
        };

        ui.separator();
        ui.heading("Clicked");
        for entry in self.clicks.borrow().iter() {
            ui.label(entry);
        }
    }

    fn viewport(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let viewport = Viewport::new(rect);

        // drag to orbit
        if response.dragged() {
            let delta = response.drag_delta();
            self.cam_params.orbit(delta.x, delta.y);
        }
        // scroll to dolly in/out
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.1 {
                self.cam_params.zoom(scroll);
            }
        }
        let camera = self.cam_params.camera();
        let painter = ui.painter_at(rect);

        let Some(mount) = self.mount.as_mut() else {
            painter.rect_filled(rect, egui::Rounding::ZERO, egui::Color32::from_rgb(0, 8, 20));
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No scene mounted",
                egui::FontId::proportional(18.0),
                egui::Color32::GRAY,
            );
            return;
        };

        let mut events = Vec::with_capacity(2);
        match response.hover_pos() {
            Some(pos) => {
                let (origin, direction) = viewport.ray(&camera, pos);
                events.push(PointerEvent::Move { origin, direction });
                if response.clicked() {
                    events.push(PointerEvent::Click { origin, direction });
                }
                self.pointer_inside = true;
            }
            None if self.pointer_inside => {
                events.push(PointerEvent::Leave);
                self.pointer_inside = false;
            }
            None => {}
        }
        for event in events {
            if let Err(err) = mount.pointer(event) {
                log::warn!("pointer event dropped: {}", err);
            }
        }
        if mount.hovered().is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        let dt = if self.paused { 0.0 } else { ui.input(|i| i.stable_dt).min(0.1) };
        let snapshot = self.feed.snapshot(mount.elapsed() + dt);
        let hovered = mount.hovered().map(str::to_string);
        if let Some(view) = mount.advance(dt, &snapshot) {
            self.scene_painter
                .paint(&painter, viewport, &camera, &view, hovered.as_deref());
        }
    }
}

impl eframe::App for ThreatscapeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let next = egui::TopBottomPanel::top("controls")
            .show(ctx, |ui| self.controls(ui))
            .inner;
        if let Some(variant) = next {
            self.remount(variant);
        }

        egui::SidePanel::right("stats")
            .default_width(240.0)
            .show(ctx, |ui| self.side_panel(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.viewport(ui));

        if self.mount.as_ref().is_some_and(SceneMount::wants_frame) {
            ctx.request_repaint();
        }
    }
}
