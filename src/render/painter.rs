//! egui Painter-based wireframe rendering of a [`FrameView`].
//!
//! Every mesh edge is transformed with its node's [`Transform`], projected
//! through the orbit [`Camera`], and stroked with the node's display color
//! faded toward the fog color by view depth. Particles are drawn as dots
//! after applying the field's bulk yaw.

use egui::{Align2, Color32, FontId, Pos2, Rect, Rounding, Stroke, Vec2};
use glam::Vec3;

use crate::fast_math::transform_point;
use crate::render::camera::{Camera, Projected};
use crate::scene::composer::{Fog, FrameView};
use crate::scene::node::{AnimatedSceneNode, NodeKind};
use crate::visual::color::Rgba;

/// Screen rectangle the scene is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub rect: Rect,
}

impl Viewport {
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }

    pub fn aspect(&self) -> f32 {
        self.rect.width() / self.rect.height().max(1.0)
    }

    pub fn to_screen(&self, p: Projected) -> Pos2 {
        let c = self.rect.center();
        Pos2::new(
            c.x + p.x * self.rect.width() * 0.5,
            c.y - p.y * self.rect.height() * 0.5,
        )
    }

    /// NDC of a screen position, the inverse of [`Viewport::to_screen`].
    pub fn to_ndc(&self, pos: Pos2) -> (f32, f32) {
        let c = self.rect.center();
        (
            (pos.x - c.x) / (self.rect.width() * 0.5).max(0.5),
            -(pos.y - c.y) / (self.rect.height() * 0.5).max(0.5),
        )
    }

    /// World-space picking ray `(origin, direction)` under a screen position.
    pub fn ray(&self, camera: &Camera, pos: Pos2) -> (Vec3, Vec3) {
        let (u, v) = self.to_ndc(pos);
        (camera.origin, camera.ray(u, v, self.aspect()))
    }

    /// Pixels per world unit at `depth`.
    fn pixels_at(&self, camera: &Camera, depth: f32) -> f32 {
        camera.scale_at(depth) * self.rect.height() * 0.5
    }
}

fn color32(c: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// Color faded toward the fog at `depth`, alpha scaled down with it.
fn fogged(c: Rgba, fog: &Fog, depth: f32) -> Color32 {
    let f = fog.factor(depth);
    let alpha = (c.a as f32 * (1.0 - f * 0.85)).round() as u8;
    color32(c.mix(fog.color, f).with_alpha(alpha))
}

/// Per-viewer painter state. The draw order and projected vertices live in
/// scratch buffers reused across frames.
#[derive(Debug, Default)]
pub struct ScenePainter {
    /// `(depth, node index)`, sorted back to front
    order: Vec<(f32, usize)>,
    projected: Vec<Option<Projected>>,
}

impl ScenePainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame. `highlight` is the hovered entity id, outlined in white.
    pub fn paint(
        &mut self,
        painter: &egui::Painter,
        viewport: Viewport,
        camera: &Camera,
        view: &FrameView,
        highlight: Option<&str>,
    ) {
        let env = view.environment;
        painter.rect_filled(viewport.rect, Rounding::ZERO, color32(env.background));

        draw_ground(painter, viewport, camera, view, &mut self.projected);
        draw_particles(painter, viewport, camera, view);

        // back to front
        let aspect = viewport.aspect();
        self.order.clear();
        self.order.extend(
            view.nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.material.visible && n.material.opacity > 0.0)
                .filter_map(|(i, n)| camera.project(n.transform.position, aspect).map(|p| (p.depth, i))),
        );
        self.order.sort_by(|a, b| b.0.total_cmp(&a.0));

        for &(_, i) in &self.order {
            let node = &view.nodes[i];
            let hovered = highlight == Some(node.id());
            draw_node(painter, viewport, camera, &env.fog, node, hovered, &mut self.projected);
            if hovered {
                draw_label(painter, viewport, camera, node);
            }
        }
    }

    /// Capacities of the `(order, projected)` scratch buffers.
    pub fn scratch_capacity(&self) -> (usize, usize) {
        (self.order.capacity(), self.projected.capacity())
    }
}

fn draw_ground(
    painter: &egui::Painter,
    viewport: Viewport,
    camera: &Camera,
    view: &FrameView,
    scratch: &mut Vec<Option<Projected>>,
) {
    let env = view.environment;
    let offset = Vec3::new(0.0, env.ground_level, 0.0);
    let base = env.key_light.color.scaled(0.12 + env.key_light.intensity * 0.1).with_alpha(120);
    draw_edges(
        painter,
        viewport,
        camera,
        &env.fog,
        &env.ground.mesh.vertices,
        &env.ground.mesh.edges,
        |p| p + offset,
        base,
        0.6,
        scratch,
    );
}

fn draw_particles(painter: &egui::Painter, viewport: Viewport, camera: &Camera, view: &FrameView) {
    let field = view.particles;
    if field.is_empty() || field.opacity <= 0.0 {
        return;
    }
    let aspect = viewport.aspect();
    let yaw = Vec3::new(0.0, field.rotation, 0.0);
    let fog = &view.environment.fog;
    for v in field.vertices() {
        let world = transform_point(Vec3::from_array(v.position), Vec3::ONE, yaw, Vec3::ZERO);
        let Some(p) = camera.project(world, aspect) else {
            continue;
        };
        let pos = viewport.to_screen(p);
        if !viewport.rect.contains(pos) {
            continue;
        }
        let [r, g, b, a] = v.color;
        let c = Rgba {
            r: (r * 255.0) as u8,
            g: (g * 255.0) as u8,
            b: (b * 255.0) as u8,
            a: 255,
        }
        .with_opacity(a * field.opacity);
        let radius = (v.size * viewport.pixels_at(camera, p.depth)).clamp(0.5, 3.0);
        painter.circle_filled(pos, radius, fogged(c, fog, p.depth));
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_edges(
    painter: &egui::Painter,
    viewport: Viewport,
    camera: &Camera,
    fog: &Fog,
    vertices: &[Vec3],
    edges: &[[u32; 2]],
    to_world: impl Fn(Vec3) -> Vec3,
    color: Rgba,
    width: f32,
    projected: &mut Vec<Option<Projected>>,
) {
    let aspect = viewport.aspect();
    projected.clear();
    projected.extend(vertices.iter().map(|&v| camera.project(to_world(v), aspect)));
    for &[a, b] in edges {
        let (Some(Some(pa)), Some(Some(pb))) = (projected.get(a as usize), projected.get(b as usize)) else {
            continue;
        };
        let depth = (pa.depth + pb.depth) * 0.5;
        painter.line_segment(
            [viewport.to_screen(*pa), viewport.to_screen(*pb)],
            Stroke::new(width, fogged(color, fog, depth)),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_node(
    painter: &egui::Painter,
    viewport: Viewport,
    camera: &Camera,
    fog: &Fog,
    node: &AnimatedSceneNode,
    hovered: bool,
    scratch: &mut Vec<Option<Projected>>,
) {
    let material = &node.material;
    let state = &node.state;
    let mesh = &node.shape.mesh;
    let aspect = viewport.aspect();
    let width = 1.0 + material.emissive_intensity.clamp(0.0, 2.0);

    if hovered {
        draw_edges(
            painter,
            viewport,
            camera,
            fog,
            &mesh.vertices,
            &mesh.edges,
            |p| node.transform.apply(p),
            Rgba::WHITE.with_opacity(0.9),
            width + 2.0,
            scratch,
        );
    }
    draw_edges(
        painter,
        viewport,
        camera,
        fog,
        &mesh.vertices,
        &mesh.edges,
        |p| node.transform.apply(p),
        material.display_color(),
        width,
        scratch,
    );

    let accent = material.display_accent();
    let Some(center) = camera.project(node.transform.position, aspect) else {
        return;
    };
    let px = viewport.pixels_at(camera, center.depth);

    if state.alert.is_active() {
        match &node.kind {
            NodeKind::DefenseRing(rule) => {
                for &local in &rule.alert_points {
                    if let Some(p) = camera.project(node.transform.apply(local), aspect) {
                        painter.circle_filled(viewport.to_screen(p), 3.0, fogged(accent, fog, p.depth));
                    }
                }
            }
            _ => {
                let r = node.shape.bounding_radius * node.transform.max_scale() * px * 1.3;
                painter.circle_stroke(
                    viewport.to_screen(center),
                    r.max(4.0),
                    Stroke::new(1.5, fogged(accent, fog, center.depth)),
                );
            }
        }
    }

    // throughput indicators stacked above the node
    for i in 0..state.lit_indicators {
        let above = node.transform.position + Vec3::Y * (node.shape.bounding_radius + 0.4 + i as f32 * 0.35);
        if let Some(p) = camera.project(above, aspect) {
            painter.circle_filled(viewport.to_screen(p), 2.0, fogged(accent, fog, p.depth));
        }
    }

    if let Some(burst) = state.burst {
        let c = accent.with_opacity(burst.opacity * material.opacity);
        painter.circle_stroke(
            viewport.to_screen(center),
            burst.radius * px,
            Stroke::new(1.2, fogged(c, fog, center.depth)),
        );
    }

    if let Some(marker) = state.marker {
        if let Some(p) = camera.project(marker, aspect) {
            let r = (0.15 * viewport.pixels_at(camera, p.depth)).clamp(2.0, 6.0);
            painter.circle_filled(viewport.to_screen(p), r, fogged(accent.with_alpha(255), fog, p.depth));
        }
    }
}

fn draw_label(painter: &egui::Painter, viewport: Viewport, camera: &Camera, node: &AnimatedSceneNode) {
    let top = node.transform.position + Vec3::Y * (node.shape.bounding_radius * node.transform.max_scale());
    let Some(p) = camera.project(top, viewport.aspect()) else {
        return;
    };
    let anchor = viewport.to_screen(p) - Vec2::new(0.0, 8.0);
    let text = format!("{} · {}", node.config.name, node.config.category.label());
    let font = FontId::proportional(13.0);
    let size = painter.layout_no_wrap(text.clone(), font.clone(), Color32::WHITE).size();
    let bg = Rect::from_center_size(anchor - Vec2::new(0.0, size.y * 0.5), size + Vec2::splat(8.0));
    painter.rect_filled(bg, Rounding::same(4.0), Color32::from_black_alpha(180));
    painter.text(anchor, Align2::CENTER_BOTTOM, text, font, Color32::WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::camera::CameraParams;
    use crate::scene::clock::FrameTime;
    use crate::scene::composer::{SceneComposer, SceneVariant};
    use crate::scene::config::SceneConfig;
    use crate::scene::geometry::GeometryCache;
    use crate::scene::particles::ParticleSeed;
    use crate::scene::telemetry::TelemetrySnapshot;

    fn viewport() -> Viewport {
        Viewport::new(Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(800.0, 500.0)))
    }

    #[test]
    fn screen_and_ndc_round_trip() {
        let vp = viewport();
        let pos = vp.to_screen(Projected {
            x: 0.25,
            y: -0.5,
            depth: 1.0,
        });
        let (u, v) = vp.to_ndc(pos);
        assert!((u - 0.25).abs() < 1e-5 && (v + 0.5).abs() < 1e-5);
        assert_eq!(vp.to_screen(Projected { x: 0.0, y: 0.0, depth: 1.0 }), vp.rect.center());
    }

    #[test]
    fn center_ray_hits_camera_target() {
        let vp = viewport();
        let params = CameraParams::default();
        let cam = params.camera();
        let (origin, dir) = vp.ray(&cam, vp.rect.center());
        let closest = origin + dir * params.distance;
        assert!(closest.distance(params.target) < 1e-3);
    }

    #[test]
    fn fog_fades_far_colors() {
        let fog = Fog {
            color: Rgba::BLACK,
            near: 10.0,
            far: 20.0,
        };
        let near = fogged(Rgba::WHITE, &fog, 5.0);
        let far = fogged(Rgba::WHITE, &fog, 30.0);
        assert_eq!(near, Color32::WHITE);
        assert!(far.a() < near.a());
    }

    #[test]
    fn scratch_buffers_are_reused_across_frames() {
        let mut cache = GeometryCache::new();
        let mut composer = SceneComposer::new(
            SceneVariant::CommandCenter,
            &SceneConfig::default(),
            ParticleSeed::Fixed(3),
            &mut cache,
        );
        let vp = viewport();
        let camera = CameraParams::default().camera();
        let snapshot = TelemetrySnapshot::new(90.0, 6.0);
        let mut scene_painter = ScenePainter::new();
        let ctx = egui::Context::default();

        let mut capacities = Vec::new();
        for frame in 0..3 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                let painter = ctx.layer_painter(egui::LayerId::background());
                let view = composer.compose(FrameTime::at(frame as f32 * 0.5), &snapshot);
                scene_painter.paint(&painter, vp, &camera, &view, None);
            });
            capacities.push(scene_painter.scratch_capacity());
        }
        let (order, projected) = capacities[0];
        assert!(order > 0 && projected > 0);
        assert!(capacities.iter().all(|&c| c == capacities[0]), "{:?}", capacities);
    }
}
