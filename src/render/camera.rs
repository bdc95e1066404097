//! Orbit camera: projection for drawing and screen rays for picking.

use glam::Vec3;

use crate::scene::composer::SceneVariant;

/// Camera parameters for interactive orbit navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    /// Horizontal orbit angle in radians (0 = front)
    pub azimuth: f32,
    /// Vertical orbit angle in radians (0 = level, positive = looking down)
    pub elevation: f32,
    /// Distance from the camera to the target point
    pub distance: f32,
    /// Target point the camera looks at
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_deg: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            azimuth: 0.6,
            elevation: 0.55,
            distance: 42.0,
            target: Vec3::ZERO,
            fov_deg: 50.0,
        }
    }
}

impl CameraParams {
    /// Framing that fits each variant's default layout.
    pub fn for_variant(variant: SceneVariant) -> Self {
        match variant {
            SceneVariant::CommandCenter => Self::default(),
            SceneVariant::ThreatRadar => Self {
                azimuth: 0.0,
                elevation: 1.1,
                distance: 26.0,
                ..Self::default()
            },
            SceneVariant::WorldMap => Self {
                azimuth: 0.0,
                elevation: 0.9,
                distance: 22.0,
                ..Self::default()
            },
        }
    }

    /// Drag to orbit; elevation stays off the poles.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.azimuth += dx * 0.008;
        self.elevation = (self.elevation - dy * 0.008)
            .clamp(0.05, std::f32::consts::FRAC_PI_2 - 0.05);
    }

    /// Scroll to dolly in/out.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * (1.0 - scroll * 0.003)).clamp(2.0, 200.0);
    }

    pub fn eye(&self) -> Vec3 {
        self.target
            + Vec3::new(
                self.distance * self.azimuth.sin() * self.elevation.cos(),
                self.distance * self.elevation.sin(),
                self.distance * self.azimuth.cos() * self.elevation.cos(),
            )
    }

    pub fn camera(&self) -> Camera {
        Camera::look_at(self.eye(), self.target, self.fov_deg)
    }
}

/// Point projected to normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// -1 (left) .. 1 (right) inside the view
    pub x: f32,
    /// -1 (bottom) .. 1 (top) inside the view
    pub y: f32,
    /// Distance along the view axis
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    fov_factor: f32,
}

/// Points closer than this are not drawn.
pub const NEAR_PLANE: f32 = 0.1;

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3, fov_deg: f32) -> Self {
        let forward = (target - eye).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        Self {
            origin: eye,
            forward,
            right,
            up,
            fov_factor: (fov_deg.to_radians() * 0.5).tan(),
        }
    }

    /// World-space unit ray through NDC `(u, v)`.
    pub fn ray(&self, u: f32, v: f32, aspect: f32) -> Vec3 {
        (self.forward
            + self.right * (u * self.fov_factor * aspect)
            + self.up * (v * self.fov_factor))
            .normalize_or_zero()
    }

    /// Inverse of [`Camera::ray`]; `None` behind the near plane.
    pub fn project(&self, p: Vec3, aspect: f32) -> Option<Projected> {
        let rel = p - self.origin;
        let depth = rel.dot(self.forward);
        if !(depth > NEAR_PLANE) {
            return None;
        }
        Some(Projected {
            x: rel.dot(self.right) / (depth * self.fov_factor * aspect),
            y: rel.dot(self.up) / (depth * self.fov_factor),
            depth,
        })
    }

    /// Screen-space size of a world length at `depth`, in NDC height units.
    pub fn scale_at(&self, depth: f32) -> f32 {
        1.0 / (depth.max(NEAR_PLANE) * self.fov_factor)
    }
}
