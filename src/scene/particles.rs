//! Layered particle field.
//!
//! Generated once per mount into a GPU-ready vertex buffer: `N` particles
//! over `L` concentric shells, layer `l` getting `N / L` particles plus one
//! of the `N % L` remainder while `l < N % L`. Per frame only the bulk
//! rotation and the breathing opacity change; vertices are never touched
//! again until [`ParticleField::release`].
//!
//! Radii, spacing, jitter and sizes are clamped into `0..=MAX_EXTENT`, so
//! every sampled range has a finite width and every coordinate is finite.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::fast_math::{fma, oscillate, wrap_angle};
use crate::scene::geometry::MAX_EXTENT;
use crate::visual::color::Rgba;
use crate::visual::mapping::VisualClass;

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleFieldConfig {
    pub count: usize,
    pub layers: usize,
    pub base_radius: f32,
    pub layer_spacing: f32,
    /// Max radial offset either side of the shell
    pub jitter: f32,
    pub size_min: f32,
    pub size_max: f32,
    /// Layer `l` uses `palette[l % palette.len()]`
    pub palette: Vec<Rgba>,
    /// rad/s
    pub rotation_speed: f32,
    pub opacity_base: f32,
    pub opacity_amplitude: f32,
    pub opacity_frequency: f32,
}

impl Default for ParticleFieldConfig {
    fn default() -> Self {
        Self {
            count: 1500,
            layers: 5,
            base_radius: 25.0,
            layer_spacing: 6.0,
            jitter: 2.0,
            size_min: 0.05,
            size_max: 0.2,
            palette: vec![
                VisualClass::Calm.color(),
                VisualClass::Hardened.color(),
                VisualClass::Quantum.color(),
                VisualClass::Healthy.color(),
            ],
            rotation_speed: 0.02,
            opacity_base: 0.6,
            opacity_amplitude: 0.2,
            opacity_frequency: 0.5,
        }
    }
}

/// Where the field's randomness comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleSeed {
    /// Reproducible field.
    Fixed(u64),
    /// Fresh seed per mount; the drawn seed is logged so a session can be
    /// replayed with `Fixed`.
    #[default]
    Entropy,
}

impl ParticleSeed {
    pub fn resolve(self) -> u64 {
        match self {
            Self::Fixed(seed) => seed,
            Self::Entropy => {
                let seed = rand::thread_rng().gen::<u64>();
                log::info!("particle field seed: {}", seed);
                seed
            }
        }
    }
}

/// One particle as uploaded to the GPU (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct ParticleField {
    vertices: Vec<ParticleVertex>,
    layer_counts: Vec<usize>,
    seed: u64,
    rotation_speed: f32,
    opacity_base: f32,
    opacity_amplitude: f32,
    opacity_frequency: f32,
    /// Bulk yaw, radians
    pub rotation: f32,
    /// Bulk opacity, 0–1
    pub opacity: f32,
}

/// Per-layer counts: `n / layers` each, remainder to the first layers.
pub fn layer_counts(n: usize, layers: usize) -> Vec<usize> {
    let layers = layers.max(1);
    let (base, rem) = (n / layers, n % layers);
    (0..layers).map(|l| base + (l < rem) as usize).collect()
}

fn sane(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

/// Finite length in `0..=MAX_EXTENT`.
fn extent(param: &'static str, v: f32, fallback: f32) -> f32 {
    let c = sane(v, fallback).clamp(0.0, MAX_EXTENT);
    if c != v {
        log::debug!("particle field: {} = {} clamped to {}", param, v, c);
    }
    c
}

impl ParticleField {
    pub fn generate(config: &ParticleFieldConfig, seed: ParticleSeed) -> Self {
        let seed = seed.resolve();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let counts = layer_counts(config.count, config.layers);
        let base_radius = extent("base_radius", config.base_radius, 0.0);
        let spacing = extent("layer_spacing", config.layer_spacing, 0.0);
        let jitter = extent("jitter", config.jitter.abs(), 0.0);
        let (lo, hi) = {
            let a = extent("size_min", config.size_min, 0.05);
            let b = extent("size_max", config.size_max, 0.2);
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        };

        let mut vertices = Vec::with_capacity(config.count);
        for (layer, &count) in counts.iter().enumerate() {
            let color = config
                .palette
                .get(layer % config.palette.len().max(1))
                .copied()
                .unwrap_or(VisualClass::Fallback.color())
                .to_f32();
            let shell = match fma(layer as f32, spacing, base_radius) {
                r if r.is_finite() => r,
                _ => base_radius,
            };
            for _ in 0..count {
                let offset = if jitter > 0.0 {
                    rng.gen_range(-jitter..=jitter)
                } else {
                    0.0
                };
                let radius = (shell + offset).max(0.0);
                let position = random_direction(&mut rng) * radius;
                vertices.push(ParticleVertex {
                    position: position.to_array(),
                    size: rng.gen_range(lo..=hi),
                    color,
                });
            }
        }
        log::debug!(
            "particle field: {} particles over {} layers (seed {})",
            vertices.len(),
            counts.len(),
            seed
        );

        let mut field = Self {
            vertices,
            layer_counts: counts,
            seed,
            rotation_speed: sane(config.rotation_speed, 0.0),
            opacity_base: sane(config.opacity_base, 0.6),
            opacity_amplitude: sane(config.opacity_amplitude, 0.0),
            opacity_frequency: sane(config.opacity_frequency, 0.0),
            rotation: 0.0,
            opacity: 0.0,
        };
        field.animate(0.0);
        field
    }

    /// Bulk transform for time `t`. Vertices are untouched.
    pub fn animate(&mut self, t: f32) {
        self.rotation = wrap_angle(t * self.rotation_speed);
        let o = oscillate(t, self.opacity_frequency, 0.0, self.opacity_base, self.opacity_amplitude);
        self.opacity = if o.is_nan() { 0.0 } else { o.clamp(0.0, 1.0) };
    }

    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    pub fn layer_counts(&self) -> &[usize] {
        &self.layer_counts
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex buffer for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Free the vertex buffer.
    pub fn release(&mut self) {
        self.vertices = Vec::new();
        self.layer_counts = Vec::new();
    }
}

/// Uniform direction on the unit sphere.
fn random_direction<R: Rng>(rng: &mut R) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let phi: f32 = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), z, r * phi.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_split_distributes_remainder_first() {
        assert_eq!(layer_counts(10, 3), vec![4, 3, 3]);
        assert_eq!(layer_counts(9, 3), vec![3, 3, 3]);
        assert_eq!(layer_counts(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(layer_counts(5, 0), vec![5]);
        assert_eq!(layer_counts(1500, 5).iter().sum::<usize>(), 1500);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let cfg = ParticleFieldConfig::default();
        let a = ParticleField::generate(&cfg, ParticleSeed::Fixed(7));
        let b = ParticleField::generate(&cfg, ParticleSeed::Fixed(7));
        let c = ParticleField::generate(&cfg, ParticleSeed::Fixed(8));
        assert_eq!(a.vertices(), b.vertices());
        assert_ne!(a.vertices(), c.vertices());
        assert_eq!(a.seed(), 7);
    }

    #[test]
    fn layers_are_colored_from_palette_and_sized_in_bounds() {
        let cfg = ParticleFieldConfig {
            count: 103,
            layers: 6,
            ..Default::default()
        };
        let field = ParticleField::generate(&cfg, ParticleSeed::Fixed(1));
        assert_eq!(field.len(), 103);
        let mut start = 0;
        for (layer, &n) in field.layer_counts().iter().enumerate() {
            let expected = cfg.palette[layer % cfg.palette.len()].to_f32();
            for v in &field.vertices()[start..start + n] {
                assert_eq!(v.color, expected);
                assert!(v.size >= cfg.size_min && v.size <= cfg.size_max);
                let r = Vec3::from_array(v.position).length();
                let shell = cfg.base_radius + layer as f32 * cfg.layer_spacing;
                assert!((r - shell).abs() <= cfg.jitter + 1e-3);
            }
            start += n;
        }
    }

    #[test]
    fn empty_palette_falls_back() {
        let cfg = ParticleFieldConfig {
            count: 12,
            palette: Vec::new(),
            ..Default::default()
        };
        let field = ParticleField::generate(&cfg, ParticleSeed::Fixed(3));
        let fallback = VisualClass::Fallback.color().to_f32();
        assert!(field.vertices().iter().all(|v| v.color == fallback));
    }

    #[test]
    fn animation_leaves_vertices_alone() {
        let cfg = ParticleFieldConfig::default();
        let mut field = ParticleField::generate(&cfg, ParticleSeed::Fixed(11));
        let before = field.vertices().to_vec();
        for i in 0..100 {
            field.animate(i as f32 * 0.5);
            assert!((0.0..=1.0).contains(&field.opacity));
            assert!(field.rotation >= 0.0 && field.rotation < TAU);
        }
        assert_eq!(field.vertices(), &before[..]);
    }

    #[test]
    fn opacity_is_clamped() {
        let cfg = ParticleFieldConfig {
            count: 4,
            opacity_base: 0.9,
            opacity_amplitude: 0.5,
            ..Default::default()
        };
        let mut field = ParticleField::generate(&cfg, ParticleSeed::Fixed(2));
        // sin(t * 0.5) = 1 at t = π
        field.animate(std::f32::consts::PI);
        assert_eq!(field.opacity, 1.0);
    }

    #[test]
    fn buffer_bytes_and_release() {
        let cfg = ParticleFieldConfig {
            count: 64,
            ..Default::default()
        };
        let mut field = ParticleField::generate(&cfg, ParticleSeed::Fixed(5));
        assert_eq!(std::mem::size_of::<ParticleVertex>(), 32);
        assert_eq!(field.as_bytes().len(), 64 * 32);
        field.release();
        assert!(field.is_empty());
        assert!(field.as_bytes().is_empty());
    }

    #[test]
    fn huge_finite_parameters_stay_finite() {
        let wide_jitter = ParticleFieldConfig {
            count: 10,
            jitter: f32::MAX,
            ..Default::default()
        };
        let far_shells = ParticleFieldConfig {
            count: 10,
            layers: 3,
            base_radius: f32::MAX,
            layer_spacing: f32::MAX,
            jitter: 0.0,
            size_min: f32::MAX,
            size_max: f32::MAX,
            ..Default::default()
        };
        for cfg in [wide_jitter, far_shells] {
            let field = ParticleField::generate(&cfg, ParticleSeed::Fixed(4));
            assert_eq!(field.len(), 10);
            for v in field.vertices() {
                assert!(Vec3::from_array(v.position).is_finite(), "{:?}", v);
                assert!(v.size.is_finite() && v.size <= MAX_EXTENT);
            }
        }
    }

    #[test]
    fn entropy_seed_still_builds_full_field() {
        let cfg = ParticleFieldConfig {
            count: 20,
            ..Default::default()
        };
        let field = ParticleField::generate(&cfg, ParticleSeed::Entropy);
        assert_eq!(field.len(), 20);
    }
}
