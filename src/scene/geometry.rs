//! Procedural geometry builders.
//!
//! Parameterized shapes (ring, lattice sphere, tower, plane, octahedron,
//! cube) are emitted as wireframe meshes: a vertex list plus an edge list.
//! Builders are deterministic and never emit non-finite vertices:
//!
//! - extents (radius, size, height) ≤ 0 or non-finite clamp to [`MIN_EXTENT`],
//!   finite extents above [`MAX_EXTENT`] clamp down to it
//! - segment counts clamp into [`MIN_SEGMENTS`]..=[`MAX_SEGMENTS`]
//!
//! [`ShapeParams::validate`] is the strict variant for callers that would
//! rather reject than clamp. [`GeometryCache`] memoizes descriptors by the
//! (sanitized) parameter tuple so every node sharing a shape shares one
//! buffer.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use glam::Vec3;

use crate::error::GeometryError;
use crate::fast_math::circle_point;

pub const MIN_EXTENT: f32 = 0.01;
/// Largest accepted extent. Derived coordinates (`radius + tube`,
/// `height * 1.25`, squared lengths) stay well inside `f32` range.
pub const MAX_EXTENT: f32 = 1.0e6;
pub const MIN_SEGMENTS: u32 = 3;
pub const MAX_SEGMENTS: u32 = 256;

/// Wireframe mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub edges: Vec<[u32; 2]>,
}

impl Mesh {
    fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            edges: Vec::with_capacity(edges),
        }
    }

    fn push(&mut self, v: Vec3) -> u32 {
        self.vertices.push(v);
        (self.vertices.len() - 1) as u32
    }

    fn edge(&mut self, a: u32, b: u32) {
        self.edges.push([a, b]);
    }

    /// Closed loop through `count` consecutive vertices starting at `first`.
    fn close_loop(&mut self, first: u32, count: u32) {
        for i in 0..count {
            self.edge(first + i, first + (i + 1) % count);
        }
    }

    fn bounding_radius(&self) -> f32 {
        self.vertices.iter().map(|v| v.length()).fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Ring,
    LatticeSphere,
    Tower,
    Plane,
    Octahedron,
    Cube,
    Polyline,
}

/// Parameters of a procedural shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeParams {
    /// Flat annulus in the XZ plane
    Ring { radius: f32, tube: f32, segments: u32 },
    /// Latitude/longitude lattice
    LatticeSphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Tapered lattice mast with an antenna, base at y = 0
    Tower {
        height: f32,
        base_radius: f32,
        segments: u32,
        tiers: u32,
    },
    /// Grid in the XZ plane
    Plane { width: f32, depth: f32, divisions: u32 },
    Octahedron { radius: f32 },
    Cube { size: f32 },
}

/// Cache key: shape tag plus the bit patterns of the sanitized parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    kind: ShapeKind,
    bits: [u32; 4],
}

/// Shape consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    pub mesh: Mesh,
    /// Radius of a sphere around the local origin enclosing every vertex
    pub bounding_radius: f32,
}

// ── Sanitizing ──

fn sane_extent(param: &'static str, v: f32) -> f32 {
    if !(v.is_finite() && v > 0.0) {
        log::debug!("geometry: {} = {} clamped to {}", param, v, MIN_EXTENT);
        MIN_EXTENT
    } else if v > MAX_EXTENT {
        log::debug!("geometry: {} = {} clamped to {}", param, v, MAX_EXTENT);
        MAX_EXTENT
    } else {
        v
    }
}

fn sane_segments(param: &'static str, v: u32, min: u32) -> u32 {
    let c = v.clamp(min, MAX_SEGMENTS);
    if c != v {
        log::debug!("geometry: {} = {} clamped to {}", param, v, c);
    }
    c
}

fn check_extent(param: &'static str, value: f32) -> Result<(), GeometryError> {
    if !(value.is_finite() && value > 0.0) {
        Err(GeometryError::NonPositiveExtent { param, value })
    } else if value > MAX_EXTENT {
        Err(GeometryError::ExtentTooLarge {
            param,
            value,
            max: MAX_EXTENT,
        })
    } else {
        Ok(())
    }
}

fn check_segments(param: &'static str, value: u32, min: u32) -> Result<(), GeometryError> {
    if value >= min {
        Ok(())
    } else {
        Err(GeometryError::TooFewSegments { param, value, min })
    }
}

impl ShapeParams {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Ring { .. } => ShapeKind::Ring,
            Self::LatticeSphere { .. } => ShapeKind::LatticeSphere,
            Self::Tower { .. } => ShapeKind::Tower,
            Self::Plane { .. } => ShapeKind::Plane,
            Self::Octahedron { .. } => ShapeKind::Octahedron,
            Self::Cube { .. } => ShapeKind::Cube,
        }
    }

    /// Reject degenerate parameters instead of clamping them.
    pub fn validate(&self) -> Result<(), GeometryError> {
        match *self {
            Self::Ring {
                radius,
                tube,
                segments,
            } => {
                check_extent("ring radius", radius)?;
                check_extent("ring tube", tube)?;
                check_segments("ring segments", segments, MIN_SEGMENTS)
            }
            Self::LatticeSphere {
                radius,
                width_segments,
                height_segments,
            } => {
                check_extent("sphere radius", radius)?;
                check_segments("sphere width segments", width_segments, MIN_SEGMENTS)?;
                check_segments("sphere height segments", height_segments, MIN_SEGMENTS)
            }
            Self::Tower {
                height,
                base_radius,
                segments,
                tiers,
            } => {
                check_extent("tower height", height)?;
                check_extent("tower base radius", base_radius)?;
                check_segments("tower segments", segments, MIN_SEGMENTS)?;
                check_segments("tower tiers", tiers, 1)
            }
            Self::Plane {
                width,
                depth,
                divisions,
            } => {
                check_extent("plane width", width)?;
                check_extent("plane depth", depth)?;
                check_segments("plane divisions", divisions, 1)
            }
            Self::Octahedron { radius } => check_extent("octahedron radius", radius),
            Self::Cube { size } => check_extent("cube size", size),
        }
    }

    /// Clamp every parameter into its safe range.
    pub fn sanitized(&self) -> Self {
        match *self {
            Self::Ring {
                radius,
                tube,
                segments,
            } => {
                let radius = sane_extent("ring radius", radius);
                // the inner edge must stay outside the center
                let tube = sane_extent("ring tube", tube).min(radius * 0.9).max(MIN_EXTENT * 0.5);
                Self::Ring {
                    radius,
                    tube,
                    segments: sane_segments("ring segments", segments, MIN_SEGMENTS),
                }
            }
            Self::LatticeSphere {
                radius,
                width_segments,
                height_segments,
            } => Self::LatticeSphere {
                radius: sane_extent("sphere radius", radius),
                width_segments: sane_segments("sphere width segments", width_segments, MIN_SEGMENTS),
                height_segments: sane_segments(
                    "sphere height segments",
                    height_segments,
                    MIN_SEGMENTS,
                ),
            },
            Self::Tower {
                height,
                base_radius,
                segments,
                tiers,
            } => Self::Tower {
                height: sane_extent("tower height", height),
                base_radius: sane_extent("tower base radius", base_radius),
                segments: sane_segments("tower segments", segments, MIN_SEGMENTS),
                tiers: sane_segments("tower tiers", tiers, 1),
            },
            Self::Plane {
                width,
                depth,
                divisions,
            } => Self::Plane {
                width: sane_extent("plane width", width),
                depth: sane_extent("plane depth", depth),
                divisions: sane_segments("plane divisions", divisions, 1),
            },
            Self::Octahedron { radius } => Self::Octahedron {
                radius: sane_extent("octahedron radius", radius),
            },
            Self::Cube { size } => Self::Cube {
                size: sane_extent("cube size", size),
            },
        }
    }

    /// Key of the sanitized parameters.
    pub fn key(&self) -> GeometryKey {
        let bits = match self.sanitized() {
            Self::Ring {
                radius,
                tube,
                segments,
            } => [radius.to_bits(), tube.to_bits(), segments, 0],
            Self::LatticeSphere {
                radius,
                width_segments,
                height_segments,
            } => [radius.to_bits(), width_segments, height_segments, 0],
            Self::Tower {
                height,
                base_radius,
                segments,
                tiers,
            } => [height.to_bits(), base_radius.to_bits(), segments, tiers],
            Self::Plane {
                width,
                depth,
                divisions,
            } => [width.to_bits(), depth.to_bits(), divisions, 0],
            Self::Octahedron { radius } => [radius.to_bits(), 0, 0, 0],
            Self::Cube { size } => [size.to_bits(), 0, 0, 0],
        };
        GeometryKey {
            kind: self.kind(),
            bits,
        }
    }
}

// ── Builders ──

/// Build the shape for `params`, clamping degenerate values.
pub fn build(params: &ShapeParams) -> ShapeDescriptor {
    let mesh = match params.sanitized() {
        ShapeParams::Ring {
            radius,
            tube,
            segments,
        } => ring(radius, tube, segments),
        ShapeParams::LatticeSphere {
            radius,
            width_segments,
            height_segments,
        } => lattice_sphere(radius, width_segments, height_segments),
        ShapeParams::Tower {
            height,
            base_radius,
            segments,
            tiers,
        } => tower(height, base_radius, segments, tiers),
        ShapeParams::Plane {
            width,
            depth,
            divisions,
        } => plane(width, depth, divisions),
        ShapeParams::Octahedron { radius } => octahedron(radius),
        ShapeParams::Cube { size } => cube(size),
    };
    let bounding_radius = mesh.bounding_radius();
    ShapeDescriptor {
        kind: params.kind(),
        mesh,
        bounding_radius,
    }
}

/// Open or closed polyline through `points` (continent outlines, arcs,
/// flow lines). Non-finite points and points beyond [`MAX_EXTENT`] on any
/// axis are dropped.
pub fn polyline(points: &[Vec3], closed: bool) -> ShapeDescriptor {
    let mut mesh = Mesh::with_capacity(points.len(), points.len());
    for p in points
        .iter()
        .filter(|p| p.is_finite() && p.abs().max_element() <= MAX_EXTENT)
    {
        mesh.push(*p);
    }
    let n = mesh.vertices.len() as u32;
    if n >= 2 {
        for i in 0..n - 1 {
            mesh.edge(i, i + 1);
        }
        if closed && n >= 3 {
            mesh.edge(n - 1, 0);
        }
    }
    let bounding_radius = mesh.bounding_radius();
    ShapeDescriptor {
        kind: ShapeKind::Polyline,
        mesh,
        bounding_radius,
    }
}

fn ring(radius: f32, tube: f32, segments: u32) -> Mesh {
    let n = segments as usize;
    let mut mesh = Mesh::with_capacity(2 * n, 3 * n);
    let step = TAU / segments as f32;
    for r in [radius + tube, radius - tube] {
        for i in 0..segments {
            mesh.push(circle_point(r, i as f32 * step, 0.0));
        }
    }
    mesh.close_loop(0, segments);
    mesh.close_loop(segments, segments);
    for i in 0..segments {
        mesh.edge(i, segments + i);
    }
    mesh
}

fn lattice_sphere(radius: f32, width: u32, height: u32) -> Mesh {
    let rings = height - 1;
    let mut mesh = Mesh::with_capacity(
        (rings * width + 2) as usize,
        (rings * width * 2 + width) as usize,
    );
    let top = mesh.push(Vec3::new(0.0, radius, 0.0));
    let first = top + 1;
    for i in 1..height {
        let phi = PI * i as f32 / height as f32;
        let (s, c) = phi.sin_cos();
        for j in 0..width {
            let theta = TAU * j as f32 / width as f32;
            mesh.push(circle_point(radius * s, theta, radius * c));
        }
    }
    let bottom = mesh.push(Vec3::new(0.0, -radius, 0.0));

    for r in 0..rings {
        mesh.close_loop(first + r * width, width);
    }
    // meridians: pole → rings → pole
    for j in 0..width {
        mesh.edge(top, first + j);
        for r in 0..rings - 1 {
            mesh.edge(first + r * width + j, first + (r + 1) * width + j);
        }
        mesh.edge(first + (rings - 1) * width + j, bottom);
    }
    mesh
}

fn tower(height: f32, base_radius: f32, segments: u32, tiers: u32) -> Mesh {
    let levels = tiers + 1;
    let mut mesh = Mesh::with_capacity(
        (levels * segments + 2) as usize,
        (levels * segments * 2 + 1) as usize,
    );
    let step = TAU / segments as f32;
    for k in 0..levels {
        let f = k as f32 / tiers as f32;
        let r = base_radius * (1.0 - 0.5 * f);
        for i in 0..segments {
            mesh.push(circle_point(r, i as f32 * step, height * f));
        }
    }
    for k in 0..levels {
        mesh.close_loop(k * segments, segments);
    }
    for k in 0..tiers {
        for i in 0..segments {
            mesh.edge(k * segments + i, (k + 1) * segments + i);
        }
    }
    let mast = mesh.push(Vec3::new(0.0, height, 0.0));
    let tip = mesh.push(Vec3::new(0.0, height * 1.25, 0.0));
    mesh.edge(mast, tip);
    mesh
}

fn plane(width: f32, depth: f32, divisions: u32) -> Mesh {
    let lines = divisions + 1;
    let mut mesh = Mesh::with_capacity((lines * 4) as usize, (lines * 2) as usize);
    let (hw, hd) = (width * 0.5, depth * 0.5);
    for i in 0..lines {
        let f = i as f32 / divisions as f32;
        let x = -hw + width * f;
        let z = -hd + depth * f;
        let a = mesh.push(Vec3::new(x, 0.0, -hd));
        let b = mesh.push(Vec3::new(x, 0.0, hd));
        mesh.edge(a, b);
        let c = mesh.push(Vec3::new(-hw, 0.0, z));
        let d = mesh.push(Vec3::new(hw, 0.0, z));
        mesh.edge(c, d);
    }
    mesh
}

fn octahedron(r: f32) -> Mesh {
    let mut mesh = Mesh::with_capacity(6, 12);
    for v in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
        mesh.push(v * r);
    }
    // equator
    for [a, b] in [[0, 4], [4, 1], [1, 5], [5, 0]] {
        mesh.edge(a, b);
    }
    // poles
    for eq in [0, 1, 4, 5] {
        mesh.edge(2, eq);
        mesh.edge(3, eq);
    }
    mesh
}

fn cube(size: f32) -> Mesh {
    let h = size * 0.5;
    let mut mesh = Mesh::with_capacity(8, 12);
    for i in 0..8u32 {
        let sx = if i & 1 == 0 { -h } else { h };
        let sy = if i & 2 == 0 { -h } else { h };
        let sz = if i & 4 == 0 { -h } else { h };
        mesh.push(Vec3::new(sx, sy, sz));
    }
    // vertices differing in exactly one bit share an edge
    for a in 0..8u32 {
        for bit in [1u32, 2, 4] {
            let b = a | bit;
            if b != a {
                mesh.edge(a, b);
            }
        }
    }
    mesh
}

// ── Cache ──

/// Builder cache keyed by the sanitized parameter tuple.
#[derive(Debug, Default)]
pub struct GeometryCache {
    entries: HashMap<GeometryKey, Arc<ShapeDescriptor>>,
    hits: u64,
    misses: u64,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared descriptor for `params`, building it on first request.
    pub fn get(&mut self, params: &ShapeParams) -> Arc<ShapeDescriptor> {
        let key = params.key();
        if let Some(shape) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(shape);
        }
        self.misses += 1;
        log::debug!("geometry cache MISS: {:?}", params);
        let shape = Arc::new(build(params));
        self.entries.insert(key, Arc::clone(&shape));
        shape
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Drop every cached descriptor (nodes keep theirs alive until dropped).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.entries.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_finite(shape: &ShapeDescriptor) -> bool {
        shape.mesh.vertices.iter().all(|v| v.is_finite()) && shape.bounding_radius.is_finite()
    }

    fn edges_in_bounds(shape: &ShapeDescriptor) -> bool {
        let n = shape.mesh.vertices.len() as u32;
        shape.mesh.edges.iter().all(|[a, b]| *a < n && *b < n && a != b)
    }

    #[test]
    fn ring_has_two_loops_and_spokes() {
        let shape = build(&ShapeParams::Ring {
            radius: 5.0,
            tube: 0.2,
            segments: 16,
        });
        assert_eq!(shape.kind, ShapeKind::Ring);
        assert_eq!(shape.mesh.vertices.len(), 32);
        assert_eq!(shape.mesh.edges.len(), 48);
        assert!((shape.bounding_radius - 5.2).abs() < 1e-4);
        assert!(edges_in_bounds(&shape));
    }

    #[test]
    fn lattice_sphere_vertices_on_surface() {
        let shape = build(&ShapeParams::LatticeSphere {
            radius: 2.0,
            width_segments: 12,
            height_segments: 8,
        });
        assert_eq!(shape.mesh.vertices.len(), 7 * 12 + 2);
        for v in &shape.mesh.vertices {
            assert!((v.length() - 2.0).abs() < 1e-4);
        }
        assert!(edges_in_bounds(&shape));
    }

    #[test]
    fn tower_tapers_and_has_antenna() {
        let shape = build(&ShapeParams::Tower {
            height: 4.0,
            base_radius: 1.0,
            segments: 4,
            tiers: 3,
        });
        let top = shape.mesh.vertices.iter().map(|v| v.y).fold(f32::MIN, f32::max);
        assert!((top - 5.0).abs() < 1e-5);
        assert!(edges_in_bounds(&shape));
    }

    #[test]
    fn plane_grid_line_count() {
        let shape = build(&ShapeParams::Plane {
            width: 10.0,
            depth: 10.0,
            divisions: 4,
        });
        assert_eq!(shape.mesh.edges.len(), 10);
    }

    #[test]
    fn octahedron_and_cube_topology() {
        let octa = build(&ShapeParams::Octahedron { radius: 1.0 });
        assert_eq!((octa.mesh.vertices.len(), octa.mesh.edges.len()), (6, 12));
        let cube = build(&ShapeParams::Cube { size: 2.0 });
        assert_eq!((cube.mesh.vertices.len(), cube.mesh.edges.len()), (8, 12));
        assert!((cube.bounding_radius - 3f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn degenerate_params_are_clamped_not_nan() {
        let cases = [
            ShapeParams::Ring {
                radius: -1.0,
                tube: f32::NAN,
                segments: 0,
            },
            ShapeParams::LatticeSphere {
                radius: 0.0,
                width_segments: 1,
                height_segments: 0,
            },
            ShapeParams::Tower {
                height: f32::INFINITY,
                base_radius: -3.0,
                segments: 2,
                tiers: 0,
            },
            ShapeParams::Plane {
                width: 0.0,
                depth: -1.0,
                divisions: 0,
            },
            ShapeParams::Octahedron { radius: f32::NAN },
            ShapeParams::Cube { size: -0.0 },
            ShapeParams::Tower {
                height: f32::MAX,
                base_radius: f32::MAX,
                segments: 6,
                tiers: 3,
            },
            ShapeParams::Ring {
                radius: f32::MAX,
                tube: f32::MAX,
                segments: 8,
            },
            ShapeParams::LatticeSphere {
                radius: f32::MAX,
                width_segments: 8,
                height_segments: 6,
            },
            ShapeParams::Plane {
                width: f32::MAX,
                depth: f32::MAX,
                divisions: 4,
            },
        ];
        for params in cases {
            let shape = build(&params);
            assert!(all_finite(&shape), "{:?}", params);
            assert!(edges_in_bounds(&shape), "{:?}", params);
            assert!(!shape.mesh.vertices.is_empty());
        }
    }

    #[test]
    fn segment_counts_are_capped() {
        let shape = build(&ShapeParams::Ring {
            radius: 1.0,
            tube: 0.1,
            segments: u32::MAX,
        });
        assert_eq!(shape.mesh.vertices.len(), 2 * MAX_SEGMENTS as usize);
    }

    #[test]
    fn validate_rejects_degenerate() {
        let bad = ShapeParams::Ring {
            radius: 0.0,
            tube: 0.1,
            segments: 8,
        };
        assert!(matches!(
            bad.validate(),
            Err(GeometryError::NonPositiveExtent { .. })
        ));
        let few = ShapeParams::LatticeSphere {
            radius: 1.0,
            width_segments: 2,
            height_segments: 8,
        };
        assert!(matches!(
            few.validate(),
            Err(GeometryError::TooFewSegments { min: 3, .. })
        ));
        assert!(ShapeParams::Cube { size: 1.0 }.validate().is_ok());

        let huge = ShapeParams::Tower {
            height: f32::MAX,
            base_radius: 1.0,
            segments: 6,
            tiers: 3,
        };
        assert!(matches!(
            huge.validate(),
            Err(GeometryError::ExtentTooLarge { param: "tower height", .. })
        ));
        assert!(ShapeParams::Cube { size: MAX_EXTENT }.validate().is_ok());
    }

    #[test]
    fn builders_are_deterministic() {
        let params = ShapeParams::LatticeSphere {
            radius: 1.5,
            width_segments: 9,
            height_segments: 6,
        };
        assert_eq!(build(&params), build(&params));
    }

    #[test]
    fn cache_shares_descriptors() {
        let mut cache = GeometryCache::new();
        let params = ShapeParams::Octahedron { radius: 0.5 };
        let a = cache.get(&params);
        let b = cache.get(&params);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats(), (1, 1));

        // clamped-equal params share an entry too
        let c = cache.get(&ShapeParams::Cube { size: -1.0 });
        let d = cache.get(&ShapeParams::Cube { size: 0.0 });
        assert!(Arc::ptr_eq(&c, &d));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn polyline_skips_non_finite_points() {
        let pts = [
            Vec3::ZERO,
            Vec3::new(f32::NAN, 0.0, 0.0),
            Vec3::X,
            Vec3::new(0.0, f32::MAX, 0.0),
            Vec3::Z,
        ];
        let shape = polyline(&pts, true);
        assert_eq!(shape.mesh.vertices.len(), 3);
        assert_eq!(shape.mesh.edges.len(), 3);
        assert!(shape.bounding_radius.is_finite());
    }
}
