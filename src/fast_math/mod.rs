//! Fast Math: per-frame scalar helpers
//!
//! Everything the animation rules evaluate per node per frame lives here, so
//! the hot loop stays branch-light and allocation-free.
//!
//! ## Division Exorcism
//!   x / 10   →  x * INV_10     (threat level → unit range)
//!   x / 100  →  x * INV_100    (percentages → unit range)
//!   x / 2π   →  x * INV_TAU    (angles → turns)
//!
//! ## FMA (Fused Multiply-Add)
//! `base + s * span` and friends are one instruction and one rounding step.
//!
//! ## Exact endpoints
//! `lerp3` uses the `a·(1−t) + b·t` form so that `t = 0` and `t = 1`
//! reproduce the endpoints bit-for-bit. Flow markers depend on it.

use std::f32::consts::TAU;

use glam::Vec3;

/// 1 / 10: threat level (0–10) to unit range.
pub const INV_10: f32 = 1.0 / 10.0;
/// 1 / 100: percentages (0–100) to unit range.
pub const INV_100: f32 = 1.0 / 100.0;
/// 1 / 2π: radians to turns.
pub const INV_TAU: f32 = 1.0 / TAU;

/// Fused Multiply-Add: a * b + c
#[inline(always)]
pub fn fma(a: f32, b: f32, c: f32) -> f32 {
    a.mul_add(b, c)
}

/// Scalar lerp, `a + t·(b − a)` as one FMA.
#[inline(always)]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    fma(t, b - a, a)
}

/// Vector lerp with exact endpoints: `a·(1−t) + b·t`.
#[inline(always)]
pub fn lerp3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

/// Wrap an angle into `[0, 2π)`.
#[inline(always)]
pub fn wrap_angle(a: f32) -> f32 {
    let w = a.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if w >= TAU {
        0.0
    } else {
        w
    }
}

/// Continuous ping-pong in `[0, 1]`: `(sin(t·speed + phase) + 1) / 2`.
#[inline(always)]
pub fn ping_pong(t: f32, speed: f32, phase: f32) -> f32 {
    (fma(t, speed, phase).sin() + 1.0) * 0.5
}

/// Breathing oscillation `base + sin(t·freq + phase) · amplitude`.
#[inline(always)]
pub fn oscillate(t: f32, freq: f32, phase: f32, base: f32, amplitude: f32) -> f32 {
    fma(fma(t, freq, phase).sin(), amplitude, base)
}

/// Fractional saw in `[0, 1)` (one-way travel).
#[inline(always)]
pub fn saw(t: f32, rate: f32, phase: f32) -> f32 {
    fma(t, rate, phase).rem_euclid(1.0)
}

/// Clamp into `[lo, hi]`; NaN resolves to `fallback`.
///
/// Returns the value and whether the input was outside the domain.
#[inline]
pub fn clamp_domain(v: f32, lo: f32, hi: f32, fallback: f32) -> (f32, bool) {
    if v.is_nan() {
        return (fallback, true);
    }
    let c = v.clamp(lo, hi);
    (c, c != v)
}

/// Quadratic Bézier through a control point: start, elevated mid, end.
#[inline]
pub fn quadratic_bezier(a: Vec3, ctrl: Vec3, b: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    a * (u * u) + ctrl * (2.0 * u * t) + b * (t * t)
}

/// Euler (XYZ) rotation applied to a point, followed by scale and translation.
#[inline]
pub fn transform_point(p: Vec3, scale: Vec3, rotation: Vec3, translation: Vec3) -> Vec3 {
    let p = p * scale;
    let (sx, cx) = rotation.x.sin_cos();
    let (sy, cy) = rotation.y.sin_cos();
    let (sz, cz) = rotation.z.sin_cos();
    // X
    let p = Vec3::new(p.x, p.y * cx - p.z * sx, p.y * sx + p.z * cx);
    // Y
    let p = Vec3::new(p.x * cy + p.z * sy, p.y, -p.x * sy + p.z * cy);
    // Z
    let p = Vec3::new(p.x * cz - p.y * sz, p.x * sz + p.y * cz, p.z);
    p + translation
}

/// Point on a horizontal circle of radius `r` at angle `a`.
#[inline(always)]
pub fn circle_point(r: f32, a: f32, y: f32) -> Vec3 {
    let (s, c) = a.sin_cos();
    Vec3::new(r * c, y, r * s)
}

/// Distance along a unit ray to its first hit on a sphere.
pub fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = center - origin;
    let tca = oc.dot(dir);
    let d2 = oc.length_squared() - tca * tca;
    let r2 = radius * radius;
    // written so NaN falls through to None
    if !(d2 <= r2) {
        return None;
    }
    let thc = (r2 - d2).sqrt();
    let t0 = tca - thc;
    let t = if t0 >= 0.0 { t0 } else { tca + thc };
    (t >= 0.0).then_some(t)
}

/// Closest approach between a unit ray and segment `a..b`.
///
/// Returns `(distance along the ray, gap between ray and segment)`.
pub fn ray_segment(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3) -> (f32, f32) {
    let e = b - a;
    let w = origin - a;
    let be = dir.dot(e);
    let ee = e.length_squared();
    let dw = dir.dot(w);
    let ew = e.dot(w);
    let denom = ee - be * be;
    let u = if ee <= f32::EPSILON {
        0.0
    } else if denom.abs() <= f32::EPSILON * ee {
        // parallel: project the ray origin
        (ew / ee).clamp(0.0, 1.0)
    } else {
        ((ew - dw * be) / denom).clamp(0.0, 1.0)
    };
    let s = fma(u, be, -dw).max(0.0);
    let gap = (origin + dir * s).distance(a + e * u);
    (s, gap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fma() {
        assert!((fma(2.0, 3.0, 4.0) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_lerp3_exact_endpoints() {
        let a = Vec3::new(-3.7, 0.11, 9.3);
        let b = Vec3::new(12.25, -4.5, 0.3);
        assert_eq!(lerp3(a, b, 0.0), a);
        assert_eq!(lerp3(a, b, 1.0), b);
    }

    #[test]
    fn test_wrap_angle_range() {
        for &a in &[-100.0f32, -TAU, -1e-8, 0.0, 3.0, TAU, 1000.0] {
            let w = wrap_angle(a);
            assert!((0.0..TAU).contains(&w), "wrap_angle({}) = {}", a, w);
        }
        assert!((wrap_angle(TAU + 1.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ping_pong_bounds() {
        for i in 0..1000 {
            let p = ping_pong(i as f32 * 0.037, 1.3, 0.4);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_saw_range() {
        assert!((saw(1.25, 1.0, 0.0) - 0.25).abs() < 1e-6);
        assert!(saw(-0.25, 1.0, 0.0) >= 0.0);
    }

    #[test]
    fn test_clamp_domain() {
        assert_eq!(clamp_domain(5.0, 0.0, 10.0, 0.0), (5.0, false));
        assert_eq!(clamp_domain(-1.0, 0.0, 10.0, 0.0), (0.0, true));
        assert_eq!(clamp_domain(11.0, 0.0, 10.0, 0.0), (10.0, true));
        assert_eq!(clamp_domain(f32::NAN, 0.0, 10.0, 3.0), (3.0, true));
    }

    #[test]
    fn test_bezier_endpoints_and_apex() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(4.0, 0.0, 0.0);
        let c = Vec3::new(2.0, 2.0, 0.0);
        assert!((quadratic_bezier(a, c, b, 0.0) - a).length() < 1e-6);
        assert!((quadratic_bezier(a, c, b, 1.0) - b).length() < 1e-6);
        // apex of a symmetric quadratic is half the control height
        assert!((quadratic_bezier(a, c, b, 0.5).y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_transform_point_identity_and_yaw() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!((transform_point(p, Vec3::ONE, Vec3::ZERO, Vec3::ZERO) - p).length() < 1e-6);
        let yawed = transform_point(
            Vec3::X,
            Vec3::ONE,
            Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::ZERO,
        );
        assert!((yawed - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_ray_sphere() {
        let t = ray_sphere(Vec3::new(0.0, 0.0, -10.0), Vec3::Z, Vec3::ZERO, 2.0).unwrap();
        assert!((t - 8.0).abs() < 1e-5);
        assert!(ray_sphere(Vec3::new(0.0, 5.0, -10.0), Vec3::Z, Vec3::ZERO, 2.0).is_none());
        // sphere behind the origin
        assert!(ray_sphere(Vec3::new(0.0, 0.0, 10.0), Vec3::Z, Vec3::ZERO, 2.0).is_none());
        // origin inside the sphere
        let inside = ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::ZERO, 2.0).unwrap();
        assert!((inside - 2.0).abs() < 1e-5);
        assert!(ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::splat(f32::NAN), 2.0).is_none());
    }

    #[test]
    fn test_ray_segment() {
        // ray down the y axis, segment crossing it at y = 3
        let (s, gap) = ray_segment(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::NEG_Y,
            Vec3::new(-1.0, 3.0, 0.5),
            Vec3::new(1.0, 3.0, 0.5),
        );
        assert!((s - 7.0).abs() < 1e-5);
        assert!((gap - 0.5).abs() < 1e-5);

        // closest point clamps to the segment end
        let (_, gap) = ray_segment(Vec3::ZERO, Vec3::Z, Vec3::new(2.0, 0.0, 5.0), Vec3::new(4.0, 0.0, 5.0));
        assert!((gap - 2.0).abs() < 1e-5);

        // parallel
        let (_, gap) = ray_segment(Vec3::ZERO, Vec3::Z, Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 3.0));
        assert!((gap - 1.0).abs() < 1e-5);
    }
}
