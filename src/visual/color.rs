//! Palette colors.
//!
//! Colors are stored as 8-bit RGBA and built from `0xRRGGBB` literals at
//! compile time, so palette tables are plain `const` data with no parsing
//! on the frame path.

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };
    pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };

    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn from_hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
            a: 255,
        }
    }

    /// Same color with a new alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Same color with alpha taken from a unit opacity (clamped; NaN → 0).
    #[inline]
    pub fn with_opacity(self, opacity: f32) -> Self {
        let o = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        self.with_alpha((o * 255.0).round() as u8)
    }

    /// Scale RGB by `k` (clamped to the channel range), alpha unchanged.
    #[inline]
    pub fn scaled(self, k: f32) -> Self {
        let k = if k.is_finite() { k.max(0.0) } else { 0.0 };
        let ch = |c: u8| (c as f32 * k).round().min(255.0) as u8;
        Self {
            r: ch(self.r),
            g: ch(self.g),
            b: ch(self.b),
            a: self.a,
        }
    }

    /// Per-channel blend toward `other` by `t` in `[0, 1]`.
    #[inline]
    pub fn mix(self, other: Self, t: f32) -> Self {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let ch = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: ch(self.r, other.r),
            g: ch(self.g, other.g),
            b: ch(self.b, other.b),
            a: ch(self.a, other.a),
        }
    }

    /// Convert to normalized f32 (for rendering)
    #[inline(always)]
    pub fn to_f32(self) -> [f32; 4] {
        const INV_255: f32 = 1.0 / 255.0;
        [
            self.r as f32 * INV_255,
            self.g as f32 * INV_255,
            self.b as f32 * INV_255,
            self.a as f32 * INV_255,
        ]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgba::from_hex(0xFF8800), Rgba { r: 255, g: 136, b: 0, a: 255 });
        assert_eq!(Rgba::from_hex(0x000000), Rgba::BLACK);
    }

    #[test]
    fn test_with_opacity_clamps() {
        assert_eq!(Rgba::WHITE.with_opacity(0.5).a, 128);
        assert_eq!(Rgba::WHITE.with_opacity(2.0).a, 255);
        assert_eq!(Rgba::WHITE.with_opacity(f32::NAN).a, 0);
    }

    #[test]
    fn test_scaled_saturates() {
        let c = Rgba::from_hex(0x808080).scaled(4.0);
        assert_eq!((c.r, c.g, c.b), (255, 255, 255));
        assert_eq!(Rgba::WHITE.scaled(f32::INFINITY), Rgba::BLACK);
    }

    #[test]
    fn test_mix_endpoints() {
        let a = Rgba::from_hex(0x102030);
        let b = Rgba::from_hex(0xF0E0D0);
        assert_eq!(a.mix(b, 0.0), a);
        assert_eq!(a.mix(b, 1.0), b);
    }

    #[test]
    fn test_rgba_to_f32() {
        let f = Rgba::from_hex(0xFF8000).to_f32();
        assert!((f[0] - 1.0).abs() < 0.01);
        assert!((f[1] - 0.502).abs() < 0.01);
        assert!(f[2].abs() < 0.01);
    }
}
