//! Value → visual mapping.
//!
//! Every function here is total: any number (including NaN and values
//! outside the documented domain) and any enum variant (including the
//! `Unknown` catch-alls produced by unrecognised host labels) resolves to a
//! defined [`VisualClass`]. Nothing here allocates or logs on the frame
//! path; label parsing happens once at the host boundary.
//!
//! | input                | domain  | out-of-domain            |
//! |----------------------|---------|--------------------------|
//! | threat level         | 0–10    | clamp; NaN → `Calm`      |
//! | severity (markers)   | 0–10    | clamp; NaN → `Calm`      |
//! | throughput / health  | 0–100   | clamp; NaN → `Fallback`  |
//! | enums                | closed  | `Unknown` → `Fallback`   |

use crate::visual::color::Rgba;

// ── Visual classes ──

/// Discrete palette token produced by the mapping functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualClass {
    Critical,
    High,
    Elevated,
    Calm,
    Healthy,
    Standby,
    Offline,
    Quantum,
    Hardened,
    Standard,
    Legacy,
    /// Default palette entry for anything unrecognised.
    Fallback,
}

/// Color + glow resolved from a [`VisualClass`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swatch {
    pub color: Rgba,
    pub emissive_intensity: f32,
}

impl VisualClass {
    pub const ALL: [VisualClass; 12] = [
        Self::Critical,
        Self::High,
        Self::Elevated,
        Self::Calm,
        Self::Healthy,
        Self::Standby,
        Self::Offline,
        Self::Quantum,
        Self::Hardened,
        Self::Standard,
        Self::Legacy,
        Self::Fallback,
    ];

    /// Palette lookup.
    pub const fn swatch(self) -> Swatch {
        let (hex, emissive) = match self {
            Self::Critical => (0xFF0040, 1.0),
            Self::High => (0xFF6600, 0.8),
            Self::Elevated => (0xFFAA00, 0.6),
            Self::Calm => (0x00FFFF, 0.4),
            Self::Healthy => (0x00FF88, 0.5),
            Self::Standby => (0x6677FF, 0.3),
            Self::Offline => (0x445566, 0.05),
            Self::Quantum => (0xAA00FF, 0.7),
            Self::Hardened => (0x0088FF, 0.55),
            Self::Standard => (0x44DDAA, 0.4),
            Self::Legacy => (0x999966, 0.2),
            Self::Fallback => (0x8899AA, 0.2),
        };
        Swatch {
            color: Rgba::from_hex(hex),
            emissive_intensity: emissive,
        }
    }

    #[inline]
    pub const fn color(self) -> Rgba {
        self.swatch().color
    }

    /// Ordering along the calm → critical axis, for the heat-banded classes.
    pub const fn heat(self) -> Option<u8> {
        match self {
            Self::Calm | Self::Healthy => Some(0),
            Self::Elevated => Some(1),
            Self::High => Some(2),
            Self::Critical => Some(3),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Elevated => "elevated",
            Self::Calm => "calm",
            Self::Healthy => "healthy",
            Self::Standby => "standby",
            Self::Offline => "offline",
            Self::Quantum => "quantum",
            Self::Hardened => "hardened",
            Self::Standard => "standard",
            Self::Legacy => "legacy",
            Self::Fallback => "fallback",
        }
    }
}

// ── Enumerated telemetry ──

fn warn_unknown(kind: &str, label: &str) {
    log::warn!("unknown {} label `{}`, using fallback palette entry", kind, label);
}

/// Operational status of towers, data nodes, data paths and data centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityStatus {
    Active,
    Warning,
    Critical,
    Offline,
    Maintenance,
    #[default]
    Unknown,
}

impl EntityStatus {
    /// Parse a host label. Unrecognised labels become `Unknown` (and warn).
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "active" | "online" | "operational" | "secure" => Self::Active,
            "warning" | "degraded" | "elevated" => Self::Warning,
            "critical" | "compromised" | "breach" => Self::Critical,
            "offline" | "down" | "inactive" => Self::Offline,
            "maintenance" | "standby" => Self::Maintenance,
            _ => {
                warn_unknown("status", label);
                Self::Unknown
            }
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Technology tier of a data node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TechTier {
    Quantum,
    Advanced,
    Standard,
    Legacy,
    #[default]
    Unknown,
}

impl TechTier {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "quantum" => Self::Quantum,
            "advanced" | "ai" | "neural" => Self::Advanced,
            "standard" | "classic" => Self::Standard,
            "legacy" => Self::Legacy,
            _ => {
                warn_unknown("tech tier", label);
                Self::Unknown
            }
        }
    }
}

/// Encryption class of a data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncryptionClass {
    QuantumResistant,
    Aes256,
    Rsa4096,
    Tls13,
    #[default]
    Unknown,
}

impl EncryptionClass {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "quantum" | "quantum-resistant" | "pqc" => Self::QuantumResistant,
            "aes-256" | "aes256" => Self::Aes256,
            "rsa-4096" | "rsa4096" => Self::Rsa4096,
            "tls-1.3" | "tls1.3" | "tls13" => Self::Tls13,
            _ => {
                warn_unknown("encryption", label);
                Self::Unknown
            }
        }
    }
}

/// Bandwidth class of a world-map connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BandwidthClass {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl BandwidthClass {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" | "10gbps" | "100gbps" => Self::High,
            "medium" | "1gbps" => Self::Medium,
            "low" | "100mbps" => Self::Low,
            _ => {
                warn_unknown("bandwidth", label);
                Self::Unknown
            }
        }
    }
}

/// Severity label of a world-map threat source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Severity {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" | "moderate" => Self::Medium,
            "low" | "info" => Self::Low,
            _ => {
                warn_unknown("severity", label);
                Self::Unknown
            }
        }
    }
}

// ── Mapping functions ──

/// Threat level (0–10) → heat class. `>7` critical, `>4` high, `>2`
/// elevated, else calm. Monotonic; NaN maps to `Calm`.
pub fn threat_class(level: f32) -> VisualClass {
    if level.is_nan() {
        return VisualClass::Calm;
    }
    let level = level.clamp(0.0, 10.0);
    if level > 7.0 {
        VisualClass::Critical
    } else if level > 4.0 {
        VisualClass::High
    } else if level > 2.0 {
        VisualClass::Elevated
    } else {
        VisualClass::Calm
    }
}

/// System health (0–100) → heat class; lower health is hotter.
pub fn health_class(pct: f32) -> VisualClass {
    if pct.is_nan() {
        return VisualClass::Fallback;
    }
    let pct = pct.clamp(0.0, 100.0);
    if pct > 80.0 {
        VisualClass::Healthy
    } else if pct > 50.0 {
        VisualClass::Elevated
    } else if pct > 25.0 {
        VisualClass::High
    } else {
        VisualClass::Critical
    }
}

/// Throughput utilisation (0–100 %) → heat class; saturation is hot.
pub fn throughput_class(pct: f32) -> VisualClass {
    if pct.is_nan() {
        return VisualClass::Fallback;
    }
    let pct = pct.clamp(0.0, 100.0);
    if pct > 90.0 {
        VisualClass::Critical
    } else if pct > 75.0 {
        VisualClass::High
    } else if pct > 50.0 {
        VisualClass::Elevated
    } else {
        VisualClass::Healthy
    }
}

pub fn status_class(status: EntityStatus) -> VisualClass {
    match status {
        EntityStatus::Active => VisualClass::Healthy,
        EntityStatus::Warning => VisualClass::Elevated,
        EntityStatus::Critical => VisualClass::Critical,
        EntityStatus::Offline => VisualClass::Offline,
        EntityStatus::Maintenance => VisualClass::Standby,
        EntityStatus::Unknown => VisualClass::Fallback,
    }
}

pub fn tech_tier_class(tier: TechTier) -> VisualClass {
    match tier {
        TechTier::Quantum => VisualClass::Quantum,
        TechTier::Advanced => VisualClass::Hardened,
        TechTier::Standard => VisualClass::Standard,
        TechTier::Legacy => VisualClass::Legacy,
        TechTier::Unknown => VisualClass::Fallback,
    }
}

pub fn encryption_class(enc: EncryptionClass) -> VisualClass {
    match enc {
        EncryptionClass::QuantumResistant => VisualClass::Quantum,
        EncryptionClass::Aes256 => VisualClass::Hardened,
        EncryptionClass::Rsa4096 => VisualClass::Standard,
        EncryptionClass::Tls13 => VisualClass::Calm,
        EncryptionClass::Unknown => VisualClass::Fallback,
    }
}

pub fn bandwidth_class(bw: BandwidthClass) -> VisualClass {
    match bw {
        BandwidthClass::High => VisualClass::Calm,
        BandwidthClass::Medium => VisualClass::Hardened,
        BandwidthClass::Low => VisualClass::Legacy,
        BandwidthClass::Unknown => VisualClass::Fallback,
    }
}

pub fn severity_class(severity: Severity) -> VisualClass {
    match severity {
        Severity::Critical => VisualClass::Critical,
        Severity::High => VisualClass::High,
        Severity::Medium => VisualClass::Elevated,
        Severity::Low => VisualClass::Calm,
        Severity::Unknown => VisualClass::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_class_bands() {
        assert_eq!(threat_class(9.0), VisualClass::Critical);
        assert_eq!(threat_class(7.0), VisualClass::High);
        assert_eq!(threat_class(5.0), VisualClass::High);
        assert_eq!(threat_class(3.0), VisualClass::Elevated);
        assert_eq!(threat_class(1.0), VisualClass::Calm);
        assert_eq!(threat_class(0.0), VisualClass::Calm);
    }

    #[test]
    fn threat_class_is_monotonic_over_domain() {
        let mut prev = 0u8;
        for i in 0..=1000 {
            let level = i as f32 * 0.01;
            let heat = threat_class(level).heat().expect("heat-banded class");
            assert!(heat >= prev, "level {} cooled from {} to {}", level, prev, heat);
            prev = heat;
        }
    }

    #[test]
    fn out_of_domain_inputs_resolve() {
        assert_eq!(threat_class(-3.0), VisualClass::Calm);
        assert_eq!(threat_class(42.0), VisualClass::Critical);
        assert_eq!(threat_class(f32::NAN), VisualClass::Calm);
        assert_eq!(threat_class(f32::INFINITY), VisualClass::Critical);
        assert_eq!(threat_class(f32::NEG_INFINITY), VisualClass::Calm);

        assert_eq!(throughput_class(f32::NAN), VisualClass::Fallback);
        assert_eq!(throughput_class(-10.0), VisualClass::Healthy);
        assert_eq!(throughput_class(250.0), VisualClass::Critical);

        assert_eq!(health_class(f32::NAN), VisualClass::Fallback);
        assert_eq!(health_class(-5.0), VisualClass::Critical);
        assert_eq!(health_class(500.0), VisualClass::Healthy);
    }

    #[test]
    fn throughput_and_health_monotonic() {
        let mut prev_tp = 0u8;
        let mut prev_health = u8::MAX;
        for i in 0..=100 {
            let pct = i as f32;
            let tp = throughput_class(pct).heat().unwrap();
            let h = health_class(pct).heat().unwrap();
            assert!(tp >= prev_tp);
            assert!(h <= prev_health);
            prev_tp = tp;
            prev_health = h;
        }
    }

    #[test]
    fn unknown_labels_fall_back() {
        assert_eq!(EncryptionClass::from_label("rot13"), EncryptionClass::Unknown);
        assert_eq!(
            encryption_class(EncryptionClass::from_label("rot13")),
            VisualClass::Fallback
        );
        assert_eq!(status_class(EntityStatus::from_label("???")), VisualClass::Fallback);
        assert_eq!(tech_tier_class(TechTier::from_label("")), VisualClass::Fallback);
        assert_eq!(bandwidth_class(BandwidthClass::from_label("fast")), VisualClass::Fallback);
        assert_eq!(severity_class(Severity::from_label("meh")), VisualClass::Fallback);
    }

    #[test]
    fn labels_are_case_insensitive() {
        assert_eq!(EntityStatus::from_label(" Online "), EntityStatus::Active);
        assert_eq!(EncryptionClass::from_label("AES-256"), EncryptionClass::Aes256);
        assert_eq!(Severity::from_label("CRITICAL"), Severity::Critical);
    }

    #[test]
    fn every_class_has_a_visible_swatch() {
        for class in VisualClass::ALL {
            let s = class.swatch();
            assert_eq!(s.color.a, 255, "{} should be opaque", class.label());
            assert!(s.emissive_intensity.is_finite() && s.emissive_intensity >= 0.0);
        }
    }
}
