//! Telemetry snapshot supplied by the host each frame.
//!
//! The engine only ever borrows a snapshot. Per-entity slices are keyed by
//! the same stable ids as the scene's [`EntityConfig`]s; lookups are linear
//! scans over small vectors, so a frame performs no allocation.
//!
//! Resolution is where the presentation faults are handled: an entity with
//! no entry resolves to documented defaults, out-of-range numbers are
//! clamped, and both are tallied in a [`FaultTally`] instead of failing.
//!
//! [`EntityConfig`]: crate::scene::config::EntityConfig

use crate::fast_math::clamp_domain;
use crate::visual::mapping::{BandwidthClass, EncryptionClass, EntityStatus, Severity};

#[derive(Debug, Clone, PartialEq)]
pub struct TowerTelemetry {
    pub id: String,
    pub status: EntityStatus,
    /// 0–10
    pub threat_level: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataNodeTelemetry {
    pub id: String,
    pub status: EntityStatus,
    /// Utilisation, 0–100 %
    pub throughput: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreatTelemetry {
    pub id: String,
    pub active: bool,
    /// 0–10
    pub severity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathTelemetry {
    pub id: String,
    pub status: EntityStatus,
    pub encryption: EncryptionClass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataCenterTelemetry {
    pub id: String,
    pub status: EntityStatus,
    /// 0–100 %
    pub load: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionTelemetry {
    pub id: String,
    pub bandwidth: BandwidthClass,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreatSourceTelemetry {
    pub id: String,
    pub severity: Severity,
    pub active: bool,
}

/// Everything the engine reads in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    /// 0–100
    pub system_health: f32,
    /// 0–10
    pub threat_level: f32,
    pub towers: Vec<TowerTelemetry>,
    pub data_nodes: Vec<DataNodeTelemetry>,
    pub threats: Vec<ThreatTelemetry>,
    pub paths: Vec<PathTelemetry>,
    pub data_centers: Vec<DataCenterTelemetry>,
    pub connections: Vec<ConnectionTelemetry>,
    pub threat_sources: Vec<ThreatSourceTelemetry>,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::new(100.0, 0.0)
    }
}

// ── Resolved (clamped, defaulted) readings ──

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowerReading {
    pub status: EntityStatus,
    pub threat_level: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataNodeReading {
    pub status: EntityStatus,
    pub throughput: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatReading {
    pub active: bool,
    pub severity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathReading {
    pub status: EntityStatus,
    pub encryption: EncryptionClass,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataCenterReading {
    pub status: EntityStatus,
    pub load: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionReading {
    pub bandwidth: BandwidthClass,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatSourceReading {
    pub severity: Severity,
    pub active: bool,
}

/// Presentation faults observed while resolving one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultTally {
    /// Entities with no telemetry entry
    pub missing_telemetry: u32,
    /// Numbers clamped into their domain (NaN included)
    pub out_of_range: u32,
    /// Enum fields carrying an `Unknown` label
    pub unknown_labels: u32,
    /// Nodes whose update produced a non-finite transform
    pub degraded_nodes: u32,
}

impl FaultTally {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    fn clamp(&mut self, v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
        let (v, clamped) = clamp_domain(v, lo, hi, fallback);
        self.out_of_range += clamped as u32;
        v
    }

    fn label<T: PartialEq + Default>(&mut self, v: T) -> T {
        // every label enum defaults to its Unknown variant
        self.unknown_labels += (v == T::default()) as u32;
        v
    }
}

impl TelemetrySnapshot {
    pub fn new(system_health: f32, threat_level: f32) -> Self {
        Self {
            system_health,
            threat_level,
            towers: Vec::new(),
            data_nodes: Vec::new(),
            threats: Vec::new(),
            paths: Vec::new(),
            data_centers: Vec::new(),
            connections: Vec::new(),
            threat_sources: Vec::new(),
        }
    }

    // ── Builders (host / tests) ──

    pub fn with_tower(mut self, id: &str, status: EntityStatus, threat_level: f32) -> Self {
        self.towers.push(TowerTelemetry {
            id: id.to_string(),
            status,
            threat_level,
        });
        self
    }

    pub fn with_data_node(mut self, id: &str, status: EntityStatus, throughput: f32) -> Self {
        self.data_nodes.push(DataNodeTelemetry {
            id: id.to_string(),
            status,
            throughput,
        });
        self
    }

    pub fn with_threat(mut self, id: &str, active: bool, severity: f32) -> Self {
        self.threats.push(ThreatTelemetry {
            id: id.to_string(),
            active,
            severity,
        });
        self
    }

    pub fn with_path(mut self, id: &str, status: EntityStatus, encryption: EncryptionClass) -> Self {
        self.paths.push(PathTelemetry {
            id: id.to_string(),
            status,
            encryption,
        });
        self
    }

    pub fn with_data_center(mut self, id: &str, status: EntityStatus, load: f32) -> Self {
        self.data_centers.push(DataCenterTelemetry {
            id: id.to_string(),
            status,
            load,
        });
        self
    }

    pub fn with_connection(mut self, id: &str, bandwidth: BandwidthClass, active: bool) -> Self {
        self.connections.push(ConnectionTelemetry {
            id: id.to_string(),
            bandwidth,
            active,
        });
        self
    }

    pub fn with_threat_source(mut self, id: &str, severity: Severity, active: bool) -> Self {
        self.threat_sources.push(ThreatSourceTelemetry {
            id: id.to_string(),
            severity,
            active,
        });
        self
    }

    // ── Resolution ──

    /// Global threat level clamped into 0–10 (NaN → 0).
    pub fn threat_level(&self, tally: &mut FaultTally) -> f32 {
        tally.clamp(self.threat_level, 0.0, 10.0, 0.0)
    }

    /// System health clamped into 0–100 (NaN → 100).
    pub fn system_health(&self, tally: &mut FaultTally) -> f32 {
        tally.clamp(self.system_health, 0.0, 100.0, 100.0)
    }

    /// Missing → status Unknown, threat 0.
    pub fn tower(&self, id: &str, tally: &mut FaultTally) -> TowerReading {
        match self.towers.iter().find(|t| t.id == id) {
            Some(t) => TowerReading {
                status: tally.label(t.status),
                threat_level: tally.clamp(t.threat_level, 0.0, 10.0, 0.0),
            },
            None => {
                tally.missing_telemetry += 1;
                TowerReading {
                    status: EntityStatus::Unknown,
                    threat_level: 0.0,
                }
            }
        }
    }

    /// Missing → status Unknown, throughput 0.
    pub fn data_node(&self, id: &str, tally: &mut FaultTally) -> DataNodeReading {
        match self.data_nodes.iter().find(|n| n.id == id) {
            Some(n) => DataNodeReading {
                status: tally.label(n.status),
                throughput: tally.clamp(n.throughput, 0.0, 100.0, 0.0),
            },
            None => {
                tally.missing_telemetry += 1;
                DataNodeReading {
                    status: EntityStatus::Unknown,
                    throughput: 0.0,
                }
            }
        }
    }

    /// Missing → idle, severity 0.
    pub fn threat(&self, id: &str, tally: &mut FaultTally) -> ThreatReading {
        match self.threats.iter().find(|t| t.id == id) {
            Some(t) => ThreatReading {
                active: t.active,
                severity: tally.clamp(t.severity, 0.0, 10.0, 0.0),
            },
            None => {
                tally.missing_telemetry += 1;
                ThreatReading {
                    active: false,
                    severity: 0.0,
                }
            }
        }
    }

    /// Missing → status Unknown (slow flow), encryption Unknown.
    pub fn path(&self, id: &str, tally: &mut FaultTally) -> PathReading {
        match self.paths.iter().find(|p| p.id == id) {
            Some(p) => PathReading {
                status: tally.label(p.status),
                encryption: tally.label(p.encryption),
            },
            None => {
                tally.missing_telemetry += 1;
                PathReading {
                    status: EntityStatus::Unknown,
                    encryption: EncryptionClass::Unknown,
                }
            }
        }
    }

    /// Missing → status Unknown, load 0.
    pub fn data_center(&self, id: &str, tally: &mut FaultTally) -> DataCenterReading {
        match self.data_centers.iter().find(|d| d.id == id) {
            Some(d) => DataCenterReading {
                status: tally.label(d.status),
                load: tally.clamp(d.load, 0.0, 100.0, 0.0),
            },
            None => {
                tally.missing_telemetry += 1;
                DataCenterReading {
                    status: EntityStatus::Unknown,
                    load: 0.0,
                }
            }
        }
    }

    /// Missing → bandwidth Unknown, inactive.
    pub fn connection(&self, id: &str, tally: &mut FaultTally) -> ConnectionReading {
        match self.connections.iter().find(|c| c.id == id) {
            Some(c) => ConnectionReading {
                bandwidth: tally.label(c.bandwidth),
                active: c.active,
            },
            None => {
                tally.missing_telemetry += 1;
                ConnectionReading {
                    bandwidth: BandwidthClass::Unknown,
                    active: false,
                }
            }
        }
    }

    /// Missing → severity Unknown, inactive.
    pub fn threat_source(&self, id: &str, tally: &mut FaultTally) -> ThreatSourceReading {
        match self.threat_sources.iter().find(|s| s.id == id) {
            Some(s) => ThreatSourceReading {
                severity: tally.label(s.severity),
                active: s.active,
            },
            None => {
                tally.missing_telemetry += 1;
                ThreatSourceReading {
                    severity: Severity::Unknown,
                    active: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entities_resolve_to_defaults() {
        let snap = TelemetrySnapshot::new(90.0, 2.0);
        let mut tally = FaultTally::default();

        let tower = snap.tower("tower-404", &mut tally);
        assert_eq!(tower.status, EntityStatus::Unknown);
        assert_eq!(tower.threat_level, 0.0);

        let threat = snap.threat("threat-404", &mut tally);
        assert!(!threat.active);
        assert_eq!(threat.severity, 0.0);

        assert_eq!(tally.missing_telemetry, 2);
        assert_eq!(tally.out_of_range, 0);
    }

    #[test]
    fn out_of_range_values_are_clamped_and_counted() {
        let snap = TelemetrySnapshot::new(f32::NAN, 14.0)
            .with_data_node("node-1", EntityStatus::Active, 180.0)
            .with_tower("tower-1", EntityStatus::Active, -2.0);
        let mut tally = FaultTally::default();

        assert_eq!(snap.threat_level(&mut tally), 10.0);
        assert_eq!(snap.system_health(&mut tally), 100.0);
        assert_eq!(snap.data_node("node-1", &mut tally).throughput, 100.0);
        assert_eq!(snap.tower("tower-1", &mut tally).threat_level, 0.0);
        assert_eq!(tally.out_of_range, 4);
        assert_eq!(tally.missing_telemetry, 0);
    }

    #[test]
    fn unknown_labels_are_counted() {
        let snap = TelemetrySnapshot::default()
            .with_path("path-1", EntityStatus::Active, EncryptionClass::Unknown);
        let mut tally = FaultTally::default();
        let path = snap.path("path-1", &mut tally);
        assert_eq!(path.encryption, EncryptionClass::Unknown);
        assert_eq!(tally.unknown_labels, 1);
    }

    #[test]
    fn clean_snapshot_has_clean_tally() {
        let snap = TelemetrySnapshot::new(75.0, 5.0)
            .with_tower("tower-1", EntityStatus::Warning, 5.0);
        let mut tally = FaultTally::default();
        snap.threat_level(&mut tally);
        snap.system_health(&mut tally);
        snap.tower("tower-1", &mut tally);
        assert!(tally.is_clean());
    }
}
