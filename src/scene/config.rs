//! Static scene topology.
//!
//! `SceneConfig::default()` is the constant dataset the dashboard ships
//! with: the command-center layout (core, defense layers, towers, data
//! nodes, threat markers, data paths), the threat-radar layout and the
//! world-map layout (continents, data centers, connections, threat
//! sources). Hosts may build their own; nothing here changes after the
//! scene is mounted.

use std::collections::HashSet;
use std::f32::consts::TAU;

use glam::Vec3;

use crate::error::SceneError;
use crate::fast_math::circle_point;
use crate::scene::composer::EnvironmentConfig;
use crate::scene::particles::ParticleFieldConfig;
use crate::visual::color::Rgba;
use crate::visual::mapping::{TechTier, VisualClass};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EntityConfig
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Core,
    DefenseLayer,
    Tower,
    DataNode,
    ThreatMarker,
    DataPath,
    Continent,
    DataCenter,
    Connection,
    ThreatSource,
    RadarSweep,
    RadarBlip,
    RangeRing,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::DefenseLayer => "defense layer",
            Self::Tower => "tower",
            Self::DataNode => "data node",
            Self::ThreatMarker => "threat marker",
            Self::DataPath => "data path",
            Self::Continent => "continent",
            Self::DataCenter => "data center",
            Self::Connection => "connection",
            Self::ThreatSource => "threat source",
            Self::RadarSweep => "radar sweep",
            Self::RadarBlip => "radar blip",
            Self::RangeRing => "range ring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeClass {
    Small,
    #[default]
    Medium,
    Large,
}

impl SizeClass {
    pub fn scale(self) -> f32 {
        match self {
            Self::Small => 0.75,
            Self::Medium => 1.0,
            Self::Large => 1.4,
        }
    }
}

/// Static numeric parameters shared by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EntityParams {
    pub radius: f32,
    pub height: f32,
    pub segments: u32,
    pub size_class: SizeClass,
}

/// Static description of one visual entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityConfig {
    /// Stable id; telemetry entries are keyed by it
    pub id: String,
    pub category: Category,
    pub name: String,
    pub position: Vec3,
    pub params: EntityParams,
}

impl EntityConfig {
    pub fn new(id: &str, category: Category, name: &str, position: Vec3) -> Self {
        Self {
            id: id.to_string(),
            category,
            name: name.to_string(),
            position,
            params: EntityParams::default(),
        }
    }

    pub fn with_params(mut self, params: EntityParams) -> Self {
        self.params = params;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Command center
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    pub radius: f32,
    pub segments: u32,
    /// rad/s
    pub rotation_speed: f32,
    /// rad/s of the pulse oscillation
    pub pulse_speed: f32,
    pub pulse_amplitude: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefenseLayerConfig {
    pub id: String,
    pub name: String,
    pub radius: f32,
    pub tube: f32,
    /// Number of alert decorations spaced around the ring. The ring mesh
    /// itself is always built at
    /// [`crate::scene::composer::RING_MESH_SEGMENTS`].
    pub segments: u32,
    /// Signed rad/s
    pub rotation_speed: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TowerConfig {
    pub id: String,
    pub name: String,
    pub position: Vec3,
    pub height: f32,
    pub base_radius: f32,
    pub bob_frequency: f32,
    pub bob_amplitude: f32,
    pub phase_offset: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataNodeConfig {
    pub id: String,
    pub name: String,
    pub position: Vec3,
    pub size: f32,
    pub tier: TechTier,
    pub size_class: SizeClass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreatMarkerConfig {
    pub id: String,
    pub name: String,
    pub position: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPathConfig {
    pub id: String,
    pub name: String,
    pub from: Vec3,
    pub to: Vec3,
    /// rad/s of the ping-pong oscillation while active
    pub speed: f32,
    pub phase_offset: f32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Threat radar
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq)]
pub struct RadarBlipConfig {
    /// Threat id the blip reports
    pub threat_id: String,
    /// Bearing in radians
    pub bearing: f32,
    /// Distance from the radar center
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarConfig {
    pub radius: f32,
    pub range_rings: u32,
    /// rad/s
    pub sweep_speed: f32,
    /// Fraction of a turn over which a blip fades out after the sweep passes
    pub fade_fraction: f32,
    pub blips: Vec<RadarBlipConfig>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  World map
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq)]
pub struct ContinentConfig {
    pub id: String,
    pub name: String,
    /// Outline as (longitude, latitude) degrees
    pub outline: Vec<(f32, f32)>,
    pub tint: VisualClass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataCenterConfig {
    pub id: String,
    pub name: String,
    pub lon: f32,
    pub lat: f32,
    pub size_class: SizeClass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub id: String,
    /// Data-center id
    pub from: String,
    /// Data-center id
    pub to: String,
    /// Pulse trips per second
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreatSourceConfig {
    pub id: String,
    pub name: String,
    pub lon: f32,
    pub lat: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldMapConfig {
    /// Map extent along x (longitude)
    pub width: f32,
    /// Map extent along z (latitude)
    pub depth: f32,
    /// Arc apex height per unit of endpoint distance
    pub arc_height_factor: f32,
    /// Samples per connection arc
    pub arc_samples: usize,
    pub continents: Vec<ContinentConfig>,
    pub data_centers: Vec<DataCenterConfig>,
    pub connections: Vec<ConnectionConfig>,
    pub threat_sources: Vec<ThreatSourceConfig>,
}

impl WorldMapConfig {
    /// Equirectangular projection onto the XZ plane (north is −z).
    pub fn project(&self, lon: f32, lat: f32) -> Vec3 {
        Vec3::new(
            lon.clamp(-180.0, 180.0) / 180.0 * self.width * 0.5,
            0.0,
            -lat.clamp(-90.0, 90.0) / 90.0 * self.depth * 0.5,
        )
    }

    pub fn data_center(&self, id: &str) -> Option<&DataCenterConfig> {
        self.data_centers.iter().find(|d| d.id == id)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SceneConfig
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Full static configuration of every scene variant.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub core: CoreConfig,
    pub defense_layers: Vec<DefenseLayerConfig>,
    pub towers: Vec<TowerConfig>,
    pub data_nodes: Vec<DataNodeConfig>,
    pub threat_markers: Vec<ThreatMarkerConfig>,
    pub data_paths: Vec<DataPathConfig>,
    pub radar: RadarConfig,
    pub world_map: WorldMapConfig,
    pub particles: ParticleFieldConfig,
    pub environment: EnvironmentConfig,
}

const GREEK: [&str; 12] = [
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota", "Kappa",
    "Lambda", "Mu",
];

impl Default for SceneConfig {
    fn default() -> Self {
        let core = CoreConfig {
            radius: 2.0,
            segments: 16,
            rotation_speed: 0.5,
            pulse_speed: 2.0,
            pulse_amplitude: 0.1,
        };

        let defense_layers = [
            ("shield-inner", "Inner Shield", 4.0, 8, 0.30, 0x00FFFF),
            ("shield-mid", "Perimeter Grid", 6.0, 12, -0.20, 0x0088FF),
            ("shield-outer", "Outer Firewall", 8.0, 16, 0.12, 0xAA00FF),
        ]
        .iter()
        .map(|&(id, name, radius, segments, speed, hex)| DefenseLayerConfig {
            id: id.to_string(),
            name: name.to_string(),
            radius,
            tube: 0.08,
            segments,
            rotation_speed: speed,
            color: Rgba::from_hex(hex),
        })
        .collect();

        let towers = (0..8)
            .map(|k| {
                let angle = k as f32 * TAU / 8.0;
                TowerConfig {
                    id: format!("tower-{:02}", k + 1),
                    name: format!("Sentinel {}", GREEK[k]),
                    position: circle_point(12.0, angle, 0.0),
                    height: 3.0 + (k % 3) as f32 * 0.5,
                    base_radius: 0.5,
                    bob_frequency: 1.5,
                    bob_amplitude: 0.15,
                    phase_offset: k as f32 * 0.8,
                }
            })
            .collect::<Vec<_>>();

        let tiers = [
            TechTier::Quantum,
            TechTier::Advanced,
            TechTier::Standard,
            TechTier::Legacy,
        ];
        let data_nodes = (0..12)
            .map(|k| {
                let angle = (k as f32 + 0.5) * TAU / 12.0;
                DataNodeConfig {
                    id: format!("node-{:02}", k + 1),
                    name: format!("Vault {}", GREEK[k]),
                    position: circle_point(16.0, angle, 1.0),
                    size: 0.6,
                    tier: tiers[k % tiers.len()],
                    size_class: if k % 4 == 0 {
                        SizeClass::Large
                    } else {
                        SizeClass::Medium
                    },
                }
            })
            .collect();

        let threat_markers = (0..6)
            .map(|k| {
                let angle = k as f32 * TAU / 6.0 + 0.3;
                ThreatMarkerConfig {
                    id: format!("threat-{:02}", k + 1),
                    name: format!("Intrusion {}", GREEK[k]),
                    position: circle_point(20.0, angle, 3.0 + (k % 2) as f32 * 1.5),
                    radius: 0.5,
                }
            })
            .collect();

        // towers uplink into the core
        let data_paths = towers
            .iter()
            .enumerate()
            .map(|(k, t)| DataPathConfig {
                id: format!("path-{:02}", k + 1),
                name: format!("Uplink {}", GREEK[k]),
                from: t.position + Vec3::new(0.0, t.height, 0.0),
                to: Vec3::new(0.0, core.radius, 0.0),
                speed: 1.0 + (k % 3) as f32 * 0.3,
                phase_offset: k as f32 * 0.7,
            })
            .collect();

        let radar = RadarConfig {
            radius: 10.0,
            range_rings: 4,
            sweep_speed: 1.2,
            fade_fraction: 0.75,
            blips: (0..6)
                .map(|k| RadarBlipConfig {
                    threat_id: format!("threat-{:02}", k + 1),
                    bearing: k as f32 * TAU / 6.0 + 0.3,
                    range: 3.0 + k as f32 * 1.1,
                })
                .collect(),
        };

        Self {
            core,
            defense_layers,
            towers,
            data_nodes,
            threat_markers,
            data_paths,
            radar,
            world_map: default_world_map(),
            particles: ParticleFieldConfig::default(),
            environment: EnvironmentConfig::default(),
        }
    }
}

fn default_world_map() -> WorldMapConfig {
    let continent = |id: &str, name: &str, tint, outline: &[(f32, f32)]| ContinentConfig {
        id: id.to_string(),
        name: name.to_string(),
        outline: outline.to_vec(),
        tint,
    };
    let continents = vec![
        continent(
            "cont-na",
            "North America",
            VisualClass::Calm,
            &[
                (-165.0, 65.0),
                (-140.0, 70.0),
                (-95.0, 72.0),
                (-60.0, 55.0),
                (-80.0, 25.0),
                (-100.0, 18.0),
                (-118.0, 32.0),
                (-125.0, 48.0),
            ],
        ),
        continent(
            "cont-sa",
            "South America",
            VisualClass::Calm,
            &[
                (-80.0, 10.0),
                (-50.0, 0.0),
                (-35.0, -8.0),
                (-55.0, -35.0),
                (-70.0, -55.0),
                (-75.0, -15.0),
            ],
        ),
        continent(
            "cont-eu",
            "Europe",
            VisualClass::Hardened,
            &[
                (-10.0, 36.0),
                (-10.0, 55.0),
                (10.0, 58.0),
                (30.0, 70.0),
                (40.0, 55.0),
                (30.0, 45.0),
                (15.0, 38.0),
            ],
        ),
        continent(
            "cont-af",
            "Africa",
            VisualClass::Standard,
            &[
                (-17.0, 15.0),
                (-5.0, 35.0),
                (30.0, 32.0),
                (50.0, 12.0),
                (40.0, -15.0),
                (20.0, -35.0),
                (12.0, -5.0),
            ],
        ),
        continent(
            "cont-as",
            "Asia",
            VisualClass::Hardened,
            &[
                (40.0, 55.0),
                (60.0, 70.0),
                (140.0, 72.0),
                (170.0, 65.0),
                (140.0, 40.0),
                (120.0, 20.0),
                (100.0, 5.0),
                (75.0, 10.0),
                (55.0, 25.0),
            ],
        ),
        continent(
            "cont-oc",
            "Oceania",
            VisualClass::Standard,
            &[
                (115.0, -20.0),
                (130.0, -12.0),
                (145.0, -15.0),
                (153.0, -28.0),
                (145.0, -38.0),
                (115.0, -35.0),
            ],
        ),
    ];

    let data_centers = [
        ("dc-virginia", "US East", -77.5, 39.0, SizeClass::Large),
        ("dc-oregon", "US West", -120.5, 45.6, SizeClass::Medium),
        ("dc-saopaulo", "South America", -46.6, -23.5, SizeClass::Small),
        ("dc-frankfurt", "EU Central", 8.7, 50.1, SizeClass::Large),
        ("dc-london", "EU West", -0.1, 51.5, SizeClass::Medium),
        ("dc-singapore", "Asia Pacific", 103.8, 1.35, SizeClass::Large),
        ("dc-tokyo", "Asia North", 139.7, 35.7, SizeClass::Medium),
        ("dc-sydney", "Oceania", 151.2, -33.9, SizeClass::Small),
    ]
    .iter()
    .map(|&(id, name, lon, lat, size_class)| DataCenterConfig {
        id: id.to_string(),
        name: name.to_string(),
        lon,
        lat,
        size_class,
    })
    .collect();

    let connections = [
        ("dc-virginia", "dc-oregon"),
        ("dc-virginia", "dc-london"),
        ("dc-london", "dc-frankfurt"),
        ("dc-frankfurt", "dc-singapore"),
        ("dc-singapore", "dc-tokyo"),
        ("dc-tokyo", "dc-oregon"),
        ("dc-singapore", "dc-sydney"),
        ("dc-saopaulo", "dc-virginia"),
        ("dc-saopaulo", "dc-frankfurt"),
        ("dc-sydney", "dc-tokyo"),
    ]
    .iter()
    .enumerate()
    .map(|(k, &(from, to))| ConnectionConfig {
        id: format!("link-{:02}", k + 1),
        from: from.to_string(),
        to: to.to_string(),
        speed: 0.4 + (k % 3) as f32 * 0.15,
    })
    .collect();

    let threat_sources = [
        ("src-01", "Botnet C2", 37.6, 55.7),
        ("src-02", "APT Staging", 116.4, 39.9),
        ("src-03", "Phishing Relay", -43.2, -22.9),
        ("src-04", "Scanner Swarm", 3.4, 6.5),
        ("src-05", "Ransomware C2", 127.0, 37.5),
    ]
    .iter()
    .map(|&(id, name, lon, lat)| ThreatSourceConfig {
        id: id.to_string(),
        name: name.to_string(),
        lon,
        lat,
    })
    .collect();

    WorldMapConfig {
        width: 24.0,
        depth: 12.0,
        arc_height_factor: 0.3,
        arc_samples: 24,
        continents,
        data_centers,
        connections,
        threat_sources,
    }
}

impl SceneConfig {
    /// Check cross references: connection endpoints and radar blips must
    /// name existing entities, and ids must be unique per category.
    pub fn validate(&self) -> Result<(), SceneError> {
        for conn in &self.world_map.connections {
            for end in [&conn.from, &conn.to] {
                if self.world_map.data_center(end).is_none() {
                    return Err(SceneError::UnknownEntity(end.clone()));
                }
            }
        }
        for blip in &self.radar.blips {
            if !self.threat_markers.iter().any(|t| t.id == blip.threat_id) {
                return Err(SceneError::UnknownEntity(blip.threat_id.clone()));
            }
        }

        let groups: [Vec<&str>; 6] = [
            self.towers.iter().map(|t| t.id.as_str()).collect(),
            self.data_nodes.iter().map(|n| n.id.as_str()).collect(),
            self.threat_markers.iter().map(|t| t.id.as_str()).collect(),
            self.data_paths.iter().map(|p| p.id.as_str()).collect(),
            self.world_map.data_centers.iter().map(|d| d.id.as_str()).collect(),
            self.world_map.connections.iter().map(|c| c.id.as_str()).collect(),
        ];
        for ids in &groups {
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(*id) {
                    log::warn!("duplicate entity id `{}`", id);
                }
            }
        }
        Ok(())
    }
}
