//! Configuration models and loaders for the Blueshift warp drive.

use std::fs::File;
use std::path::{Path, PathBuf};

use blueshift_core::constants::WARP_SIMULATION_RESOURCE;
use blueshift_curve::CurveSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session-wide tunables shared by every warp engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpSettings {
    /// Resource generators produce and coils consume to sustain the warp field.
    pub warp_simulation_resource: String,
    /// Speed multiplier applied while outside every star's sphere of influence.
    pub interstellar_speed_multiplier: f64,
    /// Multiplier applied to the outermost planet's semi-major axis to size a star's SOI.
    pub soi_multiplier: f64,
    /// Multiplier applied to a planetless star's radius before `soi_multiplier`.
    pub no_planets_soi_multiplier: f64,
    /// Bodies ignored when sizing SOIs; vessels near blacklisted stars count as interstellar.
    pub blacklisted_bodies: Vec<String>,
    /// Real-time window (seconds) during which recomputation is suppressed after a throttle
    /// change or a spatial location crossing.
    pub frame_skip_seconds: f64,
    /// Allow the power multiplier to exceed 1.0 when generators overproduce.
    pub supercharge_enabled: bool,
    /// Power multiplier ceiling while supercharging.
    pub supercharge_ceiling: f64,
    /// Floor (fraction of c) for planetary speeds that the SOI curve would otherwise zero out.
    pub min_planetary_speed: f64,
}

impl Default for WarpSettings {
    fn default() -> Self {
        Self {
            warp_simulation_resource: WARP_SIMULATION_RESOURCE.to_string(),
            interstellar_speed_multiplier: 10.0,
            soi_multiplier: 1.1,
            no_planets_soi_multiplier: 1000.0,
            blacklisted_bodies: Vec::new(),
            frame_skip_seconds: 0.1,
            supercharge_enabled: false,
            supercharge_ceiling: 2.0,
            min_planetary_speed: 0.001,
        }
    }
}

impl WarpSettings {
    /// Reject settings that would make downstream calculations meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("interstellar_speed_multiplier", self.interstellar_speed_multiplier),
            ("soi_multiplier", self.soi_multiplier),
            ("no_planets_soi_multiplier", self.no_planets_soi_multiplier),
            ("supercharge_ceiling", self.supercharge_ceiling),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Validation {
                    message: format!("{field} must be positive and finite, got {value}"),
                });
            }
        }
        if !self.frame_skip_seconds.is_finite() || self.frame_skip_seconds < 0.0 {
            return Err(ConfigError::Validation {
                message: format!(
                    "frame_skip_seconds must be non-negative, got {}",
                    self.frame_skip_seconds
                ),
            });
        }
        if self.supercharge_ceiling < 1.0 {
            return Err(ConfigError::Validation {
                message: format!(
                    "supercharge_ceiling must be at least 1.0, got {}",
                    self.supercharge_ceiling
                ),
            });
        }
        if self.warp_simulation_resource.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "warp_simulation_resource must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_blacklisted(&self, body: &str) -> bool {
        self.blacklisted_bodies
            .iter()
            .any(|name| name.eq_ignore_ascii_case(body))
    }
}

/// Celestial body parsed from the body catalog.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CelestialBodyConfig {
    pub name: String,
    #[serde(default)]
    pub is_star: bool,
    #[serde(default)]
    pub parent: Option<String>,
    pub radius_m: f64,
    #[serde(default)]
    pub semi_major_axis_m: Option<f64>,
    pub soi_radius_m: f64,
}

/// A resource flow requirement or output, in units per second.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ResourceRateConfig {
    pub resource: String,
    pub rate_per_second: f64,
}

/// Warp engine part configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineConfig {
    pub id: String,
    /// Warp capacity to speed (fraction of c).
    pub warp_curve: CurveSpec,
    /// Altitude / planet SOI radius to speed multiplier while in planetary space.
    #[serde(default)]
    pub planetary_soi_speed_curve: CurveSpec,
    /// Minimum orbital altitude, in multiples of the main body's radius.
    #[serde(default = "default_min_planetary_radius")]
    pub min_planetary_radius: f64,
    #[serde(default)]
    pub displacement_impulse: f64,
    /// Minimum power multiplier required to stay ignited.
    #[serde(default = "default_ignition_threshold")]
    pub warp_ignition_threshold: f64,
    /// Throttle to effect intensity; absent means intensity follows throttle.
    #[serde(default)]
    pub effect_curve: Option<CurveSpec>,
    #[serde(default = "default_speed_skill")]
    pub warp_speed_skill: String,
    #[serde(default = "default_boost_rank")]
    pub warp_speed_boost_rank: u32,
    /// Speed bonus per crew rank once the boost rank is reached.
    #[serde(default = "default_skill_multiplier")]
    pub warp_speed_skill_multiplier: f64,
}

/// Warp coil part configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CoilConfig {
    pub id: String,
    pub warp_capacity: f64,
    #[serde(default)]
    pub displacement_impulse: f64,
    #[serde(default)]
    pub inputs: Vec<ResourceRateConfig>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub needs_maintenance: bool,
}

/// Warp generator part configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub id: String,
    #[serde(default = "default_simulation_resource")]
    pub produced_resource: String,
    pub produced_rate_per_second: f64,
    #[serde(default)]
    pub inputs: Vec<ResourceRateConfig>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Part records, tagged by `type`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PartConfig {
    Engine(EngineConfig),
    Coil(CoilConfig),
    Generator(GeneratorConfig),
}

impl PartConfig {
    pub fn id(&self) -> &str {
        match self {
            PartConfig::Engine(engine) => &engine.id,
            PartConfig::Coil(coil) => &coil.id,
            PartConfig::Generator(generator) => &generator.id,
        }
    }
}

/// Initial stock of a vessel resource.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ResourceStockConfig {
    pub resource: String,
    #[serde(default)]
    pub amount: f64,
    pub max_amount: f64,
}

/// Crew member relevant to warp speed skill bonuses.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CrewConfig {
    pub name: String,
    pub skill: String,
    pub rank: u32,
}

/// Vessel configuration: parts in attachment order plus starting inventory.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VesselConfig {
    pub name: String,
    pub mass_tons: f64,
    pub parts: Vec<PartConfig>,
    #[serde(default)]
    pub resources: Vec<ResourceStockConfig>,
    #[serde(default)]
    pub crew: Vec<CrewConfig>,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

fn default_true() -> bool {
    true
}

fn default_min_planetary_radius() -> f64 {
    1.0
}

fn default_ignition_threshold() -> f64 {
    0.9
}

fn default_speed_skill() -> String {
    "ConverterSkill".to_string()
}

fn default_boost_rank() -> u32 {
    5
}

fn default_skill_multiplier() -> f64 {
    0.05
}

fn default_simulation_resource() -> String {
    WARP_SIMULATION_RESOURCE.to_string()
}

/// Load session settings from a TOML file. Missing keys take their defaults.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<WarpSettings, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let settings: WarpSettings = toml::from_str(&contents)?;
    settings.validate()?;
    Ok(settings)
}

/// Load celestial body configurations from a YAML file or a directory of TOML files.
pub fn load_bodies<P: AsRef<Path>>(path: P) -> Result<Vec<CelestialBodyConfig>, ConfigError> {
    let bodies: Vec<CelestialBodyConfig> = load_records(path)?;
    for body in &bodies {
        if !body.radius_m.is_finite() || body.radius_m <= 0.0 {
            return Err(ConfigError::Validation {
                message: format!("body `{}` must have a positive radius", body.name),
            });
        }
    }
    Ok(bodies)
}

/// Load vessel configurations from a YAML file or a directory of TOML files.
pub fn load_vessels<P: AsRef<Path>>(path: P) -> Result<Vec<VesselConfig>, ConfigError> {
    let vessels: Vec<VesselConfig> = load_records(path)?;
    for vessel in &vessels {
        let mut seen = std::collections::BTreeSet::new();
        for part in &vessel.parts {
            if !seen.insert(part.id()) {
                return Err(ConfigError::Validation {
                    message: format!(
                        "vessel `{}` has duplicate part id `{}`",
                        vessel.name,
                        part.id()
                    ),
                });
            }
        }
        if vessel.mass_tons <= 0.0 {
            tracing::warn!(
                vessel = %vessel.name,
                mass_tons = vessel.mass_tons,
                "vessel mass is not positive; displacement will be zero"
            );
        }
    }
    Ok(vessels)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}
