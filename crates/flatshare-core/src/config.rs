//! Configuration loading and typed config structures for the simulation.
//!
//! The canonical configuration lives in `flatshare.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//!
//! The roster, the resource definitions, the simulated-time parameters, and
//! the run bounds are all external inputs; nothing here is mutated by the
//! simulation itself.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `flatshare.yaml`. All fields have defaults so a
/// partial file (or none at all) still yields a runnable simulation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Household-level settings (name, clock, run bounds).
    #[serde(default)]
    pub household: HouseholdConfig,

    /// Ordered roster of actors. The per-tick processing order is exactly
    /// this order.
    #[serde(default = "default_roster")]
    pub roster: Vec<RosterEntry>,

    /// Shared resource definitions, keyed by resource name.
    #[serde(default = "default_resources")]
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Household-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HouseholdConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Simulated time of day at tick 0, as `HH:MM`.
    #[serde(default = "default_start_time")]
    pub start_time: String,

    /// Simulated minutes added to the clock per tick.
    #[serde(default = "default_minutes_per_tick")]
    pub minutes_per_tick: u32,

    /// Number of ticks to run before stopping.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Real-time milliseconds to sleep between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            start_time: default_start_time(),
            minutes_per_tick: default_minutes_per_tick(),
            max_ticks: default_max_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// One roster member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    /// Unique actor name. Names are the identities used for routing.
    pub name: String,

    /// Path to the persona text file injected as the actor's fixed framing.
    #[serde(default)]
    pub persona_file: Option<String>,

    /// Situational framing for prompts. Defaults to `"<name>'s room"`.
    #[serde(default)]
    pub scene: Option<String>,
}

impl RosterEntry {
    /// The scene label used in this actor's turn context.
    pub fn scene_label(&self) -> String {
        self.scene
            .clone()
            .unwrap_or_else(|| format!("{}'s room", self.name))
    }
}

/// Occupancy mode of a shared resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyMode {
    /// At most one holder at a time.
    Exclusive,
    /// Up to `capacity` simultaneous holders.
    Shared,
}

/// Definition of one shared resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
    /// Whether the resource is single- or multi-occupant.
    pub mode: OccupancyMode,

    /// Maximum simultaneous holders. Ignored for exclusive resources
    /// (their capacity is always 1).
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Holders seeded at simulation start.
    #[serde(default)]
    pub initial_holders: Vec<String>,
}

fn default_name() -> String {
    "Flatshare".to_owned()
}

fn default_start_time() -> String {
    "07:00".to_owned()
}

const fn default_minutes_per_tick() -> u32 {
    15
}

const fn default_max_ticks() -> u64 {
    5
}

const fn default_tick_interval_ms() -> u64 {
    5000
}

const fn default_capacity() -> usize {
    4
}

/// Default roster mirroring the four flatmates of the reference household.
fn default_roster() -> Vec<RosterEntry> {
    ["Ming", "Zhuang", "Zhang", "Li"]
        .into_iter()
        .map(|name| RosterEntry {
            name: name.to_owned(),
            persona_file: None,
            scene: None,
        })
        .collect()
}

/// Default resources: exclusive bathroom and kitchen, a four-seat living room.
fn default_resources() -> BTreeMap<String, ResourceConfig> {
    let mut resources = BTreeMap::new();
    resources.insert(
        "Bathroom".to_owned(),
        ResourceConfig {
            mode: OccupancyMode::Exclusive,
            capacity: 1,
            initial_holders: Vec::new(),
        },
    );
    resources.insert(
        "Kitchen".to_owned(),
        ResourceConfig {
            mode: OccupancyMode::Exclusive,
            capacity: 1,
            initial_holders: Vec::new(),
        },
    );
    resources.insert(
        "Living room".to_owned(),
        ResourceConfig {
            mode: OccupancyMode::Shared,
            capacity: 4,
            initial_holders: Vec::new(),
        },
    );
    resources
}
