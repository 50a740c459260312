use carrel_seating::{SeatLayout, SeatingRules};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RulesConfig {
    pub freeze_minutes: i64,
    pub sweep_interval_seconds: u64,
    pub complete_booking_on_absence: bool,
    pub default_layout: SeatLayout,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            freeze_minutes: carrel_seating::DEFAULT_FREEZE_MINUTES,
            sweep_interval_seconds: carrel_seating::DEFAULT_SWEEP_INTERVAL.as_secs(),
            complete_booking_on_absence: false,
            default_layout: SeatLayout::Demo,
        }
    }
}

impl RulesConfig {
    pub fn seating_rules(&self) -> SeatingRules {
        SeatingRules {
            freeze_window: chrono::Duration::minutes(self.freeze_minutes.max(1)),
            complete_booking_on_absence: self.complete_booking_on_absence,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
    pub redis_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("./data"),
            redis_url: "redis://127.0.0.1/".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load_from(Path::new("config"), &run_mode)
    }

    pub fn load_from(dir: &Path, run_mode: &str) -> Result<Self, config::ConfigError> {
        let file = |name: &str| config::File::with_name(&dir.join(name).to_string_lossy()).required(false);

        let s = config::Config::builder()
            // Every key has a built-in default, so all files are optional
            .add_source(file("default"))
            .add_source(file(run_mode))
            // Not checked in
            .add_source(file("local"))
            // Eg.. `CARREL__RULES__FREEZE_MINUTES=5`
            .add_source(
                config::Environment::with_prefix("CARREL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
