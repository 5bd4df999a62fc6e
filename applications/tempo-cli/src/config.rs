/// CLI configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempo_playback::PlaybackConfig;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "tempo.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub simulator: SimulatorSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Timing of the simulated audio device
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulatorSettings {
    /// Delay between `load` and `Ready`
    #[serde(default = "default_load_latency_ms")]
    pub load_latency_ms: u64,

    /// Interval between time ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Track seconds played per real second
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Duration reported for every loaded track
    #[serde(default = "default_track_duration_secs")]
    pub track_duration_secs: u64,
}

impl SimulatorSettings {
    pub fn load_latency(&self) -> Duration {
        Duration::from_millis(self.load_latency_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn track_duration(&self) -> Duration {
        Duration::from_secs(self.track_duration_secs)
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            load_latency_ms: default_load_latency_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            speed: default_speed(),
            track_duration_secs: default_track_duration_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `tempo.toml` is read if present.
    /// `TEMPO_`-prefixed variables override both (`TEMPO_PLAYBACK__VOLUME=0.5`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`AppConfig::load`], reading variables from `env` instead of
    /// the process environment when given
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with TEMPO_)
        settings = settings.add_source(
            config::Environment::with_prefix("TEMPO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;

        if !(self.simulator.speed.is_finite() && self.simulator.speed > 0.0) {
            return Err(CliError::Config(format!(
                "simulator.speed must be positive, got {}",
                self.simulator.speed
            )));
        }

        Ok(())
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// Default values
fn default_log_level() -> String {
    "tempo=info,tempo_cli=info,tempo_playback=info".to_string()
}

fn default_load_latency_ms() -> u64 {
    150
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_speed() -> f64 {
    60.0
}

fn default_track_duration_secs() -> u64 {
    180
}
