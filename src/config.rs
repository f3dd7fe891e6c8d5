use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "LUBE_CONFIG_PATH";

pub const DEFAULT_UPDATE_INTERVAL_SECS: f64 = 0.1;
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 0.1;
pub const DEFAULT_MOVEMENT_WINDOW_SECS: f64 = 1.0;
pub const DEFAULT_CONSECUTIVE_MOVEMENT_SECS: u64 = 16 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    pub lubrication: LubricationSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

/// Raw `[lubrication]` section, keys named as in the machine INI file.
///
/// Booleans are kept as strings here because the INI dialect accepts
/// values like "yes"/"off"; see [`parse_bool`].
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LubricationSection {
    #[serde(rename = "ENABLED")]
    pub enabled: Option<String>,
    #[serde(rename = "UPDATE_INTERVAL")]
    pub update_interval: Option<f64>,
    #[serde(rename = "PRESSURE_TIMEOUT")]
    pub pressure_timeout: Option<u64>,
    #[serde(rename = "PRESSURE_HOLD_TIME")]
    pub pressure_hold_time: Option<u64>,
    #[serde(rename = "MOVEMENT_THRESHOLD")]
    pub movement_threshold: Option<f64>,
    #[serde(rename = "MOVEMENT_WINDOW_SECONDS")]
    pub movement_window_seconds: Option<f64>,
    #[serde(rename = "INTERVAL_CONSECUTIVE_MOVEMENT")]
    pub interval_consecutive_movement: Option<u64>,
    #[serde(rename = "DEBUG_MODE")]
    pub debug_mode: Option<String>,
}

/// Validated lubrication parameters, immutable for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct LubeConfig {
    pub enabled: bool,
    pub update_interval: Duration,
    pub pressure_timeout: Duration,
    pub pressure_hold_time: Duration,
    pub movement_threshold: f64,
    pub movement_window: Duration,
    pub consecutive_movement_interval: Duration,
    pub debug_mode: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required key {key} in [lubrication]")]
    MissingKey { key: &'static str },
    #[error("invalid truth value {value:?} for {key}")]
    InvalidBool { key: &'static str, value: String },
    #[error("{key} must be a positive number of seconds")]
    NotPositive { key: &'static str },
    #[error("MOVEMENT_THRESHOLD must be a finite, non-negative distance")]
    InvalidThreshold,
    #[error(
        "UPDATE_INTERVAL ({update_interval:?}) cannot exceed MOVEMENT_WINDOW_SECONDS \
         ({movement_window:?}): the window would never hold two samples"
    )]
    WindowTooSmall {
        update_interval: Duration,
        movement_window: Duration,
    },
}

/// Convert an INI-style truth string to a bool.
///
/// Accepted true values: "y", "yes", "t", "true", "on", "1".
/// Accepted false values: "n", "no", "f", "false", "off", "0".
/// Case-insensitive, surrounding whitespace ignored.
pub fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}

/// Load configuration from `LUBE_CONFIG_PATH` if set, else the default path.
pub fn load_default() -> Result<Config, ConfigError> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => load_from_path(path),
        _ => load_from_path(DEFAULT_CONFIG_PATH),
    }
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

fn positive_secs_f64(key: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NotPositive { key });
    }
    Ok(Duration::from_secs_f64(value))
}

fn positive_secs_u64(key: &'static str, value: u64) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotPositive { key });
    }
    Ok(Duration::from_secs(value))
}

impl LubricationSection {
    /// Validate the raw section into usable parameters.
    ///
    /// `PRESSURE_TIMEOUT` and `PRESSURE_HOLD_TIME` are required; the other
    /// keys fall back to their defaults. An absent `ENABLED` reads as
    /// disabled, matching the original machine configuration.
    pub fn resolve(&self) -> Result<LubeConfig, ConfigError> {
        let enabled = match &self.enabled {
            Some(value) => parse_bool("ENABLED", value)?,
            None => false,
        };
        let debug_mode = match &self.debug_mode {
            Some(value) => parse_bool("DEBUG_MODE", value)?,
            None => false,
        };

        let update_interval = positive_secs_f64(
            "UPDATE_INTERVAL",
            self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL_SECS),
        )?;
        let pressure_timeout = positive_secs_u64(
            "PRESSURE_TIMEOUT",
            self.pressure_timeout.ok_or(ConfigError::MissingKey {
                key: "PRESSURE_TIMEOUT",
            })?,
        )?;
        let pressure_hold_time = positive_secs_u64(
            "PRESSURE_HOLD_TIME",
            self.pressure_hold_time.ok_or(ConfigError::MissingKey {
                key: "PRESSURE_HOLD_TIME",
            })?,
        )?;
        let movement_window = positive_secs_f64(
            "MOVEMENT_WINDOW_SECONDS",
            self.movement_window_seconds
                .unwrap_or(DEFAULT_MOVEMENT_WINDOW_SECS),
        )?;
        let consecutive_movement_interval = positive_secs_u64(
            "INTERVAL_CONSECUTIVE_MOVEMENT",
            self.interval_consecutive_movement
                .unwrap_or(DEFAULT_CONSECUTIVE_MOVEMENT_SECS),
        )?;

        let movement_threshold = self
            .movement_threshold
            .unwrap_or(DEFAULT_MOVEMENT_THRESHOLD);
        if !movement_threshold.is_finite() || movement_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold);
        }

        Ok(LubeConfig {
            enabled,
            update_interval,
            pressure_timeout,
            pressure_hold_time,
            movement_threshold,
            movement_window,
            consecutive_movement_interval,
            debug_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn section(overrides: impl FnOnce(&mut LubricationSection)) -> LubricationSection {
        let mut section = LubricationSection {
            enabled: Some("yes".to_string()),
            pressure_timeout: Some(60),
            pressure_hold_time: Some(15),
            ..LubricationSection::default()
        };
        overrides(&mut section);
        section
    }

    #[test]
    fn default_config_is_valid() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_from_path(DEFAULT_CONFIG_PATH)?;
        let lube = config.lubrication.resolve()?;
        assert!(lube.enabled);
        assert_eq!(lube.pressure_timeout, Duration::from_secs(60));
        assert_eq!(lube.pressure_hold_time, Duration::from_secs(15));
        Ok(())
    }

    #[test]
    fn parse_bool_accepts_known_truth_values() -> Result<(), ConfigError> {
        for value in ["y", "YES", " t ", "True", "on", "1"] {
            assert!(parse_bool("ENABLED", value)?, "{value:?}");
        }
        for value in ["n", "NO", " f ", "False", "off", "0"] {
            assert!(!parse_bool("ENABLED", value)?, "{value:?}");
        }
        Ok(())
    }

    #[test]
    fn parse_bool_rejects_anything_else() {
        let result = parse_bool("ENABLED", "maybe");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidBool { key: "ENABLED", .. })
        ));
    }

    #[test]
    fn resolve_applies_defaults() -> Result<(), ConfigError> {
        let lube = section(|_| {}).resolve()?;
        assert_eq!(lube.update_interval, Duration::from_millis(100));
        assert_eq!(lube.movement_threshold, 0.1);
        assert_eq!(lube.movement_window, Duration::from_secs(1));
        assert_eq!(
            lube.consecutive_movement_interval,
            Duration::from_secs(16 * 60)
        );
        assert!(!lube.debug_mode);
        Ok(())
    }

    #[test]
    fn missing_enabled_reads_as_disabled() -> Result<(), ConfigError> {
        let lube = section(|s| s.enabled = None).resolve()?;
        assert!(!lube.enabled);
        Ok(())
    }

    #[test]
    fn missing_pressure_timeout_is_an_error() {
        let result = section(|s| s.pressure_timeout = None).resolve();
        assert!(matches!(
            result,
            Err(ConfigError::MissingKey {
                key: "PRESSURE_TIMEOUT"
            })
        ));
    }

    #[test]
    fn missing_pressure_hold_time_is_an_error() {
        let result = section(|s| s.pressure_hold_time = None).resolve();
        assert!(matches!(
            result,
            Err(ConfigError::MissingKey {
                key: "PRESSURE_HOLD_TIME"
            })
        ));
    }

    #[test]
    fn zero_update_interval_is_an_error() {
        let result = section(|s| s.update_interval = Some(0.0)).resolve();
        assert!(matches!(
            result,
            Err(ConfigError::NotPositive {
                key: "UPDATE_INTERVAL"
            })
        ));
    }

    #[test]
    fn negative_movement_threshold_is_an_error() {
        let result = section(|s| s.movement_threshold = Some(-0.1)).resolve();
        assert!(matches!(result, Err(ConfigError::InvalidThreshold)));
    }

    #[test]
    fn missing_config_file_returns_read_error() {
        let temp_dir = std::env::temp_dir();
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = temp_dir.join(format!("lube-config-missing-{unique}.toml"));

        let result = load_from_path(&path);

        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn invalid_toml_returns_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = std::env::temp_dir();
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = temp_dir.join(format!("lube-config-invalid-{unique}.toml"));
        fs::write(&path, "not = [valid")?;

        let result = load_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        Ok(())
    }

    #[test]
    fn config_file_with_lubrication_section_round_trips() -> Result<(), Box<dyn std::error::Error>>
    {
        let temp_dir = std::env::temp_dir();
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = temp_dir.join(format!("lube-config-{unique}.toml"));
        let contents = r#"
[app]
name = "lube-pump"

[logging]
level = "debug"

[lubrication]
ENABLED = "on"
PRESSURE_TIMEOUT = 30
PRESSURE_HOLD_TIME = 5
DEBUG_MODE = "1"
"#;
        fs::write(&path, contents)?;

        let config = load_from_path(&path)?;
        let _ = fs::remove_file(&path);

        let lube = config.lubrication.resolve()?;
        assert!(lube.enabled);
        assert!(lube.debug_mode);
        assert_eq!(lube.pressure_timeout, Duration::from_secs(30));
        assert_eq!(lube.pressure_hold_time, Duration::from_secs(5));
        Ok(())
    }
}
