use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_TTL_HOURS;
use crate::error::EngineError;
use crate::logging::LogConfig;

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Analysis windows and limits
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Injury risk probability source
    #[serde(default)]
    pub risk: RiskSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Lifetime of a cached recovery analysis
    pub ttl_hours: i64,

    /// Background sweep period; 0 disables the sweeper
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_TTL_HOURS,
            sweep_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Lookback window used when the caller does not pass one
    pub default_timeframe_days: u32,

    /// Projection length used when the caller does not pass one
    pub default_horizon_periods: u32,

    /// Largest accepted lookback window
    pub max_timeframe_days: u32,

    /// Largest accepted projection horizon
    pub max_horizon_periods: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_timeframe_days: 30,
            default_horizon_periods: 12,
            max_timeframe_days: 365,
            max_horizon_periods: 52,
        }
    }
}

/// How the injury probability is drawn inside its tier band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbabilityMode {
    /// Uniform draw, seeded when `seed` is set
    Random,
    /// Band midpoint
    Midpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub probability_mode: ProbabilityMode,
    pub seed: Option<u64>,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            probability_mode: ProbabilityMode::Random,
            seed: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let now = Utc::now();

        EngineConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            cache: CacheSettings::default(),
            analysis: AnalysisSettings::default(),
            risk: RiskSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl EngineConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.validate()?;
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recoveryrs")
            .join("config.toml")
    }

    /// Load the default file, falling back to defaults when it is absent
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<PathBuf> {
        let config_path = Self::default_config_path();
        self.save_to_file(&config_path)?;
        Ok(config_path)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> std::result::Result<(), EngineError> {
        let invalid = |message: String| Err(EngineError::Configuration(message));

        if self.cache.ttl_hours <= 0 {
            return invalid(format!("cache.ttl_hours must be positive, got {}", self.cache.ttl_hours));
        }

        let analysis = &self.analysis;
        if analysis.max_timeframe_days == 0 || analysis.max_horizon_periods == 0 {
            return invalid("analysis limits must be at least 1".to_string());
        }
        if analysis.default_timeframe_days == 0
            || analysis.default_timeframe_days > analysis.max_timeframe_days
        {
            return invalid(format!(
                "analysis.default_timeframe_days must be within 1-{}, got {}",
                analysis.max_timeframe_days, analysis.default_timeframe_days
            ));
        }
        if analysis.default_horizon_periods == 0
            || analysis.default_horizon_periods > analysis.max_horizon_periods
        {
            return invalid(format!(
                "analysis.default_horizon_periods must be within 1-{}, got {}",
                analysis.max_horizon_periods, analysis.default_horizon_periods
            ));
        }

        Ok(())
    }

    /// Cache TTL as a chrono duration
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache.ttl_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: EngineConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let toml_str = r#"
            [metadata]
            version = "1.0"
            created_at = "2024-03-01T08:00:00Z"
            updated_at = "2024-03-01T08:00:00Z"

            [risk]
            probability_mode = "midpoint"
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.cache.ttl_hours, 24);
        assert_eq!(config.analysis.max_horizon_periods, 52);
        assert_eq!(config.risk.probability_mode, ProbabilityMode::Midpoint);
        assert_eq!(config.risk.seed, None);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_validation() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());

        config.cache.ttl_hours = 0;
        assert!(matches!(config.validate(), Err(EngineError::Configuration(_))));

        let mut config = EngineConfig::default();
        config.analysis.default_timeframe_days = 400;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.analysis.default_horizon_periods = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = EngineConfig::default();
        original.cache.ttl_hours = 6;
        original.risk.seed = Some(42);

        original.save_to_file(&config_path).unwrap();
        let loaded = EngineConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.cache.ttl_hours, 6);
        assert_eq!(loaded.risk.seed, Some(42));
        assert_eq!(loaded.cache_ttl(), chrono::Duration::hours(6));
    }

    #[test]
    fn test_invalid_file_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "not = [valid").unwrap();

        assert!(EngineConfig::load_from_file(&config_path).is_err());
        assert!(EngineConfig::load_from_file(temp_dir.path().join("absent.toml")).is_err());
    }
}
