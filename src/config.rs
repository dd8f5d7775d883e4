use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{ActivityParameters, ChoMixType, Subject};
use crate::simulator::SimulationInputs;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Default athlete profile
    pub subject: Subject,

    /// Default activity thresholds
    pub activity: ActivityParameters,

    /// Simulation defaults
    pub simulation: SimulationDefaults,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Default knobs for the minute simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationDefaults {
    /// Effort duration (min)
    pub duration_min: f64,

    /// Fueling strategy target (g/h)
    pub target_intake_g_h: f64,

    /// Carbohydrate per dose (g)
    pub cho_per_dose_g: f64,

    /// Gut absorption time constant (min)
    pub tau_min: f64,

    /// Fraction of ingested carbohydrate that reaches oxidation
    pub oxidation_efficiency: f64,

    /// Carbohydrate mix of the fueling products
    pub mix_type: ChoMixType,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        let inputs = SimulationInputs::default();
        SimulationDefaults {
            duration_min: inputs.duration_min,
            target_intake_g_h: inputs.target_intake_g_h,
            cho_per_dose_g: inputs.cho_per_dose_g,
            tau_min: inputs.tau_min,
            oxidation_efficiency: inputs.oxidation_efficiency,
            mix_type: inputs.mix_type,
        }
    }
}

impl SimulationDefaults {
    /// Build simulator inputs from the configured defaults
    pub fn to_inputs(&self) -> SimulationInputs {
        SimulationInputs {
            duration_min: self.duration_min,
            target_intake_g_h: self.target_intake_g_h,
            cho_per_dose_g: self.cho_per_dose_g,
            tau_min: self.tau_min,
            oxidation_efficiency: self.oxidation_efficiency,
            mix_type: self.mix_type,
            ..SimulationInputs::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            subject: Subject::default(),
            activity: ActivityParameters::default(),
            simulation: SimulationDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".glycosim")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(_) => {
                tracing::debug!(
                    path = %config_path.display(),
                    "Config file not found, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.subject, deserialized.subject);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let mut original = AppConfig::default();
        original.subject.weight_kg = 68.0;
        original.simulation.target_intake_g_h = 90.0;

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.subject.weight_kg, 68.0);
        assert_eq!(loaded.simulation.target_intake_g_h, 90.0);
    }

    #[test]
    fn test_simulation_defaults_to_inputs() {
        let defaults = SimulationDefaults {
            duration_min: 240.0,
            target_intake_g_h: 90.0,
            mix_type: ChoMixType::Mix2to1,
            ..SimulationDefaults::default()
        };
        let inputs = defaults.to_inputs();

        assert_eq!(inputs.duration_min, 240.0);
        assert_eq!(inputs.target_intake_g_h, 90.0);
        assert_eq!(inputs.mix_type, ChoMixType::Mix2to1);
        assert!(inputs.intensity_series.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let result = AppConfig::load_from_file("/nonexistent/config.toml");
        assert!(result.is_err());
    }
}
