//! Scheduler configuration
//!
//! Every tunable used by the classifier, partitioner, selector, guards and
//! timed practice lives here and is handed to the components at construction.
//! A config file is TOML; any field left out takes its default.
//!
//! ```toml
//! sessionCapacity = 30
//! reinforceProbability = 0.25
//!
//! [classifier]
//! minPassingAccuracy = 0.85
//!
//! [guards]
//! spacedRepetitionWriteMs = 2000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::Severity;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Thresholds used to classify a single item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Accuracy (as a fraction of 1) below which an item counts as failed
    #[serde(default = "default_min_passing_accuracy")]
    pub min_passing_accuracy: f64,
    /// Upper bound of the overdue ratio; reaching it means overdue
    #[serde(default = "default_ratio_ceiling")]
    pub ratio_ceiling: f64,
}

fn default_min_passing_accuracy() -> f64 {
    0.9
}

fn default_ratio_ceiling() -> f64 {
    2.0
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_passing_accuracy: default_min_passing_accuracy(),
            ratio_ceiling: default_ratio_ceiling(),
        }
    }
}

/// Debounce windows for navigation side effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardConfig {
    #[serde(default = "default_spaced_repetition_write_ms")]
    pub spaced_repetition_write_ms: u64,
    #[serde(default = "default_timed_play_resume_ms")]
    pub timed_play_resume_ms: u64,
}

fn default_spaced_repetition_write_ms() -> u64 {
    1500
}

fn default_timed_play_resume_ms() -> u64 {
    300
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            spaced_repetition_write_ms: default_spaced_repetition_write_ms(),
            timed_play_resume_ms: default_timed_play_resume_ms(),
        }
    }
}

/// Timing of hands-free practice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeConfig {
    /// Delay before each automatic advance
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,
    /// Sub-interval at which countdown progress is reported
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,
}

fn default_tick_delay_ms() -> u64 {
    3000
}

fn default_countdown_tick_ms() -> u64 {
    200
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            tick_delay_ms: default_tick_delay_ms(),
            countdown_tick_ms: default_countdown_tick_ms(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Most failed/overdue items one recall session surfaces
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,
    /// Chance that an advance is intercepted by the reinforcement pool
    #[serde(default = "default_reinforce_probability")]
    pub reinforce_probability: f64,
    #[serde(default)]
    pub guards: GuardConfig,
    #[serde(default)]
    pub practice: PracticeConfig,
    /// Threshold of the error channel
    #[serde(default = "default_log_severity")]
    pub log_severity: Severity,
}

fn default_session_capacity() -> usize {
    20
}

fn default_reinforce_probability() -> f64 {
    1.0 / 3.0
}

fn default_log_severity() -> Severity {
    Severity::Warn
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            session_capacity: default_session_capacity(),
            reinforce_probability: default_reinforce_probability(),
            guards: GuardConfig::default(),
            practice: PracticeConfig::default(),
            log_severity: default_log_severity(),
        }
    }
}

impl SchedulerConfig {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("recall").join("config.toml"))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let accuracy = self.classifier.min_passing_accuracy;
        if !(0.0..=1.0).contains(&accuracy) {
            return Err(ConfigError::Invalid(format!(
                "minPassingAccuracy must be within [0, 1], got {}",
                accuracy
            )));
        }

        let ceiling = self.classifier.ratio_ceiling;
        if !ceiling.is_finite() || ceiling < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "ratioCeiling must be a finite number >= 1, got {}",
                ceiling
            )));
        }

        if !(0.0..=1.0).contains(&self.reinforce_probability) {
            return Err(ConfigError::Invalid(format!(
                "reinforceProbability must be within [0, 1], got {}",
                self.reinforce_probability
            )));
        }

        if self.practice.countdown_tick_ms == 0 {
            return Err(ConfigError::Invalid(
                "countdownTickMs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
