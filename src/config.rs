use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration. Every section and every field has a default, so
/// a YAML file only needs to name the options it overrides.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub risk: RiskThresholds,
    pub ingestion: IngestionConfig,
    pub layout: LayoutConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.risk.validate()?;
        self.ingestion.validate()?;
        self.layout.validate()?;
        Ok(())
    }
}

/// Shared general configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Run the force layout as part of `analyze`
    pub include_layout: bool,
}

/// Thresholds for the risk heuristics
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RiskThresholds {
    /// A transfer counts as high-value when its value is strictly above this
    pub high_value_threshold: f64,
    /// Lifetime transaction count above which volume is flagged
    pub tx_count_ceiling: u64,
    /// Non-zero token balances above which the wallet is flagged
    pub token_count_ceiling: usize,
    /// High-value transfers above which the frequency pattern is raised
    pub large_tx_frequency_ceiling: usize,
    /// Minimum unique addresses per transfer in the batch
    pub diversity_ratio: f64,
}

impl RiskThresholds {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.high_value_threshold.is_finite() || self.high_value_threshold < 0.0 {
            return Err(ValidationError::InvalidRisk(format!(
                "high_value_threshold must be a non-negative number, got {}",
                self.high_value_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.diversity_ratio) {
            return Err(ValidationError::InvalidRisk(format!(
                "diversity_ratio must be within [0, 1], got {}",
                self.diversity_ratio
            )));
        }
        Ok(())
    }
}

/// Token enrichment settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IngestionConfig {
    /// Maximum number of metadata lookups per batch
    pub metadata_lookup_cap: usize,
    /// Worker threads used for metadata lookups
    pub lookup_parallelism: usize,
}

impl IngestionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.lookup_parallelism == 0 {
            return Err(ValidationError::InvalidIngestion(
                "lookup_parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Force-directed layout parameters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Viewport width; the layout centres on `width / 2`
    pub width: f64,
    /// Viewport height; the layout centres on `height / 2`
    pub height: f64,
    /// Rest length of every link spring
    pub link_distance: f64,
    /// Fixed spring strength. Unset means `1 / min(degree)` per link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_strength: Option<f64>,
    /// Many-body strength; negative values repel
    pub charge_strength: f64,
    /// Fraction of velocity removed each tick
    pub velocity_decay: f64,
    /// Alpha below which the run has converged
    pub alpha_min: f64,
    /// Geometric alpha decay per tick
    pub cooling_rate: f64,
    /// Hard tick ceiling for non-convergent graphs
    pub max_ticks: u64,
    /// Seed for randomised initial placement. Unset uses a phyllotaxis spiral.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Delay between streamed frames
    #[serde(with = "humantime_serde")]
    pub frame_interval: Duration,
}

impl LayoutConfig {
    /// Centre of the viewport
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ValidationError::InvalidLayout(format!(
                "viewport must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.link_distance < 0.0 {
            return Err(ValidationError::InvalidLayout(
                "link_distance cannot be negative".to_string(),
            ));
        }
        if !(self.velocity_decay > 0.0 && self.velocity_decay < 1.0) {
            return Err(ValidationError::InvalidLayout(format!(
                "velocity_decay must be within (0, 1), got {}",
                self.velocity_decay
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(ValidationError::InvalidLayout(format!(
                "cooling_rate must be within (0, 1), got {}",
                self.cooling_rate
            )));
        }
        if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
            return Err(ValidationError::InvalidLayout(format!(
                "alpha_min must be within (0, 1), got {}",
                self.alpha_min
            )));
        }
        if self.max_ticks == 0 {
            return Err(ValidationError::InvalidLayout(
                "max_ticks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid risk configuration: {0}")]
    InvalidRisk(String),
    #[error("Invalid ingestion configuration: {0}")]
    InvalidIngestion(String),
    #[error("Invalid layout configuration: {0}")]
    InvalidLayout(String),
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            include_layout: true,
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_value_threshold: 10.0,
            tx_count_ceiling: 1000,
            token_count_ceiling: 50,
            large_tx_frequency_ceiling: 5,
            diversity_ratio: 0.3,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            metadata_lookup_cap: 20,
            lookup_parallelism: 4,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 300.0,
            link_distance: 30.0,
            link_strength: None,
            charge_strength: -30.0,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            cooling_rate: 0.0228,
            max_ticks: 1000,
            seed: None,
            frame_interval: Duration::from_millis(16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.risk, RiskThresholds::default());
        assert_eq!(config.ingestion.metadata_lookup_cap, 20);
        assert_eq!(config.layout.center(), (300.0, 150.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
risk:
  diversity_ratio: 0.5
layout:
  seed: 42
  frame_interval: "40ms"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Only the named fields change
        assert_eq!(config.risk.diversity_ratio, 0.5);
        assert_eq!(config.risk.high_value_threshold, 10.0);
        assert_eq!(config.risk.large_tx_frequency_ceiling, 5);
        assert_eq!(config.layout.seed, Some(42));
        assert_eq!(config.layout.frame_interval, Duration::from_millis(40));
        assert_eq!(config.layout.link_distance, 30.0);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.risk.diversity_ratio = 1.5;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRisk(_))));

        let mut config = Config::default();
        config.ingestion.lookup_parallelism = 0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidIngestion(_))));

        let mut config = Config::default();
        config.layout.velocity_decay = 1.0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidLayout(_))));

        let mut config = Config::default();
        config.layout.max_ticks = 0;
        assert!(config.validate().is_err());
    }
}
