use crate::config::Config;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, LevelFilter};
use std::fs::File;
use std::path::Path;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Load the configuration at `config_path`, or fall back to defaults when no path is given
pub fn load_or_default(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using defaults");
            Ok(Config::default())
        }
    }
}

/// Level named by `general.log_level`, if any
///
/// Accepts the plain level names (`off`, `error` ... `trace`), case-insensitively.
pub fn config_log_level(config: &Config) -> Result<Option<LevelFilter>> {
    config
        .general
        .log_level
        .as_deref()
        .map(|level| {
            level
                .trim()
                .parse::<LevelFilter>()
                .map_err(|_| eyre!("Unknown general.log_level '{}'", level))
        })
        .transpose()
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub seed: Option<u64>,
    pub max_ticks: Option<u64>,
    pub lookup_parallelism: Option<usize>,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    if let Some(seed) = overrides.seed {
        info!("Overriding layout seed: {}", seed);
        config.layout.seed = Some(seed);
    }

    if let Some(max_ticks) = overrides.max_ticks {
        info!("Overriding layout tick ceiling: {}", max_ticks);
        config.layout.max_ticks = max_ticks;
    }

    if let Some(threads) = overrides.lookup_parallelism {
        info!("Overriding metadata lookup parallelism: {}", threads);
        config.ingestion.lookup_parallelism = threads;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
