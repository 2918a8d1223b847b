use crate::config::SimulationConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and validate a run configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<SimulationConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .with_context(|| format!("Failed to open configuration file {:?}", config_path))?;

    let config: SimulationConfig = serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse configuration file {:?}", config_path))?;

    config.validate()?;

    info!(
        "Configuration loaded: {} chaos every {} ms, seed {}",
        config.chaos.sub_mode,
        config.chaos.interval_ms,
        config.seed.map_or_else(|| "from entropy".to_string(), |seed| seed.to_string())
    );

    Ok(config)
}
