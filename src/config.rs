use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    NotFound(String),
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => write!(f, "Config file not found at: {}", path),
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to deserialize config JSON: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::NotFound(_) => None,
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TensorConfig {
    /// Longest dimension list accepted by blank-size and reshape. Longer
    /// lists are treated as invalid dimension specs. This also bounds the
    /// recursion depth of tensor construction.
    pub max_rank: usize,
    /// Largest element count blank-size and reshape will build.
    pub max_elements: usize,
    pub pretty_output: bool,
}

impl Default for TensorConfig {
    fn default() -> Self {
        TensorConfig {
            max_rank: 32,
            max_elements: 1 << 24,
            pretty_output: false,
        }
    }
}

impl TensorConfig {
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        if !Path::new(config_path).exists() {
            return Err(ConfigError::NotFound(config_path.to_string()));
        }

        let mut file = File::open(config_path).map_err(ConfigError::Io)?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(ConfigError::Io)?;

        let config: TensorConfig = serde_json::from_str(&contents).map_err(ConfigError::Parse)?;
        log::debug!("Loaded tensor config from {}: {:?}", config_path, config);

        Ok(config)
    }
}
