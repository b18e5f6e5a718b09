//! Configuration management for TallyChain

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A hex-rendered SHA-256 digest has 64 characters, so no difficulty beyond
/// 64 leading zeros is satisfiable.
pub const MAX_DIFFICULTY: u32 = 64;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
}

#[derive(Debug, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
        }
    }
}

fn default_difficulty() -> u32 {
    4
}

/// Load `config.toml` from the working directory, falling back to defaults
/// when the file is absent.
pub fn load_config() -> Result<Config> {
    load_config_from("config.toml")
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Sane defaults when the config file is absent
        Config {
            chain: ChainConfig::default(),
        }
    } else {
        toml::from_str(&config_str).map_err(|e| ChainError::Config(e.to_string()))?
    };

    // Validate critical values
    if config.chain.difficulty > MAX_DIFFICULTY {
        return Err(ChainError::Config(format!(
            "chain.difficulty must be at most {} leading hex zeros, got {}",
            MAX_DIFFICULTY, config.chain.difficulty
        )));
    }

    Ok(config)
}
