//! Runner settings read from the environment.

use std::str::FromStr;
use thiserror::Error;
use treasure_core::GameConfig;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{name} is not a valid value: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Could not read config file {path}: {source}")]
    ConfigFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

/// Everything needed to set up one table
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: GameConfig,
    pub players: usize,
    pub map_radius: u32,
    /// Stop the game once this round starts
    pub max_rounds: u32,
}

impl Settings {
    /// Read `TREASURE_*` variables, falling back to defaults
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut config = match std::env::var("TREASURE_CONFIG") {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)
                    .map_err(|source| SettingsError::ConfigFile { path, source })?;
                GameConfig::from_json(&json)?
            }
            Err(_) => GameConfig::default(),
        };
        if let Some(seed) = parse_var("TREASURE_SEED")? {
            config.seed = Some(seed);
        }

        Ok(Self {
            players: parse_var("TREASURE_PLAYERS")?.unwrap_or(3),
            map_radius: parse_var("TREASURE_MAP_RADIUS")?.unwrap_or(4),
            max_rounds: parse_var("TREASURE_MAX_ROUNDS")?.unwrap_or(200),
            config,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, SettingsError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SettingsError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variable_is_none() {
        let value: Option<u32> = parse_var("TREASURE_TEST_UNSET_VARIABLE").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_invalid_variable_is_reported() {
        std::env::set_var("TREASURE_TEST_INVALID_VARIABLE", "many");
        let error = parse_var::<usize>("TREASURE_TEST_INVALID_VARIABLE").unwrap_err();
        assert!(error.to_string().contains("many"));
    }
}
