use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MiningOptions};
use crate::error::{ChainError, ConfigError};

/// Runtime settings read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
    /// Unset means mining runs until a nonce is found.
    pub mining_timeout: Option<Duration>,
    /// Unset means no cap on digests tried per block.
    pub mining_max_attempts: Option<u64>,
    pub mining_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            difficulty: DEFAULT_DIFFICULTY,
            mining_timeout: None,
            mining_max_attempts: None,
            mining_workers: 1,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT")?.unwrap_or(defaults.port),
            difficulty: parse(&lookup, "DIFFICULTY")?.unwrap_or(defaults.difficulty),
            mining_timeout: parse(&lookup, "MINING_TIMEOUT_MS")?.map(Duration::from_millis),
            mining_max_attempts: parse(&lookup, "MINING_MAX_ATTEMPTS")?,
            mining_workers: parse(&lookup, "MINING_WORKERS")?.unwrap_or(defaults.mining_workers),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(self.difficulty).into());
        }
        if self.mining_workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MINING_WORKERS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn mining_options(&self) -> MiningOptions {
        let mut options = MiningOptions::default().with_workers(self.mining_workers);
        if let Some(timeout) = self.mining_timeout {
            options = options.with_deadline(timeout);
        }
        if let Some(max) = self.mining_max_attempts {
            options = options.with_max_attempts(max);
        }
        options
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::Config;
    use crate::error::{ChainError, ConfigError};

    fn config_from(pairs: &[(&'static str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<&str, String> = pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.difficulty, 3);
        assert!(config.mining_options().is_unbounded());
    }

    #[test]
    fn reads_all_keys() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("DIFFICULTY", "4"),
            ("MINING_TIMEOUT_MS", "250"),
            ("MINING_MAX_ATTEMPTS", "5000"),
            ("MINING_WORKERS", "2"),
        ])
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.mining_timeout, Some(Duration::from_millis(250)));

        let options = config.mining_options();
        assert_eq!(options.workers, 2);
        assert_eq!(options.deadline, Some(Duration::from_millis(250)));
        assert_eq!(options.max_attempts, Some(5000));
        assert!(!options.is_unbounded());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config_from(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("DIFFICULTY", "0")]),
            Err(ConfigError::Chain(ChainError::InvalidDifficulty(0)))
        ));
        assert!(matches!(
            config_from(&[("MINING_WORKERS", "0")]),
            Err(ConfigError::InvalidValue { key: "MINING_WORKERS", .. })
        ));
    }
}
