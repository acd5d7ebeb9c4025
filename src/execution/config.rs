use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::execution::retry::{BackoffPolicy, SlippagePolicy, MAX_SLIPPAGE_BPS};
use crate::execution::types::DEFAULT_MAX_ATTEMPTS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("cannot load keypair: {0}")]
    Keypair(String),
}

/// Parse `key` from the environment, falling back to `default` when unset.
pub fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

pub fn env_required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

/// Parse a required `key`; both failure modes name the variable.
pub fn env_parsed<T: FromStr>(key: &'static str) -> Result<T, ConfigError> {
    let value = env_required(key)?;
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutorConfig {
    /// Attempt cap given to requests built from configuration.
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
    pub slippage: SlippagePolicy,
    pub confirmation_timeout: Duration,
    /// Oldest quote that may still be combined with a fresh blockhash.
    pub quote_max_age: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffPolicy::default(),
            slippage: SlippagePolicy::default(),
            confirmation_timeout: Duration::from_secs(60),
            quote_max_age: Duration::from_secs(5),
        }
    }
}

impl ExecutorConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            max_attempts: env_or("SWAP_MAX_ATTEMPTS", defaults.max_attempts)?,
            backoff: BackoffPolicy {
                initial_delay: Duration::from_millis(env_or(
                    "SWAP_BACKOFF_INITIAL_MS",
                    defaults.backoff.initial_delay.as_millis() as u64,
                )?),
                max_delay: Duration::from_millis(env_or(
                    "SWAP_BACKOFF_MAX_MS",
                    defaults.backoff.max_delay.as_millis() as u64,
                )?),
                backoff_factor: env_or("SWAP_BACKOFF_MULTIPLIER", defaults.backoff.backoff_factor)?,
            },
            slippage: SlippagePolicy {
                step_bps: env_or("SWAP_SLIPPAGE_STEP_BPS", defaults.slippage.step_bps)?,
                ceiling_bps: env_or("SWAP_SLIPPAGE_CEILING_BPS", defaults.slippage.ceiling_bps)?,
            },
            confirmation_timeout: Duration::from_secs(env_or(
                "SWAP_CONFIRM_TIMEOUT_SECS",
                defaults.confirmation_timeout.as_secs(),
            )?),
            quote_max_age: Duration::from_secs(env_or(
                "SWAP_QUOTE_MAX_AGE_SECS",
                defaults.quote_max_age.as_secs(),
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "SWAP_MAX_ATTEMPTS",
                value: self.max_attempts.to_string(),
            });
        }
        if self.slippage.ceiling_bps > MAX_SLIPPAGE_BPS {
            return Err(ConfigError::Invalid {
                key: "SWAP_SLIPPAGE_CEILING_BPS",
                value: self.slippage.ceiling_bps.to_string(),
            });
        }
        if !self.backoff.backoff_factor.is_finite() || self.backoff.backoff_factor < 1.0 {
            return Err(ConfigError::Invalid {
                key: "SWAP_BACKOFF_MULTIPLIER",
                value: self.backoff.backoff_factor.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Process environment is shared across test threads.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    const KEYS: [&str; 4] = [
        "SWAP_MAX_ATTEMPTS",
        "SWAP_SLIPPAGE_STEP_BPS",
        "SWAP_SLIPPAGE_CEILING_BPS",
        "SWAP_BACKOFF_MULTIPLIER",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();

        let config = ExecutorConfig::load_from_env().unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.slippage.ceiling_bps, 1_000);
    }

    #[test]
    fn reads_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();
        env::set_var("SWAP_MAX_ATTEMPTS", "5");
        env::set_var("SWAP_SLIPPAGE_STEP_BPS", "150");

        let config = ExecutorConfig::load_from_env().unwrap();
        clear();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.slippage.step_bps, 150);
    }

    #[test]
    fn rejects_malformed_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();
        env::set_var("SWAP_MAX_ATTEMPTS", "three");
        let err = ExecutorConfig::load_from_env().unwrap_err();
        clear();
        assert!(matches!(err, ConfigError::Invalid { key: "SWAP_MAX_ATTEMPTS", .. }));

        env::set_var("SWAP_SLIPPAGE_CEILING_BPS", "2500");
        let err = ExecutorConfig::load_from_env().unwrap_err();
        clear();
        assert!(matches!(err, ConfigError::Invalid { key: "SWAP_SLIPPAGE_CEILING_BPS", .. }));
    }

    #[test]
    fn required_value_errors_name_the_variable() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        const KEY: &str = "SWAP_TEST_REQUIRED_AMOUNT";

        env::remove_var(KEY);
        let missing = env_parsed::<u64>(KEY).unwrap_err();
        assert!(matches!(missing, ConfigError::Missing(KEY)));
        assert_eq!(missing.to_string(), "missing environment variable SWAP_TEST_REQUIRED_AMOUNT");

        env::set_var(KEY, "1e9");
        let invalid = env_parsed::<u64>(KEY).unwrap_err();
        env::remove_var(KEY);
        assert_eq!(invalid.to_string(), "invalid value for SWAP_TEST_REQUIRED_AMOUNT: '1e9'");

        env::set_var(KEY, " 250000 ");
        let parsed = env_parsed::<u64>(KEY);
        env::remove_var(KEY);
        assert_eq!(parsed.unwrap(), 250_000);
    }
}
