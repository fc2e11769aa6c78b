use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub log_level: tracing::Level,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Well-known pay items used for ad-hoc ledger lines
    pub bonus_item_name: String,
    pub deduction_item_name: String,

    pub manager_cache_ttl_secs: u64,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn or_default<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{} is malformed", key))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            log_level: or_default("LOG_LEVEL", "debug")?,

            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            bonus_item_name: or_default("BONUS_ITEM_NAME", "Bonus")?,
            deduction_item_name: or_default("DEDUCTION_ITEM_NAME", "Deduction")?,

            manager_cache_ttl_secs: or_default("MANAGER_CACHE_TTL_SECS", "3600")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_log_level_is_an_error() {
        // SAFETY: the key is only touched by this test
        unsafe { env::set_var("PAYLEDGER_TEST_LOG_LEVEL", "loud") };
        let err = or_default::<tracing::Level>("PAYLEDGER_TEST_LOG_LEVEL", "debug").unwrap_err();
        assert!(err.to_string().contains("PAYLEDGER_TEST_LOG_LEVEL is malformed"));

        unsafe { env::set_var("PAYLEDGER_TEST_LOG_LEVEL", "warn") };
        let level: tracing::Level = or_default("PAYLEDGER_TEST_LOG_LEVEL", "debug").unwrap();
        assert_eq!(level, tracing::Level::WARN);
    }

    #[test]
    fn missing_values_fall_back_to_the_default() {
        let level: tracing::Level = or_default("PAYLEDGER_TEST_UNSET_LEVEL", "debug").unwrap();
        assert_eq!(level, tracing::Level::DEBUG);
    }
}
