use crate::domain::Address;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_URL: &str = "https://api.hyperliquid.xyz";
pub const DEFAULT_DATASOURCE_TYPE: &str = "hyperliquid";
pub const DEFAULT_FILLS_TTL_MS: u64 = 60_000;
pub const DEFAULT_CLEARINGHOUSE_TTL_MS: u64 = 5_000;
pub const DEFAULT_MAX_START_CAPITAL: f64 = 1_000_000.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub datasource_type: String,
    pub hyperliquid_api_url: String,
    pub target_builder: Option<Address>,
    pub fills_ttl_ms: u64,
    pub clearinghouse_ttl_ms: u64,
    pub max_start_capital: f64,
    pub log_level: String,
    pub seed_users: Vec<Address>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let datasource_type = env_map
            .get("DATASOURCE_TYPE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DATASOURCE_TYPE.to_string());

        let hyperliquid_api_url = env_map
            .get("HYPERLIQUID_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let target_builder = match env_map.get("TARGET_BUILDER").map(|s| s.trim()) {
            Some("") | None => None,
            Some(raw) => Some(Address::from_str(raw).map_err(|e| {
                ConfigError::InvalidValue("TARGET_BUILDER".to_string(), e.to_string())
            })?),
        };

        let fills_ttl_ms = parse_u64(&env_map, "CACHE_FILLS_TTL_MS", DEFAULT_FILLS_TTL_MS)?;
        let clearinghouse_ttl_ms = parse_u64(
            &env_map,
            "CACHE_CLEARINGHOUSE_TTL_MS",
            DEFAULT_CLEARINGHOUSE_TTL_MS,
        )?;

        let max_start_capital = match env_map.get("MAX_START_CAPITAL") {
            None => DEFAULT_MAX_START_CAPITAL,
            Some(raw) => {
                let value = raw.parse::<f64>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "MAX_START_CAPITAL".to_string(),
                        "must be a number".to_string(),
                    )
                })?;
                if !value.is_finite() || value <= 0.0 {
                    return Err(ConfigError::InvalidValue(
                        "MAX_START_CAPITAL".to_string(),
                        "must be positive".to_string(),
                    ));
                }
                value
            }
        };

        let log_level = env_map
            .get("LOG_LEVEL")
            .cloned()
            .unwrap_or_else(|| "info".to_string());

        let seed_users = parse_seed_users(&env_map)?;

        Ok(Config {
            port,
            datasource_type,
            hyperliquid_api_url,
            target_builder,
            fills_ttl_ms,
            clearinghouse_ttl_ms,
            max_start_capital,
            log_level,
            seed_users,
        })
    }
}

fn parse_u64(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a non-negative integer".to_string())
        }),
    }
}

fn parse_seed_users(env_map: &HashMap<String, String>) -> Result<Vec<Address>, ConfigError> {
    let Some(raw) = env_map.get("LEADERBOARD_USERS") else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Address::from_str(s).map_err(|e| {
                ConfigError::InvalidValue("LEADERBOARD_USERS".to_string(), e.to_string())
            })
        })
        .collect()
}
