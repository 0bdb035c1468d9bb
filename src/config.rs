// Ledger configuration, read from the environment (and .env when present)

use crate::error::{MarketError, MarketResult};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATA_DIR: &str = "data/ledger";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:1234";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fraction of the losing pool kept by the platform
    pub fee_rate: Decimal,
    /// None keeps the ledger in memory only
    pub data_dir: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    /// Required in `x-admin-key` on close/resolve/void; unset disables them
    pub admin_key: Option<String>,
    pub log_level: tracing::Level,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_rate: Decimal::ZERO,
            data_dir: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 1234)),
            admin_key: None,
            log_level: tracing::Level::INFO,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> MarketResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> MarketResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fee_rate = match lookup("PLATFORM_FEE_RATE") {
            Some(raw) => Decimal::from_str(raw.trim())
                .map_err(|e| MarketError::InvalidConfig(format!("PLATFORM_FEE_RATE {:?}: {}", raw, e)))?,
            None => Decimal::ZERO,
        };
        if fee_rate < Decimal::ZERO || fee_rate >= Decimal::ONE {
            return Err(MarketError::InvalidConfig(format!(
                "PLATFORM_FEE_RATE must be in [0, 1), got {}",
                fee_rate
            )));
        }

        let data_dir = match lookup("LEDGER_DATA_DIR") {
            Some(dir) if dir.trim().is_empty() => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => Some(PathBuf::from(DEFAULT_DATA_DIR)),
        };

        let raw_addr = lookup("LEDGER_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|e| MarketError::InvalidConfig(format!("LEDGER_BIND_ADDR {:?}: {}", raw_addr, e)))?;

        let admin_key = lookup("LEDGER_ADMIN_KEY").filter(|k| !k.is_empty());

        let raw_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_level = tracing::Level::from_str(&raw_level)
            .map_err(|_| MarketError::InvalidConfig(format!("LOG_LEVEL {:?}", raw_level)))?;

        Ok(Self { fee_rate, data_dir, bind_addr, admin_key, log_level })
    }
}
