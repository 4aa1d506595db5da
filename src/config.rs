use anyhow::{Result, anyhow};
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub client_base_url: String,
    /// Offset of the local zone whose calendar days drive document expiry.
    pub local_utc_offset_minutes: i32,
    pub near_expiry_days: i64,
    pub sweep_interval_secs: u64,
    pub outbox_relay_interval_secs: u64,
    pub outbox_batch_size: i64,
    /// How long a relay pass owns the rows it claimed before another pass may take them.
    pub outbox_claim_lease_secs: u64,
    pub unit_of_work_timeout_secs: u64,
    pub event_channel_capacity: usize,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let config = Config {
            database_url: var_or(
                "DATABASE_URL",
                "postgres://postgres@localhost:5432/guardsched",
            ),
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10),
            host: var_or("HOST", "127.0.0.1"),
            port: parsed_or("PORT", 8080),
            environment: var_or("ENVIRONMENT", "development"),
            client_base_url: var_or("BASE_URL", "http://localhost:3000"),
            local_utc_offset_minutes: parsed_or("LOCAL_UTC_OFFSET_MINUTES", 420),
            near_expiry_days: parsed_or("NEAR_EXPIRY_DAYS", 7),
            sweep_interval_secs: parsed_or("SWEEP_INTERVAL_SECS", 3600),
            outbox_relay_interval_secs: parsed_or("OUTBOX_RELAY_INTERVAL_SECS", 10),
            outbox_batch_size: parsed_or("OUTBOX_BATCH_SIZE", 100),
            outbox_claim_lease_secs: parsed_or("OUTBOX_CLAIM_LEASE_SECS", 300),
            unit_of_work_timeout_secs: parsed_or("UNIT_OF_WORK_TIMEOUT_SECS", 30),
            event_channel_capacity: parsed_or("EVENT_CHANNEL_CAPACITY", 1024),
        };

        config.local_offset()?;
        Ok(config)
    }

    pub fn test_config() -> Self {
        Config {
            database_url: "postgres://postgres@localhost:5432/guardsched_test".to_string(),
            database_max_connections: 2,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            client_base_url: "http://localhost:3000".to_string(),
            local_utc_offset_minutes: 420,
            near_expiry_days: 7,
            sweep_interval_secs: 3600,
            outbox_relay_interval_secs: 10,
            outbox_batch_size: 100,
            outbox_claim_lease_secs: 60,
            unit_of_work_timeout_secs: 5,
            event_channel_capacity: 64,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn local_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.local_utc_offset_minutes * 60).ok_or_else(|| {
            anyhow!(
                "LOCAL_UTC_OFFSET_MINUTES out of range: {}",
                self.local_utc_offset_minutes
            )
        })
    }

    pub fn unit_of_work_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_of_work_timeout_secs)
    }

    pub fn outbox_claim_lease(&self) -> Duration {
        Duration::from_secs(self.outbox_claim_lease_secs.max(1))
    }
}
