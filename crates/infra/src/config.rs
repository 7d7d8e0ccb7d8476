//! Coordinator configuration, loaded from the environment.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `COUNTOPS_AUDIT_TIMEOUT_MS` | `2000` | bound on the durable audit write |
//! | `COUNTOPS_REGISTRY_SHARDS` | dashmap default | registry shard count (power of two, 2 to 1024) |

use std::time::Duration;

use thiserror::Error;

use crate::audit::{AlertChannel, AuditLogger, AuditStore, FallbackSink};
use crate::registry::RunRegistry;

pub const AUDIT_TIMEOUT_VAR: &str = "COUNTOPS_AUDIT_TIMEOUT_MS";
pub const REGISTRY_SHARDS_VAR: &str = "COUNTOPS_REGISTRY_SHARDS";

/// Upper bound on registry shards; each shard is allocated up front.
pub const MAX_REGISTRY_SHARDS: usize = 1024;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an unsigned integer, got '{value}'")]
    NotANumber { var: &'static str, value: String },

    #[error("audit write timeout must be greater than zero")]
    ZeroTimeout,

    #[error(
        "registry shard count must be a power of two between 2 and {}, got {0}",
        MAX_REGISTRY_SHARDS
    )]
    InvalidShardCount(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub audit_write_timeout: Duration,
    pub registry_shards: Option<usize>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            audit_write_timeout: crate::audit::logger::DEFAULT_WRITE_TIMEOUT,
            registry_shards: None,
        }
    }
}

impl CoordinatorConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = parse_var(&lookup, AUDIT_TIMEOUT_VAR)? {
            config.audit_write_timeout = Duration::from_millis(ms);
        }
        if let Some(shards) = parse_var(&lookup, REGISTRY_SHARDS_VAR)? {
            let shards = usize::try_from(shards).unwrap_or(usize::MAX);
            config.registry_shards = Some(shards);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_audit_write_timeout(mut self, timeout: Duration) -> Self {
        self.audit_write_timeout = timeout;
        self
    }

    pub fn with_registry_shards(mut self, shards: usize) -> Self {
        self.registry_shards = Some(shards);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit_write_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(shards) = self.registry_shards {
            if !(2..=MAX_REGISTRY_SHARDS).contains(&shards) || !shards.is_power_of_two() {
                return Err(ConfigError::InvalidShardCount(shards));
            }
        }
        Ok(())
    }

    pub fn build_registry(&self) -> Result<RunRegistry, ConfigError> {
        self.validate()?;
        Ok(match self.registry_shards {
            Some(shards) => RunRegistry::with_shard_amount(shards),
            None => RunRegistry::new(),
        })
    }

    /// Apply the configured write timeout to an audit logger.
    pub fn configure_audit<S, F, A>(&self, logger: AuditLogger<S, F, A>) -> AuditLogger<S, F, A>
    where
        S: AuditStore,
        F: FallbackSink,
        A: AlertChannel,
    {
        logger.with_write_timeout(self.audit_write_timeout)
    }
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { var, value: raw }),
    }
}
