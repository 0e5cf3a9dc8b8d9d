//! Configuration loading and representation.
//!
//! Everything is read from environment variables:
//!
//! | Variable | Default |
//! |---|---|
//! | `BIND_ADDR` | `0.0.0.0:8080` |
//! | `USE_PERSISTENT_STORES` | `false` |
//! | `DATABASE_URL` | required when persistent |
//! | `DATABASE_MAX_CONNECTIONS` | `5` |
//! | `STOCK_POLICY` | `unchanged` |

use std::net::SocketAddr;

use thiserror::Error;

use thirtyone_sales::StockPolicy;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be set when {reason}")]
    Missing {
        name: &'static str,
        reason: &'static str,
    },

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Which data store backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub stock_policy: StockPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let persistent = match var("USE_PERSISTENT_STORES") {
            Some(v) => parse_flag("USE_PERSISTENT_STORES", &v)?,
            None => false,
        };

        let storage = if persistent {
            let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing {
                name: "DATABASE_URL",
                reason: "USE_PERSISTENT_STORES=true",
            })?;
            let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
                Some(v) => v
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConfigError::Invalid {
                        name: "DATABASE_MAX_CONNECTIONS",
                        message: format!("expected a positive integer, got {v:?}"),
                    })?,
                None => DEFAULT_MAX_CONNECTIONS,
            };
            StorageConfig::Postgres {
                database_url,
                max_connections,
            }
        } else {
            StorageConfig::InMemory
        };

        let stock_policy = match var("STOCK_POLICY") {
            Some(v) => v.parse::<StockPolicy>().map_err(|e| ConfigError::Invalid {
                name: "STOCK_POLICY",
                message: e.to_string(),
            })?,
            None => StockPolicy::default(),
        };

        Ok(Self {
            bind_addr,
            storage,
            stock_policy,
        })
    }

    /// In-memory configuration on an ephemeral loopback port (tests/dev).
    pub fn in_memory() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            storage: StorageConfig::InMemory,
            stock_policy: StockPolicy::default(),
        }
    }

    pub fn with_stock_policy(mut self, stock_policy: StockPolicy) -> Self {
        self.stock_policy = stock_policy;
        self
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            message: format!("expected true/false, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_to_in_memory_without_decrement() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.storage, StorageConfig::InMemory);
        assert_eq!(cfg.stock_policy, StockPolicy::Unchanged);
    }

    #[test]
    fn persistent_requires_database_url() {
        let err = load(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                name: "DATABASE_URL",
                reason: "USE_PERSISTENT_STORES=true",
            }
        );
    }

    #[test]
    fn persistent_reads_pool_size() {
        let cfg = load(&[
            ("USE_PERSISTENT_STORES", "1"),
            ("DATABASE_URL", "postgres://localhost/thirtyone"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();
        assert_eq!(
            cfg.storage,
            StorageConfig::Postgres {
                database_url: "postgres://localhost/thirtyone".to_string(),
                max_connections: 12,
            }
        );
    }

    #[test]
    fn zero_pool_size_is_invalid() {
        let err = load(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/thirtyone"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DATABASE_MAX_CONNECTIONS", .. }));
    }

    #[test]
    fn stock_policy_and_bind_addr_are_parsed() {
        let cfg = load(&[("STOCK_POLICY", "decrement"), ("BIND_ADDR", "127.0.0.1:9000")]).unwrap();
        assert_eq!(cfg.stock_policy, StockPolicy::Decrement);
        assert_eq!(cfg.bind_addr.port(), 9000);
    }

    #[test]
    fn in_memory_config_binds_ephemeral_loopback() {
        let cfg = AppConfig::in_memory().with_stock_policy(StockPolicy::Decrement);
        assert_eq!(cfg.storage, StorageConfig::InMemory);
        assert_eq!(cfg.stock_policy, StockPolicy::Decrement);
        assert!(cfg.bind_addr.ip().is_loopback());
        assert_eq!(cfg.bind_addr.port(), 0);
    }

    #[test]
    fn garbage_values_are_rejected() {
        assert!(matches!(
            load(&[("USE_PERSISTENT_STORES", "maybe")]).unwrap_err(),
            ConfigError::Invalid { name: "USE_PERSISTENT_STORES", .. }
        ));
        assert!(matches!(
            load(&[("STOCK_POLICY", "reserve")]).unwrap_err(),
            ConfigError::Invalid { name: "STOCK_POLICY", .. }
        ));
        assert!(matches!(
            load(&[("BIND_ADDR", "localhost")]).unwrap_err(),
            ConfigError::Invalid { name: "BIND_ADDR", .. }
        ));
    }
}
