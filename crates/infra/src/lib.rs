//! Infrastructure layer: configuration, data stores, and the application service.

pub mod config;
pub mod marketplace;
pub mod store;

mod integration_tests;

pub use config::{AppConfig, ConfigError, StorageConfig};
pub use marketplace::{Marketplace, SaleProductDetail, ServiceError, ServiceResult};
pub use store::{InMemoryMarketStore, MarketStore, PostgresMarketStore, StoreError, StoreResult};
