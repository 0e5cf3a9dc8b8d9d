//! Data store abstraction for buyers, stores, sale products and orders.
//!
//! Every decision point in the application maps to exactly one call on
//! [`MarketStore`]. Existence checks are derived from the returned
//! `Option`/`Vec` rather than a second query.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use thirtyone_catalog::{ProductCategory, SaleProduct, SearchKeyword, SearchResults, Store};
use thirtyone_core::{BuyerId, DomainError, OrderId, SaleProductId, StoreId};
use thirtyone_parties::Buyer;
use thirtyone_sales::{Order, PlaceOrder, StockPolicy};

use crate::config::StorageConfig;

pub use in_memory::InMemoryMarketStore;
pub use postgres::PostgresMarketStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A domain rule rejected an operation evaluated inside the store's atomic scope.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A persisted row could not be mapped back into a domain value.
    #[error("corrupt {table} row: {message}")]
    Corrupt { table: &'static str, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for the marketplace.
///
/// Listing methods return records in creation order.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn insert_buyer(&self, buyer: &Buyer) -> StoreResult<()>;

    async fn buyer(&self, id: BuyerId) -> StoreResult<Option<Buyer>>;

    async fn insert_store(&self, store: &Store) -> StoreResult<()>;

    async fn store(&self, id: StoreId) -> StoreResult<Option<Store>>;

    /// Fails with `Rejected(NotFound)` when the owning store does not exist.
    async fn insert_sale_product(&self, product: &SaleProduct) -> StoreResult<()>;

    async fn sale_product(&self, id: SaleProductId) -> StoreResult<Option<SaleProduct>>;

    async fn sale_products_by_category(
        &self,
        category: ProductCategory,
    ) -> StoreResult<Vec<SaleProduct>>;

    async fn sale_products_by_store(&self, store_id: StoreId) -> StoreResult<Vec<SaleProduct>>;

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    async fn orders_by_buyer(&self, buyer_id: BuyerId) -> StoreResult<Vec<Order>>;

    /// Resolve a keyword search against one consistent view of the catalog.
    async fn search_catalog(&self, keyword: &SearchKeyword) -> StoreResult<SearchResults>;

    /// Validate and persist an order as one atomic unit.
    ///
    /// The product is re-read under the store's write guard, checked with
    /// [`Order::place`], the buyer is checked to exist, `policy` is applied
    /// and the order inserted. Concurrent placements against the same product
    /// are serialized.
    async fn place_order(
        &self,
        order_id: OrderId,
        cmd: &PlaceOrder,
        policy: StockPolicy,
        now: DateTime<Utc>,
    ) -> StoreResult<Order>;
}

/// Open the configured backend.
pub async fn open(config: &StorageConfig) -> StoreResult<Arc<dyn MarketStore>> {
    match config {
        StorageConfig::InMemory => {
            tracing::info!(backend = "in_memory", "opening market store");
            Ok(Arc::new(InMemoryMarketStore::new()))
        }
        StorageConfig::Postgres {
            database_url,
            max_connections,
        } => {
            tracing::info!(backend = "postgres", max_connections, "opening market store");
            let store = PostgresMarketStore::connect(database_url, *max_connections).await?;
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}
