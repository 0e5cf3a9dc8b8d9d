//! Application service for the marketplace.
//!
//! `Marketplace` sits between the HTTP layer and the [`MarketStore`]. It
//! parses and validates inputs into domain values, calls the store once per
//! decision point, and maps failures into [`ServiceError`].
//!
//! ```text
//! request DTO
//!   ↓
//! 1. Parse / validate (domain constructors)
//!   ↓
//! 2. Store call (atomic for order placement)
//!   ↓
//! 3. Domain value or ServiceError
//! ```

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use thirtyone_catalog::{
    NewSaleProduct, NewStore, ProductCategory, SaleProduct, SearchKeyword, SearchResults, Store,
};
use thirtyone_core::{BuyerId, DomainError, OrderId, SaleProductId, StoreId};
use thirtyone_parties::{Buyer, NewBuyer};
use thirtyone_sales::{Order, PlaceOrder, StockPolicy};

use crate::store::{MarketStore, StoreError};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Deterministic business failure (bad input, stock, missing record).
    #[error(transparent)]
    Domain(DomainError),

    /// The data store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        ServiceError::Domain(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Rejected(e) => ServiceError::Domain(e),
            other => ServiceError::Store(other),
        }
    }
}

/// A sale product together with its owning store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleProductDetail {
    pub product: SaleProduct,
    pub store: Store,
}

pub struct Marketplace<S: MarketStore + ?Sized = dyn MarketStore> {
    store: Arc<S>,
    stock_policy: StockPolicy,
}

impl<S: MarketStore + ?Sized> Clone for Marketplace<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            stock_policy: self.stock_policy,
        }
    }
}

impl<S: MarketStore + ?Sized> Marketplace<S> {
    pub fn new(store: Arc<S>, stock_policy: StockPolicy) -> Self {
        Self {
            store,
            stock_policy,
        }
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    pub async fn register_buyer(&self, request: NewBuyer) -> ServiceResult<Buyer> {
        let buyer = Buyer::register(BuyerId::new(), request, Utc::now())?;
        self.store.insert_buyer(&buyer).await?;
        tracing::info!(buyer_id = %buyer.id, "buyer registered");
        Ok(buyer)
    }

    pub async fn buyer(&self, id: BuyerId) -> ServiceResult<Buyer> {
        self.store
            .buyer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("buyer not found").into())
    }

    pub async fn open_store(&self, request: NewStore) -> ServiceResult<Store> {
        let store = Store::open(StoreId::new(), request, Utc::now())?;
        self.store.insert_store(&store).await?;
        tracing::info!(store_id = %store.id, "store opened");
        Ok(store)
    }

    pub async fn store(&self, id: StoreId) -> ServiceResult<Store> {
        self.store
            .store(id)
            .await?
            .ok_or_else(|| DomainError::not_found("store not found").into())
    }

    /// List a new sale product under an existing store.
    pub async fn list_sale_product(
        &self,
        store_id: StoreId,
        request: NewSaleProduct,
    ) -> ServiceResult<SaleProduct> {
        let product = SaleProduct::list(SaleProductId::new(), store_id, request, Utc::now())?;
        self.store.insert_sale_product(&product).await?;
        tracing::info!(
            sale_product_id = %product.id,
            store_id = %store_id,
            product_type = %product.product_type,
            "sale product listed"
        );
        Ok(product)
    }

    /// Place an order. The store is derived from the product; stock is
    /// checked and the order persisted atomically.
    pub async fn place_order(&self, cmd: PlaceOrder) -> ServiceResult<Order> {
        let placed = self
            .store
            .place_order(OrderId::new(), &cmd, self.stock_policy, Utc::now())
            .await;

        match placed {
            Ok(order) => {
                tracing::info!(
                    order_id = %order.id,
                    buyer_id = %order.buyer_id,
                    sale_product_id = %order.sale_product_id,
                    store_id = %order.store_id,
                    amount = order.amount,
                    "order placed"
                );
                Ok(order)
            }
            Err(StoreError::Rejected(e)) => {
                tracing::info!(
                    sale_product_id = %cmd.sale_product_id,
                    buyer_id = %cmd.buyer_id,
                    quantity = cmd.quantity.get(),
                    reason = %e,
                    "order rejected"
                );
                Err(ServiceError::Domain(e))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn order(&self, id: OrderId) -> ServiceResult<Order> {
        self.store
            .order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order not found").into())
    }

    /// All orders placed by `buyer_id`. No existence check on the buyer.
    pub async fn orders_for_buyer(&self, buyer_id: BuyerId) -> ServiceResult<Vec<Order>> {
        Ok(self.store.orders_by_buyer(buyer_id).await?)
    }

    /// Sale products in a category, given its raw code.
    pub async fn products_in_category(&self, code: &str) -> ServiceResult<Vec<SaleProduct>> {
        let category: ProductCategory = code.parse()?;
        Ok(self.store.sale_products_by_category(category).await?)
    }

    pub async fn sale_product_detail(&self, id: SaleProductId) -> ServiceResult<SaleProductDetail> {
        let product = self
            .store
            .sale_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("sale product not found"))?;
        let store = self.store.store(product.store_id).await?.ok_or_else(|| {
            StoreError::Corrupt {
                table: "sale_products",
                message: format!("sale product {} references missing store {}", product.id, product.store_id),
            }
        })?;
        Ok(SaleProductDetail { product, store })
    }

    /// Listings of one store.
    ///
    /// A missing store and a store with no listings are both `NotFound`,
    /// with distinct messages.
    pub async fn products_for_store(&self, store_id: StoreId) -> ServiceResult<Vec<SaleProduct>> {
        if self.store.store(store_id).await?.is_none() {
            return Err(DomainError::not_found("store not found").into());
        }
        let products = self.store.sale_products_by_store(store_id).await?;
        if products.is_empty() {
            return Err(DomainError::not_found("no sale products listed for this store").into());
        }
        Ok(products)
    }

    /// Keyword search. An absent or empty keyword resolves to `Empty`
    /// without touching the store.
    pub async fn search(&self, query: Option<&str>) -> ServiceResult<SearchResults> {
        let Some(keyword) = SearchKeyword::parse(query) else {
            return Ok(SearchResults::Empty);
        };
        let results = self.store.search_catalog(&keyword).await?;
        tracing::debug!(
            keyword = keyword.as_str(),
            kind = results.kind(),
            count = results.len(),
            "search resolved"
        );
        Ok(results)
    }
}
