use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use thirtyone_catalog::{ProductCategory, SaleProduct, SearchKeyword, SearchResults, Store};
use thirtyone_core::{BuyerId, DomainError, Entity, OrderId, SaleProductId, StoreId};
use thirtyone_parties::Buyer;
use thirtyone_sales::{Order, PlaceOrder, StockPolicy};

use super::{MarketStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    buyers: HashMap<BuyerId, Buyer>,
    stores: HashMap<StoreId, Store>,
    products: HashMap<SaleProductId, SaleProduct>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory market store.
///
/// Intended for tests/dev. All tables sit behind one lock, so every
/// operation sees a consistent snapshot and `place_order` is atomic.
#[derive(Debug, Default)]
pub struct InMemoryMarketStore {
    tables: RwLock<Tables>,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

/// Insert or replace `record` under its entity id.
fn put<E: Entity + Clone>(table: &mut HashMap<E::Id, E>, record: &E) {
    table.insert(record.id(), record.clone());
}

fn products_sorted<'a>(products: impl Iterator<Item = &'a SaleProduct>) -> Vec<SaleProduct> {
    let mut out: Vec<SaleProduct> = products.cloned().collect();
    out.sort_by_key(|p| (p.created_at, p.id));
    out
}

fn stores_sorted<'a>(stores: impl Iterator<Item = &'a Store>) -> Vec<Store> {
    let mut out: Vec<Store> = stores.cloned().collect();
    out.sort_by_key(|s| (s.created_at, s.id));
    out
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn insert_buyer(&self, buyer: &Buyer) -> StoreResult<()> {
        put(&mut self.write()?.buyers, buyer);
        Ok(())
    }

    async fn buyer(&self, id: BuyerId) -> StoreResult<Option<Buyer>> {
        Ok(self.read()?.buyers.get(&id).cloned())
    }

    async fn insert_store(&self, store: &Store) -> StoreResult<()> {
        put(&mut self.write()?.stores, store);
        Ok(())
    }

    async fn store(&self, id: StoreId) -> StoreResult<Option<Store>> {
        Ok(self.read()?.stores.get(&id).cloned())
    }

    async fn insert_sale_product(&self, product: &SaleProduct) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.stores.contains_key(&product.store_id) {
            return Err(DomainError::not_found("store not found").into());
        }
        put(&mut tables.products, product);
        Ok(())
    }

    async fn sale_product(&self, id: SaleProductId) -> StoreResult<Option<SaleProduct>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn sale_products_by_category(
        &self,
        category: ProductCategory,
    ) -> StoreResult<Vec<SaleProduct>> {
        let tables = self.read()?;
        Ok(products_sorted(
            tables.products.values().filter(|p| p.product_type == category),
        ))
    }

    async fn sale_products_by_store(&self, store_id: StoreId) -> StoreResult<Vec<SaleProduct>> {
        let tables = self.read()?;
        Ok(products_sorted(
            tables.products.values().filter(|p| p.store_id == store_id),
        ))
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn orders_by_buyer(&self, buyer_id: BuyerId) -> StoreResult<Vec<Order>> {
        let tables = self.read()?;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn search_catalog(&self, keyword: &SearchKeyword) -> StoreResult<SearchResults> {
        let tables = self.read()?;
        let stores = stores_sorted(tables.stores.values());
        let products = products_sorted(tables.products.values());
        Ok(SearchResults::resolve(keyword, &stores, &products))
    }

    async fn place_order(
        &self,
        order_id: OrderId,
        cmd: &PlaceOrder,
        policy: StockPolicy,
        now: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let mut tables = self.write()?;

        let mut product = tables
            .products
            .get(&cmd.sale_product_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("sale product not found"))?;

        let order = Order::place(order_id, cmd, &product, now)?;

        if !tables.buyers.contains_key(&cmd.buyer_id) {
            return Err(DomainError::invalid_input("buyer does not exist").into());
        }

        if policy.settle(&mut product, &order)? {
            put(&mut tables.products, &product);
        }
        put(&mut tables.orders, &order);
        Ok(order)
    }
}
