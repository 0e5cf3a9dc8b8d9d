//! Postgres-backed market store.
//!
//! ## Error Mapping
//!
//! | SQLx error | Code | StoreError |
//! |---|---|---|
//! | Database (foreign key violation) on sale product insert | `23503` | `Rejected(NotFound)` |
//! | Database (other) | any | `Database` |
//! | PoolClosed / PoolTimedOut | n/a | `Unavailable` |
//! | Other | n/a | `Database` |
//!
//! ## Atomicity
//!
//! `place_order` runs in one transaction and locks the product row with
//! `SELECT ... FOR UPDATE`, so the stock check, optional decrement and
//! insert cannot interleave with another placement on the same product.
//! `search_catalog` reads inside a `REPEATABLE READ` read-only transaction.
//!
//! ## Search folding
//!
//! The keyword is lowercased in Rust and compared against `lower(column)`
//! with `LIKE`, so both sides fold case the same way for ordinary text.
//! Postgres `lower()` maps one code point at a time under the database
//! locale, whereas `str::to_lowercase` applies full Unicode mappings. Names
//! whose lowercase form expands (e.g. `U+0130`, dotted capital I) can be
//! dropped by the pre-filter even though the in-memory store matches them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};
use uuid::Uuid;

use thirtyone_catalog::{ProductCategory, SaleProduct, SearchKeyword, SearchResults, Store};
use thirtyone_core::{BuyerId, DomainError, OrderId, SaleProductId, StoreId};
use thirtyone_parties::{Buyer, ContactInfo};
use thirtyone_sales::{Order, PlaceOrder, StockPolicy};

use super::{MarketStore, StoreError, StoreResult};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS buyers (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stores (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        store_type TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sale_products (
        id UUID PRIMARY KEY,
        store_id UUID NOT NULL REFERENCES stores (id),
        name TEXT NOT NULL,
        product_type TEXT NOT NULL
            CHECK (product_type IN ('FRV', 'BUT', 'BAK', 'SID', 'SEA', 'RIC', 'SNA')),
        amount BIGINT NOT NULL CHECK (amount >= 0),
        price BIGINT NOT NULL CHECK (price >= 0),
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS sale_products_store_idx ON sale_products (store_id)",
    "CREATE INDEX IF NOT EXISTS sale_products_type_idx ON sale_products (product_type)",
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        buyer_id UUID NOT NULL REFERENCES buyers (id),
        sale_product_id UUID NOT NULL REFERENCES sale_products (id),
        store_id UUID NOT NULL REFERENCES stores (id),
        amount BIGINT NOT NULL CHECK (amount > 0),
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_buyer_idx ON orders (buyer_id)",
];

const PRODUCT_COLUMNS: &str =
    "id, store_id, name, product_type, amount, price, description, created_at";

/// Postgres-backed market store.
///
/// Uses a SQLx connection pool (`Send + Sync`); clone freely.
#[derive(Debug, Clone)]
pub struct PostgresMarketStore {
    pool: Arc<PgPool>,
}

impl PostgresMarketStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn list_products(
        &self,
        operation: &'static str,
        filter: ProductFilter,
    ) -> StoreResult<Vec<SaleProduct>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM sale_products WHERE {} ORDER BY created_at, id",
            filter.clause()
        );
        let query = sqlx::query(&sql);
        let query = match filter {
            ProductFilter::Category(category) => query.bind(category.code()),
            ProductFilter::Store(store_id) => query.bind(*store_id.as_uuid()),
        };
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.iter().map(product_from_row).collect()
    }
}

/// Single-key filters for product listings.
#[derive(Debug, Clone, Copy)]
enum ProductFilter {
    Category(ProductCategory),
    Store(StoreId),
}

impl ProductFilter {
    fn clause(self) -> &'static str {
        match self {
            ProductFilter::Category(_) => "product_type = $1",
            ProductFilter::Store(_) => "store_id = $1",
        }
    }
}

#[async_trait]
impl MarketStore for PostgresMarketStore {
    #[instrument(skip(self, buyer), fields(buyer_id = %buyer.id), err)]
    async fn insert_buyer(&self, buyer: &Buyer) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO buyers (id, name, email, phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(buyer.id.as_uuid())
        .bind(&buyer.name)
        .bind(&buyer.contact.email)
        .bind(&buyer.contact.phone)
        .bind(&buyer.contact.address)
        .bind(buyer.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_buyer", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn buyer(&self, id: BuyerId) -> StoreResult<Option<Buyer>> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, address, created_at FROM buyers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_buyer", e))?;
        row.as_ref().map(buyer_from_row).transpose()
    }

    #[instrument(skip(self, store), fields(store_id = %store.id), err)]
    async fn insert_store(&self, store: &Store) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO stores (id, name, store_type, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(store.id.as_uuid())
        .bind(&store.name)
        .bind(&store.store_type)
        .bind(store.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_store", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn store(&self, id: StoreId) -> StoreResult<Option<Store>> {
        let row = sqlx::query("SELECT id, name, store_type, created_at FROM stores WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_store", e))?;
        row.as_ref().map(store_from_row).transpose()
    }

    #[instrument(skip(self, product), fields(sale_product_id = %product.id, store_id = %product.store_id), err)]
    async fn insert_sale_product(&self, product: &SaleProduct) -> StoreResult<()> {
        let price = i64::try_from(product.price)
            .map_err(|_| DomainError::invalid_input("price is too large"))?;
        sqlx::query(
            r#"
            INSERT INTO sale_products
                (id, store_id, name, product_type, amount, price, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.store_id.as_uuid())
        .bind(&product.name)
        .bind(product.product_type.code())
        .bind(i64::from(product.amount))
        .bind(price)
        .bind(&product.description)
        .bind(product.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::Rejected(DomainError::not_found("store not found"))
            } else {
                map_sqlx_error("insert_sale_product", e)
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn sale_product(&self, id: SaleProductId) -> StoreResult<Option<SaleProduct>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM sale_products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_sale_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn sale_products_by_category(
        &self,
        category: ProductCategory,
    ) -> StoreResult<Vec<SaleProduct>> {
        self.list_products("list_by_category", ProductFilter::Category(category))
            .await
    }

    #[instrument(skip(self), err)]
    async fn sale_products_by_store(&self, store_id: StoreId) -> StoreResult<Vec<SaleProduct>> {
        self.list_products("list_by_store", ProductFilter::Store(store_id))
            .await
    }

    #[instrument(skip(self), err)]
    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, buyer_id, sale_product_id, store_id, amount, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?;
        row.as_ref().map(order_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn orders_by_buyer(&self, buyer_id: BuyerId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, buyer_id, sale_product_id, store_id, amount, created_at
            FROM orders
            WHERE buyer_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(buyer_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders_by_buyer", e))?;
        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self, keyword), fields(keyword = %keyword.as_str(), kind = tracing::field::Empty), err)]
    async fn search_catalog(&self, keyword: &SearchKeyword) -> StoreResult<SearchResults> {
        let pattern = like_pattern(keyword.folded());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        // The LIKE is the coarse filter; `SearchResults::resolve` applies the
        // exact matching and tier order.
        let store_rows = sqlx::query(
            r#"
            SELECT id, name, store_type, created_at
            FROM stores
            WHERE lower(name) LIKE $1 ESCAPE '\' OR lower(store_type) LIKE $1 ESCAPE '\'
            ORDER BY created_at, id
            "#,
        )
        .bind(&pattern)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("search_stores", e))?;
        let stores = store_rows
            .iter()
            .map(store_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        let no_products: [&SaleProduct; 0] = [];
        let mut results = SearchResults::resolve(keyword, &stores, no_products);

        if results.is_empty() {
            let sql = format!(
                "SELECT {PRODUCT_COLUMNS} FROM sale_products WHERE lower(name) LIKE $1 ESCAPE '\\' ORDER BY created_at, id"
            );
            let product_rows = sqlx::query(&sql)
                .bind(&pattern)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("search_sale_products", e))?;
            let products = product_rows
                .iter()
                .map(product_from_row)
                .collect::<StoreResult<Vec<_>>>()?;
            results = SearchResults::resolve(keyword, &stores, &products);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("kind", results.kind());
        Ok(results)
    }

    #[instrument(
        skip(self, cmd, now),
        fields(
            sale_product_id = %cmd.sale_product_id,
            buyer_id = %cmd.buyer_id,
            quantity = cmd.quantity.get()
        ),
        err
    )]
    async fn place_order(
        &self,
        order_id: OrderId,
        cmd: &PlaceOrder,
        policy: StockPolicy,
        now: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        match place_in_tx(&mut tx, order_id, cmd, policy, now).await {
            Ok(order) => {
                tx.commit()
                    .await
                    .map_err(|e| map_sqlx_error("commit_transaction", e))?;
                Ok(order)
            }
            Err(e) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                Err(e)
            }
        }
    }
}

async fn place_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    cmd: &PlaceOrder,
    policy: StockPolicy,
    now: DateTime<Utc>,
) -> StoreResult<Order> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM sale_products WHERE id = $1 FOR UPDATE");
    let row = sqlx::query(&sql)
        .bind(cmd.sale_product_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_sale_product", e))?;
    let mut product = match row {
        Some(row) => product_from_row(&row)?,
        None => return Err(DomainError::not_found("sale product not found").into()),
    };

    let order = Order::place(order_id, cmd, &product, now)?;

    let buyer_exists = sqlx::query("SELECT 1 FROM buyers WHERE id = $1")
        .bind(cmd.buyer_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("check_buyer", e))?
        .is_some();
    if !buyer_exists {
        return Err(DomainError::invalid_input("buyer does not exist").into());
    }

    if policy.settle(&mut product, &order)? {
        sqlx::query("UPDATE sale_products SET amount = $2 WHERE id = $1")
            .bind(product.id.as_uuid())
            .bind(i64::from(product.amount))
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("update_stock", e))?;
    }

    sqlx::query(
        r#"
        INSERT INTO orders (id, buyer_id, sale_product_id, store_id, amount, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(order.id.as_uuid())
    .bind(order.buyer_id.as_uuid())
    .bind(order.sale_product_id.as_uuid())
    .bind(order.store_id.as_uuid())
    .bind(i64::from(order.amount))
    .bind(order.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_order", e))?;

    Ok(order)
}

/// Build a `LIKE` substring pattern, escaping the wildcard characters.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Database {
            operation,
            message: db_err.message().to_string(),
        },
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        other => StoreError::Database {
            operation,
            message: other.to_string(),
        },
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23503";
        }
    }
    false
}

fn corrupt(table: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::Corrupt {
        table,
        message: e.to_string(),
    }
}

fn non_negative_u32(table: &'static str, column: &str, value: i64) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt {
        table,
        message: format!("{column} out of range: {value}"),
    })
}

fn buyer_from_row(row: &PgRow) -> StoreResult<Buyer> {
    let err = corrupt("buyers");
    Ok(Buyer {
        id: BuyerId::from_uuid(row.try_get::<Uuid, _>("id").map_err(&err)?),
        name: row.try_get("name").map_err(&err)?,
        contact: ContactInfo {
            email: row.try_get("email").map_err(&err)?,
            phone: row.try_get("phone").map_err(&err)?,
            address: row.try_get("address").map_err(&err)?,
        },
        created_at: row.try_get("created_at").map_err(&err)?,
    })
}

fn store_from_row(row: &PgRow) -> StoreResult<Store> {
    let err = corrupt("stores");
    Ok(Store {
        id: StoreId::from_uuid(row.try_get::<Uuid, _>("id").map_err(&err)?),
        name: row.try_get("name").map_err(&err)?,
        store_type: row.try_get("store_type").map_err(&err)?,
        created_at: row.try_get("created_at").map_err(&err)?,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<SaleProduct> {
    let err = corrupt("sale_products");
    let code: String = row.try_get("product_type").map_err(&err)?;
    let product_type = code.parse::<ProductCategory>().map_err(|e| StoreError::Corrupt {
        table: "sale_products",
        message: e.to_string(),
    })?;
    let price: i64 = row.try_get("price").map_err(&err)?;
    Ok(SaleProduct {
        id: SaleProductId::from_uuid(row.try_get::<Uuid, _>("id").map_err(&err)?),
        store_id: StoreId::from_uuid(row.try_get::<Uuid, _>("store_id").map_err(&err)?),
        name: row.try_get("name").map_err(&err)?,
        product_type,
        amount: non_negative_u32("sale_products", "amount", row.try_get("amount").map_err(&err)?)?,
        price: u64::try_from(price).map_err(|_| StoreError::Corrupt {
            table: "sale_products",
            message: format!("price out of range: {price}"),
        })?,
        description: row.try_get("description").map_err(&err)?,
        created_at: row.try_get("created_at").map_err(&err)?,
    })
}

fn order_from_row(row: &PgRow) -> StoreResult<Order> {
    let err = corrupt("orders");
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id").map_err(&err)?),
        buyer_id: BuyerId::from_uuid(row.try_get::<Uuid, _>("buyer_id").map_err(&err)?),
        sale_product_id: SaleProductId::from_uuid(
            row.try_get::<Uuid, _>("sale_product_id").map_err(&err)?,
        ),
        store_id: StoreId::from_uuid(row.try_get::<Uuid, _>("store_id").map_err(&err)?),
        amount: non_negative_u32("orders", "amount", row.try_get("amount").map_err(&err)?)?,
        created_at: row.try_get("created_at").map_err(&err)?,
    })
}
