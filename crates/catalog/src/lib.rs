//! Catalog domain module: stores, their sale products, and keyword search.
//!
//! This crate contains business rules for the catalog, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod category;
pub mod sale_product;
pub mod search;
pub mod store;

pub use category::ProductCategory;
pub use sale_product::{NewSaleProduct, SaleProduct, MAX_PRODUCT_NAME_LEN};
pub use search::{SearchKeyword, SearchResults};
pub use store::{NewStore, Store, MAX_STORE_NAME_LEN, MAX_STORE_TYPE_LEN};
