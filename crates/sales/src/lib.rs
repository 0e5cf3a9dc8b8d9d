//! Sales domain module: buyers' orders against sale products.
//!
//! This crate contains the order placement rules, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod order;

pub use order::{Order, PlaceOrder, Quantity, StockPolicy};
