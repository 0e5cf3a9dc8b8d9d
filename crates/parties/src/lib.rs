//! Parties domain module: the buyer accounts that place orders.
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod buyer;

pub use buyer::{Buyer, ContactInfo, NewBuyer, MAX_BUYER_NAME_LEN};
