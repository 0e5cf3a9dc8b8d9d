use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thirtyone_core::{DomainError, DomainResult, Entity, SaleProductId, StoreId};

use crate::category::ProductCategory;
use crate::store::required;

pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// Request to list a sale product under a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSaleProduct {
    pub name: String,
    pub product_type: ProductCategory,
    pub amount: u32,
    /// Price in smallest currency unit.
    pub price: u64,
    pub description: Option<String>,
}

/// A discounted / near-expiry item listed by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleProduct {
    pub id: SaleProductId,
    pub store_id: StoreId,
    pub name: String,
    pub product_type: ProductCategory,
    /// Units currently available.
    pub amount: u32,
    pub price: u64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SaleProduct {
    pub fn list(
        id: SaleProductId,
        store_id: StoreId,
        request: NewSaleProduct,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = required("name", &request.name, MAX_PRODUCT_NAME_LEN)?;
        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(Self {
            id,
            store_id,
            name,
            product_type: request.product_type,
            amount: request.amount,
            price: request.price,
            description,
            created_at: now,
        })
    }

    pub fn has_stock_for(&self, quantity: u32) -> bool {
        quantity <= self.amount
    }

    /// Remove `quantity` units from the available stock.
    pub fn take_stock(&mut self, quantity: u32) -> DomainResult<()> {
        self.amount = self
            .amount
            .checked_sub(quantity)
            .ok_or(DomainError::insufficient_stock(quantity, self.amount))?;
        Ok(())
    }
}

impl Entity for SaleProduct {
    type Id = SaleProductId;

    fn id(&self) -> SaleProductId {
        self.id
    }
}
