use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thirtyone_core::{DomainError, DomainResult, Entity, StoreId};

pub const MAX_STORE_NAME_LEN: usize = 100;
pub const MAX_STORE_TYPE_LEN: usize = 50;

/// Request to open a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStore {
    pub name: String,
    #[serde(rename = "type")]
    pub store_type: String,
}

/// A seller. Owns zero or more sale products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// Free-text classification (e.g. `grocery`, `bakery`), searchable.
    #[serde(rename = "type")]
    pub store_type: String,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn open(id: StoreId, request: NewStore, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = required("name", &request.name, MAX_STORE_NAME_LEN)?;
        let store_type = required("type", &request.store_type, MAX_STORE_TYPE_LEN)?;
        Ok(Self {
            id,
            name,
            store_type,
            created_at: now,
        })
    }
}

impl Entity for Store {
    type Id = StoreId;

    fn id(&self) -> StoreId {
        self.id
    }
}

pub(crate) fn required(field: &str, value: &str, max_len: usize) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::invalid_input(format!("{field} cannot be empty")));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::invalid_input(format!(
            "{field} cannot exceed {max_len} characters"
        )));
    }
    Ok(value.to_string())
}
