use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thirtyone_core::{BuyerId, DomainError, DomainResult, Entity};

pub const MAX_BUYER_NAME_LEN: usize = 100;

/// Contact information for a buyer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ContactInfo {
    /// Trim every field and drop the ones left empty.
    fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            email: clean(self.email),
            phone: clean(self.phone),
            address: clean(self.address),
        }
    }

    fn validate(&self) -> DomainResult<()> {
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(DomainError::invalid_input("email must contain '@'"));
            }
        }
        if let Some(phone) = &self.phone {
            let ok = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' '));
            if !ok || !phone.chars().any(|c| c.is_ascii_digit()) {
                return Err(DomainError::invalid_input(
                    "phone may only contain digits, '+', '-' and spaces",
                ));
            }
        }
        Ok(())
    }
}

/// Registration request for a buyer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBuyer {
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
}

/// A purchasing account. Orders reference it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: BuyerId,
    pub name: String,
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

impl Buyer {
    /// Validate a registration request and build the buyer record.
    pub fn register(id: BuyerId, request: NewBuyer, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid_input("name cannot be empty"));
        }
        if name.chars().count() > MAX_BUYER_NAME_LEN {
            return Err(DomainError::invalid_input(format!(
                "name cannot exceed {MAX_BUYER_NAME_LEN} characters"
            )));
        }

        let contact = request.contact.normalized();
        contact.validate()?;

        Ok(Self {
            id,
            name: name.to_string(),
            contact,
            created_at: now,
        })
    }
}

impl Entity for Buyer {
    type Id = BuyerId;

    fn id(&self) -> BuyerId {
        self.id
    }
}
