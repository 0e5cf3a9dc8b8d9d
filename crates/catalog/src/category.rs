use core::str::FromStr;

use serde::{Deserialize, Serialize};

use thirtyone_core::DomainError;

/// Fixed set of sale product categories, identified by three-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "FRV")]
    FreshProduce,
    #[serde(rename = "BUT")]
    Butchery,
    #[serde(rename = "BAK")]
    Bakery,
    #[serde(rename = "SID")]
    SideDish,
    #[serde(rename = "SEA")]
    Seafood,
    #[serde(rename = "RIC")]
    Rice,
    #[serde(rename = "SNA")]
    Snack,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 7] = [
        ProductCategory::FreshProduce,
        ProductCategory::Butchery,
        ProductCategory::Bakery,
        ProductCategory::SideDish,
        ProductCategory::Seafood,
        ProductCategory::Rice,
        ProductCategory::Snack,
    ];

    /// Wire/storage code.
    pub fn code(self) -> &'static str {
        match self {
            ProductCategory::FreshProduce => "FRV",
            ProductCategory::Butchery => "BUT",
            ProductCategory::Bakery => "BAK",
            ProductCategory::SideDish => "SID",
            ProductCategory::Seafood => "SEA",
            ProductCategory::Rice => "RIC",
            ProductCategory::Snack => "SNA",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ProductCategory::FreshProduce => "fresh produce",
            ProductCategory::Butchery => "butchery",
            ProductCategory::Bakery => "bakery",
            ProductCategory::SideDish => "side dish",
            ProductCategory::Seafood => "seafood",
            ProductCategory::Rice => "rice",
            ProductCategory::Snack => "snack",
        }
    }
}

impl core::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProductCategory {
    type Err = DomainError;

    /// Codes are case-sensitive: `frv` is not a category.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductCategory::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or_else(|| DomainError::invalid_input(format!("invalid product_type: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_parses_back_to_its_category() {
        for category in ProductCategory::ALL {
            assert_eq!(category.code().parse::<ProductCategory>().unwrap(), category);
        }
    }

    #[test]
    fn lowercase_code_is_rejected() {
        let err = "frv".parse::<ProductCategory>().unwrap_err();
        assert_eq!(err, DomainError::invalid_input("invalid product_type: frv"));
    }

    #[test]
    fn serde_uses_the_code() {
        let json = serde_json::to_value(ProductCategory::Seafood).unwrap();
        assert_eq!(json, serde_json::json!("SEA"));
        let back: ProductCategory = serde_json::from_value(serde_json::json!("RIC")).unwrap();
        assert_eq!(back, ProductCategory::Rice);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Anything outside the seven codes is invalid input.
            #[test]
            fn unknown_codes_are_rejected(code in "[A-Za-z]{0,5}") {
                let known = ProductCategory::ALL.iter().any(|c| c.code() == code);
                let parsed = code.parse::<ProductCategory>();
                prop_assert_eq!(parsed.is_ok(), known);
                if !known {
                    prop_assert!(matches!(parsed, Err(DomainError::InvalidInput(_))));
                }
            }
        }
    }
}
