use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thirtyone_catalog::SaleProduct;
use thirtyone_core::{BuyerId, DomainError, DomainResult, Entity, OrderId, SaleProductId, StoreId};

/// Ordered quantity: a whole number of units, at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(units: i64) -> DomainResult<Self> {
        if units < 1 {
            return Err(DomainError::invalid_input("amount must be at least 1"));
        }
        let units = u32::try_from(units)
            .map_err(|_| DomainError::invalid_input("amount is too large"))?;
        Ok(Self(units))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let units: i64 = s
            .trim()
            .parse()
            .map_err(|_| DomainError::invalid_input(format!("amount must be an integer, got {s:?}")))?;
        Self::new(units)
    }
}

/// What happens to a sale product's stock once an order is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    /// Stock is validated but left as is.
    #[default]
    Unchanged,
    /// Ordered units are removed from stock in the same atomic step as the insert.
    Decrement,
}

impl StockPolicy {
    /// Apply the policy to `product` for an accepted order.
    ///
    /// Returns `true` when the product was modified and must be written back.
    pub fn settle(self, product: &mut SaleProduct, order: &Order) -> DomainResult<bool> {
        match self {
            StockPolicy::Unchanged => Ok(false),
            StockPolicy::Decrement => {
                product.take_stock(order.amount)?;
                Ok(true)
            }
        }
    }
}

impl FromStr for StockPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unchanged" => Ok(StockPolicy::Unchanged),
            "decrement" => Ok(StockPolicy::Decrement),
            other => Err(DomainError::invalid_input(format!(
                "stock policy must be one of: unchanged, decrement (got {other:?})"
            ))),
        }
    }
}

/// Command: place an order for a quantity of a sale product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub buyer_id: BuyerId,
    pub sale_product_id: SaleProductId,
    pub quantity: Quantity,
}

/// A buyer's purchase of a sale product. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub sale_product_id: SaleProductId,
    /// Always the owning store of `sale_product_id` at creation time.
    pub store_id: StoreId,
    pub amount: u32,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Decide whether `cmd` can be fulfilled from `product` and build the order.
    ///
    /// `product` must be the current state of `cmd.sale_product_id`. The
    /// store is taken from the product; nothing else can set it.
    pub fn place(
        id: OrderId,
        cmd: &PlaceOrder,
        product: &SaleProduct,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        debug_assert_eq!(product.id, cmd.sale_product_id);

        let requested = cmd.quantity.get();
        if !product.has_stock_for(requested) {
            return Err(DomainError::insufficient_stock(requested, product.amount));
        }

        Ok(Self {
            id,
            buyer_id: cmd.buyer_id,
            sale_product_id: product.id,
            store_id: product.store_id,
            amount: requested,
            created_at: now,
        })
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thirtyone_catalog::{NewSaleProduct, ProductCategory};

    fn product_with_stock(amount: u32) -> SaleProduct {
        SaleProduct::list(
            SaleProductId::new(),
            StoreId::new(),
            NewSaleProduct {
                name: "Fresh Mart Bananas".to_string(),
                product_type: ProductCategory::FreshProduce,
                amount,
                price: 1200,
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn command(product: &SaleProduct, units: i64) -> PlaceOrder {
        PlaceOrder {
            buyer_id: BuyerId::new(),
            sale_product_id: product.id,
            quantity: Quantity::new(units).unwrap(),
        }
    }

    #[test]
    fn quantity_parses_numeric_strings() {
        assert_eq!("3".parse::<Quantity>().unwrap().get(), 3);
        assert_eq!(" 12 ".parse::<Quantity>().unwrap().get(), 12);
    }

    #[test]
    fn quantity_rejects_non_integers() {
        for raw in ["", "three", "2.5", "1e3"] {
            let err = raw.parse::<Quantity>().unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)), "{raw:?} -> {err:?}");
        }
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(-4).is_err());
        assert!(Quantity::new(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn quantity_deserializes_through_validation() {
        let q: Quantity = serde_json::from_value(serde_json::json!(2)).unwrap();
        assert_eq!(q.get(), 2);
        assert!(serde_json::from_value::<Quantity>(serde_json::json!(0)).is_err());
    }

    #[test]
    fn place_rejects_more_than_available() {
        let product = product_with_stock(3);
        let err = Order::place(OrderId::new(), &command(&product, 10), &product, Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock(10, 3));
    }

    #[test]
    fn place_accepts_exactly_the_available_stock() {
        let product = product_with_stock(3);
        let order =
            Order::place(OrderId::new(), &command(&product, 3), &product, Utc::now()).unwrap();
        assert_eq!(order.amount, 3);
    }

    #[test]
    fn place_derives_store_from_product() {
        let product = product_with_stock(5);
        let cmd = command(&product, 2);
        let order = Order::place(OrderId::new(), &cmd, &product, Utc::now()).unwrap();
        assert_eq!(order.store_id, product.store_id);
        assert_eq!(order.buyer_id, cmd.buyer_id);
        assert_eq!(order.sale_product_id, product.id);
    }

    #[test]
    fn unchanged_policy_leaves_stock_alone() {
        let mut product = product_with_stock(5);
        let order =
            Order::place(OrderId::new(), &command(&product, 2), &product, Utc::now()).unwrap();
        assert!(!StockPolicy::Unchanged.settle(&mut product, &order).unwrap());
        assert_eq!(product.amount, 5);
    }

    #[test]
    fn decrement_policy_takes_ordered_units() {
        let mut product = product_with_stock(5);
        let order =
            Order::place(OrderId::new(), &command(&product, 2), &product, Utc::now()).unwrap();
        assert!(StockPolicy::Decrement.settle(&mut product, &order).unwrap());
        assert_eq!(product.amount, 3);
    }

    #[test]
    fn stock_policy_parses_case_insensitively() {
        assert_eq!("Decrement".parse::<StockPolicy>().unwrap(), StockPolicy::Decrement);
        assert_eq!("unchanged".parse::<StockPolicy>().unwrap(), StockPolicy::Unchanged);
        assert!("reserve".parse::<StockPolicy>().is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Orders are accepted exactly when the quantity fits the stock,
            /// and accepted orders always carry the product's store.
            #[test]
            fn placement_respects_stock(stock in 0u32..50, units in 1i64..60) {
                let product = product_with_stock(stock);
                let cmd = command(&product, units);
                let result = Order::place(OrderId::new(), &cmd, &product, Utc::now());

                if units <= i64::from(stock) {
                    let order = result.unwrap();
                    prop_assert_eq!(order.store_id, product.store_id);
                    prop_assert_eq!(i64::from(order.amount), units);
                } else {
                    prop_assert_eq!(
                        result.unwrap_err(),
                        DomainError::insufficient_stock(units as u32, stock)
                    );
                }
            }

            /// Decrementing never underflows and removes exactly the ordered units.
            #[test]
            fn decrement_conserves_units(stock in 1u32..50, units in 1i64..50) {
                prop_assume!(units <= i64::from(stock));
                let mut product = product_with_stock(stock);
                let order = Order::place(OrderId::new(), &command(&product, units), &product, Utc::now()).unwrap();
                StockPolicy::Decrement.settle(&mut product, &order).unwrap();
                prop_assert_eq!(product.amount + order.amount, stock);
            }
        }
    }
}
