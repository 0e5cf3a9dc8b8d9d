//! Integration tests for the marketplace service over the in-memory store.
//!
//! Tests: Marketplace → MarketStore → domain rules
//!
//! Verifies:
//! - Orders derive their store from the product and respect stock
//! - Catalog queries report missing and empty results distinctly
//! - Concurrent placements under `Decrement` never oversell

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use thirtyone_catalog::{NewSaleProduct, NewStore, ProductCategory, SaleProduct, SearchResults, Store};
    use thirtyone_core::{BuyerId, DomainError, SaleProductId, StoreId};
    use thirtyone_parties::{Buyer, ContactInfo, NewBuyer};
    use thirtyone_sales::{PlaceOrder, Quantity, StockPolicy};

    use crate::marketplace::{Marketplace, ServiceError};
    use crate::store::{InMemoryMarketStore, MarketStore};

    fn setup(policy: StockPolicy) -> Marketplace<InMemoryMarketStore> {
        Marketplace::new(Arc::new(InMemoryMarketStore::new()), policy)
    }

    async fn buyer(market: &Marketplace<InMemoryMarketStore>, name: &str) -> Buyer {
        market
            .register_buyer(NewBuyer {
                name: name.to_string(),
                contact: ContactInfo::default(),
            })
            .await
            .unwrap()
    }

    async fn store(market: &Marketplace<InMemoryMarketStore>, name: &str, store_type: &str) -> Store {
        market
            .open_store(NewStore {
                name: name.to_string(),
                store_type: store_type.to_string(),
            })
            .await
            .unwrap()
    }

    async fn product(
        market: &Marketplace<InMemoryMarketStore>,
        store_id: StoreId,
        name: &str,
        product_type: ProductCategory,
        amount: u32,
    ) -> SaleProduct {
        market
            .list_sale_product(
                store_id,
                NewSaleProduct {
                    name: name.to_string(),
                    product_type,
                    amount,
                    price: 1_500,
                    description: None,
                },
            )
            .await
            .unwrap()
    }

    fn order(buyer_id: BuyerId, sale_product_id: SaleProductId, units: i64) -> PlaceOrder {
        PlaceOrder {
            buyer_id,
            sale_product_id,
            quantity: Quantity::new(units).unwrap(),
        }
    }

    #[tokio::test]
    async fn order_takes_store_from_product_and_is_listed_for_buyer() {
        let market = setup(StockPolicy::Unchanged);
        let alice = buyer(&market, "Alice").await;
        let mart = store(&market, "Fresh Mart", "grocery").await;
        let apples = product(&market, mart.id, "Apples", ProductCategory::FreshProduce, 10).await;

        let placed = market.place_order(order(alice.id, apples.id, 3)).await.unwrap();
        assert_eq!(placed.store_id, mart.id);
        assert_eq!(placed.amount, 3);

        let orders = market.orders_for_buyer(alice.id).await.unwrap();
        assert_eq!(orders, vec![placed.clone()]);
        assert_eq!(market.order(placed.id).await.unwrap(), placed);

        // Unchanged policy leaves stock alone.
        let detail = market.sale_product_detail(apples.id).await.unwrap();
        assert_eq!(detail.product.amount, 10);
        assert_eq!(detail.store, mart);
    }

    #[tokio::test]
    async fn insufficient_stock_creates_no_order() {
        let market = setup(StockPolicy::Unchanged);
        let alice = buyer(&market, "Alice").await;
        let mart = store(&market, "Fresh Mart", "grocery").await;
        let bread = product(&market, mart.id, "Bread", ProductCategory::Bakery, 3).await;

        let err = market.place_order(order(alice.id, bread.id, 10)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::InsufficientStock {
                requested: 10,
                available: 3
            })
        ));
        assert!(market.orders_for_buyer(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_for_unknown_product_or_buyer_is_rejected() {
        let market = setup(StockPolicy::Unchanged);
        let alice = buyer(&market, "Alice").await;
        let mart = store(&market, "Fresh Mart", "grocery").await;
        let rice = product(&market, mart.id, "Rice", ProductCategory::Rice, 5).await;

        let err = market
            .place_order(order(alice.id, SaleProductId::new(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));

        let ghost = BuyerId::new();
        let err = market.place_order(order(ghost, rice.id, 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidInput(_))));
        assert!(market.orders_for_buyer(ghost).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn decrement_policy_reduces_stock() {
        let market = setup(StockPolicy::Decrement);
        let alice = buyer(&market, "Alice").await;
        let mart = store(&market, "Fresh Mart", "grocery").await;
        let fish = product(&market, mart.id, "Mackerel", ProductCategory::Seafood, 5).await;

        market.place_order(order(alice.id, fish.id, 2)).await.unwrap();
        let detail = market.sale_product_detail(fish.id).await.unwrap();
        assert_eq!(detail.product.amount, 3);

        let err = market.place_order(order(alice.id, fish.id, 4)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::InsufficientStock {
                requested: 4,
                available: 3
            })
        ));
    }

    #[tokio::test]
    async fn concurrent_decrement_never_oversells() {
        let market = setup(StockPolicy::Decrement);
        let alice = buyer(&market, "Alice").await;
        let mart = store(&market, "Fresh Mart", "grocery").await;
        let stock = 7;
        let snack = product(&market, mart.id, "Chips", ProductCategory::Snack, stock).await;

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..20 {
            let market = market.clone();
            let cmd = order(alice.id, snack.id, 2);
            tasks.spawn(async move { market.place_order(cmd).await });
        }

        let mut accepted = 0u32;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(order) => accepted += order.amount,
                Err(ServiceError::Domain(DomainError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted, 6);
        let left = market.sale_product_detail(snack.id).await.unwrap().product.amount;
        assert_eq!(accepted + left, stock);
    }

    #[tokio::test]
    async fn store_listing_distinguishes_missing_and_empty() {
        let market = setup(StockPolicy::Unchanged);
        let empty = store(&market, "Corner Shop", "convenience").await;

        let err = market.products_for_store(empty.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(ref m)) if m.contains("no sale products")));

        let err = market.products_for_store(StoreId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(ref m)) if m == "store not found"));
    }

    #[tokio::test]
    async fn listing_under_missing_store_is_not_found() {
        let market = setup(StockPolicy::Unchanged);
        let err = market
            .list_sale_product(
                StoreId::new(),
                NewSaleProduct {
                    name: "Orphan".to_string(),
                    product_type: ProductCategory::Snack,
                    amount: 1,
                    price: 100,
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn category_listing_filters_and_validates_code() {
        let market = setup(StockPolicy::Unchanged);
        let mart = store(&market, "Fresh Mart", "grocery").await;
        let apples = product(&market, mart.id, "Apples", ProductCategory::FreshProduce, 4).await;
        product(&market, mart.id, "Baguette", ProductCategory::Bakery, 2).await;

        let fresh = market.products_in_category("FRV").await.unwrap();
        assert_eq!(fresh, vec![apples]);
        assert!(market.products_in_category("SID").await.unwrap().is_empty());

        let err = market.products_in_category("XXX").await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn search_prefers_stores_then_products() {
        let market = setup(StockPolicy::Unchanged);
        let mart = store(&market, "Fresh Mart", "grocery").await;
        let bakery = store(&market, "Sunrise", "bakery").await;
        let croissant = product(&market, bakery.id, "Croissant", ProductCategory::Bakery, 6).await;

        match market.search(Some("fresh")).await.unwrap() {
            SearchResults::Stores(stores) => assert_eq!(stores, vec![mart]),
            other => panic!("expected stores, got {other:?}"),
        }
        match market.search(Some("BAKERY")).await.unwrap() {
            SearchResults::Stores(stores) => assert_eq!(stores, vec![bakery]),
            other => panic!("expected stores, got {other:?}"),
        }
        match market.search(Some("croiss")).await.unwrap() {
            SearchResults::Products(products) => assert_eq!(products, vec![croissant]),
            other => panic!("expected products, got {other:?}"),
        }
        assert_eq!(market.search(Some("durian")).await.unwrap(), SearchResults::Empty);
        assert_eq!(market.search(Some("")).await.unwrap(), SearchResults::Empty);
        assert_eq!(market.search(None).await.unwrap(), SearchResults::Empty);
    }

    #[tokio::test]
    async fn search_keyword_is_matched_verbatim() {
        let market = setup(StockPolicy::Unchanged);
        let mart = store(&market, "Fresh Mart", "grocery").await;
        store(&market, "Sunrise", "bakery").await;
        product(&market, mart.id, "Croissant", ProductCategory::Bakery, 6).await;

        // A lone space is a keyword: it matches names containing a space.
        match market.search(Some(" ")).await.unwrap() {
            SearchResults::Stores(stores) => assert_eq!(stores, vec![mart]),
            other => panic!("expected stores, got {other:?}"),
        }
        assert_eq!(market.search(Some("Mart ")).await.unwrap(), SearchResults::Empty);
        assert_eq!(market.search(Some(" croissant")).await.unwrap(), SearchResults::Empty);
    }

    #[tokio::test]
    async fn lookups_report_not_found() {
        let market = setup(StockPolicy::Unchanged);
        assert!(matches!(
            market.buyer(BuyerId::new()).await.unwrap_err(),
            ServiceError::Domain(DomainError::NotFound(_))
        ));
        assert!(matches!(
            market.store(StoreId::new()).await.unwrap_err(),
            ServiceError::Domain(DomainError::NotFound(_))
        ));
        assert!(matches!(
            market.sale_product_detail(SaleProductId::new()).await.unwrap_err(),
            ServiceError::Domain(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let store: Arc<dyn MarketStore> = Arc::new(InMemoryMarketStore::new());
        let market: Marketplace = Marketplace::new(store, StockPolicy::default());
        assert_eq!(market.stock_policy(), StockPolicy::Unchanged);
        let registered = market
            .register_buyer(NewBuyer {
                name: "Bob".to_string(),
                contact: ContactInfo {
                    email: Some("bob@example.com".to_string()),
                    ..ContactInfo::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(market.buyer(registered.id).await.unwrap(), registered);
    }
}
