use serde::Deserialize;
use serde_json::{json, Value};

use thirtyone_catalog::{NewSaleProduct, NewStore, ProductCategory, SaleProduct, SearchResults, Store};
use thirtyone_core::{BuyerId, DomainError, DomainResult, SaleProductId};
use thirtyone_infra::SaleProductDetail;
use thirtyone_parties::{Buyer, ContactInfo, NewBuyer};
use thirtyone_sales::{Order, PlaceOrder, Quantity};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBuyerRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<CreateBuyerRequest> for NewBuyer {
    fn from(body: CreateBuyerRequest) -> Self {
        NewBuyer {
            name: body.name,
            contact: ContactInfo {
                email: body.email,
                phone: body.phone,
                address: body.address,
            },
        }
    }
}

/// Order placement body.
///
/// Fields are kept loose so every parse failure surfaces as `invalid_input`
/// with a specific message. A `store` field, if sent, is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub buyer: Option<String>,
    pub sale_product: Option<String>,
    pub amount: Option<Value>,
}

impl CreateOrderRequest {
    pub fn into_command(self) -> DomainResult<PlaceOrder> {
        let quantity = parse_quantity(self.amount.as_ref())?;
        let buyer_id: BuyerId = required_field("buyer", self.buyer.as_deref())?.parse()?;
        let sale_product_id: SaleProductId =
            required_field("sale_product", self.sale_product.as_deref())?.parse()?;
        Ok(PlaceOrder {
            buyer_id,
            sale_product_id,
            quantity,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub store_type: String,
}

impl From<CreateStoreRequest> for NewStore {
    fn from(body: CreateStoreRequest) -> Self {
        NewStore {
            name: body.name,
            store_type: body.store_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleProductRequest {
    pub name: String,
    pub product_type: String,
    pub amount: u32,
    pub price: u64,
    pub description: Option<String>,
}

impl CreateSaleProductRequest {
    pub fn into_new(self) -> DomainResult<NewSaleProduct> {
        let product_type: ProductCategory = self.product_type.parse()?;
        Ok(NewSaleProduct {
            name: self.name,
            product_type,
            amount: self.amount,
            price: self.price,
            description: self.description,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

fn required_field<'a>(name: &str, value: Option<&'a str>) -> DomainResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DomainError::invalid_input(format!("{name} is required")))
}

/// Accept the ordered amount as a JSON integer or a numeric string.
pub fn parse_quantity(raw: Option<&Value>) -> DomainResult<Quantity> {
    match raw {
        None | Some(Value::Null) => Err(DomainError::invalid_input("amount is required")),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(units) => Quantity::new(units),
            None if n.is_u64() => Err(DomainError::invalid_input("amount is too large")),
            None => Err(DomainError::invalid_input(format!(
                "amount must be an integer, got {n}"
            ))),
        },
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(DomainError::invalid_input(format!(
            "amount must be an integer, got {other}"
        ))),
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn buyer_json(buyer: &Buyer) -> Value {
    json!({
        "id": buyer.id.to_string(),
        "name": buyer.name,
        "email": buyer.contact.email,
        "phone": buyer.contact.phone,
        "address": buyer.contact.address,
        "created_at": buyer.created_at.to_rfc3339(),
    })
}

pub fn order_json(order: &Order) -> Value {
    json!({
        "id": order.id.to_string(),
        "buyer": order.buyer_id.to_string(),
        "sale_product": order.sale_product_id.to_string(),
        "store": order.store_id.to_string(),
        "amount": order.amount,
        "created_at": order.created_at.to_rfc3339(),
    })
}

pub fn store_summary_json(store: &Store) -> Value {
    json!({
        "id": store.id.to_string(),
        "name": store.name,
        "type": store.store_type,
    })
}

pub fn product_summary_json(product: &SaleProduct) -> Value {
    json!({
        "id": product.id.to_string(),
        "name": product.name,
        "product_type": product.product_type.code(),
        "amount": product.amount,
        "price": product.price,
        "store": product.store_id.to_string(),
    })
}

pub fn product_detail_json(detail: &SaleProductDetail) -> Value {
    let product = &detail.product;
    let mut body = product_summary_json(product);
    if let Value::Object(map) = &mut body {
        map.insert("product_type_label".into(), json!(product.product_type.label()));
        map.insert("description".into(), json!(product.description));
        map.insert("store_name".into(), json!(detail.store.name));
        map.insert("created_at".into(), json!(product.created_at.to_rfc3339()));
    }
    body
}

/// JSON body for a search outcome; `None` when nothing matched.
pub fn search_results_json(results: &SearchResults) -> Option<Value> {
    match results {
        SearchResults::Stores(stores) => {
            Some(Value::Array(stores.iter().map(store_summary_json).collect()))
        }
        SearchResults::Products(products) => {
            Some(Value::Array(products.iter().map(product_summary_json).collect()))
        }
        SearchResults::Empty => None,
    }
}
