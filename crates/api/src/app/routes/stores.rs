use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use thirtyone_core::StoreId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_store))
        .route("/:id", get(get_store))
        .route("/:id/products", get(list_products).post(create_product))
}

pub async fn create_store(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateStoreRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.marketplace.open_store(body.into()).await {
        Ok(store) => (StatusCode::CREATED, Json(dto::store_summary_json(&store))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_store(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let id: StoreId = match errors::path_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.marketplace.store(id).await {
        Ok(store) => (StatusCode::OK, Json(dto::store_summary_json(&store))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let id: StoreId = match errors::path_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.marketplace.products_for_store(id).await {
        Ok(products) => {
            let body: Vec<_> = products.iter().map(dto::product_summary_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::CreateSaleProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: StoreId = match errors::path_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let request = match body.into_new() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.marketplace.list_sale_product(id, request).await {
        Ok(product) => {
            (StatusCode::CREATED, Json(dto::product_summary_json(&product))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
