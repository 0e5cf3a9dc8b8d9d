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

use thirtyone_core::BuyerId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_buyer))
        .route("/:id", get(get_buyer))
        .route("/:id/orders", get(list_orders))
}

pub async fn create_buyer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateBuyerRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.marketplace.register_buyer(body.into()).await {
        Ok(buyer) => (StatusCode::CREATED, Json(dto::buyer_json(&buyer))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_buyer(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let id: BuyerId = match errors::path_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.marketplace.buyer(id).await {
        Ok(buyer) => (StatusCode::OK, Json(dto::buyer_json(&buyer))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let id: BuyerId = match errors::path_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.marketplace.orders_for_buyer(id).await {
        Ok(orders) => {
            let body: Vec<_> = orders.iter().map(dto::order_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
