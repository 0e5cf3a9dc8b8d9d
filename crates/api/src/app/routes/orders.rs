use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use thirtyone_core::OrderId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/:id", get(get_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let cmd = match body.into_command() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.marketplace.place_order(cmd).await {
        Ok(order) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("/orders/{}", order.id))],
            Json(dto::order_json(&order)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let id: OrderId = match errors::path_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.marketplace.order(id).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_json(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
