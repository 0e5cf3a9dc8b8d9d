use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use thirtyone_core::SaleProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn categories_router() -> Router {
    Router::new().route("/:code/products", get(list_by_category))
}

pub fn products_router() -> Router {
    Router::new().route("/:id", get(get_product))
}

pub async fn list_by_category(
    Extension(services): Extension<Arc<AppServices>>,
    code: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let Path(code) = match code {
        Ok(c) => c,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    match services.marketplace.products_in_category(&code).await {
        Ok(products) => {
            let body: Vec<_> = products.iter().map(dto::product_summary_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let id: SaleProductId = match errors::path_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.marketplace.sale_product_detail(id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::product_detail_json(&detail))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
