use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::SearchParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let results = match services.marketplace.search(params.q.as_deref()).await {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };

    match dto::search_results_json(&results) {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "no results"),
    }
}
