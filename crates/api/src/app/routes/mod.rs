use axum::{routing::get, Router};

pub mod buyers;
pub mod catalog;
pub mod orders;
pub mod search;
pub mod stores;
pub mod system;

/// Router for all marketplace endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/buyers", buyers::router())
        .nest("/orders", orders::router())
        .nest("/categories", catalog::categories_router())
        .nest("/products", catalog::products_router())
        .nest("/stores", stores::router())
        .route("/search", get(search::search))
}
