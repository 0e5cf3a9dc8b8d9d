use thirtyone_infra::store::{self, StoreError};
use thirtyone_infra::{AppConfig, Marketplace};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    pub marketplace: Marketplace,
}

impl AppServices {
    pub fn new(marketplace: Marketplace) -> Self {
        Self { marketplace }
    }
}

/// Open the configured data store and wire the marketplace over it.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let store = store::open(&config.storage).await?;
    let marketplace = Marketplace::new(store, config.stock_policy);
    tracing::info!(stock_policy = ?marketplace.stock_policy(), "marketplace ready");
    Ok(AppServices::new(marketplace))
}
