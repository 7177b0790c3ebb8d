pub mod algorithms;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::*;

use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rating_store: Arc<services::ratings::InMemoryRatingStore>,
    pub recommendation_service: Arc<services::recommendation::RecommendationService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let rating_store =
            Arc::new(services::ratings::InMemoryRatingStore::new(config.ratings.clone()));

        let recommendation_service = Arc::new(services::recommendation::RecommendationService::new(
            rating_store.clone(),
            rating_store.clone(),
            config.clone(),
        ));

        Ok(Self {
            config,
            rating_store,
            recommendation_service,
        })
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
