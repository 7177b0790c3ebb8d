use crate::algorithms::{Outcome, RecommendationFilter, SlopeOne};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::ratings::{RatingSource, TopItemsSource};
use crate::utils::validation::validate_recommendation_request;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct RecommendationService {
    ratings: Arc<dyn RatingSource>,
    top_items: Arc<dyn TopItemsSource>,
    filter: RecommendationFilter<SlopeOne>,
    config: Arc<Config>,
    serving_stats: Arc<DashMap<String, u64>>,
}

impl RecommendationService {
    pub fn new(
        ratings: Arc<dyn RatingSource>,
        top_items: Arc<dyn TopItemsSource>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            ratings,
            top_items,
            filter: RecommendationFilter::new(SlopeOne::new()),
            config,
            serving_stats: Arc::new(DashMap::new()),
        }
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> AppResult<RecommendationResponse> {
        self.increment_stat("total_requests");
        let start_time = Instant::now();

        validate_recommendation_request(request)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        self.ensure_user(request.user_id).await?;

        let threshold = request.threshold.unwrap_or(self.config.recommendation.threshold);
        let matrix = self.snapshot_for(request.user_id).await?;

        let filter = self.filter;
        let user_id = request.user_id;
        let outcome = self
            .run_bounded(tokio::task::spawn_blocking(move || {
                filter.evaluate(&matrix, &user_id, threshold, &[])
            }))
            .await?;

        // popular films are only looked up when no prediction qualified
        let (films, source) = match outcome {
            Outcome::Predicted(ranked) => {
                let films = ranked.into_iter().map(|(film_id, _)| film_id).collect();
                (films, RecommendationSource::Predicted)
            }
            Outcome::Fallback(_) => {
                self.increment_stat("fallback_responses");
                let fallback = self
                    .top_items
                    .top_items(self.config.recommendation.fallback_count)
                    .await?;
                (fallback, RecommendationSource::Fallback)
            }
        };
        let films = crate::utils::truncate(films, request.count);

        let latency = start_time.elapsed().as_millis() as u64;
        self.update_latency_stat(latency);
        self.increment_stat("successful_requests");
        info!(
            "Served {} recommendations ({:?}) for user {} in {}ms",
            films.len(),
            source,
            request.user_id,
            latency
        );

        Ok(RecommendationResponse {
            user_id: request.user_id,
            films,
            source,
            generated_at: Utc::now(),
        })
    }

    /// Predictions for every film the user has not rated, best first; films
    /// without a prediction basis come last.
    pub async fn predictions(&self, user_id: UserId) -> AppResult<Vec<PredictedFilm>> {
        self.increment_stat("prediction_requests");
        self.ensure_user(user_id).await?;

        let matrix = self.snapshot_for(user_id).await?;
        let filter = self.filter;
        let predictions = self
            .run_bounded(tokio::task::spawn_blocking(move || {
                filter.filtered_predict(&matrix, &user_id)
            }))
            .await?;

        let mut films: Vec<PredictedFilm> = predictions
            .into_iter()
            .map(|(film_id, prediction)| PredictedFilm { film_id, prediction })
            .collect();
        films.sort_by(|a, b| {
            let by_score = match (a.prediction.score(), b.prediction.score()) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (x, y) => y.is_some().cmp(&x.is_some()),
            };
            by_score.then(a.film_id.cmp(&b.film_id))
        });

        Ok(films)
    }

    pub fn stats(&self) -> HashMap<String, u64> {
        self.serving_stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    async fn ensure_user(&self, user_id: UserId) -> AppResult<()> {
        if self.ratings.contains_user(user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("user {}", user_id)))
        }
    }

    async fn snapshot_for(&self, user_id: UserId) -> AppResult<RatingMatrix> {
        self.ratings
            .snapshot_capped(self.config.recommendation.max_ratings_per_user, user_id)
            .await
    }

    /// Awaits a blocking computation, giving up after the configured
    /// timeout. The computation itself cannot be interrupted and finishes
    /// in the background.
    async fn run_bounded<T>(&self, handle: JoinHandle<T>) -> AppResult<T> {
        let timeout_ms = self.config.recommendation.compute_timeout_ms;
        if timeout_ms == 0 {
            return Ok(handle.await?);
        }

        match tokio::time::timeout(Duration::from_millis(timeout_ms), handle).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!("Prediction exceeded {}ms", timeout_ms);
                self.increment_stat("timeouts");
                Err(AppError::Timeout(format!("prediction exceeded {}ms", timeout_ms)))
            }
        }
    }

    fn increment_stat(&self, key: &str) {
        *self.serving_stats.entry(key.to_string()).or_insert(0) += 1;
    }

    fn update_latency_stat(&self, latency_ms: u64) {
        *self
            .serving_stats
            .entry("total_latency_ms".to_string())
            .or_insert(0) += latency_ms;

        let mut max_latency = self
            .serving_stats
            .entry("max_latency_ms".to_string())
            .or_insert(0);
        if latency_ms > *max_latency {
            *max_latency = latency_ms;
        }
    }
}
