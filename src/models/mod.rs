use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::algorithms::Prediction;

pub type UserId = i64;
pub type FilmId = i64;
pub type Rating = i32;

/// Every user's ratings: user -> (film -> rating).
pub type RatingMatrix = HashMap<UserId, HashMap<FilmId, Rating>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmRating {
    pub user_id: UserId,
    pub film_id: FilmId,
    pub rating: Rating,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmStats {
    pub film_id: FilmId,
    pub mean_rating: Option<f64>,
    pub rating_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    pub count: usize,
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Predicted,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub films: Vec<FilmId>,
    pub source: RecommendationSource,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedFilm {
    pub film_id: FilmId,
    pub prediction: Prediction,
}

impl FilmRating {
    pub fn new(user_id: UserId, film_id: FilmId, rating: Rating) -> Self {
        Self {
            user_id,
            film_id,
            rating,
            rated_at: Utc::now(),
        }
    }

    pub fn at(mut self, rated_at: DateTime<Utc>) -> Self {
        self.rated_at = rated_at;
        self
    }
}

impl RecommendationRequest {
    pub fn new(user_id: UserId, count: usize) -> Self {
        Self {
            user_id,
            count,
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}
