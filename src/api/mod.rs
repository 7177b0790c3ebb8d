use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::ratings::TopItemsSource;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub count: Option<usize>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct NewFilm {
    pub film_id: FilmId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }
}

async fn health_check() -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "filmrec".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());

    Json(ApiResponse::success(status))
}

async fn add_user(
    State(state): State<AppState>,
    Json(user): Json<NewUser>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserId>>)> {
    if user.user_id <= 0 {
        return Err(AppError::InvalidInput("user_id must be positive".to_string()));
    }
    let status = if state.rating_store.add_user(user.user_id) {
        info!("Registered user {}", user.user_id);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(user.user_id))))
}

async fn add_film(
    State(state): State<AppState>,
    Json(film): Json<NewFilm>,
) -> AppResult<(StatusCode, Json<ApiResponse<FilmId>>)> {
    if film.film_id <= 0 {
        return Err(AppError::InvalidInput("film_id must be positive".to_string()));
    }
    let status = if state.rating_store.add_film(film.film_id) {
        info!("Registered film {}", film.film_id);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(film.film_id))))
}

async fn rate_film(
    State(state): State<AppState>,
    Path((film_id, user_id, rating)): Path<(FilmId, UserId, Rating)>,
) -> AppResult<Json<ApiResponse<FilmRating>>> {
    let film_rating = FilmRating::new(user_id, film_id, rating);
    state.rating_store.rate(film_rating.clone())?;
    Ok(Json(ApiResponse::success(film_rating)))
}

async fn remove_rating(
    State(state): State<AppState>,
    Path((film_id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<Json<ApiResponse<Rating>>> {
    let removed = state.rating_store.remove_rating(user_id, film_id)?;
    Ok(Json(ApiResponse::success(removed)))
}

async fn popular_films(
    State(state): State<AppState>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<ApiResponse<Vec<FilmId>>>> {
    let count = params.count.unwrap_or(state.config.recommendation.default_count);
    let films = state.rating_store.top_items(count).await?;
    Ok(Json(ApiResponse::success(films)))
}

async fn user_ratings(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<ApiResponse<HashMap<FilmId, Rating>>>> {
    if !state.rating_store.has_user(user_id) {
        return Err(AppError::NotFound(format!("user {}", user_id)));
    }
    Ok(Json(ApiResponse::success(state.rating_store.user_ratings(user_id))))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<ApiResponse<RecommendationResponse>>> {
    let request = RecommendationRequest {
        user_id,
        count: params.count.unwrap_or(state.config.recommendation.default_count),
        threshold: params.threshold,
    };

    let response = state.recommendation_service.recommend(&request).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn get_predictions(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<ApiResponse<Vec<PredictedFilm>>>> {
    let predictions = state.recommendation_service.predictions(user_id).await?;
    Ok(Json(ApiResponse::success(predictions)))
}

async fn serving_stats(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, u64>>> {
    Json(ApiResponse::success(state.recommendation_service.stats()))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(add_user))
        .route("/users/:user_id/ratings", get(user_ratings))
        .route("/users/:user_id/recommendations", get(get_recommendations))
        .route("/users/:user_id/predictions", get(get_predictions))
        .route("/films", post(add_film))
        .route("/films/popular", get(popular_films))
        .route("/ratings/:film_id/:user_id/:rating", put(rate_film))
        .route("/ratings/:film_id/:user_id", axum::routing::delete(remove_rating))
        .route("/stats", get(serving_stats))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}
