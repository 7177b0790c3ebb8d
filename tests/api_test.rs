use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use filmrec::api::create_router;
use filmrec::{AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    let state = AppState::new(Config::default()).await.unwrap();
    create_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed(app: &Router) {
    for id in 1..=3 {
        send(app, Method::POST, "/users", Some(json!({ "user_id": id }))).await;
        send(app, Method::POST, "/films", Some(json!({ "film_id": id }))).await;
    }
    send(app, Method::POST, "/users", Some(json!({ "user_id": 4 }))).await;

    let ratings = [(1, 1, 9), (2, 1, 7), (3, 1, 2), (1, 2, 8), (2, 2, 6), (2, 3, 8), (3, 3, 3)];
    for (film, user, rating) in ratings {
        let uri = format!("/ratings/{}/{}/{}", film, user, rating);
        let (status, _) = send(app, Method::PUT, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_register_user_twice() {
    let app = test_app().await;
    let (status, _) = send(&app, Method::POST, "/users", Some(json!({ "user_id": 7 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, "/users", Some(json!({ "user_id": 7 }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rating_out_of_range() {
    let app = test_app().await;
    seed(&app).await;
    let (status, body) = send(&app, Method::PUT, "/ratings/1/1/11", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_recommendations_predicted() {
    let app = test_app().await;
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/users/3/recommendations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], "predicted");
    assert_eq!(body["data"]["films"], json!([1]));
}

#[tokio::test]
async fn test_recommendations_fallback() {
    let app = test_app().await;
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/users/4/recommendations?count=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], "fallback");
    assert_eq!(body["data"]["films"], json!([1, 2]));
}

#[tokio::test]
async fn test_recommendations_unknown_user() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/users/42/recommendations", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_predictions_and_removal() {
    let app = test_app().await;
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/users/2/predictions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["film_id"], 3);
    assert_eq!(body["data"][0]["prediction"]["kind"], "estimated");

    let (status, body) = send(&app, Method::DELETE, "/ratings/3/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], 2);

    let (status, body) = send(&app, Method::GET, "/users/1/ratings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("3").is_none());

    let (status, _) = send(&app, Method::DELETE, "/ratings/3/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_popular_films() {
    let app = test_app().await;
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/films/popular?count=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([1, 2, 3]));
}
