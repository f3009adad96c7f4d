//! Tests for the HTTP API, driven through the router without a socket

use super::*;
use crate::store::{BlockingStore, JsonStore, SqliteStore};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn sqlite_router() -> Router {
    create_router(Arc::new(BlockingStore::new(SqliteStore::open_in_memory().unwrap())))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn seed_flour_and_cake(router: &Router) -> i64 {
    send(
        router,
        Method::POST,
        "/api/inventory",
        Some(json!({"name": "flour", "measurement": 500, "unit": "g"})),
    )
    .await;
    let (_, recipe) = send(
        router,
        Method::POST,
        "/api/recipes",
        Some(json!({
            "name": "Cake",
            "ingredients": [
                {"name": "flour", "quantity": 200, "unit": "g"},
                {"name": "sugar", "quantity": 50, "unit": "g"}
            ]
        })),
    )
    .await;
    recipe["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let router = sqlite_router();
    let (status, body) = send(&router, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_ingredients_create_and_list() {
    let router = sqlite_router();

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/ingredients",
        Some(json!({"name": "basil", "notes": "fresh"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created, json!({"id": 1, "name": "basil", "notes": "fresh"}));

    let (status, listed) = send(&router, Method::GET, "/api/ingredients", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn test_inventory_defaults_is_recipe_to_false() {
    let router = sqlite_router();

    let (status, item) = send(
        &router,
        Method::POST,
        "/api/inventory",
        Some(json!({"name": "milk", "measurement": 1.5, "unit": "l", "expiration": "2026-11-01"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["id"], 1);
    assert_eq!(item["is_recipe"], false);
    assert_eq!(item["expiration"], "2026-11-01");
    assert_eq!(item["brand"], Value::Null);
}

#[tokio::test]
async fn test_inventory_rejects_non_positive_measurement() {
    let router = sqlite_router();

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/inventory",
        Some(json!({"name": "milk", "measurement": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("measurement"));

    let (_, listed) = send(&router, Method::GET, "/api/inventory", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_inventory_missing_measurement_returns_detail() {
    let router = sqlite_router();

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/inventory",
        Some(json!({"name": "milk"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("measurement"), "{}", detail);

    let (_, listed) = send(&router, Method::GET, "/api/inventory", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_malformed_bodies_return_detail() {
    let router = sqlite_router();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/recipes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": \"Cake\", "))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].is_string());

    // No content type at all
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/ingredients")
        .body(Body::from(r#"{"name": "basil"}"#))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_recipe_rejects_non_positive_quantity() {
    let router = sqlite_router();

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/recipes",
        Some(json!({
            "name": "Broken",
            "ingredients": [{"name": "flour", "quantity": -1, "unit": "g"}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_recipe_round_trip() {
    let router = sqlite_router();
    let id = seed_flour_and_cake(&router).await;

    let (status, recipe) = send(&router, Method::GET, &format!("/api/recipes/{}", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(recipe["name"], "Cake");
    assert_eq!(recipe["notes"], Value::Null);
    assert_eq!(
        recipe["ingredients"],
        json!([
            {"name": "flour", "quantity": 200.0, "unit": "g"},
            {"name": "sugar", "quantity": 50.0, "unit": "g"}
        ])
    );

    let (_, listed) = send(&router, Method::GET, "/api/recipes", None).await;
    assert_eq!(listed, json!([recipe]));
}

#[tokio::test]
async fn test_max_batches_for_single_ingredient() {
    let router = sqlite_router();
    send(
        &router,
        Method::POST,
        "/api/inventory",
        Some(json!({"name": "flour", "measurement": 500, "unit": "g"})),
    )
    .await;
    let (_, recipe) = send(
        &router,
        Method::POST,
        "/api/recipes",
        Some(json!({"name": "Bread", "ingredients": [{"name": "flour", "quantity": 200, "unit": "g"}]})),
    )
    .await;

    let (status, body) = send(
        &router,
        Method::GET,
        &format!("/api/recipes/{}/max-batches", recipe["id"]),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"max_batches": 2}));
}

#[tokio::test]
async fn test_validate_reports_missing_sugar() {
    let router = sqlite_router();
    let id = seed_flour_and_cake(&router).await;

    let (status, body) = send(
        &router,
        Method::POST,
        &format!("/api/recipes/{}/validate", id),
        Some(json!({"batches": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "can_make": false,
            "batches_requested": 1,
            "max_batches": 0,
            "shortages": [
                {"name": "sugar", "unit": "g", "required": 50.0, "available": 0.0, "missing": 50.0}
            ]
        })
    );
}

#[tokio::test]
async fn test_validate_without_body_checks_one_batch() {
    let router = sqlite_router();
    let id = seed_flour_and_cake(&router).await;

    let (status, body) = send(&router, Method::POST, &format!("/api/recipes/{}/validate", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["batches_requested"], 1);
}

#[tokio::test]
async fn test_validate_rejects_zero_batches() {
    let router = sqlite_router();
    let id = seed_flour_and_cake(&router).await;

    let (status, body) = send(
        &router,
        Method::POST,
        &format!("/api/recipes/{}/validate", id),
        Some(json!({"batches": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("batches"));
}

#[tokio::test]
async fn test_unknown_recipe_is_not_found() {
    let router = sqlite_router();

    for (method, uri) in [
        (Method::GET, "/api/recipes/42"),
        (Method::GET, "/api/recipes/42/max-batches"),
        (Method::POST, "/api/recipes/42/validate"),
    ] {
        let (status, body) = send(&router, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, json!({"detail": "Recipe not found"}));
    }
}

#[tokio::test]
async fn test_json_backend_serves_the_same_api() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonStore::open(&temp_dir.path().join("db.json")).unwrap();
    let router = create_router(Arc::new(BlockingStore::new(store)));

    let id = seed_flour_and_cake(&router).await;
    send(
        &router,
        Method::POST,
        "/api/inventory",
        Some(json!({"name": "Sugar", "measurement": 120, "unit": "g"})),
    )
    .await;

    let (status, body) = send(&router, Method::GET, &format!("/api/recipes/{}/max-batches", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"max_batches": 2}));
}

#[test]
fn test_blank_body_parses_as_default_request() {
    assert_eq!(
        parse_validation_request(b"").unwrap(),
        ValidationRequest::default()
    );
    assert_eq!(parse_validation_request(b"  \n").unwrap().batches, 1);
    assert_eq!(parse_validation_request(br#"{"batches": 4}"#).unwrap().batches, 4);
    assert!(parse_validation_request(b"{oops").is_err());
}

#[test]
fn test_storage_errors_map_to_500() {
    let err = ApiError::from(StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "disk on fire",
    )));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
