//! HTTP API for ingredients, inventory and recipes
//!
//! Thin layer over a [`RecipeStore`]: payloads are validated here, records are
//! fetched from the store and batch questions are answered by the feasibility
//! engine in `pantry_common`.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use pantry_common::{
    compute_max_batches, validate, FoodRecipe, Ingredient, InventoryItem, NewIngredient,
    NewInventoryItem, NewRecipe, ValidationError, ValidationRequest, ValidationResult,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::StoreError;
use crate::store::RecipeStore;

/// Shared application state (the record store selected at startup)
#[derive(Clone)]
struct AppState {
    store: Arc<dyn RecipeStore>,
}

/// Errors surfaced to HTTP clients as `{"detail": ...}`
#[derive(Debug)]
pub enum ApiError {
    /// Requested record does not exist
    NotFound(&'static str),
    /// Payload failed validation
    Validation(String),
    /// Store failure, reported without internals
    Storage(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Storage(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, what.to_string()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Storage(e) => {
                log::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal storage error".to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// JSON request body whose rejections are reported as `{"detail": ...}`
/// with status 422 instead of axum's plain-text responses
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Response body of the max-batches endpoint
#[derive(Debug, Serialize)]
struct MaxBatches {
    max_batches: u64,
}

/// GET /api/health
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// POST /api/ingredients
async fn create_ingredient_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewIngredient>,
) -> ApiResult<Ingredient> {
    Ok(Json(state.store.create_ingredient(&payload).await?))
}

/// GET /api/ingredients
async fn list_ingredients_handler(State(state): State<AppState>) -> ApiResult<Vec<Ingredient>> {
    Ok(Json(state.store.list_ingredients().await?))
}

/// POST /api/inventory
async fn create_inventory_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewInventoryItem>,
) -> ApiResult<InventoryItem> {
    payload.validate()?;
    Ok(Json(state.store.create_inventory_item(&payload).await?))
}

/// GET /api/inventory
async fn list_inventory_handler(State(state): State<AppState>) -> ApiResult<Vec<InventoryItem>> {
    Ok(Json(state.store.list_inventory_items().await?))
}

/// POST /api/recipes
async fn create_recipe_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewRecipe>,
) -> ApiResult<FoodRecipe> {
    payload.validate()?;
    Ok(Json(state.store.create_recipe(&payload).await?))
}

/// GET /api/recipes
async fn list_recipes_handler(State(state): State<AppState>) -> ApiResult<Vec<FoodRecipe>> {
    Ok(Json(state.store.list_recipes().await?))
}

async fn find_recipe(store: &dyn RecipeStore, id: i64) -> Result<FoodRecipe, ApiError> {
    store
        .get_recipe(id)
        .await?
        .ok_or(ApiError::NotFound("Recipe not found"))
}

/// GET /api/recipes/{id}
async fn get_recipe_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<FoodRecipe> {
    Ok(Json(find_recipe(state.store.as_ref(), id).await?))
}

/// GET /api/recipes/{id}/max-batches
async fn max_batches_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<MaxBatches> {
    let recipe = find_recipe(state.store.as_ref(), id).await?;
    let inventory = state.store.list_inventory_items().await?;

    Ok(Json(MaxBatches {
        max_batches: compute_max_batches(&recipe, &inventory),
    }))
}

/// POST /api/recipes/{id}/validate
///
/// The body is optional; an empty body checks a single batch.
async fn validate_recipe_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<ValidationResult> {
    let request = parse_validation_request(&body)?;
    request.validate()?;

    let recipe = find_recipe(state.store.as_ref(), id).await?;
    let inventory = state.store.list_inventory_items().await?;

    Ok(Json(validate(&recipe, &inventory, request.batches)))
}

fn parse_validation_request(body: &[u8]) -> Result<ValidationRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ValidationRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Validation(e.to_string()))
}

/// Build the web server router
pub fn create_router(store: Arc<dyn RecipeStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/ingredients",
            get(list_ingredients_handler).post(create_ingredient_handler),
        )
        .route(
            "/api/inventory",
            get(list_inventory_handler).post(create_inventory_handler),
        )
        .route(
            "/api/recipes",
            get(list_recipes_handler).post(create_recipe_handler),
        )
        .route("/api/recipes/{id}", get(get_recipe_handler))
        .route("/api/recipes/{id}/max-batches", get(max_batches_handler))
        .route("/api/recipes/{id}/validate", post(validate_recipe_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server and run until Ctrl+C
pub async fn serve(
    store: Arc<dyn RecipeStore>,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(store);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    log::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod tests;
