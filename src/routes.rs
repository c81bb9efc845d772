use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::GenerationError;
use crate::models::{ControllerSnapshot, GenerateForm};
use crate::page::render_page;
use crate::services::controller::GenerationController;

const BUSY_MESSAGE: &str = "An article is already being generated.";
const INCOMPLETE_MESSAGE: &str = "API key, topic and length are all required.";

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<GenerationController>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate_form))
        .route("/health", get(health_check))
        .route("/api/state", get(api_state))
        .route("/api/generate", post(api_generate))
        .route("/api/reset", post(api_reset))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

#[derive(Debug)]
pub enum ApiError {
    Busy,
    Incomplete,
    BadLength(GenerationError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Busy => (StatusCode::CONFLICT, BUSY_MESSAGE.to_string()),
            ApiError::Incomplete => (
                StatusCode::UNPROCESSABLE_ENTITY,
                INCOMPLETE_MESSAGE.to_string(),
            ),
            ApiError::BadLength(err) => (StatusCode::BAD_REQUEST, err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Applies the posted fields and runs one submission.
async fn run_submission(
    controller: &Arc<GenerationController>,
    form: &GenerateForm,
) -> Result<ControllerSnapshot, ApiError> {
    match controller.submit_form(form).await {
        Ok(Some(snapshot)) => Ok(snapshot),
        Ok(None) => Err(ApiError::Incomplete),
        Err(GenerationError::SubmissionInFlight) => Err(ApiError::Busy),
        Err(err) => Err(ApiError::BadLength(err)),
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.controller.snapshot().await;
    Html(render_page(&snapshot, None))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn generate_form(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> (StatusCode, Html<String>) {
    match run_submission(&state.controller, &form).await {
        Ok(snapshot) => (StatusCode::OK, Html(render_page(&snapshot, None))),
        Err(err) => {
            let (status, notice) = err.status_and_message();
            let snapshot = state.controller.snapshot().await;
            (status, Html(render_page(&snapshot, Some(&notice))))
        }
    }
}

async fn api_state(State(state): State<AppState>) -> Json<ControllerSnapshot> {
    Json(state.controller.snapshot().await)
}

async fn api_generate(
    State(state): State<AppState>,
    Json(form): Json<GenerateForm>,
) -> Result<Json<ControllerSnapshot>, ApiError> {
    run_submission(&state.controller, &form).await.map(Json)
}

async fn api_reset(State(state): State<AppState>) -> Result<Json<ControllerSnapshot>, ApiError> {
    if !state.controller.reset().await {
        return Err(ApiError::Busy);
    }
    Ok(Json(state.controller.snapshot().await))
}
