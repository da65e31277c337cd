// POST /api/moderate — moderate one message.
//
// Body: { "message": string, "guidelines"?: string | null }
// Omitted or null guidelines fall back to the server's default document.
//
// Returns 200 with { result, rule, verdict }, 400 when the body has the
// wrong shape or isn't JSON, 415 without a JSON content type, 503 when a
// classifier is unavailable. Every error body is { "error": string }.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::error::ModerationError;
use crate::moderator::ModerationRequest;
use crate::web::{api_error, AppState};

pub async fn moderate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(rejection.status(), &rejection.body_text()),
    };

    let request = match ModerationRequest::from_json(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    let guidelines = request
        .guidelines
        .as_deref()
        .unwrap_or(state.default_guidelines.as_str());

    match state
        .moderator
        .moderate_verdict(&request.message, guidelines)
        .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &ModerationError) -> Response {
    match err {
        ModerationError::InvalidInput { .. } => api_error(StatusCode::BAD_REQUEST, &err.to_string()),
        ModerationError::ServiceUnavailable { .. } => {
            tracing::error!(error = %err, "Moderation aborted");
            api_error(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
    }
}
