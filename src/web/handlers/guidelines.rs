// GET /api/guidelines — the default guidelines and the policy they parse to.
//
// The form page preloads its guidelines textbox from here.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::policy;
use crate::web::AppState;

pub async fn get_guidelines(State(state): State<AppState>) -> impl IntoResponse {
    let parsed = policy::parse(&state.default_guidelines);
    Json(serde_json::json!({
        "guidelines": state.default_guidelines.as_str(),
        "policy": parsed,
    }))
}
