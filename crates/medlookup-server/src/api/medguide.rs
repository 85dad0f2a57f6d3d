//! Medicine assistant endpoint

use axum::{extract::State, Json};
use medlookup_core::synthesizer::EXAMPLE_QUERIES;
use medlookup_core::MedicineResponse;
use serde::Deserialize;
use tracing::warn;

use super::error::ApiError;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub message: String,
}

/// POST /api/medguide
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<MedicineResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Please provide a medicine query")
            .with_examples(EXAMPLE_QUERIES));
    }

    match tokio::time::timeout(state.request_timeout, state.assistant.handle(message)).await {
        Ok(result) => Ok(Json(result?)),
        Err(_) => {
            warn!(timeout = ?state.request_timeout, "Assistant call timed out");
            Err(ApiError::unavailable("Service temporarily unavailable")
                .with_details("The request took too long, please try again"))
        }
    }
}
