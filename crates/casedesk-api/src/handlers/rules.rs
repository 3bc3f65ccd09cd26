//! SLA rule handlers.

use axum::{extract::State, Json};

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::RuleListResponse;

/// GET /api/rules - The SLA rule set in evaluation order.
pub async fn list_rules(State(state): State<AppState>) -> Result<Json<RuleListResponse>> {
    let store = state
        .intake
        .store()
        .ok_or_else(|| ApiError::ServiceUnavailable("no persistence store is configured".to_string()))?;

    let rules = store.list_sla_rules()?;
    let total = rules.len();
    Ok(Json(RuleListResponse { rules, total }))
}
