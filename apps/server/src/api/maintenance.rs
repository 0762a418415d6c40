use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use bookdrive_core::consistency::ConsistencyReport;

use crate::{api::actor::ActingUser, error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReconcileResponse {
    message: &'static str,
    updated_users: usize,
}

async fn reconcile_donors(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ReconcileResponse>> {
    actor.require_admin()?;
    let updated_users = state.consistency_service.reconcile_donor_totals().await?;
    Ok(Json(ReconcileResponse {
        message: "Donor totals reconciled successfully",
        updated_users,
    }))
}

/// Read-only report of stored totals that disagree with their breakdowns.
async fn audit(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ConsistencyReport>> {
    actor.require_admin()?;
    Ok(Json(state.consistency_service.audit()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/maintenance/reconcile-donors", post(reconcile_donors))
        .route("/maintenance/audit", get(audit))
}
