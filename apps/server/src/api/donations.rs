use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use bookdrive_core::donations::{DonationRecord, DonationStatus, DonationSubmission};

use crate::{api::actor::ActingUser, error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DonationResponse {
    message: &'static str,
    donation: DonationRecord,
}

#[derive(Deserialize)]
struct StatusBody {
    status: DonationStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecalculateResponse {
    message: &'static str,
    updated_drives: usize,
}

async fn submit(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
    Json(submission): Json<DonationSubmission>,
) -> ApiResult<(StatusCode, Json<DonationResponse>)> {
    let donation = state
        .donation_service
        .submit_donation(&actor.0.id, submission)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DonationResponse {
            message: "Donation submitted successfully",
            donation,
        }),
    ))
}

async fn list_all(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DonationRecord>>> {
    actor.require_admin()?;
    Ok(Json(state.donation_service.get_all_donations()?))
}

async fn my_donations(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DonationRecord>>> {
    Ok(Json(
        state.donation_service.get_donations_for_donor(&actor.0.id)?,
    ))
}

async fn update_status(
    actor: ActingUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<DonationResponse>> {
    actor.require_admin_or_coordinator()?;
    let donation = state
        .donation_service
        .update_donation_status(&id, body.status)
        .await?;
    Ok(Json(DonationResponse {
        message: "Donation status updated successfully",
        donation,
    }))
}

async fn recalculate_totals(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RecalculateResponse>> {
    actor.require_admin()?;
    let updated_drives = state.consistency_service.recalculate_drive_totals().await?;
    Ok(Json(RecalculateResponse {
        message: "Drive totals recalculated successfully",
        updated_drives,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/donations/submit", post(submit))
        .route("/donations/all", get(list_all))
        .route("/donations/my-donations", get(my_donations))
        .route("/donations/{id}/status", put(update_status))
        .route("/donations/recalculate-totals", post(recalculate_totals))
}
