use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use bookdrive_core::allocations::{
    AllocationFilter, AllocationRequest, AllocationStatus, BookAllocation, DonorAllocationHistory,
    DonorInventory, DriveInventory,
};
use bookdrive_core::books::BookCounts;

use crate::{api::actor::ActingUser, error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllocateBody {
    #[serde(alias = "donationDriveId")]
    drive_id: String,
    #[serde(default)]
    donor_id: Option<String>,
    school_id: String,
    #[serde(default)]
    books_allocated: serde_json::Value,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocationResponse {
    message: &'static str,
    allocation: BookAllocation,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    status: AllocationStatus,
    #[serde(default)]
    delivery_date: Option<NaiveDateTime>,
}

async fn donors_by_drive(
    actor: ActingUser,
    Path(drive_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DonorInventory>>> {
    actor.require_admin()?;
    let donors = state.allocation_service.get_donors_with_inventory(&drive_id)?;
    Ok(Json(donors))
}

async fn allocate(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AllocateBody>,
) -> ApiResult<(StatusCode, Json<AllocationResponse>)> {
    actor.require_admin()?;
    let request = AllocationRequest {
        drive_id: body.drive_id,
        donor_id: body.donor_id,
        school_id: body.school_id,
        books_allocated: BookCounts::from_lenient(&body.books_allocated),
        notes: body.notes,
        allocated_by: actor.0.id,
    };
    let allocation = state.allocation_service.allocate(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(AllocationResponse {
            message: "Books allocated successfully",
            allocation,
        }),
    ))
}

async fn list_all(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<BookAllocation>>> {
    actor.require_admin()?;
    Ok(Json(state.allocation_service.get_allocations(AllocationFilter::All)?))
}

async fn list_by_drive(
    actor: ActingUser,
    Path(drive_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<BookAllocation>>> {
    actor.require_admin()?;
    Ok(Json(
        state
            .allocation_service
            .get_allocations(AllocationFilter::Drive(drive_id))?,
    ))
}

async fn list_by_school(
    actor: ActingUser,
    Path(school_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<BookAllocation>>> {
    actor.require_admin()?;
    Ok(Json(
        state
            .allocation_service
            .get_allocations(AllocationFilter::School(school_id))?,
    ))
}

async fn update_status(
    actor: ActingUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<AllocationResponse>> {
    actor.require_admin()?;
    let allocation = state
        .allocation_service
        .update_allocation_status(&id, body.status, body.delivery_date)
        .await?;
    Ok(Json(AllocationResponse {
        message: "Allocation status updated successfully",
        allocation,
    }))
}

async fn drive_inventory(
    actor: ActingUser,
    Path(drive_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DriveInventory>> {
    actor.require_admin()?;
    Ok(Json(state.allocation_service.get_drive_inventory(&drive_id)?))
}

async fn my_allocations(
    actor: ActingUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DonorAllocationHistory>> {
    let history = state
        .allocation_service
        .get_donor_allocation_history(&actor.0.id)?;
    Ok(Json(history))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/allocations/donors/by-drive/{drive_id}", get(donors_by_drive))
        .route("/allocations/allocate", post(allocate))
        .route("/allocations/all", get(list_all))
        .route("/allocations/by-drive/{drive_id}", get(list_by_drive))
        .route("/allocations/by-school/{school_id}", get(list_by_school))
        .route("/allocations/{id}/status", put(update_status))
        .route("/allocations/drive-inventory/{drive_id}", get(drive_inventory))
        .route("/donor-allocations/my-allocations", get(my_allocations))
}
