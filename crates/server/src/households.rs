//! Household endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use api_types::household::{Household, HouseholdNew, HouseholdRename};

use crate::{ServerError, server::ServerState, user};

fn view(household: engine::Household) -> Household {
    Household {
        id: household.id,
        name: household.name,
        created_by: household.created_by,
        created_at: household.created_at,
        pending_owner_member_id: household.pending_transfer.map(|t| t.target_member_id),
        transfer_initiated_at: household.pending_transfer.map(|t| t.initiated_at),
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<HouseholdNew>,
) -> Result<(StatusCode, Json<Household>), ServerError> {
    let household = state
        .engine
        .create_household(
            &payload.name,
            &payload.display_name,
            &user.username,
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view(household))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Household>>, ServerError> {
    let households = state
        .engine
        .list_households(&user.username)
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(Json(households))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<Json<Household>, ServerError> {
    let household = state.engine.household(household_id, &user.username).await?;
    Ok(Json(view(household)))
}

pub async fn rename(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<HouseholdRename>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .rename_household(household_id, &payload.name, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
