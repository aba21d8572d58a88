//! Ownership-transfer endpoints. The pending slot itself is read through the
//! household resource.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use api_types::ownership::TransferInitiate;

use crate::{ServerError, server::ServerState, user};

pub async fn initiate(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<TransferInitiate>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .initiate_ownership_transfer(
            household_id,
            payload.target_member_id,
            &user.username,
            Utc::now(),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn accept(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .accept_ownership_transfer(household_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn decline(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .decline_ownership_transfer(household_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .revoke_ownership_transfer(household_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
