//! Membership lifecycle endpoints: joining, approval, managed members,
//! removal and reactivation.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use api_types::member::{ClaimRequest, JoinRequest, ManagedMemberNew, Member};

use crate::{ServerError, server::ServerState, user};

/// Member view with the claim code stripped. The code is a bearer secret and
/// only ever leaves the server in the response to the creation call.
fn view(member: engine::Member) -> Member {
    Member {
        id: member.id,
        household_id: member.household_id,
        user_id: member.user_id,
        display_name: member.display_name,
        status: member.status.as_str().to_string(),
        role: member.role.as_str().to_string(),
        claim_code: None,
        created_at: member.created_at,
    }
}

pub async fn request_join(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<JoinRequest>,
) -> Result<(StatusCode, Json<Member>), ServerError> {
    let member = state
        .engine
        .request_join(household_id, &payload.display_name, &user.username, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(view(member))))
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Member>, ServerError> {
    let member = state
        .engine
        .approve_member(household_id, member_id, &user.username)
        .await?;
    Ok(Json(view(member)))
}

pub async fn create_managed(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<ManagedMemberNew>,
) -> Result<(StatusCode, Json<Member>), ServerError> {
    let member = state
        .engine
        .create_managed_member(household_id, &payload.display_name, &user.username, Utc::now())
        .await?;
    let claim_code = member.claim_code.clone();
    let mut body = view(member);
    body.claim_code = claim_code;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn claim(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<ClaimRequest>,
) -> Result<Json<Member>, ServerError> {
    let member = state
        .engine
        .claim_managed_member(household_id, &payload.claim_code, &user.username)
        .await?;
    Ok(Json(view(member)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(household_id, member_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reactivate(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Member>, ServerError> {
    let member = state
        .engine
        .reactivate_member(household_id, member_id, &user.username)
        .await?;
    Ok(Json(view(member)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<Json<Vec<Member>>, ServerError> {
    let members = state
        .engine
        .list_members(household_id, &user.username)
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(Json(members))
}
