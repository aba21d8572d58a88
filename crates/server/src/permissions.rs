//! Permission endpoints. `GET` returns the effective capability set, so an
//! owner reads as all-true even though no row backs it.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::permission::Permissions;
use engine::MemberPermissions;

use crate::{ServerError, server::ServerState, user};

pub async fn get_permissions(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Permissions>, ServerError> {
    let grants = state
        .engine
        .member_permissions(household_id, member_id, &user.username)
        .await?;
    Ok(Json(Permissions {
        create_managed_members: grants.create_managed_members,
        remove_members: grants.remove_members,
        reactivate_members: grants.reactivate_members,
        approve_join_requests: grants.approve_join_requests,
    }))
}

pub async fn set_permissions(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((household_id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<Permissions>,
) -> Result<StatusCode, ServerError> {
    let grants = MemberPermissions {
        create_managed_members: payload.create_managed_members,
        remove_members: payload.remove_members,
        reactivate_members: payload.reactivate_members,
        approve_join_requests: payload.approve_join_requests,
    };
    state
        .engine
        .set_permissions(household_id, member_id, grants, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
