//! Read-only ledger views: balances, the zero-sum health check and the
//! split-integrity scan.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use api_types::balance::{BalanceHealth, MemberBalance, SplitImbalance};
use engine::HealthStatus;

use crate::{ServerError, server::ServerState, user};

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<Json<Vec<MemberBalance>>, ServerError> {
    let balances = state
        .engine
        .member_balances(household_id, &user.username)
        .await?
        .into_iter()
        .map(|balance| MemberBalance {
            member_id: balance.member_id,
            total_paid_minor: balance.total_paid.cents(),
            total_share_minor: balance.total_share.cents(),
            balance_minor: balance.balance.cents(),
        })
        .collect();
    Ok(Json(balances))
}

pub async fn health(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<Json<BalanceHealth>, ServerError> {
    let health = state
        .engine
        .balance_health(household_id, &user.username)
        .await?;
    Ok(Json(BalanceHealth {
        status: match health.status {
            HealthStatus::Balanced => "balanced".to_string(),
            HealthStatus::Imbalanced => "imbalanced".to_string(),
        },
        total_imbalance_minor: health.total_imbalance.cents(),
    }))
}

pub async fn integrity(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<Json<Vec<SplitImbalance>>, ServerError> {
    let findings = state
        .engine
        .problematic_transactions(household_id, &user.username)
        .await?
        .into_iter()
        .map(|finding| SplitImbalance {
            transaction_id: finding.transaction_id,
            amount_minor: finding.amount.cents(),
            owed_sum_minor: finding.owed_sum.cents(),
            paid_sum_minor: finding.paid_sum.cents(),
        })
        .collect();
    Ok(Json(findings))
}
