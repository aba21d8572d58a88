//! Household primitives.
//!
//! A household groups members and their shared transactions. It also carries
//! the single pending ownership-transfer slot: a nullable
//! `(pending_owner_member_id, transfer_initiated_at)` pair. At most one
//! transfer can be in flight per household at any time.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// A pending ownership transfer targeting one member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub target_member_id: Uuid,
    pub initiated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub pending_transfer: Option<PendingTransfer>,
}

impl Household {
    pub fn new(name: String, created_by: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_by,
            created_at,
            pending_transfer: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "households")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub pending_owner_member_id: Option<String>,
    pub transfer_initiated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::members::Entity")]
    Members,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Household> for ActiveModel {
    fn from(household: &Household) -> Self {
        Self {
            id: ActiveValue::Set(household.id.to_string()),
            name: ActiveValue::Set(household.name.clone()),
            created_by: ActiveValue::Set(household.created_by.clone()),
            created_at: ActiveValue::Set(household.created_at),
            pending_owner_member_id: ActiveValue::Set(
                household
                    .pending_transfer
                    .map(|t| t.target_member_id.to_string()),
            ),
            transfer_initiated_at: ActiveValue::Set(
                household.pending_transfer.map(|t| t.initiated_at),
            ),
        }
    }
}

impl TryFrom<Model> for Household {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let pending_transfer = match (model.pending_owner_member_id, model.transfer_initiated_at) {
            (Some(member_id), Some(initiated_at)) => Some(PendingTransfer {
                target_member_id: parse_uuid(&member_id, "member")?,
                initiated_at,
            }),
            _ => None,
        };
        Ok(Self {
            id: parse_uuid(&model.id, "household")?,
            name: model.name,
            created_by: model.created_by,
            created_at: model.created_at,
            pending_transfer,
        })
    }
}
