//! Household members.
//!
//! A member belongs to exactly one household. Members are either *unmanaged*
//! (backed by a user identity) or *managed* (no identity; administered by
//! another member until claimed via a one-time code).
//!
//! Status transitions are the only mutation path once a member has
//! transaction history: such members are never hard-deleted, only flipped to
//! `inactive`, so every historical split keeps its referent.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Pending,
    Approved,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Inactive => "inactive",
        }
    }
}

impl TryFrom<&str> for MemberStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "inactive" => Ok(Self::Inactive),
            other => Err(EngineError::Validation(format!(
                "invalid member status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "member" => Ok(Self::Member),
            other => Err(EngineError::Validation(format!(
                "invalid member role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub household_id: Uuid,
    /// `None` for managed members (no authenticating identity).
    pub user_id: Option<String>,
    pub display_name: String,
    pub status: MemberStatus,
    pub role: MemberRole,
    /// One-time claim code, present only on unclaimed managed members.
    pub claim_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        household_id: Uuid,
        user_id: Option<String>,
        display_name: String,
        status: MemberStatus,
        role: MemberRole,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            household_id,
            user_id,
            display_name,
            status,
            role,
            claim_code: None,
            created_at,
        }
    }

    /// A managed member has no identity of its own.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.user_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub household_id: String,
    pub user_id: Option<String>,
    pub display_name: String,
    pub status: String,
    pub role: String,
    pub claim_code: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::households::Entity",
        from = "Column::HouseholdId",
        to = "super::households::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Households,
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
}

impl Related<super::households::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Households.def()
    }
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Member> for ActiveModel {
    fn from(member: &Member) -> Self {
        Self {
            id: ActiveValue::Set(member.id.to_string()),
            household_id: ActiveValue::Set(member.household_id.to_string()),
            user_id: ActiveValue::Set(member.user_id.clone()),
            display_name: ActiveValue::Set(member.display_name.clone()),
            status: ActiveValue::Set(member.status.as_str().to_string()),
            role: ActiveValue::Set(member.role.as_str().to_string()),
            claim_code: ActiveValue::Set(member.claim_code.clone()),
            created_at: ActiveValue::Set(member.created_at),
        }
    }
}

impl TryFrom<Model> for Member {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "member")?,
            household_id: parse_uuid(&model.household_id, "household")?,
            user_id: model.user_id,
            display_name: model.display_name,
            status: MemberStatus::try_from(model.status.as_str())?,
            role: MemberRole::try_from(model.role.as_str())?,
            claim_code: model.claim_code,
            created_at: model.created_at,
        })
    }
}
