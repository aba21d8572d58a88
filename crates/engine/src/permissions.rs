//! Member permissions.
//!
//! One optional row per non-owner member; absence of a row means "no
//! permissions". The owner bypasses this table entirely. The absence case is
//! resolved once at lookup time into an `Option<MemberPermissions>` instead
//! of leaking implicit column defaults through the engine.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single grantable capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreateManagedMembers,
    RemoveMembers,
    ReactivateMembers,
    ApproveJoinRequests,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateManagedMembers => "create_managed_members",
            Self::RemoveMembers => "remove_members",
            Self::ReactivateMembers => "reactivate_members",
            Self::ApproveJoinRequests => "approve_join_requests",
        }
    }
}

/// The capability set of one member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPermissions {
    pub create_managed_members: bool,
    pub remove_members: bool,
    pub reactivate_members: bool,
    pub approve_join_requests: bool,
}

impl MemberPermissions {
    /// No permissions at all (the meaning of an absent row).
    pub const NONE: MemberPermissions = MemberPermissions {
        create_managed_members: false,
        remove_members: false,
        reactivate_members: false,
        approve_join_requests: false,
    };

    /// Default grants on first approval: everything except approving join
    /// requests, which must be granted explicitly.
    #[must_use]
    pub const fn default_grants() -> Self {
        Self {
            create_managed_members: true,
            remove_members: true,
            reactivate_members: true,
            approve_join_requests: false,
        }
    }

    #[must_use]
    pub const fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::CreateManagedMembers => self.create_managed_members,
            Capability::RemoveMembers => self.remove_members,
            Capability::ReactivateMembers => self.reactivate_members,
            Capability::ApproveJoinRequests => self.approve_join_requests,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "member_permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub member_id: String,
    pub create_managed_members: bool,
    pub remove_members: bool,
    pub reactivate_members: bool,
    pub approve_join_requests: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Members,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn permissions(&self) -> MemberPermissions {
        MemberPermissions {
            create_managed_members: self.create_managed_members,
            remove_members: self.remove_members,
            reactivate_members: self.reactivate_members,
            approve_join_requests: self.approve_join_requests,
        }
    }
}

pub(crate) fn active_model(member_id: Uuid, permissions: MemberPermissions) -> ActiveModel {
    ActiveModel {
        member_id: ActiveValue::Set(member_id.to_string()),
        create_managed_members: ActiveValue::Set(permissions.create_managed_members),
        remove_members: ActiveValue::Set(permissions.remove_members),
        reactivate_members: ActiveValue::Set(permissions.reactivate_members),
        approve_join_requests: ActiveValue::Set(permissions.approve_join_requests),
    }
}
