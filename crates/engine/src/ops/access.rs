use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Capability, EngineError, Household, Member, MemberPermissions, MemberRole, MemberStatus,
    ResultEngine, households, members, permissions, users,
};

use super::Engine;

impl Engine {
    pub(super) async fn require_household(
        &self,
        db: &DatabaseTransaction,
        household_id: Uuid,
    ) -> ResultEngine<Household> {
        let model = households::Entity::find_by_id(household_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("household not exists".to_string()))?;
        Household::try_from(model)
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }

    /// Resolves the member the user acts as within a household.
    ///
    /// The member must be `approved`: pending and inactive members cannot
    /// perform any operation.
    pub(super) async fn require_acting_member(
        &self,
        db: &DatabaseTransaction,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Member> {
        let model = members::Entity::find()
            .filter(members::Column::HouseholdId.eq(household_id.to_string()))
            .filter(members::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| {
                EngineError::Forbidden("user is not a member of this household".to_string())
            })?;
        let member = Member::try_from(model)?;
        if member.status != MemberStatus::Approved {
            return Err(EngineError::Forbidden(
                "member is not approved".to_string(),
            ));
        }
        Ok(member)
    }

    /// Looks up any member (whatever its status) within a household.
    pub(super) async fn require_member_in_household(
        &self,
        db: &DatabaseTransaction,
        household_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<Member> {
        let model = members::Entity::find_by_id(member_id.to_string())
            .filter(members::Column::HouseholdId.eq(household_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))?;
        Member::try_from(model)
    }

    pub(super) fn require_owner(&self, member: &Member) -> ResultEngine<()> {
        if member.role != MemberRole::Owner {
            return Err(EngineError::Forbidden(
                "only the household owner may do this".to_string(),
            ));
        }
        Ok(())
    }

    /// The capability set a member effectively holds: owners hold everything,
    /// everyone else holds exactly their stored permission row (or nothing).
    pub(super) async fn effective_permissions(
        &self,
        db: &DatabaseTransaction,
        member: &Member,
    ) -> ResultEngine<MemberPermissions> {
        if member.role == MemberRole::Owner {
            return Ok(MemberPermissions {
                create_managed_members: true,
                remove_members: true,
                reactivate_members: true,
                approve_join_requests: true,
            });
        }
        let row = permissions::Entity::find_by_id(member.id.to_string())
            .one(db)
            .await?;
        Ok(row
            .map(|model| model.permissions())
            .unwrap_or(MemberPermissions::NONE))
    }

    pub(super) async fn require_capability(
        &self,
        db: &DatabaseTransaction,
        member: &Member,
        capability: Capability,
    ) -> ResultEngine<()> {
        let granted = self.effective_permissions(db, member).await?;
        if !granted.allows(capability) {
            return Err(EngineError::Forbidden(format!(
                "missing capability: {}",
                capability.as_str()
            )));
        }
        Ok(())
    }
}
