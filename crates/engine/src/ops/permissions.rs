use sea_orm::{ModelTrait, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MemberPermissions, MemberRole, MemberStatus, ResultEngine, permissions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Replaces a member's permission grants. Owner only; the owner itself
    /// never carries a permission row.
    pub async fn set_permissions(
        &self,
        household_id: Uuid,
        member_id: Uuid,
        grants: MemberPermissions,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_owner(&acting)?;

                let target = self
                    .require_member_in_household(&tx, household_id, member_id)
                    .await?;
                if target.role == MemberRole::Owner {
                    return Err(EngineError::StateConflict(
                        "the owner holds every capability implicitly".to_string(),
                    ));
                }
                if target.status != MemberStatus::Approved {
                    return Err(EngineError::StateConflict(
                        "permissions can only be granted to approved members".to_string(),
                    ));
                }

                if let Some(row) = permissions::Entity::find_by_id(member_id.to_string())
                    .one(&tx)
                    .await?
                {
                    row.delete(&tx).await?;
                }
                permissions::active_model(member_id, grants).insert(&tx).await?;

                tracing::info!(household_id = %household_id, member_id = %member_id, "permissions updated");
                Ok(())
            }
            .await
        })
    }

    /// The effective capability set of a member, as any approved member of
    /// the household sees it.
    pub async fn member_permissions(
        &self,
        household_id: Uuid,
        member_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<MemberPermissions> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;
                let target = self
                    .require_member_in_household(&tx, household_id, member_id)
                    .await?;
                self.effective_permissions(&tx, &target).await
            }
            .await
        })
    }
}
