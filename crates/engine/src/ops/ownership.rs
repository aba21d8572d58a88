//! Ownership-transfer state machine.
//!
//! One pending-transfer slot per household:
//! none → initiate(target) → pending(target) → accept | decline | revoke → none.
//! Every transition runs in a single database transaction; in particular the
//! two-sided role swap on accept is atomic, so a household can never be
//! observed with zero or two owners.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ModelTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Household, Member, MemberRole, MemberStatus, ResultEngine, households, members,
    permissions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Starts a transfer of the household to `target_member_id`. Owner only;
    /// at most one transfer may be pending at a time.
    pub async fn initiate_ownership_transfer(
        &self,
        household_id: Uuid,
        target_member_id: Uuid,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            async {
                let household = self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_owner(&acting)?;

                if household.pending_transfer.is_some() {
                    return Err(EngineError::StateConflict(
                        "an ownership transfer is already pending".to_string(),
                    ));
                }
                if target_member_id == acting.id {
                    return Err(EngineError::StateConflict(
                        "cannot transfer ownership to yourself".to_string(),
                    ));
                }

                let target = self
                    .require_member_in_household(&tx, household_id, target_member_id)
                    .await?;
                if target.status != MemberStatus::Approved {
                    return Err(EngineError::StateConflict(
                        "transfer target must be an approved member".to_string(),
                    ));
                }
                if target.is_managed() {
                    return Err(EngineError::StateConflict(
                        "transfer target must have their own identity".to_string(),
                    ));
                }

                let model = households::ActiveModel {
                    id: ActiveValue::Set(household_id.to_string()),
                    pending_owner_member_id: ActiveValue::Set(Some(target_member_id.to_string())),
                    transfer_initiated_at: ActiveValue::Set(Some(now)),
                    ..Default::default()
                };
                model.update(&tx).await?;

                tracing::info!(household_id = %household_id, target_member_id = %target_member_id, "ownership transfer initiated");
                Ok(())
            }
            .await
        })
    }

    /// Accepts a pending transfer. Only the designated target may accept.
    /// Swaps both roles and clears the new owner's permission row in the same
    /// database transaction.
    pub async fn accept_ownership_transfer(
        &self,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            async {
                let household = self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                let target_id = self.require_pending_target(&household, &acting)?;

                let owner_model = members::Entity::find()
                    .filter(members::Column::HouseholdId.eq(household_id.to_string()))
                    .filter(members::Column::Role.eq(MemberRole::Owner.as_str()))
                    .one(&tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("owner not exists".to_string()))?;
                let mut old_owner = Member::try_from(owner_model)?;
                old_owner.role = MemberRole::Member;
                members::ActiveModel::from(&old_owner).save(&tx).await?;

                let mut new_owner = self
                    .require_member_in_household(&tx, household_id, target_id)
                    .await?;
                new_owner.role = MemberRole::Owner;
                members::ActiveModel::from(&new_owner).save(&tx).await?;

                // Owners hold every capability implicitly; a leftover row
                // would resurface stale grants after a later transfer away.
                if let Some(row) = permissions::Entity::find_by_id(target_id.to_string())
                    .one(&tx)
                    .await?
                {
                    row.delete(&tx).await?;
                }

                self.clear_transfer_slot(&tx, household_id).await?;

                tracing::info!(household_id = %household_id, new_owner = %target_id, "ownership transfer accepted");
                Ok(())
            }
            .await
        })
    }

    /// Declines a pending transfer. Only the designated target may decline.
    pub async fn decline_ownership_transfer(
        &self,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            async {
                let household = self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_pending_target(&household, &acting)?;
                self.clear_transfer_slot(&tx, household_id).await?;

                tracing::info!(household_id = %household_id, "ownership transfer declined");
                Ok(())
            }
            .await
        })
    }

    /// Revokes a pending transfer. Owner only.
    pub async fn revoke_ownership_transfer(
        &self,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            async {
                let household = self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_owner(&acting)?;
                if household.pending_transfer.is_none() {
                    return Err(EngineError::StateConflict(
                        "no ownership transfer is pending".to_string(),
                    ));
                }
                self.clear_transfer_slot(&tx, household_id).await?;

                tracing::info!(household_id = %household_id, "ownership transfer revoked");
                Ok(())
            }
            .await
        })
    }

    /// Checks that a transfer is pending and the acting member is its target.
    fn require_pending_target(
        &self,
        household: &Household,
        acting: &Member,
    ) -> ResultEngine<Uuid> {
        let pending = household.pending_transfer.ok_or_else(|| {
            EngineError::StateConflict("no ownership transfer is pending".to_string())
        })?;
        if pending.target_member_id != acting.id {
            return Err(EngineError::StateConflict(
                "only the transfer target may resolve it".to_string(),
            ));
        }
        Ok(pending.target_member_id)
    }

    async fn clear_transfer_slot(
        &self,
        db: &sea_orm::DatabaseTransaction,
        household_id: Uuid,
    ) -> ResultEngine<()> {
        let model = households::ActiveModel {
            id: ActiveValue::Set(household_id.to_string()),
            pending_owner_member_id: ActiveValue::Set(None),
            transfer_initiated_at: ActiveValue::Set(None),
            ..Default::default()
        };
        model.update(db).await?;
        Ok(())
    }
}
