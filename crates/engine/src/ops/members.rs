use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, DatabaseTransaction, ModelTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Capability, EngineError, Member, MemberRole, MemberStatus, ResultEngine, members, permissions,
    splits, transactions,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Asks to join a household. The member starts `pending` and stays
    /// invisible to ledger operations until approved.
    pub async fn request_join(
        &self,
        household_id: Uuid,
        display_name: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Member> {
        let display_name = normalize_required_name(display_name, "member")?;

        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_user_exists(&tx, user_id).await?;

                let existing = members::Entity::find()
                    .filter(members::Column::HouseholdId.eq(household_id.to_string()))
                    .filter(members::Column::UserId.eq(user_id.to_string()))
                    .one(&tx)
                    .await?;
                if existing.is_some() {
                    return Err(EngineError::ExistingKey(format!(
                        "membership for {user_id}"
                    )));
                }

                let member = Member::new(
                    household_id,
                    Some(user_id.to_string()),
                    display_name,
                    MemberStatus::Pending,
                    MemberRole::Member,
                    now,
                );
                members::ActiveModel::from(&member).insert(&tx).await?;

                tracing::info!(household_id = %household_id, user_id, "join requested");
                Ok(member)
            }
            .await
        })
    }

    /// Approves a pending join request. Requires the `approve_join_requests`
    /// capability. The new member receives the default permission grants.
    pub async fn approve_member(
        &self,
        household_id: Uuid,
        member_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Member> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_capability(&tx, &acting, Capability::ApproveJoinRequests)
                    .await?;

                let mut member = self
                    .require_member_in_household(&tx, household_id, member_id)
                    .await?;
                if member.status != MemberStatus::Pending {
                    return Err(EngineError::StateConflict(
                        "member is not pending approval".to_string(),
                    ));
                }

                member.status = MemberStatus::Approved;
                members::ActiveModel::from(&member).save(&tx).await?;
                permissions::active_model(member.id, crate::MemberPermissions::default_grants())
                    .insert(&tx)
                    .await?;

                tracing::info!(household_id = %household_id, member_id = %member_id, "member approved");
                Ok(member)
            }
            .await
        })
    }

    /// Creates a managed member: a person without an account, administered on
    /// their behalf. Returns the member carrying its one-time claim code.
    pub async fn create_managed_member(
        &self,
        household_id: Uuid,
        display_name: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Member> {
        let display_name = normalize_required_name(display_name, "member")?;

        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_capability(&tx, &acting, Capability::CreateManagedMembers)
                    .await?;

                let mut member = Member::new(
                    household_id,
                    None,
                    display_name,
                    MemberStatus::Approved,
                    MemberRole::Member,
                    now,
                );
                member.claim_code = Some(
                    base64::engine::general_purpose::URL_SAFE_NO_PAD
                        .encode(Uuid::new_v4().as_bytes()),
                );
                members::ActiveModel::from(&member).insert(&tx).await?;

                tracing::info!(household_id = %household_id, member_id = %member.id, "managed member created");
                Ok(member)
            }
            .await
        })
    }

    /// Claims a managed member, attaching the caller's identity to it. The
    /// member keeps its id, so all its transaction history transfers with it.
    pub async fn claim_managed_member(
        &self,
        household_id: Uuid,
        claim_code: &str,
        user_id: &str,
    ) -> ResultEngine<Member> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_user_exists(&tx, user_id).await?;

                let already_member = members::Entity::find()
                    .filter(members::Column::HouseholdId.eq(household_id.to_string()))
                    .filter(members::Column::UserId.eq(user_id.to_string()))
                    .one(&tx)
                    .await?;
                if already_member.is_some() {
                    return Err(EngineError::ExistingKey(format!(
                        "membership for {user_id}"
                    )));
                }

                let model = members::Entity::find()
                    .filter(members::Column::HouseholdId.eq(household_id.to_string()))
                    .filter(members::Column::ClaimCode.eq(claim_code.to_string()))
                    .one(&tx)
                    .await?
                    .ok_or_else(|| {
                        EngineError::KeyNotFound("claim code not exists".to_string())
                    })?;
                let mut member = Member::try_from(model)?;
                if !member.is_managed() {
                    return Err(EngineError::StateConflict(
                        "member is already claimed".to_string(),
                    ));
                }

                member.user_id = Some(user_id.to_string());
                member.claim_code = None;
                members::ActiveModel::from(&member).save(&tx).await?;

                tracing::info!(household_id = %household_id, member_id = %member.id, user_id, "managed member claimed");
                Ok(member)
            }
            .await
        })
    }

    /// Removes a member. Members referenced by any transaction history are
    /// deactivated instead of deleted, so historical splits keep their
    /// referent. Owners and pending transfer targets cannot be removed.
    pub async fn remove_member(
        &self,
        household_id: Uuid,
        member_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            async {
                let household = self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_capability(&tx, &acting, Capability::RemoveMembers)
                    .await?;

                let mut member = self
                    .require_member_in_household(&tx, household_id, member_id)
                    .await?;
                if member.role == MemberRole::Owner {
                    return Err(EngineError::Forbidden(
                        "the owner cannot be removed".to_string(),
                    ));
                }
                if household
                    .pending_transfer
                    .is_some_and(|t| t.target_member_id == member_id)
                {
                    return Err(EngineError::StateConflict(
                        "member is the target of a pending ownership transfer".to_string(),
                    ));
                }
                if member.status == MemberStatus::Inactive {
                    return Err(EngineError::StateConflict(
                        "member is already inactive".to_string(),
                    ));
                }

                if let Some(row) = permissions::Entity::find_by_id(member_id.to_string())
                    .one(&tx)
                    .await?
                {
                    row.delete(&tx).await?;
                }

                if self.member_has_history(&tx, member_id).await? {
                    member.status = MemberStatus::Inactive;
                    members::ActiveModel::from(&member).save(&tx).await?;
                    tracing::info!(household_id = %household_id, member_id = %member_id, "member deactivated");
                } else {
                    members::Entity::delete_by_id(member_id.to_string())
                        .exec(&tx)
                        .await?;
                    tracing::info!(household_id = %household_id, member_id = %member_id, "member deleted");
                }
                Ok(())
            }
            .await
        })
    }

    /// Reactivates an inactive member. The member comes back with no
    /// permissions; grants must be re-issued explicitly.
    pub async fn reactivate_member(
        &self,
        household_id: Uuid,
        member_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Member> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_capability(&tx, &acting, Capability::ReactivateMembers)
                    .await?;

                let mut member = self
                    .require_member_in_household(&tx, household_id, member_id)
                    .await?;
                if member.status != MemberStatus::Inactive {
                    return Err(EngineError::StateConflict(
                        "member is not inactive".to_string(),
                    ));
                }

                member.status = MemberStatus::Approved;
                members::ActiveModel::from(&member).save(&tx).await?;
                if let Some(row) = permissions::Entity::find_by_id(member_id.to_string())
                    .one(&tx)
                    .await?
                {
                    row.delete(&tx).await?;
                }

                tracing::info!(household_id = %household_id, member_id = %member_id, "member reactivated");
                Ok(member)
            }
            .await
        })
    }

    /// Lists every member of a household, whatever their status.
    pub async fn list_members(
        &self,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<Member>> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;

                let models: Vec<members::Model> = members::Entity::find()
                    .filter(members::Column::HouseholdId.eq(household_id.to_string()))
                    .order_by_asc(members::Column::CreatedAt)
                    .all(&tx)
                    .await?;
                models.into_iter().map(Member::try_from).collect()
            }
            .await
        })
    }

    /// `true` when any split or transaction column references the member.
    pub(super) async fn member_has_history(
        &self,
        db: &DatabaseTransaction,
        member_id: Uuid,
    ) -> ResultEngine<bool> {
        let id = member_id.to_string();

        let in_splits = splits::Entity::find()
            .filter(splits::Column::MemberId.eq(id.clone()))
            .one(db)
            .await?
            .is_some();
        if in_splits {
            return Ok(true);
        }

        let in_transactions = transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::PayerMemberId.eq(id.clone()))
                    .add(transactions::Column::CounterpartyMemberId.eq(id.clone()))
                    .add(transactions::Column::SplitMemberId.eq(id)),
            )
            .one(db)
            .await?
            .is_some();
        Ok(in_transactions)
    }
}
