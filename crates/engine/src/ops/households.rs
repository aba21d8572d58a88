use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Household, Member, MemberRole, MemberStatus, ResultEngine, households, members,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Creates a household; its creator becomes the approved owner member.
    pub async fn create_household(
        &self,
        name: &str,
        display_name: &str,
        user_id: &str,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Household> {
        let name = normalize_required_name(name, "household")?;
        let display_name = normalize_required_name(display_name, "member")?;

        with_tx!(self, |tx| {
            async {
                self.require_user_exists(&tx, user_id).await?;

                let household = Household::new(name, user_id.to_string(), created_at);
                households::ActiveModel::from(&household).insert(&tx).await?;

                let owner = Member::new(
                    household.id,
                    Some(user_id.to_string()),
                    display_name,
                    MemberStatus::Approved,
                    MemberRole::Owner,
                    created_at,
                );
                members::ActiveModel::from(&owner).insert(&tx).await?;

                tracing::info!(household_id = %household.id, user_id, "household created");
                Ok(household)
            }
            .await
        })
    }

    /// Returns a household visible to the acting user.
    pub async fn household(&self, household_id: Uuid, user_id: &str) -> ResultEngine<Household> {
        with_tx!(self, |tx| {
            async {
                let household = self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;
                Ok(household)
            }
            .await
        })
    }

    /// Lists the households the user is an approved member of.
    pub async fn list_households(&self, user_id: &str) -> ResultEngine<Vec<Household>> {
        with_tx!(self, |tx| {
            async {
                let member_models: Vec<members::Model> = members::Entity::find()
                    .filter(members::Column::UserId.eq(user_id.to_string()))
                    .filter(members::Column::Status.eq(MemberStatus::Approved.as_str()))
                    .all(&tx)
                    .await?;

                let ids: Vec<String> = member_models.into_iter().map(|m| m.household_id).collect();
                let models: Vec<households::Model> = households::Entity::find()
                    .filter(households::Column::Id.is_in(ids))
                    .order_by_asc(households::Column::CreatedAt)
                    .all(&tx)
                    .await?;

                models.into_iter().map(Household::try_from).collect()
            }
            .await
        })
    }

    /// Renames a household. Owner only.
    pub async fn rename_household(
        &self,
        household_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "household")?;

        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                let acting = self
                    .require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_owner(&acting)?;

                let model = households::ActiveModel {
                    id: ActiveValue::Set(household_id.to_string()),
                    name: ActiveValue::Set(name),
                    ..Default::default()
                };
                model.update(&tx).await?;
                Ok(())
            }
            .await
        })
    }
}
