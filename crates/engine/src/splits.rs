//! Expense splits.
//!
//! A [`Split`] is one member's slice of an expense: an owed pair (their fair
//! share of the cost) and a paid pair (what they actually contributed).
//! Percentages are stored in basis points (10000 = 100%) and are always
//! derived from the amounts.
//!
//! Splits are owned entirely by their transaction: created atomically with
//! it, replaced wholesale on edit, deleted on delete. Per expense,
//! `Σ owed == amount` and `Σ paid == amount`, each within one cent.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub member_id: Uuid,
    pub owed: MoneyCents,
    pub owed_bp: i64,
    pub paid: MoneyCents,
    pub paid_bp: i64,
}

impl Split {
    pub fn new(
        transaction_id: Uuid,
        member_id: Uuid,
        owed: MoneyCents,
        owed_bp: i64,
        paid: MoneyCents,
        paid_bp: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            member_id,
            owed,
            owed_bp,
            paid,
            paid_bp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub member_id: String,
    pub owed_minor: i64,
    pub owed_bp: i64,
    pub paid_minor: i64,
    pub paid_bp: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Members,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Split> for ActiveModel {
    fn from(split: &Split) -> Self {
        Self {
            id: ActiveValue::Set(split.id.to_string()),
            transaction_id: ActiveValue::Set(split.transaction_id.to_string()),
            member_id: ActiveValue::Set(split.member_id.to_string()),
            owed_minor: ActiveValue::Set(split.owed.cents()),
            owed_bp: ActiveValue::Set(split.owed_bp),
            paid_minor: ActiveValue::Set(split.paid.cents()),
            paid_bp: ActiveValue::Set(split.paid_bp),
        }
    }
}

impl TryFrom<Model> for Split {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "split")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            member_id: parse_uuid(&model.member_id, "member")?,
            owed: MoneyCents::new(model.owed_minor),
            owed_bp: model.owed_bp,
            paid: MoneyCents::new(model.paid_minor),
            paid_bp: model.paid_bp,
        })
    }
}
