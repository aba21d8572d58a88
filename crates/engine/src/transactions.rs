//! Transaction primitives.
//!
//! A `Transaction` is an atomic ledger event of one household. Expenses
//! distribute cost across members via [`Split`](crate::Split) rows;
//! settlements move balance directly between two members; reimbursements
//! retroactively roll back part of a prior expense. Incomes are recorded for
//! budgeting but have no owed/paid sides and never affect member balances.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
    Settlement,
    Reimbursement,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Settlement => "settlement",
            Self::Reimbursement => "reimbursement",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "settlement" => Ok(Self::Settlement),
            "reimbursement" => Ok(Self::Reimbursement),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// How the *owed* side of an expense is distributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    /// Caller-supplied per-member amounts, or an even division when the
    /// caller supplies none.
    Custom,
    /// 100% owed by the payer.
    PayerOnly,
    /// 100% owed by one designated member.
    MemberOnly,
}

impl SplitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::PayerOnly => "payer_only",
            Self::MemberOnly => "member_only",
        }
    }
}

impl TryFrom<&str> for SplitKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "custom" => Ok(Self::Custom),
            "payer_only" => Ok(Self::PayerOnly),
            "member_only" => Ok(Self::MemberOnly),
            other => Err(EngineError::Validation(format!(
                "invalid split kind: {other}"
            ))),
        }
    }
}

/// How the *paid* side of an expense is distributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidByKind {
    /// One designated payer paid the full amount.
    Single,
    /// Caller-supplied per-member paid amounts.
    Custom,
}

impl PaidByKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for PaidByKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "single" => Ok(Self::Single),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::Validation(format!(
                "invalid paid-by kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub household_id: Uuid,
    pub kind: TransactionKind,
    pub occurred_at: DateTime<Utc>,
    pub amount: MoneyCents,
    pub category: Option<String>,
    pub note: Option<String>,
    pub created_by: String,
    /// Settlement payer, or the member who received a reimbursement.
    pub payer_member_id: Option<Uuid>,
    /// Settlement recipient.
    pub counterparty_member_id: Option<Uuid>,
    /// Designated member for `member_only` splits.
    pub split_member_id: Option<Uuid>,
    pub split_kind: Option<SplitKind>,
    pub paid_by_kind: Option<PaidByKind>,
    /// The expense a reimbursement rolls back.
    pub reimburses_transaction_id: Option<Uuid>,
    pub excluded_from_budget: bool,
}

impl Transaction {
    pub fn new(
        household_id: Uuid,
        kind: TransactionKind,
        occurred_at: DateTime<Utc>,
        amount: MoneyCents,
        category: Option<String>,
        note: Option<String>,
        created_by: String,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            household_id,
            kind,
            occurred_at,
            amount,
            category,
            note,
            created_by,
            payer_member_id: None,
            counterparty_member_id: None,
            split_member_id: None,
            split_kind: None,
            paid_by_kind: None,
            reimburses_transaction_id: None,
            excluded_from_budget: false,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub household_id: String,
    pub kind: String,
    pub occurred_at: DateTimeUtc,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub note: Option<String>,
    pub created_by: String,
    pub payer_member_id: Option<String>,
    pub counterparty_member_id: Option<String>,
    pub split_member_id: Option<String>,
    pub split_kind: Option<String>,
    pub paid_by_kind: Option<String>,
    pub reimburses_transaction_id: Option<String>,
    pub excluded_from_budget: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
    #[sea_orm(
        belongs_to = "super::households::Entity",
        from = "Column::HouseholdId",
        to = "super::households::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Households,
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl Related<super::households::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Households.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            household_id: ActiveValue::Set(tx.household_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            category: ActiveValue::Set(tx.category.clone()),
            note: ActiveValue::Set(tx.note.clone()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            payer_member_id: ActiveValue::Set(tx.payer_member_id.map(|id| id.to_string())),
            counterparty_member_id: ActiveValue::Set(
                tx.counterparty_member_id.map(|id| id.to_string()),
            ),
            split_member_id: ActiveValue::Set(tx.split_member_id.map(|id| id.to_string())),
            split_kind: ActiveValue::Set(tx.split_kind.map(|k| k.as_str().to_string())),
            paid_by_kind: ActiveValue::Set(tx.paid_by_kind.map(|k| k.as_str().to_string())),
            reimburses_transaction_id: ActiveValue::Set(
                tx.reimburses_transaction_id.map(|id| id.to_string()),
            ),
            excluded_from_budget: ActiveValue::Set(tx.excluded_from_budget),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            household_id: parse_uuid(&model.household_id, "household")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            occurred_at: model.occurred_at,
            amount: MoneyCents::new(model.amount_minor),
            category: model.category,
            note: model.note,
            created_by: model.created_by,
            payer_member_id: model
                .payer_member_id
                .as_deref()
                .map(|s| parse_uuid(s, "member"))
                .transpose()?,
            counterparty_member_id: model
                .counterparty_member_id
                .as_deref()
                .map(|s| parse_uuid(s, "member"))
                .transpose()?,
            split_member_id: model
                .split_member_id
                .as_deref()
                .map(|s| parse_uuid(s, "member"))
                .transpose()?,
            split_kind: model
                .split_kind
                .as_deref()
                .map(SplitKind::try_from)
                .transpose()?,
            paid_by_kind: model
                .paid_by_kind
                .as_deref()
                .map(PaidByKind::try_from)
                .transpose()?,
            reimburses_transaction_id: model
                .reimburses_transaction_id
                .as_deref()
                .map(|s| parse_uuid(s, "transaction"))
                .transpose()?,
            excluded_from_budget: model.excluded_from_budget,
        })
    }
}
