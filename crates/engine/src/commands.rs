//! Command structs for engine operations.
//!
//! These types group parameters for write operations
//! (expense/income/settlement/reimbursement/update), keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{PaidByKind, SplitKind};

/// Common metadata for transaction creation.
#[derive(Clone, Debug)]
pub struct TxMeta {
    pub category: Option<String>,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub excluded_from_budget: bool,
}

impl TxMeta {
    #[must_use]
    pub fn new(occurred_at: DateTime<Utc>) -> Self {
        Self {
            category: None,
            note: None,
            occurred_at,
            excluded_from_budget: false,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn excluded_from_budget(mut self, excluded: bool) -> Self {
        self.excluded_from_budget = excluded;
        self
    }
}

/// A per-member amount entry for custom owed or paid sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitInput {
    pub member_id: Uuid,
    pub amount_minor: i64,
}

impl SplitInput {
    #[must_use]
    pub fn new(member_id: Uuid, amount_minor: i64) -> Self {
        Self {
            member_id,
            amount_minor,
        }
    }
}

/// Create an expense transaction.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub household_id: Uuid,
    pub amount_minor: i64,
    pub split_kind: SplitKind,
    pub paid_by_kind: PaidByKind,
    /// Payer for `single` paid-by expenses.
    pub payer_member_id: Option<Uuid>,
    /// Designated member for `member_only` splits.
    pub split_member_id: Option<Uuid>,
    /// Custom owed amounts, one entry per member.
    pub owed_amounts: Option<Vec<SplitInput>>,
    /// Custom paid amounts, one entry per member.
    pub paid_amounts: Option<Vec<SplitInput>>,
    pub meta: TxMeta,
    pub user_id: String,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        household_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            household_id,
            amount_minor,
            split_kind: SplitKind::Custom,
            paid_by_kind: PaidByKind::Single,
            payer_member_id: None,
            split_member_id: None,
            owed_amounts: None,
            paid_amounts: None,
            meta: TxMeta::new(occurred_at),
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn split_kind(mut self, split_kind: SplitKind) -> Self {
        self.split_kind = split_kind;
        self
    }

    #[must_use]
    pub fn paid_by_kind(mut self, paid_by_kind: PaidByKind) -> Self {
        self.paid_by_kind = paid_by_kind;
        self
    }

    #[must_use]
    pub fn payer_member_id(mut self, member_id: Uuid) -> Self {
        self.payer_member_id = Some(member_id);
        self
    }

    #[must_use]
    pub fn split_member_id(mut self, member_id: Uuid) -> Self {
        self.split_member_id = Some(member_id);
        self
    }

    #[must_use]
    pub fn owed_amounts(mut self, amounts: Vec<SplitInput>) -> Self {
        self.owed_amounts = Some(amounts);
        self
    }

    #[must_use]
    pub fn paid_amounts(mut self, amounts: Vec<SplitInput>) -> Self {
        self.paid_amounts = Some(amounts);
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: TxMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.meta.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.meta.note = Some(note.into());
        self
    }
}

/// Create an income transaction.
#[derive(Clone, Debug)]
pub struct IncomeCmd {
    pub household_id: Uuid,
    pub amount_minor: i64,
    /// The member the income belongs to, when attributable.
    pub member_id: Option<Uuid>,
    pub meta: TxMeta,
    pub user_id: String,
}

impl IncomeCmd {
    #[must_use]
    pub fn new(
        household_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            household_id,
            amount_minor,
            member_id: None,
            meta: TxMeta::new(occurred_at),
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn member_id(mut self, member_id: Uuid) -> Self {
        self.member_id = Some(member_id);
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: TxMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.meta.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.meta.note = Some(note.into());
        self
    }
}

/// Create a settlement: `payer` hands money to `recipient` to pay down debt.
#[derive(Clone, Debug)]
pub struct SettlementCmd {
    pub household_id: Uuid,
    pub amount_minor: i64,
    pub payer_member_id: Uuid,
    pub recipient_member_id: Uuid,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub user_id: String,
}

impl SettlementCmd {
    #[must_use]
    pub fn new(
        household_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        payer_member_id: Uuid,
        recipient_member_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            household_id,
            amount_minor,
            payer_member_id,
            recipient_member_id,
            note: None,
            occurred_at,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Create a reimbursement rolling back part of a prior expense.
#[derive(Clone, Debug)]
pub struct ReimbursementCmd {
    pub household_id: Uuid,
    pub amount_minor: i64,
    /// The member who received the refunded money.
    pub receiver_member_id: Uuid,
    pub reimburses_transaction_id: Uuid,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub user_id: String,
}

impl ReimbursementCmd {
    #[must_use]
    pub fn new(
        household_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        receiver_member_id: Uuid,
        reimburses_transaction_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            household_id,
            amount_minor,
            receiver_member_id,
            reimburses_transaction_id,
            note: None,
            occurred_at,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Update an existing expense. Amount or policy changes recompute the whole
/// split set; `None` fields keep their stored values.
#[derive(Clone, Debug)]
pub struct ExpenseUpdateCmd {
    pub household_id: Uuid,
    pub transaction_id: Uuid,
    pub user_id: String,

    pub amount_minor: Option<i64>,
    pub split_kind: Option<SplitKind>,
    pub paid_by_kind: Option<PaidByKind>,
    pub payer_member_id: Option<Uuid>,
    pub split_member_id: Option<Uuid>,
    pub owed_amounts: Option<Vec<SplitInput>>,
    pub paid_amounts: Option<Vec<SplitInput>>,

    pub category: Option<String>,
    pub note: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub excluded_from_budget: Option<bool>,
}

impl ExpenseUpdateCmd {
    #[must_use]
    pub fn new(household_id: Uuid, transaction_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            household_id,
            transaction_id,
            user_id: user_id.into(),
            amount_minor: None,
            split_kind: None,
            paid_by_kind: None,
            payer_member_id: None,
            split_member_id: None,
            owed_amounts: None,
            paid_amounts: None,
            category: None,
            note: None,
            occurred_at: None,
            excluded_from_budget: None,
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn split_kind(mut self, split_kind: SplitKind) -> Self {
        self.split_kind = Some(split_kind);
        self
    }

    #[must_use]
    pub fn paid_by_kind(mut self, paid_by_kind: PaidByKind) -> Self {
        self.paid_by_kind = Some(paid_by_kind);
        self
    }

    #[must_use]
    pub fn payer_member_id(mut self, member_id: Uuid) -> Self {
        self.payer_member_id = Some(member_id);
        self
    }

    #[must_use]
    pub fn split_member_id(mut self, member_id: Uuid) -> Self {
        self.split_member_id = Some(member_id);
        self
    }

    #[must_use]
    pub fn owed_amounts(mut self, amounts: Vec<SplitInput>) -> Self {
        self.owed_amounts = Some(amounts);
        self
    }

    #[must_use]
    pub fn paid_amounts(mut self, amounts: Vec<SplitInput>) -> Self {
        self.paid_amounts = Some(amounts);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn excluded_from_budget(mut self, excluded: bool) -> Self {
        self.excluded_from_budget = Some(excluded);
        self
    }
}
