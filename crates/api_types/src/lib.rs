//! Wire types shared between the HTTP server and its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod household {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HouseholdNew {
        pub name: String,
        /// Display name of the creating member.
        pub display_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HouseholdRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Household {
        pub id: Uuid,
        pub name: String,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub pending_owner_member_id: Option<Uuid>,
        pub transfer_initiated_at: Option<DateTime<Utc>>,
    }
}

pub mod member {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequest {
        pub display_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ManagedMemberNew {
        pub display_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClaimRequest {
        pub claim_code: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Member {
        pub id: Uuid,
        pub household_id: Uuid,
        pub user_id: Option<String>,
        pub display_name: String,
        pub status: String,
        pub role: String,
        /// Present only on an unclaimed managed member, and only in the
        /// response to its creation.
        pub claim_code: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitInput {
        pub member_id: Uuid,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub amount_minor: i64,
        /// `custom`, `payer_only` or `member_only`.
        pub split_kind: Option<String>,
        /// `single` or `custom`.
        pub paid_by_kind: Option<String>,
        pub payer_member_id: Option<Uuid>,
        pub split_member_id: Option<Uuid>,
        pub owed_amounts: Option<Vec<SplitInput>>,
        pub paid_amounts: Option<Vec<SplitInput>>,
        pub category: Option<String>,
        pub note: Option<String>,
        pub occurred_at: DateTime<Utc>,
        pub excluded_from_budget: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub amount_minor: Option<i64>,
        pub split_kind: Option<String>,
        pub paid_by_kind: Option<String>,
        pub payer_member_id: Option<Uuid>,
        pub split_member_id: Option<Uuid>,
        pub owed_amounts: Option<Vec<SplitInput>>,
        pub paid_amounts: Option<Vec<SplitInput>>,
        pub category: Option<String>,
        pub note: Option<String>,
        pub occurred_at: Option<DateTime<Utc>>,
        pub excluded_from_budget: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeNew {
        pub amount_minor: i64,
        pub member_id: Option<Uuid>,
        pub category: Option<String>,
        pub note: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub amount_minor: i64,
        pub payer_member_id: Uuid,
        pub recipient_member_id: Uuid,
        pub note: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReimbursementNew {
        pub amount_minor: i64,
        pub receiver_member_id: Uuid,
        pub reimburses_transaction_id: Uuid,
        pub note: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Split {
        pub member_id: Uuid,
        pub owed_minor: i64,
        pub owed_bp: i64,
        pub paid_minor: i64,
        pub paid_bp: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Transaction {
        pub id: Uuid,
        pub household_id: Uuid,
        pub kind: String,
        pub occurred_at: DateTime<Utc>,
        pub amount_minor: i64,
        pub category: Option<String>,
        pub note: Option<String>,
        pub created_by: String,
        pub payer_member_id: Option<Uuid>,
        pub counterparty_member_id: Option<Uuid>,
        pub split_member_id: Option<Uuid>,
        pub split_kind: Option<String>,
        pub paid_by_kind: Option<String>,
        pub reimburses_transaction_id: Option<Uuid>,
        pub excluded_from_budget: bool,
        pub splits: Option<Vec<Split>>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberBalance {
        pub member_id: Uuid,
        pub total_paid_minor: i64,
        pub total_share_minor: i64,
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceHealth {
        /// `balanced` or `imbalanced`.
        pub status: String,
        pub total_imbalance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitImbalance {
        pub transaction_id: Uuid,
        pub amount_minor: i64,
        pub owed_sum_minor: i64,
        pub paid_sum_minor: i64,
    }
}

pub mod permission {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Permissions {
        pub create_managed_members: bool,
        pub remove_members: bool,
        pub reactivate_members: bool,
        pub approve_join_requests: bool,
    }
}

pub mod ownership {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferInitiate {
        pub target_member_id: Uuid,
    }
}
