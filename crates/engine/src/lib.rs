//! Shared-household ledger engine.
//!
//! The engine owns every rule of the system: who may act, how expenses are
//! split, how balances are derived, and which lifecycle transitions are
//! legal. Callers (HTTP server, tests) talk to [`Engine`] and never touch the
//! database directly.

pub use commands::{
    ExpenseCmd, ExpenseUpdateCmd, IncomeCmd, ReimbursementCmd, SettlementCmd, SplitInput, TxMeta,
};
pub use error::EngineError;
pub use households::{Household, PendingTransfer};
pub use members::{Member, MemberRole, MemberStatus};
pub use money::MoneyCents;
pub use ops::{
    BalanceHealth, Engine, EngineBuilder, HealthStatus, MemberBalance, SplitImbalance,
};
pub use permissions::{Capability, MemberPermissions};
pub use split::{
    OwedSplit, PaidSplit, SPLIT_TOLERANCE, SplitShare, allocate_proportionally,
    compute_expense_splits, split_sums, validate_split_sums,
};
pub use splits::Split;
pub use transactions::{PaidByKind, SplitKind, Transaction, TransactionKind};

mod commands;
mod error;
pub mod households;
pub mod members;
mod money;
mod ops;
pub mod permissions;
mod split;
pub mod splits;
pub mod transactions;
pub mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
