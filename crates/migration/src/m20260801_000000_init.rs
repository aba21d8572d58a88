//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Riparto:
//!
//! - `users`: authentication
//! - `households`: shared-finance groups, carrying the pending
//!   ownership-transfer slot
//! - `members`: household membership (status, role, managed-member claim code)
//! - `transactions`: ledger events (expense, income, settlement, reimbursement)
//! - `splits`: per-member owed/paid allocations of an expense
//! - `member_permissions`: optional capability grants per non-owner member

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Households {
    Table,
    Id,
    Name,
    CreatedBy,
    CreatedAt,
    PendingOwnerMemberId,
    TransferInitiatedAt,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
    HouseholdId,
    UserId,
    DisplayName,
    Status,
    Role,
    ClaimCode,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    HouseholdId,
    Kind,
    OccurredAt,
    AmountMinor,
    Category,
    Note,
    CreatedBy,
    PayerMemberId,
    CounterpartyMemberId,
    SplitMemberId,
    SplitKind,
    PaidByKind,
    ReimbursesTransactionId,
    ExcludedFromBudget,
}

#[derive(Iden)]
enum Splits {
    Table,
    Id,
    TransactionId,
    MemberId,
    OwedMinor,
    OwedBp,
    PaidMinor,
    PaidBp,
}

#[derive(Iden)]
enum MemberPermissions {
    Table,
    MemberId,
    CreateManagedMembers,
    RemoveMembers,
    ReactivateMembers,
    ApproveJoinRequests,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Households
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Households::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Households::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Households::Name).string().not_null())
                    .col(ColumnDef::new(Households::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Households::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Households::PendingOwnerMemberId).string())
                    .col(
                        ColumnDef::new(Households::TransferInitiatedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_households_created_by")
                            .from(Households::Table, Households::CreatedBy)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::HouseholdId).string().not_null())
                    .col(ColumnDef::new(Members::UserId).string())
                    .col(ColumnDef::new(Members::DisplayName).string().not_null())
                    .col(ColumnDef::new(Members::Status).string().not_null())
                    .col(ColumnDef::new(Members::Role).string().not_null())
                    .col(ColumnDef::new(Members::ClaimCode).string())
                    .col(
                        ColumnDef::new(Members::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_household")
                            .from(Members::Table, Members::HouseholdId)
                            .to(Households::Table, Households::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_members_household")
                    .table(Members::Table)
                    .col(Members::HouseholdId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_members_household_user")
                    .table(Members::Table)
                    .col(Members::HouseholdId)
                    .col(Members::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transactions::HouseholdId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Category).string())
                    .col(ColumnDef::new(Transactions::Note).string())
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Transactions::PayerMemberId).string())
                    .col(ColumnDef::new(Transactions::CounterpartyMemberId).string())
                    .col(ColumnDef::new(Transactions::SplitMemberId).string())
                    .col(ColumnDef::new(Transactions::SplitKind).string())
                    .col(ColumnDef::new(Transactions::PaidByKind).string())
                    .col(ColumnDef::new(Transactions::ReimbursesTransactionId).string())
                    .col(
                        ColumnDef::new(Transactions::ExcludedFromBudget)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_household")
                            .from(Transactions::Table, Transactions::HouseholdId)
                            .to(Households::Table, Households::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_household_occurred")
                    .table(Transactions::Table)
                    .col(Transactions::HouseholdId)
                    .col(Transactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_reimburses")
                    .table(Transactions::Table)
                    .col(Transactions::ReimbursesTransactionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Splits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Splits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Splits::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Splits::TransactionId).string().not_null())
                    .col(ColumnDef::new(Splits::MemberId).string().not_null())
                    .col(ColumnDef::new(Splits::OwedMinor).big_integer().not_null())
                    .col(ColumnDef::new(Splits::OwedBp).big_integer().not_null())
                    .col(ColumnDef::new(Splits::PaidMinor).big_integer().not_null())
                    .col(ColumnDef::new(Splits::PaidBp).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_splits_transaction")
                            .from(Splits::Table, Splits::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_splits_member")
                            .from(Splits::Table, Splits::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_splits_transaction")
                    .table(Splits::Table)
                    .col(Splits::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_splits_member")
                    .table(Splits::Table)
                    .col(Splits::MemberId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Member permissions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MemberPermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MemberPermissions::MemberId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MemberPermissions::CreateManagedMembers)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(MemberPermissions::RemoveMembers)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(MemberPermissions::ReactivateMembers)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(MemberPermissions::ApproveJoinRequests)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_permissions_member")
                            .from(MemberPermissions::Table, MemberPermissions::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MemberPermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Splits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Households::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
