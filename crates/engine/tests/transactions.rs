use chrono::Utc;

use engine::{
    EngineError, ExpenseCmd, ExpenseUpdateCmd, MoneyCents, PaidByKind, ReimbursementCmd,
    SettlementCmd, SplitInput, SplitKind,
};

mod common;
use common::{engine_with_db, household_with_two_members};

#[tokio::test]
async fn even_expense_creates_reconciled_splits() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1001, Utc::now())
                .payer_member_id(alice)
                .category("groceries"),
        )
        .await
        .unwrap();

    let (txn, splits) = engine
        .transaction(household.id, txn_id, "alice")
        .await
        .unwrap();
    assert_eq!(txn.amount, MoneyCents::new(1001));
    assert_eq!(splits.len(), 2);

    let owed_sum: MoneyCents = splits.iter().map(|s| s.owed).sum();
    let paid_sum: MoneyCents = splits.iter().map(|s| s.paid).sum();
    assert_eq!(owed_sum, MoneyCents::new(1001));
    assert_eq!(paid_sum, MoneyCents::new(1001));

    let alice_split = splits.iter().find(|s| s.member_id == alice).unwrap();
    let bob_split = splits.iter().find(|s| s.member_id == bob).unwrap();
    assert_eq!(alice_split.paid, MoneyCents::new(1001));
    assert_eq!(bob_split.paid, MoneyCents::ZERO);
}

#[tokio::test]
async fn member_only_expense_assigns_full_share() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 500, Utc::now())
                .split_kind(SplitKind::MemberOnly)
                .payer_member_id(alice)
                .split_member_id(bob),
        )
        .await
        .unwrap();

    let (_, splits) = engine
        .transaction(household.id, txn_id, "alice")
        .await
        .unwrap();
    let bob_split = splits.iter().find(|s| s.member_id == bob).unwrap();
    assert_eq!(bob_split.owed, MoneyCents::new(500));
    assert_eq!(bob_split.owed_bp, 10_000);
}

#[tokio::test]
async fn custom_amounts_must_reconcile() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let err = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now())
                .payer_member_id(alice)
                .owed_amounts(vec![
                    SplitInput::new(alice, 700),
                    SplitInput::new(bob, 200),
                ]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn custom_paid_side_is_honored() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now())
                .paid_by_kind(PaidByKind::Custom)
                .paid_amounts(vec![
                    SplitInput::new(alice, 600),
                    SplitInput::new(bob, 400),
                ]),
        )
        .await
        .unwrap();

    let (_, splits) = engine
        .transaction(household.id, txn_id, "alice")
        .await
        .unwrap();
    let alice_split = splits.iter().find(|s| s.member_id == alice).unwrap();
    assert_eq!(alice_split.paid, MoneyCents::new(600));
    assert_eq!(alice_split.paid_bp, 6000);
}

#[tokio::test]
async fn settlement_payer_and_recipient_must_differ() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    let err = engine
        .create_settlement(SettlementCmd::new(
            household.id,
            "alice",
            500,
            alice,
            alice,
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn reimbursement_cannot_exceed_original_amount() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    let expense_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();

    engine
        .create_reimbursement(ReimbursementCmd::new(
            household.id,
            "alice",
            600,
            alice,
            expense_id,
            Utc::now(),
        ))
        .await
        .unwrap();

    // 600 + 500 would exceed the original 1000.
    let err = engine
        .create_reimbursement(ReimbursementCmd::new(
            household.id,
            "alice",
            500,
            alice,
            expense_id,
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn reimbursement_must_reference_an_expense() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let settlement_id = engine
        .create_settlement(SettlementCmd::new(
            household.id,
            "alice",
            500,
            bob,
            alice,
            Utc::now(),
        ))
        .await
        .unwrap();

    let err = engine
        .create_reimbursement(ReimbursementCmd::new(
            household.id,
            "alice",
            100,
            alice,
            settlement_id,
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn update_expense_replaces_split_set() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();

    engine
        .update_expense(
            ExpenseUpdateCmd::new(household.id, txn_id, "alice")
                .amount_minor(2000)
                .owed_amounts(vec![
                    SplitInput::new(alice, 500),
                    SplitInput::new(bob, 1500),
                ]),
        )
        .await
        .unwrap();

    let (txn, splits) = engine
        .transaction(household.id, txn_id, "alice")
        .await
        .unwrap();
    assert_eq!(txn.amount, MoneyCents::new(2000));
    assert_eq!(splits.len(), 2);
    let bob_split = splits.iter().find(|s| s.member_id == bob).unwrap();
    assert_eq!(bob_split.owed, MoneyCents::new(1500));
    let owed_sum: MoneyCents = splits.iter().map(|s| s.owed).sum();
    assert_eq!(owed_sum, MoneyCents::new(2000));
}

#[tokio::test]
async fn note_only_update_keeps_custom_owed_split() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now())
                .payer_member_id(alice)
                .owed_amounts(vec![
                    SplitInput::new(alice, 700),
                    SplitInput::new(bob, 300),
                ]),
        )
        .await
        .unwrap();

    engine
        .update_expense(ExpenseUpdateCmd::new(household.id, txn_id, "alice").note("dinner out"))
        .await
        .unwrap();

    let (txn, splits) = engine
        .transaction(household.id, txn_id, "alice")
        .await
        .unwrap();
    assert_eq!(txn.note.as_deref(), Some("dinner out"));
    let alice_split = splits.iter().find(|s| s.member_id == alice).unwrap();
    let bob_split = splits.iter().find(|s| s.member_id == bob).unwrap();
    assert_eq!(
        (alice_split.owed, bob_split.owed),
        (MoneyCents::new(700), MoneyCents::new(300))
    );
}

#[tokio::test]
async fn category_only_update_keeps_custom_paid_split() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now())
                .paid_by_kind(PaidByKind::Custom)
                .paid_amounts(vec![
                    SplitInput::new(alice, 600),
                    SplitInput::new(bob, 400),
                ]),
        )
        .await
        .unwrap();

    engine
        .update_expense(
            ExpenseUpdateCmd::new(household.id, txn_id, "alice").category("restaurants"),
        )
        .await
        .unwrap();

    let (txn, splits) = engine
        .transaction(household.id, txn_id, "alice")
        .await
        .unwrap();
    assert_eq!(txn.category.as_deref(), Some("restaurants"));
    let alice_split = splits.iter().find(|s| s.member_id == alice).unwrap();
    let bob_split = splits.iter().find(|s| s.member_id == bob).unwrap();
    assert_eq!(
        (alice_split.paid, bob_split.paid),
        (MoneyCents::new(600), MoneyCents::new(400))
    );
}

#[tokio::test]
async fn amount_change_without_new_amounts_must_re_reconcile() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now())
                .payer_member_id(alice)
                .owed_amounts(vec![
                    SplitInput::new(alice, 700),
                    SplitInput::new(bob, 300),
                ]),
        )
        .await
        .unwrap();

    // The stored 700/300 allocation no longer matches the new total, so the
    // caller must supply amounts alongside the amount change.
    let err = engine
        .update_expense(
            ExpenseUpdateCmd::new(household.id, txn_id, "alice").amount_minor(2000),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn reimbursed_expense_cannot_be_edited_or_deleted() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    let expense_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();
    engine
        .create_reimbursement(ReimbursementCmd::new(
            household.id,
            "alice",
            200,
            alice,
            expense_id,
            Utc::now(),
        ))
        .await
        .unwrap();

    let err = engine
        .update_expense(ExpenseUpdateCmd::new(household.id, expense_id, "alice").amount_minor(900))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));

    let err = engine
        .delete_transaction(household.id, expense_id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
}

#[tokio::test]
async fn delete_removes_transaction_and_splits() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();

    engine
        .delete_transaction(household.id, txn_id, "alice")
        .await
        .unwrap();

    let err = engine
        .transaction(household.id, txn_id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(
        engine
            .list_transactions(household.id, "alice")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn pending_member_cannot_write() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    engine
        .request_join(household.id, "Carol", "carol", Utc::now())
        .await
        .unwrap();

    let err = engine
        .create_expense(
            ExpenseCmd::new(household.id, "carol", 1000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn non_positive_amount_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    let err = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 0, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
