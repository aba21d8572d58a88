use chrono::Utc;
use sea_orm::{ConnectionTrait, Statement};

use engine::{
    ExpenseCmd, HealthStatus, IncomeCmd, MoneyCents, ReimbursementCmd, SettlementCmd,
};

mod common;
use common::{engine_with_db, household_with_two_members};

#[tokio::test]
async fn expense_and_settlement_reach_zero_balances() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    // 10.00 split equally, paid entirely by alice.
    engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();

    let balances = engine.member_balances(household.id, "alice").await.unwrap();
    let of = |id| balances.iter().find(|b| b.member_id == id).unwrap();
    assert_eq!(of(alice).total_paid, MoneyCents::new(1000));
    assert_eq!(of(alice).total_share, MoneyCents::new(500));
    assert_eq!(of(alice).balance, MoneyCents::new(500));
    assert_eq!(of(bob).balance, MoneyCents::new(-500));

    // Bob settles his 5.00 debt.
    engine
        .create_settlement(SettlementCmd::new(
            household.id,
            "bob",
            500,
            bob,
            alice,
            Utc::now(),
        ))
        .await
        .unwrap();

    let balances = engine.member_balances(household.id, "alice").await.unwrap();
    assert!(balances.iter().all(|b| b.balance.is_zero()));
}

#[tokio::test]
async fn settlement_moves_balance_between_exactly_two_members() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    engine
        .create_settlement(SettlementCmd::new(
            household.id,
            "alice",
            700,
            alice,
            bob,
            Utc::now(),
        ))
        .await
        .unwrap();

    let balances = engine.member_balances(household.id, "alice").await.unwrap();
    let of = |id| balances.iter().find(|b| b.member_id == id).unwrap();
    assert_eq!(of(alice).total_paid, MoneyCents::new(700));
    assert_eq!(of(alice).balance, MoneyCents::new(700));
    assert_eq!(of(bob).total_share, MoneyCents::new(700));
    assert_eq!(of(bob).balance, MoneyCents::new(-700));

    let total: MoneyCents = balances.iter().map(|b| b.balance).sum();
    assert!(total.is_zero());
}

#[tokio::test]
async fn reimbursement_rolls_back_proportionally() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    // 10.00 even split, alice paid. A 4.00 refund arrives to alice.
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
            400,
            alice,
            expense_id,
            Utc::now(),
        ))
        .await
        .unwrap();

    let balances = engine.member_balances(household.id, "alice").await.unwrap();
    let of = |id| balances.iter().find(|b| b.member_id == id).unwrap();
    // alice: paid 10.00 - 4.00, share 5.00 - 2.00.
    assert_eq!(of(alice).total_paid, MoneyCents::new(600));
    assert_eq!(of(alice).total_share, MoneyCents::new(300));
    assert_eq!(of(bob).total_share, MoneyCents::new(300));

    let total: MoneyCents = balances.iter().map(|b| b.balance).sum();
    assert!(total.is_zero());
}

#[tokio::test]
async fn income_never_affects_balances() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    engine
        .create_income(
            IncomeCmd::new(household.id, "alice", 50_000, Utc::now())
                .member_id(alice)
                .category("salary"),
        )
        .await
        .unwrap();

    let balances = engine.member_balances(household.id, "alice").await.unwrap();
    assert!(balances.iter().all(|b| b.balance.is_zero()));
    assert!(balances.iter().all(|b| b.total_paid.is_zero()));
}

#[tokio::test]
async fn three_way_split_preserves_zero_sum() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _bob) = household_with_two_members(&engine).await;
    let carol = engine
        .request_join(household.id, "Carol", "carol", Utc::now())
        .await
        .unwrap();
    engine
        .approve_member(household.id, carol.id, "alice")
        .await
        .unwrap();

    // 100.00 across three members does not divide evenly.
    engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 10_000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();

    let balances = engine.member_balances(household.id, "alice").await.unwrap();
    assert_eq!(balances.len(), 3);
    let shares: Vec<i64> = balances.iter().map(|b| b.total_share.cents()).collect();
    assert_eq!(shares.iter().sum::<i64>(), 10_000);
    let total: MoneyCents = balances.iter().map(|b| b.balance).sum();
    assert!(total.is_zero());
}

#[tokio::test]
async fn balance_health_reports_balanced_household() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 999, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();

    let health = engine.balance_health(household.id, "alice").await.unwrap();
    assert_eq!(health.status, HealthStatus::Balanced);
    assert!(health.total_imbalance.is_zero());
}

#[tokio::test]
async fn corrupted_split_is_detected_not_corrected() {
    let (engine, db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    let txn_id = engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();

    assert!(
        engine
            .problematic_transactions(household.id, "alice")
            .await
            .unwrap()
            .is_empty()
    );

    // Corrupt one owed amount behind the engine's back.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE splits SET owed_minor = owed_minor + 50 WHERE transaction_id = ? AND member_id = ?",
        vec![txn_id.to_string().into(), alice.to_string().into()],
    ))
    .await
    .unwrap();

    let findings = engine
        .problematic_transactions(household.id, "alice")
        .await
        .unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].transaction_id, txn_id);
    assert_eq!(findings[0].amount, MoneyCents::new(1000));
    assert_eq!(findings[0].owed_sum, MoneyCents::new(1050));

    let health = engine.balance_health(household.id, "alice").await.unwrap();
    // The inflated owed share pushes the household total 0.50 into debit.
    assert_eq!(health.status, HealthStatus::Imbalanced);
    assert_eq!(health.total_imbalance, MoneyCents::new(-50));
}

#[tokio::test]
async fn removed_member_keeps_ledger_presence() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, bob) = household_with_two_members(&engine).await;

    engine
        .create_expense(
            ExpenseCmd::new(household.id, "alice", 1000, Utc::now()).payer_member_id(alice),
        )
        .await
        .unwrap();
    engine
        .remove_member(household.id, bob, "alice")
        .await
        .unwrap();

    // Bob is inactive but still carries his debt; the sum stays zero.
    let balances = engine.member_balances(household.id, "alice").await.unwrap();
    assert_eq!(balances.len(), 2);
    let bob_balance = balances.iter().find(|b| b.member_id == bob).unwrap();
    assert_eq!(bob_balance.balance, MoneyCents::new(-500));
    let total: MoneyCents = balances.iter().map(|b| b.balance).sum();
    assert!(total.is_zero());
}
