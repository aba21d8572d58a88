use chrono::Utc;

use engine::{
    Capability, EngineError, ExpenseCmd, MemberPermissions, MemberStatus,
};

mod common;
use common::{engine_with_db, household_with_two_members};

#[tokio::test]
async fn join_request_starts_pending_and_cannot_duplicate() {
    let (engine, _db) = engine_with_db().await;
    let (household, _, _) = household_with_two_members(&engine).await;

    let carol = engine
        .request_join(household.id, "Carol", "carol", Utc::now())
        .await
        .unwrap();
    assert_eq!(carol.status, MemberStatus::Pending);

    let err = engine
        .request_join(household.id, "Carol again", "carol", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn default_grants_exclude_join_approval() {
    let (engine, _db) = engine_with_db().await;
    let (household, _, bob) = household_with_two_members(&engine).await;

    // Bob was approved with default grants, so he can create managed members.
    engine
        .create_managed_member(household.id, "Nonna", "bob", Utc::now())
        .await
        .unwrap();

    // But he cannot approve join requests.
    let carol = engine
        .request_join(household.id, "Carol", "carol", Utc::now())
        .await
        .unwrap();
    let err = engine
        .approve_member(household.id, carol.id, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let grants = engine
        .member_permissions(household.id, bob, "alice")
        .await
        .unwrap();
    assert!(grants.allows(Capability::CreateManagedMembers));
    assert!(!grants.allows(Capability::ApproveJoinRequests));
}

#[tokio::test]
async fn managed_member_lifecycle() {
    let (engine, _db) = engine_with_db().await;
    let (household, _, _) = household_with_two_members(&engine).await;

    let managed = engine
        .create_managed_member(household.id, "Nonna", "alice", Utc::now())
        .await
        .unwrap();
    assert!(managed.is_managed());
    assert_eq!(managed.status, MemberStatus::Approved);
    let code = managed.claim_code.clone().unwrap();

    let claimed = engine
        .claim_managed_member(household.id, &code, "carol")
        .await
        .unwrap();
    assert_eq!(claimed.id, managed.id);
    assert_eq!(claimed.user_id.as_deref(), Some("carol"));
    assert!(claimed.claim_code.is_none());

    // The code is one-time: a second claim fails.
    let err = engine
        .claim_managed_member(household.id, &code, "bob")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::KeyNotFound(_) | EngineError::ExistingKey(_)
    ));
}

#[tokio::test]
async fn removal_deletes_members_without_history() {
    let (engine, _db) = engine_with_db().await;
    let (household, _, bob) = household_with_two_members(&engine).await;

    engine
        .remove_member(household.id, bob, "alice")
        .await
        .unwrap();

    let members = engine.list_members(household.id, "alice").await.unwrap();
    assert_eq!(members.len(), 1);
    assert!(members.iter().all(|m| m.id != bob));
}

#[tokio::test]
async fn removal_deactivates_members_with_history() {
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

    let members = engine.list_members(household.id, "alice").await.unwrap();
    let bob_row = members.iter().find(|m| m.id == bob).unwrap();
    assert_eq!(bob_row.status, MemberStatus::Inactive);

    // Removing again is a conflict.
    let err = engine
        .remove_member(household.id, bob, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
}

#[tokio::test]
async fn owner_cannot_be_removed() {
    let (engine, _db) = engine_with_db().await;
    let (household, alice, _) = household_with_two_members(&engine).await;

    let err = engine
        .remove_member(household.id, alice, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn reactivation_restores_membership_without_grants() {
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
    engine
        .reactivate_member(household.id, bob, "alice")
        .await
        .unwrap();

    let members = engine.list_members(household.id, "alice").await.unwrap();
    let bob_row = members.iter().find(|m| m.id == bob).unwrap();
    assert_eq!(bob_row.status, MemberStatus::Approved);

    // Grants do not survive the removal/reactivation round trip.
    let grants = engine
        .member_permissions(household.id, bob, "alice")
        .await
        .unwrap();
    assert_eq!(grants, MemberPermissions::NONE);

    let err = engine
        .reactivate_member(household.id, bob, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
}

#[tokio::test]
async fn set_permissions_is_owner_only() {
    let (engine, _db) = engine_with_db().await;
    let (household, _, bob) = household_with_two_members(&engine).await;
    let carol = engine
        .request_join(household.id, "Carol", "carol", Utc::now())
        .await
        .unwrap();
    engine
        .approve_member(household.id, carol.id, "alice")
        .await
        .unwrap();

    let err = engine
        .set_permissions(household.id, carol.id, MemberPermissions::NONE, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine
        .set_permissions(
            household.id,
            bob,
            MemberPermissions {
                approve_join_requests: true,
                ..MemberPermissions::NONE
            },
            "alice",
        )
        .await
        .unwrap();

    let grants = engine
        .member_permissions(household.id, bob, "alice")
        .await
        .unwrap();
    assert!(grants.allows(Capability::ApproveJoinRequests));
    assert!(!grants.allows(Capability::RemoveMembers));
}

#[tokio::test]
async fn member_without_grant_cannot_remove() {
    let (engine, _db) = engine_with_db().await;
    let (household, _, bob) = household_with_two_members(&engine).await;
    let carol = engine
        .request_join(household.id, "Carol", "carol", Utc::now())
        .await
        .unwrap();
    engine
        .approve_member(household.id, carol.id, "alice")
        .await
        .unwrap();

    engine
        .set_permissions(household.id, bob, MemberPermissions::NONE, "alice")
        .await
        .unwrap();

    let err = engine
        .remove_member(household.id, carol.id, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
