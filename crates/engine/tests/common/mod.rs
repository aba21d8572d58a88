use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{Engine, Household};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob", "carol"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![username.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A household owned by alice with bob approved as a plain member.
/// Returns `(household, alice_member_id, bob_member_id)`.
pub async fn household_with_two_members(engine: &Engine) -> (Household, Uuid, Uuid) {
    let household = engine
        .create_household("Casa", "Alice", "alice", Utc::now())
        .await
        .unwrap();
    let bob = engine
        .request_join(household.id, "Bob", "bob", Utc::now())
        .await
        .unwrap();
    engine
        .approve_member(household.id, bob.id, "alice")
        .await
        .unwrap();

    let alice_member = engine
        .list_members(household.id, "alice")
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.user_id.as_deref() == Some("alice"))
        .unwrap();
    (household, alice_member.id, bob.id)
}
