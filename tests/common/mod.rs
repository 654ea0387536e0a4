//! Common test utilities

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use wallet_api::api;
use wallet_api::ledger::Ledger;
use wallet_api::service::UserService;

/// Connect to the test database and ensure the schema exists.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    wallet_api::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Build the application router against the given pool.
pub fn test_app(pool: PgPool) -> Router {
    let ledger = Ledger::new(pool, Duration::from_secs(5), Duration::from_secs(10));
    let service = UserService::new(ledger);

    api::create_router().with_state(service)
}

/// Seed a user with the given balance (in minor units), replacing any
/// previous row. Tests use unique ids so they stay independent of each
/// other even when run in parallel.
pub async fn seed_user(pool: &PgPool, user_id: i64, balance: i64) {
    sqlx::query(
        r#"
        INSERT INTO users (id, balance)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET balance = EXCLUDED.balance
        "#,
    )
    .bind(user_id)
    .bind(balance)
    .execute(pool)
    .await
    .expect("Failed to seed user");
}

/// A user id unlikely to collide with other tests or the predefined seed.
pub fn unique_user_id() -> i64 {
    (Uuid::new_v4().as_u128() % 1_000_000_000) as i64 + 1_000
}

/// Fetch a user's stored balance directly, in minor units.
pub async fn stored_balance(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT balance FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("Failed to fetch balance")
}
