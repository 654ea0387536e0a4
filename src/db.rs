//! Database module
//!
//! Schema auto-creation and seed data. The schema is idempotent: startup
//! re-runs these statements safely.

use sqlx::PgPool;

/// IDs of the users provisioned at bootstrap, all starting at zero balance.
const PREDEFINED_USER_IDS: [i64; 3] = [1, 2, 3];

/// Create the schema if it does not exist and seed the predefined users.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("running schema auto-creation");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id         BIGINT PRIMARY KEY,
            balance    BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id             UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id        BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            amount         BIGINT NOT NULL,
            state          VARCHAR(4) NOT NULL,
            source_type    VARCHAR(10) NOT NULL,
            transaction_id VARCHAR NOT NULL UNIQUE,
            processed_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("seeding predefined users");

    for user_id in PREDEFINED_USER_IDS {
        sqlx::query(
            r#"
            INSERT INTO users (id, balance)
            VALUES ($1, 0)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;
    }

    Ok(())
}
