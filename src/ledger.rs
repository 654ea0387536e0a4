//! Balance Ledger
//!
//! Owns the consistency of the `users` and `transactions` tables. Every
//! balance mutation goes through [`Ledger::apply_transaction`], a single
//! SQL transaction combining a conditional balance update with a
//! unique-constrained transaction record insert. Correctness under
//! concurrent callers is delegated entirely to the database: there are no
//! in-process locks.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// A user row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Balance in minor currency units (cents). Never negative.
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A balance mutation to be applied and recorded.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub user_id: i64,
    /// Signed delta in minor units.
    pub amount: i64,
    pub state: String,
    pub source_type: String,
    /// Caller-supplied external transaction identifier, globally unique.
    pub transaction_id: String,
}

/// Ledger error types
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("user not found")]
    UserNotFound,

    #[error("duplicate transaction")]
    DuplicateTransaction,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("storage operation timed out")]
    Timeout,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage engine for user balances and transaction records.
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: PgPool,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Ledger {
    pub fn new(pool: PgPool, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            pool,
            read_timeout,
            write_timeout,
        }
    }

    /// Fetch a user row, bounded by the read timeout.
    pub async fn get_user(&self, user_id: i64) -> Result<User, LedgerError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, balance, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool);

        let user = tokio::time::timeout(self.read_timeout, query)
            .await
            .map_err(|_| LedgerError::Timeout)??;

        user.ok_or(LedgerError::UserNotFound)
    }

    /// Apply a signed delta to a user's balance and record the transaction,
    /// as one atomic unit bounded by the write timeout.
    ///
    /// Steps, all inside one SQL transaction:
    /// 1. abort with `DuplicateTransaction` if the external id was already
    ///    processed, so duplicates never touch the balance;
    /// 2. conditionally update the balance in a single statement (never a
    ///    read-then-write), only where the result stays >= 0;
    /// 3. if no row changed, probe whether the user exists to distinguish
    ///    `UserNotFound` from `InsufficientFunds`;
    /// 4. insert the transaction record; losing a unique-constraint race to
    ///    a concurrent identical submission maps to `DuplicateTransaction`
    ///    and rolls the balance change back.
    ///
    /// Two concurrent submissions of the same external id yield exactly one
    /// success and one `DuplicateTransaction`.
    pub async fn apply_transaction(&self, record: TransactionRecord) -> Result<(), LedgerError> {
        tokio::time::timeout(self.write_timeout, self.apply_transaction_inner(record))
            .await
            .map_err(|_| LedgerError::Timeout)?
    }

    async fn apply_transaction_inner(&self, record: TransactionRecord) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;

        // Dropping `tx` on any early return rolls the unit back.
        let already_processed: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM transactions WHERE transaction_id = $1)",
        )
        .bind(&record.transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_processed {
            return Err(LedgerError::DuplicateTransaction);
        }

        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1 AND balance + $2 >= 0
            "#,
        )
        .bind(record.user_id)
        .bind(record.amount)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(self.determine_update_failure(&mut tx, record.user_id).await?);
        }

        let insert = sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, amount, state, source_type, transaction_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.user_id)
        .bind(record.amount)
        .bind(&record.state)
        .bind(&record.source_type)
        .bind(&record.transaction_id)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            if is_unique_violation(&e) {
                // Lost the race to a concurrent submission of the same id.
                return Err(LedgerError::DuplicateTransaction);
            }
            return Err(e.into());
        }

        tx.commit().await?;

        tracing::debug!(
            user_id = record.user_id,
            amount = record.amount,
            transaction_id = %record.transaction_id,
            "balance updated"
        );

        Ok(())
    }

    async fn determine_update_failure(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: i64,
    ) -> Result<LedgerError, sqlx::Error> {
        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&mut **tx)
                .await?;

        Ok(if user_exists {
            LedgerError::InsufficientFunds
        } else {
            LedgerError::UserNotFound
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
