//! Database operations for the `tracking_sequences` table.
//!
//! The counter must hand out strictly increasing values under concurrency,
//! so the increment-or-create is a single `INSERT … ON CONFLICT … RETURNING`
//! statement — the row lock taken by the upsert serializes racing callers.

use sqlx::PgPool;

use crate::DbError;

/// Atomically create-or-increment the counter for `key` and return its new
/// value. The first call for a key returns 1.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails (e.g. the table is
/// missing or the database is unreachable); callers that must stay
/// available fall back to a degraded counter.
pub async fn next_sequence(pool: &PgPool, key: &str) -> Result<i64, DbError> {
    let counter = sqlx::query_scalar::<_, i64>(
        "INSERT INTO tracking_sequences (key, counter) VALUES ($1, 1) \
         ON CONFLICT (key) DO UPDATE \
         SET counter = tracking_sequences.counter + 1, updated_at = NOW() \
         RETURNING counter",
    )
    .bind(key)
    .fetch_one(pool)
    .await?;

    Ok(counter)
}

/// Returns the current counter value for `key` without incrementing, or
/// `None` if the key has never been used.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_sequence(pool: &PgPool, key: &str) -> Result<Option<i64>, DbError> {
    let counter =
        sqlx::query_scalar::<_, i64>("SELECT counter FROM tracking_sequences WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(counter)
}
