use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::exam::{ErrorRecord, UserId, WordId};

/// Adds one miss for `(user_id, word_id)`, creating the row at 1.
///
/// The increment happens inside the upsert, so concurrent writers never
/// lose an update.
pub async fn increment_error<'e, E>(
    executor: E,
    user_id: UserId,
    word_id: WordId,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO "user_word_errors" ("user_id", "word_id", "error_count", "updated_at")
        VALUES (?, ?, 1, ?)
        ON CONFLICT ("user_id", "word_id") DO UPDATE SET
            "error_count" = "error_count" + 1,
            "updated_at" = excluded."updated_at"
        "#,
    )
    .bind(user_id)
    .bind(word_id)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn error_counts<'e, E>(
    executor: E,
    user_id: UserId,
) -> Result<HashMap<WordId, i64>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        r#"
        SELECT "word_id", "error_count"
        FROM "user_word_errors"
        WHERE "user_id" = ? AND "error_count" > 0
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    let mut counts = HashMap::with_capacity(rows.len());
    for row in &rows {
        counts.insert(row.try_get("word_id")?, row.try_get("error_count")?);
    }
    Ok(counts)
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<ErrorRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        r#"
        SELECT "user_id", "word_id", "error_count", "updated_at"
        FROM "user_word_errors"
        WHERE "user_id" = ?
        ORDER BY "error_count" DESC, "word_id" ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(map_error_row).collect()
}

fn map_error_row(row: &SqliteRow) -> Result<ErrorRecord, sqlx::Error> {
    Ok(ErrorRecord {
        user_id: row.try_get("user_id")?,
        word_id: row.try_get("word_id")?,
        error_count: row.try_get("error_count")?,
        updated_at: row.try_get("updated_at")?,
    })
}
