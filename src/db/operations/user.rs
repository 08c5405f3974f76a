use chrono::Utc;
use sqlx::SqliteExecutor;

use crate::exam::UserId;

// Writes with `RETURNING` collect every row: a statement left mid-step
// keeps its autocommit transaction open on a pooled connection.

pub async fn create_user<'e, E>(executor: E, username: &str) -> Result<UserId, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let ids: Vec<UserId> = sqlx::query_scalar(
        r#"INSERT INTO "users" ("username", "total_score", "created_at") VALUES (?, 0, ?) RETURNING "id""#,
    )
    .bind(username)
    .bind(Utc::now())
    .fetch_all(executor)
    .await?;

    ids.into_iter().next().ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_by_username<'e, E>(executor: E, username: &str) -> Result<Option<UserId>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar(r#"SELECT "id" FROM "users" WHERE "username" = ?"#)
        .bind(username)
        .fetch_optional(executor)
        .await
}

pub async fn total_score<'e, E>(executor: E, user_id: UserId) -> Result<Option<i64>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar(r#"SELECT "total_score" FROM "users" WHERE "id" = ?"#)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Returns the new total, or `None` when the user does not exist.
pub async fn add_score<'e, E>(
    executor: E,
    user_id: UserId,
    delta: i64,
) -> Result<Option<i64>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let totals: Vec<i64> = sqlx::query_scalar(
        r#"
        UPDATE "users" SET "total_score" = "total_score" + ?
        WHERE "id" = ?
        RETURNING "total_score"
        "#,
    )
    .bind(delta)
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(totals.into_iter().next())
}
