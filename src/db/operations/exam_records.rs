use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::exam::{ExamSummaryRecord, NewExamRecord, UserId};

const RECORD_COLUMNS: &str = r#""id","user_id","score","total_questions","correct_answers","wrong_answers","exam_time_seconds","created_at""#;

/// Appends a summary row. The `RETURNING` result is read with `fetch_all`
/// so the statement always runs to completion, even on a bare pool
/// connection in autocommit mode.
pub async fn insert_record<'e, E>(
    executor: E,
    record: &NewExamRecord,
) -> Result<ExamSummaryRecord, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let ids: Vec<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO "exam_records" (
            "user_id", "score", "total_questions", "correct_answers",
            "wrong_answers", "exam_time_seconds", "created_at"
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING "id"
        "#,
    )
    .bind(record.user_id)
    .bind(record.score)
    .bind(record.total_questions)
    .bind(record.correct_answers)
    .bind(record.wrong_answers)
    .bind(record.exam_time_seconds)
    .bind(record.created_at)
    .fetch_all(executor)
    .await?;

    let id = ids.into_iter().next().ok_or(sqlx::Error::RowNotFound)?;
    Ok(ExamSummaryRecord::from_new(id, record))
}

pub async fn get_record<'e, E>(
    executor: E,
    record_id: i64,
) -> Result<Option<ExamSummaryRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(r#"SELECT {RECORD_COLUMNS} FROM "exam_records" WHERE "id" = ?"#);
    let row = sqlx::query(&sql)
        .bind(record_id)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(map_record_row).transpose()
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<ExamSummaryRecord>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"SELECT {RECORD_COLUMNS} FROM "exam_records" WHERE "user_id" = ? ORDER BY "created_at" DESC, "id" DESC"#
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(executor).await?;

    rows.iter().map(map_record_row).collect()
}

fn map_record_row(row: &SqliteRow) -> Result<ExamSummaryRecord, sqlx::Error> {
    Ok(ExamSummaryRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        score: row.try_get("score")?,
        total_questions: row.try_get("total_questions")?,
        correct_answers: row.try_get("correct_answers")?,
        wrong_answers: row.try_get("wrong_answers")?,
        exam_time_seconds: row.try_get("exam_time_seconds")?,
        created_at: row.try_get("created_at")?,
    })
}
