use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::exam::{WordId, WordItem};

#[derive(Debug, Clone)]
pub struct NewWord {
    pub english: String,
    pub chinese: String,
    pub grade: i64,
    pub unit: i64,
}

impl NewWord {
    pub fn new(english: impl Into<String>, chinese: impl Into<String>, grade: i64, unit: i64) -> Self {
        Self {
            english: english.into(),
            chinese: chinese.into(),
            grade,
            unit,
        }
    }
}

pub async fn insert_word<'e, E>(executor: E, word: &NewWord) -> Result<WordItem, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let ids: Vec<WordId> = sqlx::query_scalar(
        r#"
        INSERT INTO "words" ("english", "chinese", "grade", "unit", "created_at")
        VALUES (?, ?, ?, ?, ?)
        RETURNING "id"
        "#,
    )
    .bind(&word.english)
    .bind(&word.chinese)
    .bind(word.grade)
    .bind(word.unit)
    .bind(Utc::now())
    .fetch_all(executor)
    .await?;

    let id = ids.into_iter().next().ok_or(sqlx::Error::RowNotFound)?;
    Ok(WordItem {
        id,
        english: word.english.clone(),
        chinese: word.chinese.clone(),
        grade: word.grade,
        unit: word.unit,
    })
}

pub async fn list_all<'e, E>(executor: E) -> Result<Vec<WordItem>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        r#"SELECT "id","english","chinese","grade","unit" FROM "words" ORDER BY "id""#,
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(map_word_row).collect()
}

pub async fn list_by_grade<'e, E>(
    executor: E,
    grade: i64,
    unit: Option<i64>,
) -> Result<Vec<WordItem>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows = match unit {
        Some(unit) => {
            sqlx::query(
                r#"
                SELECT "id","english","chinese","grade","unit"
                FROM "words"
                WHERE "grade" = ? AND "unit" = ?
                ORDER BY "id"
                "#,
            )
            .bind(grade)
            .bind(unit)
            .fetch_all(executor)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT "id","english","chinese","grade","unit"
                FROM "words"
                WHERE "grade" = ?
                ORDER BY "id"
                "#,
            )
            .bind(grade)
            .fetch_all(executor)
            .await?
        }
    };

    rows.iter().map(map_word_row).collect()
}

pub async fn count<'e, E>(executor: E) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
        .fetch_one(executor)
        .await
}

fn map_word_row(row: &SqliteRow) -> Result<WordItem, sqlx::Error> {
    Ok(WordItem {
        id: row.try_get("id")?,
        english: row.try_get("english")?,
        chinese: row.try_get("chinese")?,
        grade: row.try_get("grade")?,
        unit: row.try_get("unit")?,
    })
}
