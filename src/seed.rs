use crate::db::operations::{user, words};
use crate::db::Database;
use crate::exam::UserId;

pub const LOCAL_USERNAME: &str = "local_user";

const DEMO_WORDS: &[(&str, &str, i64, i64)] = &[
    ("apple", "苹果", 3, 1),
    ("banana", "香蕉", 3, 1),
    ("orange", "橙子", 3, 1),
    ("pear", "梨", 3, 1),
    ("teacher", "老师", 3, 2),
    ("student", "学生", 3, 2),
    ("school", "学校", 3, 2),
    ("classroom", "教室", 3, 2),
    ("library", "图书馆", 4, 1),
    ("museum", "博物馆", 4, 1),
    ("hospital", "医院", 4, 1),
    ("station", "车站", 4, 1),
];

/// Creates the local user when it does not exist yet and returns its id.
pub async fn ensure_local_user(db: &Database) -> Result<UserId, sqlx::Error> {
    if let Some(id) = user::find_by_username(db.pool(), LOCAL_USERNAME).await? {
        tracing::debug!(user_id = id, "local user already exists");
        return Ok(id);
    }

    let id = user::create_user(db.pool(), LOCAL_USERNAME).await?;
    tracing::info!(user_id = id, "seeded local user");
    Ok(id)
}

/// Loads a small demo vocabulary into an empty catalog.
pub async fn seed_demo_words(db: &Database) -> Result<usize, sqlx::Error> {
    if words::count(db.pool()).await? > 0 {
        tracing::debug!("word catalog not empty, skipping demo words");
        return Ok(0);
    }

    let mut tx = db.pool().begin().await?;
    for (english, chinese, grade, unit) in DEMO_WORDS {
        let word = words::NewWord::new(*english, *chinese, *grade, *unit);
        words::insert_word(&mut *tx, &word).await?;
    }
    tx.commit().await?;

    tracing::info!(count = DEMO_WORDS.len(), "seeded demo words");
    Ok(DEMO_WORDS.len())
}

pub async fn seed_demo_data(db: &Database) {
    if let Err(err) = ensure_local_user(db).await {
        tracing::warn!(error = %err, "failed to seed local user");
    }
    if let Err(err) = seed_demo_words(db).await {
        tracing::warn!(error = %err, "failed to seed demo words");
    }
}
