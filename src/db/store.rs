use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;

use crate::db::operations::{exam_records, user, word_errors, words};
use crate::db::Database;
use crate::exam::ports::{ErrorLedger, ExamCommitter, ExamRecordStore, UserStore, WordCatalog};
use crate::exam::{
    CommitReceipt, ErrorRecord, ExamCommit, ExamError, ExamSummaryRecord, NewExamRecord,
    StoreError, UserId, WordId, WordItem,
};

/// SQLite implementation of every exam collaborator.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl WordCatalog for SqliteStore {
    async fn words_for_grade_unit(
        &self,
        grade: i64,
        unit: Option<i64>,
    ) -> Result<Vec<WordItem>, StoreError> {
        Ok(words::list_by_grade(self.db.pool(), grade, unit).await?)
    }

    async fn all_words(&self) -> Result<Vec<WordItem>, StoreError> {
        Ok(words::list_all(self.db.pool()).await?)
    }
}

#[async_trait]
impl ErrorLedger for SqliteStore {
    async fn error_counts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<WordId, i64>, StoreError> {
        Ok(word_errors::error_counts(self.db.pool(), user_id).await?)
    }

    async fn record_misses(&self, user_id: UserId, word_ids: &[WordId]) -> Result<(), StoreError> {
        if word_ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;
        for word_id in word_ids {
            word_errors::increment_error(&mut *tx, user_id, *word_id, now).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn errors_for_user(&self, user_id: UserId) -> Result<Vec<ErrorRecord>, StoreError> {
        Ok(word_errors::list_for_user(self.db.pool(), user_id).await?)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn apply_score_delta(&self, user_id: UserId, delta: i64) -> Result<i64, StoreError> {
        user::add_score(self.db.pool(), user_id, delta)
            .await?
            .ok_or(StoreError::UnknownUser(user_id))
    }
}

#[async_trait]
impl ExamRecordStore for SqliteStore {
    async fn append(&self, record: &NewExamRecord) -> Result<ExamSummaryRecord, StoreError> {
        Ok(exam_records::insert_record(self.db.pool(), record).await?)
    }

    async fn get(&self, record_id: i64) -> Result<Option<ExamSummaryRecord>, StoreError> {
        Ok(exam_records::get_record(self.db.pool(), record_id).await?)
    }

    async fn records_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ExamSummaryRecord>, StoreError> {
        Ok(exam_records::list_for_user(self.db.pool(), user_id).await?)
    }
}

/// All three writes share one transaction: either the exam is fully
/// recorded or nothing about it is.
#[async_trait]
impl ExamCommitter for SqliteStore {
    async fn commit(&self, commit: &ExamCommit) -> Result<CommitReceipt, ExamError> {
        let mut tx = self.db.pool().begin().await?;

        // write first so the transaction holds the write lock from the start
        let total_score = user::add_score(&mut *tx, commit.user_id, commit.score_delta)
            .await?
            .ok_or(StoreError::UnknownUser(commit.user_id))?;

        let now = Utc::now();
        for word_id in &commit.misses {
            word_errors::increment_error(&mut *tx, commit.user_id, *word_id, now).await?;
        }

        let record = exam_records::insert_record(&mut *tx, &commit.record).await?;

        tx.commit().await?;

        Ok(CommitReceipt {
            record,
            total_score,
        })
    }
}
