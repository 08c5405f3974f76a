//! Collaborator interfaces consumed by the exam engine.
//!
//! The engine owns none of this state. Word catalog, error ledger, user
//! scores and exam history live behind these traits so that a SQL store,
//! an in-memory fake or a remote service can sit behind them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::exam::{
    CommitReceipt, CommitStep, ErrorRecord, ExamCommit, ExamError, ExamSummaryRecord,
    NewExamRecord, StoreError, UserId, WordId, WordItem,
};

/// Read-only lookup of vocabulary items.
#[async_trait]
pub trait WordCatalog: Send + Sync {
    /// Words of one grade; `unit = None` means every unit of that grade.
    async fn words_for_grade_unit(
        &self,
        grade: i64,
        unit: Option<i64>,
    ) -> Result<Vec<WordItem>, StoreError>;

    async fn all_words(&self) -> Result<Vec<WordItem>, StoreError>;
}

/// Per-(user, word) wrong-answer counters.
#[async_trait]
pub trait ErrorLedger: Send + Sync {
    async fn error_counts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<WordId, i64>, StoreError>;

    /// Adds one miss per entry of `word_ids`; duplicates count once each.
    async fn record_misses(&self, user_id: UserId, word_ids: &[WordId]) -> Result<(), StoreError>;

    /// Error records of one user, highest count first.
    async fn errors_for_user(&self, user_id: UserId) -> Result<Vec<ErrorRecord>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Adds `delta` to the user's cumulative score and returns the new total.
    async fn apply_score_delta(&self, user_id: UserId, delta: i64) -> Result<i64, StoreError>;
}

/// Append-only exam history.
#[async_trait]
pub trait ExamRecordStore: Send + Sync {
    async fn append(&self, record: &NewExamRecord) -> Result<ExamSummaryRecord, StoreError>;

    async fn get(&self, record_id: i64) -> Result<Option<ExamSummaryRecord>, StoreError>;

    /// Records of one user, newest first.
    async fn records_for_user(&self, user_id: UserId)
        -> Result<Vec<ExamSummaryRecord>, StoreError>;
}

/// Applies every write of a graded exam as one logical operation.
#[async_trait]
pub trait ExamCommitter: Send + Sync {
    async fn commit(&self, commit: &ExamCommit) -> Result<CommitReceipt, ExamError>;
}

/// Commits through three independent stores, one after another.
///
/// The stores give no atomicity across each other, so a failure after the
/// first write surfaces as [`ExamError::PartialFailure`] naming the last
/// step that did go through.
#[derive(Clone)]
pub struct SequentialCommitter {
    ledger: Arc<dyn ErrorLedger>,
    records: Arc<dyn ExamRecordStore>,
    users: Arc<dyn UserStore>,
}

impl SequentialCommitter {
    pub fn new(
        ledger: Arc<dyn ErrorLedger>,
        records: Arc<dyn ExamRecordStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            ledger,
            records,
            users,
        }
    }
}

#[async_trait]
impl ExamCommitter for SequentialCommitter {
    async fn commit(&self, commit: &ExamCommit) -> Result<CommitReceipt, ExamError> {
        self.ledger
            .record_misses(commit.user_id, &commit.misses)
            .await?;

        let record = self
            .records
            .append(&commit.record)
            .await
            .map_err(|source| ExamError::PartialFailure {
                completed: CommitStep::LedgerUpdate,
                failed: CommitStep::SummaryRecord,
                source,
            })?;

        let total_score = self
            .users
            .apply_score_delta(commit.user_id, commit.score_delta)
            .await
            .map_err(|source| ExamError::PartialFailure {
                completed: CommitStep::SummaryRecord,
                failed: CommitStep::ScoreDelta,
                source,
            })?;

        Ok(CommitReceipt {
            record,
            total_score,
        })
    }
}
