use std::fmt;

use thiserror::Error;

use crate::exam::lifecycle::PhaseError;
use crate::exam::UserId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("user {0} does not exist")]
    UnknownUser(UserId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The writes that make up one recorded exam, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    LedgerUpdate,
    SummaryRecord,
    ScoreDelta,
}

impl CommitStep {
    pub const fn as_str(self) -> &'static str {
        match self {
            CommitStep::LedgerUpdate => "ledger_update",
            CommitStep::SummaryRecord => "summary_record",
            CommitStep::ScoreDelta => "score_delta",
        }
    }
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExamError {
    #[error("no words available for grade {grade:?}, unit {unit:?}")]
    EmptyPool {
        grade: Option<i64>,
        unit: Option<i64>,
    },
    #[error("cannot grade an exam paper with no words")]
    EmptyPaper,
    #[error("invalid exam request: {0}")]
    InvalidRequest(String),
    #[error("exam attempt partially recorded: {completed} applied, {failed} failed")]
    PartialFailure {
        completed: CommitStep,
        failed: CommitStep,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The engine drove an attempt out of order; never caused by client input.
    #[error(transparent)]
    Lifecycle(#[from] PhaseError),
}

impl From<sqlx::Error> for ExamError {
    fn from(err: sqlx::Error) -> Self {
        ExamError::Store(StoreError::Sqlx(err))
    }
}
