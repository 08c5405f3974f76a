//! Adaptive exam generation, grading and error-weighted sampling.
//!
//! Papers are drawn either uniformly or biased toward words a learner has
//! missed before. Submitted answers are graded by [`evaluator`], the misses
//! feed back into the learner's error ledger, and a summary record is
//! appended for every completed exam.

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod lifecycle;
pub mod paper;
pub mod policy;
pub mod ports;
pub mod reward;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use engine::ExamEngine;
pub use error::{CommitStep, ExamError, StoreError};
pub use policy::{ExamPolicy, PolicyError};

pub type UserId = i64;
pub type WordId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordItem {
    pub id: WordId,
    pub english: String,
    pub chinese: String,
    #[serde(default)]
    pub grade: i64,
    #[serde(default)]
    pub unit: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPaper {
    pub paper_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub words: Vec<WordItem>,
}

impl ExamPaper {
    pub fn new(words: Vec<WordItem>) -> Self {
        Self {
            paper_id: Uuid::new_v4(),
            issued_at: Utc::now(),
            words,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Answers for a previously issued paper. The issued words travel with the
/// submission so grading never depends on the current catalog contents.
#[derive(Debug, Clone, Default)]
pub struct ExamSubmission {
    pub paper_id: Option<Uuid>,
    pub words: Vec<WordItem>,
    pub answers: HashMap<WordId, String>,
    pub exam_time_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamOutcome {
    pub score: i64,
    pub correct_count: i64,
    pub wrong_count: i64,
    pub total_count: i64,
    pub passed: bool,
    #[serde(skip)]
    pub wrong_word_ids: Vec<WordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub user_id: UserId,
    pub word_id: WordId,
    pub error_count: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExamRecord {
    pub user_id: UserId,
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    pub exam_time_seconds: i64,
    pub created_at: DateTime<Utc>,
}

impl NewExamRecord {
    pub fn from_outcome(user_id: UserId, outcome: &ExamOutcome, exam_time_seconds: i64) -> Self {
        Self {
            user_id,
            score: outcome.score,
            total_questions: outcome.total_count,
            correct_answers: outcome.correct_count,
            wrong_answers: outcome.wrong_count,
            exam_time_seconds,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummaryRecord {
    pub id: i64,
    pub user_id: UserId,
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    pub exam_time_seconds: i64,
    pub created_at: DateTime<Utc>,
}

impl ExamSummaryRecord {
    pub fn from_new(id: i64, record: &NewExamRecord) -> Self {
        Self {
            id,
            user_id: record.user_id,
            score: record.score,
            total_questions: record.total_questions,
            correct_answers: record.correct_answers,
            wrong_answers: record.wrong_answers,
            exam_time_seconds: record.exam_time_seconds,
            created_at: record.created_at,
        }
    }
}

/// Everything the orchestrator writes for one graded exam.
#[derive(Debug, Clone)]
pub struct ExamCommit {
    pub user_id: UserId,
    pub misses: Vec<WordId>,
    pub score_delta: i64,
    pub record: NewExamRecord,
}

#[derive(Debug, Clone)]
pub struct CommitReceipt {
    pub record: ExamSummaryRecord,
    pub total_score: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub score: i64,
    pub correct_count: i64,
    pub wrong_count: i64,
    pub total_count: i64,
    pub passed: bool,
    pub points_awarded: i64,
    pub total_score: i64,
    pub record: ExamSummaryRecord,
}
