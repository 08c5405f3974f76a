use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::exam::evaluator::evaluate;
use crate::exam::lifecycle::ExamLifecycle;
use crate::exam::paper::{build_paper, build_weighted_paper};
use crate::exam::ports::{ErrorLedger, ExamCommitter, ExamRecordStore, WordCatalog};
use crate::exam::reward::reward_for;
use crate::exam::{
    ErrorRecord, ExamCommit, ExamError, ExamPaper, ExamPolicy, ExamSubmission, ExamSummary,
    ExamSummaryRecord, NewExamRecord, UserId, WordItem,
};

const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Serialization point for submissions of the same user.
///
/// Error counters and the cumulative score are shared per user, so two
/// concurrent submissions from one learner must not interleave their
/// writes. Different users never wait on each other.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            if locks.len() >= LOCK_PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct ExamCollaborators {
    pub catalog: Arc<dyn WordCatalog>,
    pub ledger: Arc<dyn ErrorLedger>,
    pub records: Arc<dyn ExamRecordStore>,
    pub committer: Arc<dyn ExamCommitter>,
}

pub struct ExamEngine {
    catalog: Arc<dyn WordCatalog>,
    ledger: Arc<dyn ErrorLedger>,
    records: Arc<dyn ExamRecordStore>,
    committer: Arc<dyn ExamCommitter>,
    policy: ExamPolicy,
    locks: UserLocks,
    rng: Mutex<StdRng>,
}

impl ExamEngine {
    pub fn new(collaborators: ExamCollaborators, policy: ExamPolicy) -> Self {
        Self {
            catalog: collaborators.catalog,
            ledger: collaborators.ledger,
            records: collaborators.records,
            committer: collaborators.committer,
            policy,
            locks: UserLocks::default(),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Engine backed by a single store that implements every collaborator.
    pub fn from_store<S>(store: Arc<S>, policy: ExamPolicy) -> Self
    where
        S: WordCatalog + ErrorLedger + ExamRecordStore + ExamCommitter + 'static,
    {
        let collaborators = ExamCollaborators {
            catalog: store.clone(),
            ledger: store.clone(),
            records: store.clone(),
            committer: store,
        };
        Self::new(collaborators, policy)
    }

    /// Replaces the randomness source, e.g. with a seeded generator in tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn policy(&self) -> &ExamPolicy {
        &self.policy
    }

    pub async fn generate_uniform_paper(&self, count: i64) -> Result<ExamPaper, ExamError> {
        self.check_count(count)?;
        let pool = self.catalog.all_words().await?;
        self.issue_uniform(pool, count, None, None)
    }

    pub async fn generate_uniform_paper_for(
        &self,
        grade: i64,
        unit: Option<i64>,
        count: i64,
    ) -> Result<ExamPaper, ExamError> {
        self.check_count(count)?;
        let unit = normalize_unit(unit);
        let pool = self.catalog.words_for_grade_unit(grade, unit).await?;
        self.issue_uniform(pool, count, Some(grade), unit)
    }

    pub async fn generate_weighted_paper(
        &self,
        user_id: UserId,
        grade: i64,
        unit: Option<i64>,
        count: i64,
    ) -> Result<ExamPaper, ExamError> {
        self.check_count(count)?;
        let unit = normalize_unit(unit);

        let pool = self.catalog.words_for_grade_unit(grade, unit).await?;
        if pool.is_empty() {
            tracing::warn!(user_id, grade, ?unit, "no words for weighted paper");
            return Err(ExamError::EmptyPool {
                grade: Some(grade),
                unit,
            });
        }

        let error_counts = self.ledger.error_counts_for_user(user_id).await?;
        let words = {
            let mut rng = self.rng.lock();
            build_weighted_paper(
                &pool,
                &error_counts,
                count,
                self.policy.weight_divisor,
                &mut *rng,
            )
        };

        let paper = ExamPaper::new(words);
        tracing::info!(
            user_id,
            grade,
            ?unit,
            paper_id = %paper.paper_id,
            pool_size = pool.len(),
            missed_words = error_counts.len(),
            questions = paper.len(),
            "weighted exam paper issued"
        );
        Ok(paper)
    }

    /// Grades a submission and records its outcome.
    ///
    /// Ledger misses, the summary record and the score delta are handed to
    /// the committer as one unit while the user's lock is held. Any failure
    /// from there on is returned as-is and must not be retried, since a
    /// retry could count the same misses twice.
    pub async fn submit_exam(
        &self,
        user_id: UserId,
        submission: ExamSubmission,
    ) -> Result<ExamSummary, ExamError> {
        if submission.exam_time_seconds < 0 {
            return Err(ExamError::InvalidRequest(
                "examTimeSeconds must not be negative".to_string(),
            ));
        }

        let paper_id = submission.paper_id.unwrap_or_else(Uuid::new_v4);
        let mut lifecycle = ExamLifecycle::issued(paper_id);
        lifecycle.submit()?;

        let _guard = self.locks.acquire(user_id).await;

        let outcome = match evaluate(&submission.words, &submission.answers, &self.policy) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    user_id,
                    %paper_id,
                    phase = %lifecycle.phase(),
                    error = %err,
                    "exam submission rejected"
                );
                return Err(err);
            }
        };
        lifecycle.score()?;

        let points = reward_for(outcome.score, &self.policy);
        let commit = ExamCommit {
            user_id,
            misses: outcome.wrong_word_ids.clone(),
            score_delta: points,
            record: NewExamRecord::from_outcome(user_id, &outcome, submission.exam_time_seconds),
        };

        let receipt = match self.committer.commit(&commit).await {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::error!(
                    user_id,
                    paper_id = %lifecycle.paper_id(),
                    phase = %lifecycle.phase(),
                    unrecorded_outcome = lifecycle.is_unrecorded_outcome(),
                    score = outcome.score,
                    wrong = outcome.wrong_count,
                    error = %err,
                    "exam attempt abandoned, outcome not recorded"
                );
                return Err(err);
            }
        };
        lifecycle.record()?;

        tracing::info!(
            user_id,
            paper_id = %lifecycle.paper_id(),
            score = outcome.score,
            correct = outcome.correct_count,
            wrong = outcome.wrong_count,
            points,
            record_id = receipt.record.id,
            elapsed_ms = lifecycle.elapsed_ms(),
            "exam recorded"
        );

        Ok(ExamSummary {
            score: outcome.score,
            correct_count: outcome.correct_count,
            wrong_count: outcome.wrong_count,
            total_count: outcome.total_count,
            passed: outcome.passed,
            points_awarded: points,
            total_score: receipt.total_score,
            record: receipt.record,
        })
    }

    pub async fn exam_records(&self, user_id: UserId) -> Result<Vec<ExamSummaryRecord>, ExamError> {
        Ok(self.records.records_for_user(user_id).await?)
    }

    pub async fn exam_record(&self, record_id: i64) -> Result<Option<ExamSummaryRecord>, ExamError> {
        Ok(self.records.get(record_id).await?)
    }

    pub async fn word_errors(&self, user_id: UserId) -> Result<Vec<ErrorRecord>, ExamError> {
        Ok(self.ledger.errors_for_user(user_id).await?)
    }

    fn check_count(&self, count: i64) -> Result<(), ExamError> {
        if count > self.policy.max_question_count {
            return Err(ExamError::InvalidRequest(format!(
                "count must not exceed {}",
                self.policy.max_question_count
            )));
        }
        Ok(())
    }

    fn issue_uniform(
        &self,
        pool: Vec<WordItem>,
        count: i64,
        grade: Option<i64>,
        unit: Option<i64>,
    ) -> Result<ExamPaper, ExamError> {
        if pool.is_empty() {
            tracing::warn!(?grade, ?unit, "no words for uniform paper");
            return Err(ExamError::EmptyPool { grade, unit });
        }

        let words = {
            let mut rng = self.rng.lock();
            build_paper(&pool, count, &mut *rng)
        };

        let paper = ExamPaper::new(words);
        tracing::info!(
            ?grade,
            ?unit,
            paper_id = %paper.paper_id,
            pool_size = pool.len(),
            questions = paper.len(),
            "uniform exam paper issued"
        );
        Ok(paper)
    }
}

fn normalize_unit(unit: Option<i64>) -> Option<i64> {
    unit.filter(|unit| *unit > 0)
}
