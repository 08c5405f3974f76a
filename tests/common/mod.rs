#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use vocab_exam_backend::db::config::SqliteConfig;
use vocab_exam_backend::db::operations::{user, words};
use vocab_exam_backend::db::Database;
use vocab_exam_backend::exam::engine::ExamCollaborators;
use vocab_exam_backend::exam::ports::{
    ErrorLedger, ExamRecordStore, SequentialCommitter, UserStore, WordCatalog,
};
use vocab_exam_backend::exam::{
    ErrorRecord, ExamEngine, ExamPolicy, ExamSummaryRecord, NewExamRecord, StoreError, UserId,
    WordId, WordItem,
};

pub fn word(id: WordId, english: &str, grade: i64, unit: i64) -> WordItem {
    WordItem {
        id,
        english: english.to_string(),
        chinese: format!("释义{id}"),
        grade,
        unit,
    }
}

/// In-memory stand-in for every collaborator.
#[derive(Default)]
pub struct MemoryStore {
    words: Vec<WordItem>,
    errors: Mutex<HashMap<(UserId, WordId), ErrorRecord>>,
    scores: Mutex<HashMap<UserId, i64>>,
    records: Mutex<Vec<ExamSummaryRecord>>,
    next_record_id: AtomicI64,
}

impl MemoryStore {
    pub fn with_words(words: Vec<WordItem>) -> Self {
        Self {
            words,
            ..Self::default()
        }
    }

    pub fn add_user(&self, user_id: UserId) {
        self.scores.lock().insert(user_id, 0);
    }

    pub fn set_error_count(&self, user_id: UserId, word_id: WordId, error_count: i64) {
        self.errors.lock().insert(
            (user_id, word_id),
            ErrorRecord {
                user_id,
                word_id,
                error_count,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn error_count(&self, user_id: UserId, word_id: WordId) -> i64 {
        self.errors
            .lock()
            .get(&(user_id, word_id))
            .map(|r| r.error_count)
            .unwrap_or(0)
    }

    pub fn score(&self, user_id: UserId) -> Option<i64> {
        self.scores.lock().get(&user_id).copied()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl WordCatalog for MemoryStore {
    async fn words_for_grade_unit(
        &self,
        grade: i64,
        unit: Option<i64>,
    ) -> Result<Vec<WordItem>, StoreError> {
        Ok(self
            .words
            .iter()
            .filter(|w| w.grade == grade && unit.map_or(true, |u| w.unit == u))
            .cloned()
            .collect())
    }

    async fn all_words(&self) -> Result<Vec<WordItem>, StoreError> {
        Ok(self.words.clone())
    }
}

#[async_trait]
impl ErrorLedger for MemoryStore {
    async fn error_counts_for_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<WordId, i64>, StoreError> {
        Ok(self
            .errors
            .lock()
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| (r.word_id, r.error_count))
            .collect())
    }

    async fn record_misses(&self, user_id: UserId, word_ids: &[WordId]) -> Result<(), StoreError> {
        let mut errors = self.errors.lock();
        for word_id in word_ids {
            let record = errors.entry((user_id, *word_id)).or_insert(ErrorRecord {
                user_id,
                word_id: *word_id,
                error_count: 0,
                updated_at: Utc::now(),
            });
            record.error_count += 1;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn errors_for_user(&self, user_id: UserId) -> Result<Vec<ErrorRecord>, StoreError> {
        let mut records: Vec<_> = self
            .errors
            .lock()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.error_count.cmp(&a.error_count).then(a.word_id.cmp(&b.word_id)));
        Ok(records)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn apply_score_delta(&self, user_id: UserId, delta: i64) -> Result<i64, StoreError> {
        let mut scores = self.scores.lock();
        let total = scores
            .get_mut(&user_id)
            .ok_or(StoreError::UnknownUser(user_id))?;
        *total += delta;
        Ok(*total)
    }
}

#[async_trait]
impl ExamRecordStore for MemoryStore {
    async fn append(&self, record: &NewExamRecord) -> Result<ExamSummaryRecord, StoreError> {
        let id = self.next_record_id.fetch_add(1, Ordering::SeqCst) + 1;
        let summary = ExamSummaryRecord::from_new(id, record);
        self.records.lock().push(summary.clone());
        Ok(summary)
    }

    async fn get(&self, record_id: i64) -> Result<Option<ExamSummaryRecord>, StoreError> {
        Ok(self.records.lock().iter().find(|r| r.id == record_id).cloned())
    }

    async fn records_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ExamSummaryRecord>, StoreError> {
        let mut records: Vec<_> = self
            .records
            .lock()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }
}

/// Record store that always fails, for exercising partial commits.
pub struct UnavailableRecords;

#[async_trait]
impl ExamRecordStore for UnavailableRecords {
    async fn append(&self, _record: &NewExamRecord) -> Result<ExamSummaryRecord, StoreError> {
        Err(StoreError::Unavailable("record store offline".to_string()))
    }

    async fn get(&self, _record_id: i64) -> Result<Option<ExamSummaryRecord>, StoreError> {
        Err(StoreError::Unavailable("record store offline".to_string()))
    }

    async fn records_for_user(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<ExamSummaryRecord>, StoreError> {
        Err(StoreError::Unavailable("record store offline".to_string()))
    }
}

pub fn memory_engine(store: Arc<MemoryStore>) -> ExamEngine {
    memory_engine_with_policy(store, ExamPolicy::default())
}

pub fn memory_engine_with_policy(store: Arc<MemoryStore>, policy: ExamPolicy) -> ExamEngine {
    let committer = Arc::new(SequentialCommitter::new(
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let collaborators = ExamCollaborators {
        catalog: store.clone(),
        ledger: store.clone(),
        records: store,
        committer,
    };
    ExamEngine::new(collaborators, policy).with_rng(StdRng::seed_from_u64(7))
}

pub async fn test_database(dir: &TempDir) -> Database {
    let config = SqliteConfig::at_path(dir.path().join("exam.db"));
    Database::connect(config)
        .await
        .expect("failed to open test database")
}

pub async fn seed_words(db: &Database, spellings: &[&str], grade: i64, unit: i64) -> Vec<WordItem> {
    let mut seeded = Vec::with_capacity(spellings.len());
    for english in spellings {
        let new_word = words::NewWord::new(*english, format!("{english}的释义"), grade, unit);
        seeded.push(
            words::insert_word(db.pool(), &new_word)
                .await
                .expect("insert word"),
        );
    }
    seeded
}

pub async fn create_user(db: &Database, username: &str) -> UserId {
    user::create_user(db.pool(), username)
        .await
        .expect("create user")
}
