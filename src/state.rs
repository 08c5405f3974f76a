use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::{Database, SqliteStore};
use crate::exam::{ExamEngine, ExamPolicy};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db: Option<Database>,
    engine: Arc<ExamEngine>,
}

impl AppState {
    pub fn new(db: Option<Database>, engine: Arc<ExamEngine>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db,
            engine,
        }
    }

    /// State backed by the SQLite store for every exam collaborator.
    pub fn from_database(db: Database, policy: ExamPolicy) -> Self {
        let store = Arc::new(SqliteStore::new(db.clone()));
        let engine = Arc::new(ExamEngine::from_store(store, policy));
        Self::new(Some(db), engine)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    pub fn engine(&self) -> Arc<ExamEngine> {
        Arc::clone(&self.engine)
    }
}
