use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    PaperRequested,
    PaperIssued,
    AnswersSubmitted,
    Scored,
    Recorded,
}

impl ExamPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExamPhase::PaperRequested => "PAPER_REQUESTED",
            ExamPhase::PaperIssued => "PAPER_ISSUED",
            ExamPhase::AnswersSubmitted => "ANSWERS_SUBMITTED",
            ExamPhase::Scored => "SCORED",
            ExamPhase::Recorded => "RECORDED",
        }
    }

    const fn next(self) -> Option<ExamPhase> {
        match self {
            ExamPhase::PaperRequested => Some(ExamPhase::PaperIssued),
            ExamPhase::PaperIssued => Some(ExamPhase::AnswersSubmitted),
            ExamPhase::AnswersSubmitted => Some(ExamPhase::Scored),
            ExamPhase::Scored => Some(ExamPhase::Recorded),
            ExamPhase::Recorded => None,
        }
    }
}

impl fmt::Display for ExamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PhaseTransition {
    pub from: ExamPhase,
    pub to: ExamPhase,
    pub timestamp_ms: u64,
}

/// Tracks one submitted exam attempt through its strictly sequential phases.
///
/// Paper generation ends at `PaperIssued`, so tracking starts there when the
/// answers come back. There is no way back: an attempt that fails after
/// `Scored` stays unrecorded and must not be retried.
#[derive(Debug)]
pub struct ExamLifecycle {
    paper_id: Uuid,
    current: ExamPhase,
    started_ms: u64,
    history: Vec<PhaseTransition>,
}

impl ExamLifecycle {
    pub fn issued(paper_id: Uuid) -> Self {
        Self {
            paper_id,
            current: ExamPhase::PaperIssued,
            started_ms: now_ms(),
            history: Vec::new(),
        }
    }

    pub fn paper_id(&self) -> Uuid {
        self.paper_id
    }

    pub fn phase(&self) -> ExamPhase {
        self.current
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    /// Milliseconds between the start of tracking and the latest transition.
    pub fn elapsed_ms(&self) -> u64 {
        self.history
            .last()
            .map(|t| t.timestamp_ms.saturating_sub(self.started_ms))
            .unwrap_or(0)
    }

    /// Scored but not recorded: the outcome exists only in memory.
    pub fn is_unrecorded_outcome(&self) -> bool {
        self.current == ExamPhase::Scored
    }

    pub fn can_transition_to(&self, target: ExamPhase) -> bool {
        self.current.next() == Some(target)
    }

    pub fn transition_to(&mut self, target: ExamPhase) -> Result<(), PhaseError> {
        if !self.can_transition_to(target) {
            return Err(PhaseError::InvalidTransition {
                from: self.current,
                to: target,
            });
        }

        tracing::debug!(
            paper_id = %self.paper_id,
            from = self.current.as_str(),
            to = target.as_str(),
            "exam phase transition"
        );

        self.history.push(PhaseTransition {
            from: self.current,
            to: target,
            timestamp_ms: now_ms(),
        });
        self.current = target;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<(), PhaseError> {
        self.transition_to(ExamPhase::AnswersSubmitted)
    }

    pub fn score(&mut self) -> Result<(), PhaseError> {
        self.transition_to(ExamPhase::Scored)
    }

    pub fn record(&mut self) -> Result<(), PhaseError> {
        self.transition_to(ExamPhase::Recorded)
    }
}

#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("Invalid exam phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: ExamPhase, to: ExamPhase },
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut lifecycle = ExamLifecycle::issued(Uuid::new_v4());
        lifecycle.submit().unwrap();
        lifecycle.score().unwrap();
        lifecycle.record().unwrap();
        assert_eq!(lifecycle.phase(), ExamPhase::Recorded);

        let phases: Vec<_> = lifecycle.history().iter().map(|t| t.to).collect();
        assert_eq!(
            phases,
            vec![
                ExamPhase::AnswersSubmitted,
                ExamPhase::Scored,
                ExamPhase::Recorded
            ]
        );
        assert!(lifecycle
            .history()
            .windows(2)
            .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    }

    #[test]
    fn test_cannot_skip_scoring() {
        let mut lifecycle = ExamLifecycle::issued(Uuid::new_v4());
        lifecycle.submit().unwrap();
        let err = lifecycle.record().unwrap_err();
        assert!(matches!(
            err,
            PhaseError::InvalidTransition {
                from: ExamPhase::AnswersSubmitted,
                to: ExamPhase::Recorded
            }
        ));
        assert_eq!(lifecycle.phase(), ExamPhase::AnswersSubmitted);
        assert_eq!(lifecycle.history().len(), 1);
    }

    #[test]
    fn test_scored_attempt_cannot_be_resubmitted() {
        let mut lifecycle = ExamLifecycle::issued(Uuid::new_v4());
        lifecycle.submit().unwrap();
        lifecycle.score().unwrap();
        assert!(lifecycle.is_unrecorded_outcome());
        assert!(lifecycle.submit().is_err());
        assert!(lifecycle.score().is_err());
    }

    #[test]
    fn test_recorded_is_terminal() {
        let mut lifecycle = ExamLifecycle::issued(Uuid::new_v4());
        lifecycle.submit().unwrap();
        lifecycle.score().unwrap();
        lifecycle.record().unwrap();
        assert!(!lifecycle.is_unrecorded_outcome());
        assert!(!lifecycle.can_transition_to(ExamPhase::PaperIssued));
        assert!(lifecycle.record().is_err());
    }

    #[test]
    fn test_elapsed_starts_at_zero() {
        let lifecycle = ExamLifecycle::issued(Uuid::new_v4());
        assert_eq!(lifecycle.elapsed_ms(), 0);
        assert_eq!(lifecycle.phase().to_string(), "PAPER_ISSUED");
    }
}
