use thiserror::Error;

use crate::config::env_i64;

const DEFAULT_PASS_THRESHOLD: i64 = 60;
const DEFAULT_WEIGHT_DIVISOR: i64 = 2;
const DEFAULT_BASE_REWARD: i64 = 10;
const DEFAULT_REWARD_STEP: i64 = 10;
const DEFAULT_QUESTION_COUNT: i64 = 10;
const DEFAULT_MAX_QUESTION_COUNT: i64 = 200;

/// Scoring and sampling constants shared by paper generation, grading and rewards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamPolicy {
    pub pass_threshold: i64,
    pub weight_divisor: i64,
    pub base_reward: i64,
    pub reward_step: i64,
    pub default_question_count: i64,
    pub max_question_count: i64,
}

impl Default for ExamPolicy {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            weight_divisor: DEFAULT_WEIGHT_DIVISOR,
            base_reward: DEFAULT_BASE_REWARD,
            reward_step: DEFAULT_REWARD_STEP,
            default_question_count: DEFAULT_QUESTION_COUNT,
            max_question_count: DEFAULT_MAX_QUESTION_COUNT,
        }
    }
}

impl ExamPolicy {
    pub fn from_env() -> Self {
        Self {
            pass_threshold: env_i64("EXAM_PASS_THRESHOLD", DEFAULT_PASS_THRESHOLD),
            weight_divisor: env_i64("EXAM_WEIGHT_DIVISOR", DEFAULT_WEIGHT_DIVISOR),
            base_reward: env_i64("EXAM_BASE_REWARD", DEFAULT_BASE_REWARD),
            reward_step: env_i64("EXAM_REWARD_STEP", DEFAULT_REWARD_STEP),
            default_question_count: env_i64("EXAM_DEFAULT_COUNT", DEFAULT_QUESTION_COUNT),
            max_question_count: env_i64("EXAM_MAX_COUNT", DEFAULT_MAX_QUESTION_COUNT),
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if !(0..=100).contains(&self.pass_threshold) {
            return Err(PolicyError::Invalid {
                field: "pass_threshold",
                reason: "must be within 0..=100",
            });
        }
        if self.weight_divisor < 1 {
            return Err(PolicyError::Invalid {
                field: "weight_divisor",
                reason: "must be at least 1",
            });
        }
        if self.reward_step < 1 {
            return Err(PolicyError::Invalid {
                field: "reward_step",
                reason: "must be at least 1",
            });
        }
        if self.base_reward < 0 {
            return Err(PolicyError::Invalid {
                field: "base_reward",
                reason: "must not be negative",
            });
        }
        if self.max_question_count < 1 {
            return Err(PolicyError::Invalid {
                field: "max_question_count",
                reason: "must be at least 1",
            });
        }
        if !(1..=self.max_question_count).contains(&self.default_question_count) {
            return Err(PolicyError::Invalid {
                field: "default_question_count",
                reason: "must be within 1..=max_question_count",
            });
        }
        Ok(())
    }

    pub fn passed(&self, score: i64) -> bool {
        score >= self.pass_threshold
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("invalid exam policy: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
