use crate::exam::ExamPolicy;

/// Points added to the learner's cumulative score for one exam.
///
/// Failing scores earn nothing; a pass earns the base reward plus one
/// point per full `reward_step` above the threshold.
pub fn reward_for(score: i64, policy: &ExamPolicy) -> i64 {
    if score < policy.pass_threshold {
        return 0;
    }
    let step = policy.reward_step.max(1);
    policy.base_reward + (score - policy.pass_threshold) / step
}
