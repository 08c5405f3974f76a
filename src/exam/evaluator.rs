use std::collections::HashMap;

use crate::exam::{ExamError, ExamOutcome, ExamPolicy, WordId, WordItem};

pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `round(correct / total * 100)` with halves rounded up, in integers.
pub fn percentage_score(correct: i64, total: i64) -> Option<i64> {
    if total <= 0 {
        return None;
    }
    let correct = correct.clamp(0, total);
    Some((correct * 200 + total) / (total * 2))
}

/// Grades `answers` against the words of an issued paper.
///
/// Every paper position is graded on its own, so a word that appears twice
/// on a weighted paper counts twice and shows up twice in
/// `wrong_word_ids` when missed. A missing answer is a wrong answer.
pub fn evaluate(
    paper: &[WordItem],
    answers: &HashMap<WordId, String>,
    policy: &ExamPolicy,
) -> Result<ExamOutcome, ExamError> {
    if paper.is_empty() {
        return Err(ExamError::EmptyPaper);
    }

    let mut correct_count = 0i64;
    let mut wrong_word_ids = Vec::new();

    for word in paper {
        let expected = normalize_answer(&word.english);
        let is_correct = answers
            .get(&word.id)
            .map(|answer| normalize_answer(answer) == expected)
            .unwrap_or(false);

        if is_correct {
            correct_count += 1;
        } else {
            wrong_word_ids.push(word.id);
        }
    }

    let total_count = paper.len() as i64;
    let score = percentage_score(correct_count, total_count).ok_or(ExamError::EmptyPaper)?;

    Ok(ExamOutcome {
        score,
        correct_count,
        wrong_count: total_count - correct_count,
        total_count,
        passed: policy.passed(score),
        wrong_word_ids,
    })
}
