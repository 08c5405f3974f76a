use std::sync::Arc;

use vocab_exam_backend::exam::engine::ExamCollaborators;
use vocab_exam_backend::exam::ports::SequentialCommitter;
use vocab_exam_backend::exam::{
    CommitStep, ExamEngine, ExamError, ExamPolicy, ExamSubmission, WordItem,
};

mod common;

use common::{memory_engine, word, MemoryStore, UnavailableRecords};

fn grade_three_store() -> Arc<MemoryStore> {
    let words = vec![
        word(1, "apple", 3, 1),
        word(2, "banana", 3, 1),
        word(3, "cherry", 3, 2),
        word(4, "grape", 3, 2),
        word(5, "lemon", 4, 1),
    ];
    let store = Arc::new(MemoryStore::with_words(words));
    store.add_user(1);
    store
}

fn submission(words: Vec<WordItem>, answers: &[(i64, &str)]) -> ExamSubmission {
    ExamSubmission {
        paper_id: None,
        words,
        answers: answers
            .iter()
            .map(|(id, text)| (*id, text.to_string()))
            .collect(),
        exam_time_seconds: 42,
    }
}

#[tokio::test]
async fn uniform_paper_uses_whole_catalog() {
    let store = grade_three_store();
    let engine = memory_engine(store);

    let paper = engine.generate_uniform_paper(10).await.unwrap();
    assert_eq!(paper.len(), 5);

    let paper = engine.generate_uniform_paper(2).await.unwrap();
    assert_eq!(paper.len(), 2);
    assert_ne!(paper.words[0].id, paper.words[1].id);
}

#[tokio::test]
async fn uniform_paper_for_grade_and_unit() {
    let engine = memory_engine(grade_three_store());

    let paper = engine.generate_uniform_paper_for(3, Some(2), 10).await.unwrap();
    let mut ids: Vec<_> = paper.words.iter().map(|w| w.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![3, 4]);

    let paper = engine.generate_uniform_paper_for(3, Some(0), 10).await.unwrap();
    assert_eq!(paper.len(), 4);
}

#[tokio::test]
async fn empty_pool_is_reported() {
    let engine = memory_engine(grade_three_store());

    let err = engine
        .generate_weighted_paper(1, 9, None, 10)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExamError::EmptyPool {
            grade: Some(9),
            unit: None
        }
    ));

    let empty = memory_engine(Arc::new(MemoryStore::default()));
    assert!(matches!(
        empty.generate_uniform_paper(5).await,
        Err(ExamError::EmptyPool { grade: None, .. })
    ));
}

#[tokio::test]
async fn zero_count_gives_empty_paper() {
    let engine = memory_engine(grade_three_store());
    let paper = engine.generate_weighted_paper(1, 3, None, 0).await.unwrap();
    assert!(paper.is_empty());
}

#[tokio::test]
async fn count_above_limit_is_rejected() {
    let engine = memory_engine(grade_three_store());
    let limit = engine.policy().max_question_count;
    let err = engine.generate_uniform_paper(limit + 1).await.unwrap_err();
    assert!(matches!(err, ExamError::InvalidRequest(_)));
}

#[tokio::test]
async fn weighted_paper_favours_missed_words() {
    let store = grade_three_store();
    store.set_error_count(1, 3, 20);
    let engine = memory_engine(store);

    // word 3 expands to 11 copies against one copy each of 1, 2 and 4
    let paper = engine.generate_weighted_paper(1, 3, None, 14).await.unwrap();
    assert_eq!(paper.len(), 14);
    assert_eq!(paper.words.iter().filter(|w| w.id == 3).count(), 11);
    assert!(paper.words.iter().all(|w| w.grade == 3));
}

#[tokio::test]
async fn weighted_paper_ignores_other_users_history() {
    let store = grade_three_store();
    store.set_error_count(2, 3, 20);
    let engine = memory_engine(store);

    let paper = engine.generate_weighted_paper(1, 3, None, 10).await.unwrap();
    let mut ids: Vec<_> = paper.words.iter().map(|w| w.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn submit_scores_records_and_rewards() {
    let store = grade_three_store();
    let engine = memory_engine(Arc::clone(&store));

    let words = vec![
        word(1, "apple", 3, 1),
        word(2, "banana", 3, 1),
        word(3, "cherry", 3, 2),
        word(4, "grape", 3, 2),
    ];
    let summary = engine
        .submit_exam(
            1,
            submission(words, &[(1, " Apple"), (2, "BANANA "), (3, "cherry"), (4, "grap")]),
        )
        .await
        .unwrap();

    assert_eq!(summary.score, 75);
    assert!(summary.passed);
    assert_eq!(summary.correct_count, 3);
    assert_eq!(summary.wrong_count, 1);
    assert_eq!(summary.points_awarded, 11);
    assert_eq!(summary.total_score, 11);
    assert_eq!(summary.record.exam_time_seconds, 42);

    assert_eq!(store.error_count(1, 4), 1);
    assert_eq!(store.error_count(1, 1), 0);
    assert_eq!(store.score(1), Some(11));
}

#[tokio::test]
async fn failing_exam_earns_nothing_but_counts_misses() {
    let store = grade_three_store();
    let engine = memory_engine(Arc::clone(&store));

    let words = vec![word(1, "apple", 3, 1), word(2, "banana", 3, 1)];
    let summary = engine
        .submit_exam(1, submission(words, &[]))
        .await
        .unwrap();

    assert_eq!(summary.score, 0);
    assert!(!summary.passed);
    assert_eq!(summary.points_awarded, 0);
    assert_eq!(store.error_count(1, 1), 1);
    assert_eq!(store.error_count(1, 2), 1);
}

#[tokio::test]
async fn duplicate_paper_entries_count_each_miss() {
    let store = grade_three_store();
    let engine = memory_engine(Arc::clone(&store));

    let words = vec![
        word(1, "apple", 3, 1),
        word(1, "apple", 3, 1),
        word(2, "banana", 3, 1),
    ];
    engine
        .submit_exam(1, submission(words, &[]))
        .await
        .unwrap();

    assert_eq!(store.error_count(1, 1), 2);
    assert_eq!(store.error_count(1, 2), 1);
}

#[tokio::test]
async fn resubmitting_counts_again() {
    let store = grade_three_store();
    let engine = memory_engine(Arc::clone(&store));

    let words = vec![word(2, "banana", 3, 1)];
    engine
        .submit_exam(1, submission(words.clone(), &[]))
        .await
        .unwrap();
    engine
        .submit_exam(1, submission(words, &[]))
        .await
        .unwrap();

    assert_eq!(store.error_count(1, 2), 2);
    assert_eq!(store.record_count(), 2);
}

#[tokio::test]
async fn empty_submission_is_rejected_without_writes() {
    let store = grade_three_store();
    let engine = memory_engine(Arc::clone(&store));

    let err = engine
        .submit_exam(1, submission(Vec::new(), &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ExamError::EmptyPaper));
    assert_eq!(store.record_count(), 0);
}

#[tokio::test]
async fn negative_exam_time_is_rejected() {
    let engine = memory_engine(grade_three_store());
    let mut sub = submission(vec![word(1, "apple", 3, 1)], &[]);
    sub.exam_time_seconds = -1;

    let err = engine.submit_exam(1, sub).await.unwrap_err();
    assert!(matches!(err, ExamError::InvalidRequest(_)));
}

#[tokio::test]
async fn record_store_failure_after_ledger_is_partial_failure() {
    let store = grade_three_store();
    let committer = Arc::new(SequentialCommitter::new(
        store.clone(),
        Arc::new(UnavailableRecords),
        store.clone(),
    ));
    let engine = ExamEngine::new(
        ExamCollaborators {
            catalog: store.clone(),
            ledger: store.clone(),
            records: store.clone(),
            committer,
        },
        ExamPolicy::default(),
    );

    let err = engine
        .submit_exam(1, submission(vec![word(1, "apple", 3, 1)], &[]))
        .await
        .unwrap_err();

    match err {
        ExamError::PartialFailure {
            completed, failed, ..
        } => {
            assert_eq!(completed, CommitStep::LedgerUpdate);
            assert_eq!(failed, CommitStep::SummaryRecord);
        }
        other => panic!("expected partial failure, got {other:?}"),
    }
    assert_eq!(store.error_count(1, 1), 1);
    assert_eq!(store.score(1), Some(0));
}

#[tokio::test]
async fn unknown_user_score_update_is_partial_failure() {
    let store = grade_three_store();
    let engine = memory_engine(Arc::clone(&store));

    let err = engine
        .submit_exam(99, submission(vec![word(1, "apple", 3, 1)], &[(1, "apple")]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExamError::PartialFailure {
            failed: CommitStep::ScoreDelta,
            ..
        }
    ));
}

#[tokio::test]
async fn records_and_errors_are_readable() {
    let store = grade_three_store();
    let engine = memory_engine(Arc::clone(&store));

    let first = engine
        .submit_exam(1, submission(vec![word(1, "apple", 3, 1)], &[]))
        .await
        .unwrap();
    let second = engine
        .submit_exam(
            1,
            submission(
                vec![word(1, "apple", 3, 1), word(2, "banana", 3, 1)],
                &[(2, "banana")],
            ),
        )
        .await
        .unwrap();

    let records = engine.exam_records(1).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], second.record);
    assert_eq!(records[1], first.record);

    let fetched = engine.exam_record(first.record.id).await.unwrap();
    assert_eq!(fetched, Some(first.record));

    let errors = engine.word_errors(1).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].word_id, 1);
    assert_eq!(errors[0].error_count, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_lose_no_misses() {
    let store = grade_three_store();
    let engine = Arc::new(memory_engine(Arc::clone(&store)));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .submit_exam(1, submission(vec![word(2, "banana", 3, 1)], &[]))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.error_count(1, 2), 16);
    assert_eq!(store.record_count(), 16);
}

#[tokio::test]
async fn custom_policy_changes_pass_mark_and_reward() {
    let store = grade_three_store();
    let policy = ExamPolicy {
        pass_threshold: 50,
        base_reward: 3,
        ..ExamPolicy::default()
    };
    let engine = common::memory_engine_with_policy(Arc::clone(&store), policy);

    let summary = engine
        .submit_exam(
            1,
            submission(
                vec![word(1, "apple", 3, 1), word(2, "banana", 3, 1)],
                &[(1, "apple")],
            ),
        )
        .await
        .unwrap();
    assert!(summary.passed);
    assert_eq!(summary.points_awarded, 3);
}
