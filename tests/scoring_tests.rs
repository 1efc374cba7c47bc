// tests/scoring_tests.rs

use omr_grader::{
    error::AppError,
    models::{
        detection::{OptionLabel, RawDetection},
        evaluation::{AnswerStatus, ComparisonRow},
        question::ReferenceQuestion,
    },
    scoring::{self, AnswerMap},
};
use serde_json::json;

fn question(options: &[&str], correct: &str) -> ReferenceQuestion {
    ReferenceQuestion {
        question_text: format!("Pick {}", correct),
        options: options.iter().map(|o| o.to_string()).collect(),
        correctanswer: correct.to_string(),
    }
}

fn mark(question: usize, option: &str) -> RawDetection {
    RawDetection {
        question: json!(question),
        option: json!(option),
        marked: json!(1),
    }
}

fn answer_key(n: usize) -> Vec<ReferenceQuestion> {
    (0..n).map(|_| question(&["w", "x", "y", "z"], "x")).collect()
}

#[test]
fn every_reference_question_gets_exactly_one_row() {
    // Arrange
    let questions = answer_key(12);
    let detections = vec![mark(3, "B"), mark(40, "A"), mark(3, "C")];

    // Act
    let rows = scoring::score(&questions, &scoring::build_answer_map(&detections));

    // Assert
    assert_eq!(rows.len(), 12);
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row.question, index + 1);
    }
}

#[test]
fn status_counts_partition_the_questions() {
    // Arrange
    let questions = answer_key(10);
    let detections = vec![mark(1, "B"), mark(2, "A"), mark(3, "B"), mark(7, "D")];

    // Act
    let rows = scoring::score(&questions, &scoring::build_answer_map(&detections));
    let summary = scoring::summarize(&rows);

    // Assert
    assert_eq!(summary.correct_answers, 2);
    assert_eq!(summary.incorrect_answers, 2);
    assert_eq!(summary.unanswered_questions, 6);
    assert_eq!(
        summary.correct_answers + summary.incorrect_answers + summary.unanswered_questions,
        summary.total_questions
    );
}

#[test]
fn empty_answer_map_leaves_everything_unanswered() {
    let questions = answer_key(5);

    let answers = AnswerMap::default();
    assert!(answers.is_empty());

    let rows = scoring::score(&questions, &answers);

    assert!(rows.iter().all(|row| row.status == AnswerStatus::Unanswered));
    assert!(rows.iter().all(|row| row.student_answer.is_none()));

    let serialized = serde_json::to_value(&rows).unwrap();
    assert_eq!(serialized[0]["studentAnswer"], "N/A");
    assert_eq!(serialized[0]["status"], "unanswered");
}

#[test]
fn correct_answer_is_matched_by_option_text() {
    let questions = vec![question(&["4", "8", "15", "16"], "8")];
    let detections = vec![mark(1, "B")];

    let rows = scoring::score(&questions, &scoring::build_answer_map(&detections));

    assert_eq!(rows[0].status, AnswerStatus::Correct);
    assert_eq!(rows[0].correct_answer, Some(OptionLabel::B));
    assert_eq!(rows[0].correct_text, "8");
}

#[test]
fn unmatched_correct_answer_is_not_available() {
    // Arrange: answer key entry whose correct text is not among its options
    let questions = vec![question(&["4", "8", "15", "16"], "23")];
    let detections = vec![mark(1, "A")];

    // Act
    let rows = scoring::score(&questions, &scoring::build_answer_map(&detections));

    // Assert
    assert_eq!(rows[0].correct_answer, None);
    assert_eq!(rows[0].status, AnswerStatus::Incorrect);
    let serialized = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(serialized["correctAnswer"], "N/A");
    assert_eq!(serialized["studentAnswer"], "A");
}

#[test]
fn first_valid_mark_wins_for_duplicates() {
    let detections = vec![mark(4, "C"), mark(4, "A"), mark(4, "D")];

    let answers = scoring::build_answer_map(&detections);

    assert_eq!(answers.len(), 1);
    assert_eq!(answers.get(4), Some(OptionLabel::C));
}

#[test]
fn invalid_records_do_not_claim_a_question() {
    // Arrange: the first two records for question 2 are unusable
    let detections = vec![
        RawDetection {
            question: json!(2),
            option: json!("A"),
            marked: json!(0),
        },
        RawDetection {
            question: json!(2),
            option: json!(""),
            marked: json!(1),
        },
        RawDetection {
            question: json!("two"),
            option: json!("B"),
            marked: json!(1),
        },
        mark(2, "D"),
    ];

    // Act
    let answers = scoring::build_answer_map(&detections);

    // Assert
    assert_eq!(answers.iter().collect::<Vec<_>>(), vec![(2, OptionLabel::D)]);
}

#[test]
fn accuracy_has_one_decimal() {
    let questions = answer_key(3);
    let detections = vec![mark(1, "B"), mark(2, "B"), mark(3, "C")];

    let rows = scoring::score(&questions, &scoring::build_answer_map(&detections));

    assert_eq!(scoring::summarize(&rows).accuracy, "66.7");
    assert_eq!(scoring::summarize(&[]).accuracy, "0");
}

#[test]
fn pagination_splits_rows_in_order() {
    // Arrange
    let questions = answer_key(100);
    let detections: Vec<RawDetection> = (1..=100)
        .filter(|q| q % 3 != 0)
        .map(|q| mark(q, if q % 2 == 0 { "B" } else { "A" }))
        .collect();
    let rows = scoring::score(&questions, &scoring::build_answer_map(&detections));

    // Act
    let pages = scoring::paginate(&rows, 45);

    // Assert
    let sizes: Vec<usize> = pages.iter().map(|p| p.questions.len()).collect();
    assert_eq!(sizes, vec![45, 45, 10]);
    for (index, page) in pages.iter().enumerate() {
        assert_eq!(page.page, index + 1);
        assert_eq!(page.correct + page.incorrect + page.unanswered, page.max_score);
        assert_eq!(page.score, page.correct);
    }
    assert_eq!(pages[1].questions[0].question, 46);
    assert_eq!(pages[2].questions.last().map(|r| r.question), Some(100));
}

#[test]
fn pagination_of_nothing_is_empty() {
    let rows: Vec<ComparisonRow> = Vec::new();
    assert!(scoring::paginate(&rows, 45).is_empty());
}

#[test]
fn scoring_is_deterministic() {
    let questions = answer_key(30);
    let detections: Vec<RawDetection> = (1..=30).map(|q| mark(q, "B")).collect();

    let first = scoring::compare(&detections, &questions, 7);
    let second = scoring::compare(&detections, &questions, 7);

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn capital_cities_example() {
    // Arrange
    let questions = vec![
        question(&["Paris", "Rome", "Berlin", "Madrid"], "Paris"),
        question(&["2", "3", "4", "5"], "4"),
    ];
    let detections = vec![mark(1, "A"), mark(2, "B")];

    // Act
    let result = scoring::compare(&detections, &questions, 45);

    // Assert
    let rows = &result.pages[0].questions;
    assert_eq!(rows[0].status, AnswerStatus::Correct);
    assert_eq!(rows[1].status, AnswerStatus::Incorrect);
    assert_eq!(rows[1].correct_answer, Some(OptionLabel::C));
    assert_eq!(result.correct_answers, 1);
    assert_eq!(result.incorrect_answers, 1);
    assert_eq!(result.unanswered_questions, 0);
    assert_eq!(result.accuracy, "50.0");
    assert_eq!(result.total_score, 1);
    assert_eq!(result.max_score, 2);
}

#[test]
fn result_keeps_its_json_field_names() {
    let result = scoring::compare(&[mark(1, "A")], &answer_key(1), 45);

    let value = serde_json::to_value(&result).unwrap();
    let object = value.as_object().unwrap();

    for key in [
        "totalScore",
        "maxScore",
        "totalQuestions",
        "correctAnswers",
        "incorrectAnswers",
        "unansweredQuestions",
        "accuracy",
        "pages",
    ] {
        assert!(object.contains_key(key), "missing {}", key);
    }
    assert_eq!(value["pages"][0]["maxScore"], 1);
    assert_eq!(value["pages"][0]["questions"][0]["questionText"], "Pick x");
}

#[test]
fn detection_envelope_is_unwrapped() {
    let payload = json!({
        "success": true,
        "results": [
            { "question": 1, "option": "A", "marked": 1 },
            "garbage",
            { "question": 2, "option": "B", "marked": 0 }
        ]
    });

    let detections = scoring::parse_detections(&payload).unwrap();

    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0], mark(1, "A"));
}

#[test]
fn bare_detection_list_is_accepted() {
    let payload = json!([{ "question": 3, "option": "D", "marked": 1 }]);

    let detections = scoring::parse_detections(&payload).unwrap();

    assert_eq!(detections, vec![mark(3, "D")]);
}

#[test]
fn structural_detection_errors_are_rejected() {
    for payload in [
        json!({ "success": false, "message": "Sheet not aligned" }),
        json!({ "success": true }),
        json!({ "success": true, "results": { "question": 1 } }),
        json!("results"),
        json!(null),
    ] {
        assert!(
            matches!(scoring::parse_detections(&payload), Err(AppError::InvalidInput(_))),
            "accepted {}",
            payload
        );
    }
}

#[test]
fn failed_envelope_reports_service_message() {
    let payload = json!({ "success": false, "message": "Sheet not aligned" });

    match scoring::parse_detections(&payload) {
        Err(AppError::InvalidInput(msg)) => assert_eq!(msg, "Sheet not aligned"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn answer_key_must_be_a_list() {
    assert!(matches!(
        scoring::parse_questions(&json!({ "question_text": "?" })),
        Err(AppError::InvalidInput(_))
    ));

    // A malformed entry keeps its slot so numbering does not shift
    let questions = scoring::parse_questions(&json!([
        42,
        { "question_text": "2+2", "options": ["3", "4", "5", "6"], "correctanswer": "4" }
    ]))
    .unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0], ReferenceQuestion::default());
    assert_eq!(questions[1].correct_label(), Some(OptionLabel::B));
}

#[test]
fn null_question_text_keeps_the_answer_key() {
    // Arrange
    let questions = scoring::parse_questions(&json!([{
        "question_text": null,
        "options": ["Paris", "Rome", "Berlin", "Madrid"],
        "correctanswer": "Paris"
    }]))
    .unwrap();
    let detections = scoring::parse_detections(&json!([
        { "question": 1, "option": "A", "marked": 1 }
    ]))
    .unwrap();

    // Act
    let result = scoring::compare(&detections, &questions, 45);

    // Assert
    let row = &result.pages[0].questions[0];
    assert_eq!(row.question_text, "");
    assert_eq!(row.correct_answer, Some(OptionLabel::A));
    assert_eq!(row.status, AnswerStatus::Correct);
    assert_eq!(result.accuracy, "100.0");
}
