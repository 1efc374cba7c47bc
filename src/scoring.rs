// src/scoring.rs

//! Scores bubble detections from a scanned answer sheet against a test's answer key.
//!
//! Everything here is pure and synchronous. Problems with individual detection
//! records or answer-key entries are logged and absorbed into the output
//! (`unanswered` rows, `N/A` labels); only a payload that is not a collection
//! at all is reported as an error.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{
    error::AppError,
    models::{
        detection::{DetectionRecord, OptionLabel, RawDetection},
        evaluation::{AnswerStatus, ComparisonResult, ComparisonRow, Page, StatusTally, Summary},
        question::ReferenceQuestion,
    },
};

/// The single option judged marked for each question that has one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerMap(BTreeMap<usize, OptionLabel>);

impl AnswerMap {
    pub fn get(&self, question: usize) -> Option<OptionLabel> {
        self.0.get(&question).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, OptionLabel)> + '_ {
        self.0.iter().map(|(q, label)| (*q, *label))
    }
}

/// Extracts detection records from an OMR service response.
///
/// Accepts the service envelope `{ "success": true, "results": [...] }` or a bare
/// array of records. Array elements that are not objects are skipped.
pub fn parse_detections(payload: &Value) -> Result<Vec<RawDetection>, AppError> {
    let records = match payload {
        Value::Array(items) => items,
        Value::Object(envelope) => {
            if envelope.get("success").and_then(Value::as_bool) != Some(true) {
                let reason = envelope
                    .get("message")
                    .or_else(|| envelope.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or("OMR processing was not successful");
                return Err(AppError::InvalidInput(reason.to_string()));
            }
            match envelope.get("results") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(AppError::InvalidInput(
                        "OMR response does not contain a results list".to_string(),
                    ));
                }
            }
        }
        _ => {
            return Err(AppError::InvalidInput(
                "Detection payload must be an object or a list".to_string(),
            ));
        }
    };

    Ok(records
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(_) => match serde_json::from_value(item.clone()) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    tracing::warn!("Skipping detection #{}: {}", index, e);
                    None
                }
            },
            _ => {
                tracing::warn!("Skipping detection #{}: not an object", index);
                None
            }
        })
        .collect())
}

/// Extracts the answer key. Entries that are not well-formed objects become
/// empty questions so that question numbering is preserved.
pub fn parse_questions(payload: &Value) -> Result<Vec<ReferenceQuestion>, AppError> {
    let Value::Array(items) = payload else {
        return Err(AppError::InvalidInput(
            "Reference questions must be a list".to_string(),
        ));
    };

    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item.clone()).unwrap_or_else(|e| {
                tracing::warn!("Reference question {} is malformed: {}", index + 1, e);
                ReferenceQuestion::default()
            })
        })
        .collect())
}

/// Reduces raw detections to one marked option per question.
///
/// Invalid or unmarked records are skipped. When several valid records name the
/// same question the first one wins; the recognizer may report more than one
/// candidate bubble per box.
pub fn build_answer_map(detections: &[RawDetection]) -> AnswerMap {
    let mut answers = BTreeMap::new();

    for (index, raw) in detections.iter().enumerate() {
        let record = match DetectionRecord::try_from(raw) {
            Ok(record) => record,
            Err(issue) => {
                tracing::warn!("Skipping detection #{}: {}", index, issue);
                continue;
            }
        };

        if let Some(kept) = answers.get(&record.question) {
            tracing::debug!(
                "Question {} already marked {}, ignoring {}",
                record.question,
                kept,
                record.option
            );
            continue;
        }
        answers.insert(record.question, record.option);
    }

    AnswerMap(answers)
}

/// Produces one row per reference question, in answer-key order.
pub fn score(questions: &[ReferenceQuestion], answers: &AnswerMap) -> Vec<ComparisonRow> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let number = index + 1;
            let correct_answer = question.correct_label();
            if correct_answer.is_none() {
                tracing::warn!(
                    "Question {}: correct answer '{}' matches none of its options",
                    number,
                    question.correctanswer.trim()
                );
            }

            let student_answer = answers.get(number);
            let status = match student_answer {
                None => AnswerStatus::Unanswered,
                Some(label) if Some(label) == correct_answer => AnswerStatus::Correct,
                Some(_) => AnswerStatus::Incorrect,
            };

            ComparisonRow {
                question: number,
                question_text: question.question_text.clone(),
                correct_answer,
                correct_text: question.correctanswer.trim().to_string(),
                student_answer,
                status,
            }
        })
        .collect()
}

/// Splits rows into consecutive pages of `page_size`; the last page may be shorter.
/// A `page_size` of zero is treated as one.
pub fn paginate(rows: &[ComparisonRow], page_size: usize) -> Vec<Page> {
    rows.chunks(page_size.max(1))
        .enumerate()
        .map(|(index, chunk)| {
            let tally = StatusTally::from_rows(chunk);
            Page {
                page: index + 1,
                questions: chunk.to_vec(),
                correct: tally.correct,
                incorrect: tally.incorrect,
                unanswered: tally.unanswered,
                score: tally.correct,
                max_score: chunk.len(),
            }
        })
        .collect()
}

pub fn summarize(rows: &[ComparisonRow]) -> Summary {
    let tally = StatusTally::from_rows(rows);
    Summary {
        total_questions: rows.len(),
        correct_answers: tally.correct,
        incorrect_answers: tally.incorrect,
        unanswered_questions: tally.unanswered,
        accuracy: format_accuracy(tally.correct, rows.len()),
    }
}

/// Runs the whole pipeline: answer map, rows, pages and totals.
pub fn compare(
    detections: &[RawDetection],
    questions: &[ReferenceQuestion],
    page_size: usize,
) -> ComparisonResult {
    let answers = build_answer_map(detections);
    let rows = score(questions, &answers);
    let summary = summarize(&rows);
    let pages = paginate(&rows, page_size);

    tracing::debug!(
        "Scored {} questions from {} detections ({} usable): {} correct",
        summary.total_questions,
        detections.len(),
        answers.len(),
        summary.correct_answers
    );

    ComparisonResult {
        total_score: pages.iter().map(|p| p.score).sum(),
        max_score: pages.iter().map(|p| p.max_score).sum(),
        total_questions: summary.total_questions,
        correct_answers: summary.correct_answers,
        incorrect_answers: summary.incorrect_answers,
        unanswered_questions: summary.unanswered_questions,
        accuracy: summary.accuracy,
        pages,
    }
}

/// One decimal, halves rounded up; `"0"` for an empty answer key.
fn format_accuracy(correct: usize, total: usize) -> String {
    if total == 0 {
        return "0".to_string();
    }
    // Tenths of a percent, computed in integers so ties round the same way everywhere.
    let tenths = (correct as u128 * 2000 + total as u128) / (total as u128 * 2);
    format!("{}.{}", tenths / 10, tenths % 10)
}
