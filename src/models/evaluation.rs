// src/models/evaluation.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::detection::{OptionLabel, label_or_na};
use crate::config::MAX_PAGE_SIZE;

/// Verdict for a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    Unanswered,
}

/// One line of the breakdown: the answer key next to what the sheet shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub question: usize,
    pub question_text: String,
    #[serde(with = "label_or_na")]
    pub correct_answer: Option<OptionLabel>,
    pub correct_text: String,
    #[serde(with = "label_or_na")]
    pub student_answer: Option<OptionLabel>,
    pub status: AnswerStatus,
}

/// Per-status counts over a slice of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTally {
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
}

impl StatusTally {
    pub fn from_rows(rows: &[ComparisonRow]) -> Self {
        rows.iter().fold(Self::default(), |mut tally, row| {
            match row.status {
                AnswerStatus::Correct => tally.correct += 1,
                AnswerStatus::Incorrect => tally.incorrect += 1,
                AnswerStatus::Unanswered => tally.unanswered += 1,
            }
            tally
        })
    }
}

/// A display page of the breakdown. Each correct answer is worth one point here;
/// mark weighting belongs to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page: usize,
    pub questions: Vec<ComparisonRow>,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub score: usize,
    pub max_score: usize,
}

/// Totals across every row of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub unanswered_questions: usize,
    /// Percentage with one decimal, or `"0"` when there are no questions.
    pub accuracy: String,
}

/// Final output of a comparison. Field names are consumed by the front-end
/// and the results API and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub total_score: usize,
    pub max_score: usize,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub unanswered_questions: usize,
    pub accuracy: String,
    pub pages: Vec<Page>,
}

/// DTO for scoring detections that were already fetched from the OMR service.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    /// Either the OMR service envelope `{ success, results }` or a bare list of records.
    #[serde(default)]
    pub detections: Value,

    /// The answer key, in question order.
    #[serde(default)]
    pub questions: Value,

    #[validate(range(min = 1, max = MAX_PAGE_SIZE))]
    pub page_size: Option<usize>,
}

/// Body POSTed to the main platform API once a sheet has been scored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub student_id: String,
    pub test_id: String,
    /// Payload returned by the QR service for this sheet.
    pub sheet: Value,
    #[serde(flatten)]
    pub result: ComparisonResult,
}

/// Response of the full upload-and-evaluate flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub qr: Value,
    pub saved: bool,
    #[serde(flatten)]
    pub result: ComparisonResult,
}
