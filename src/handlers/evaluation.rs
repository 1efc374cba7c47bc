// src/handlers/evaluation.rs

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use serde_json::Value;
use validator::Validate;

use crate::{
    clients::recognition::SheetUpload,
    config::{Config, MAX_PAGE_SIZE},
    error::AppError,
    models::evaluation::{CompareRequest, EvaluationRecord, EvaluationResponse},
    scoring,
    state::AppState,
};

/// Fields collected from the evaluate multipart form.
#[derive(Debug, Default)]
struct EvaluateForm {
    sheet: Option<SheetUpload>,
    questions: Option<Value>,
    page_size: Option<usize>,
    student_id: Option<String>,
    test_id: Option<String>,
}

impl EvaluateForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = EvaluateForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "sheet" => {
                    let file_name = field.file_name().unwrap_or("sheet").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    form.sheet = Some(SheetUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                "questions" => {
                    let text = field.text().await?;
                    let parsed = serde_json::from_str(&text).map_err(|e| {
                        AppError::BadRequest(format!("Reference questions are not valid JSON: {}", e))
                    })?;
                    form.questions = Some(parsed);
                }
                "pageSize" => {
                    let text = field.text().await?;
                    let size = text
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| AppError::BadRequest(format!("Invalid pageSize '{}'", text)))?;
                    form.page_size = Some(size);
                }
                "studentId" => form.student_id = non_empty(field.text().await?),
                "testId" => form.test_id = non_empty(field.text().await?),
                other => tracing::debug!("Ignoring unexpected form field '{}'", other),
            }
        }

        Ok(form)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn resolve_page_size(requested: Option<usize>, config: &Config) -> Result<usize, AppError> {
    match requested {
        None => Ok(config.page_size),
        Some(size) if (1..=MAX_PAGE_SIZE).contains(&size) => Ok(size),
        Some(size) => Err(AppError::BadRequest(format!(
            "pageSize must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, size
        ))),
    }
}

/// Scores detections the caller already obtained from the OMR service.
///
/// * `detections`: OMR service envelope or a bare list of records.
/// * `questions`: answer key in question order.
/// * `pageSize`: optional, defaults to the configured page size.
pub async fn compare_results(
    State(config): State<Config>,
    Json(req): Json<CompareRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let detections = scoring::parse_detections(&req.detections)?;
    let questions = scoring::parse_questions(&req.questions)?;
    let page_size = resolve_page_size(req.page_size, &config)?;

    let result = scoring::compare(&detections, &questions, page_size);
    tracing::info!(
        "Compared {} detections against {} questions: accuracy {}%",
        detections.len(),
        questions.len(),
        result.accuracy
    );

    Ok(Json(result))
}

/// Evaluates an uploaded answer sheet end to end.
///
/// * Validates the sheet's QR code; the OMR service is only called if that succeeds.
/// * Scores the OMR detections against the submitted answer key.
/// * Persists the result when a results API is configured and both
///   `studentId` and `testId` were given. A failed save is logged and
///   reported as `saved: false`.
pub async fn evaluate_sheet(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = EvaluateForm::read(multipart).await?;

    let sheet = form
        .sheet
        .ok_or_else(|| AppError::BadRequest("Missing 'sheet' file".to_string()))?;
    let questions_payload = form
        .questions
        .ok_or_else(|| AppError::BadRequest("Missing 'questions' field".to_string()))?;
    let questions = scoring::parse_questions(&questions_payload)?;
    let page_size = resolve_page_size(form.page_size, &state.config)?;

    tracing::info!(
        "Evaluating sheet '{}' ({} bytes) against {} questions",
        sheet.file_name,
        sheet.bytes.len(),
        questions.len()
    );

    let qr = state.recognition.scan_qr(&sheet).await?;
    if !qr.success {
        let reason = qr
            .message
            .unwrap_or_else(|| "QR code could not be validated".to_string());
        tracing::warn!("QR validation failed for '{}': {}", sheet.file_name, reason);
        return Err(AppError::InvalidInput(reason));
    }

    let payload = state.recognition.detect_marks(&sheet).await?;
    let detections = scoring::parse_detections(&payload)?;
    let result = scoring::compare(&detections, &questions, page_size);

    let saved = match (&state.results_api, form.student_id, form.test_id) {
        (Some(api), Some(student_id), Some(test_id)) => {
            let record = EvaluationRecord {
                student_id,
                test_id,
                sheet: qr.data.clone(),
                result: result.clone(),
            };
            match api.save(&record).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Failed to save evaluation: {}", e);
                    false
                }
            }
        }
        _ => false,
    };

    Ok(Json(EvaluationResponse {
        qr: qr.data,
        saved,
        result,
    }))
}
