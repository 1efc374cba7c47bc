// src/clients/recognition.rs

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::AppError;

/// A scanned answer sheet received from the uploader.
#[derive(Debug, Clone)]
pub struct SheetUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Response of the QR service for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QrScan {
    #[serde(default)]
    pub success: bool,

    /// Whatever the QR code decodes to (sheet / test identifiers).
    #[serde(default)]
    pub data: Value,

    #[serde(default)]
    pub message: Option<String>,
}

/// The two image-recognition collaborators an evaluation depends on.
#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Validates the QR code printed on the sheet.
    async fn scan_qr(&self, sheet: &SheetUpload) -> Result<QrScan, AppError>;

    /// Returns the raw OMR service response (`{ success, results }`).
    async fn detect_marks(&self, sheet: &SheetUpload) -> Result<Value, AppError>;
}

/// Talks to the QR and OMR microservices over HTTP.
#[derive(Clone)]
pub struct HttpRecognitionService {
    client: reqwest::Client,
    qr_url: Url,
    omr_url: Url,
}

impl HttpRecognitionService {
    pub fn new(client: reqwest::Client, qr_url: Url, omr_url: Url) -> Self {
        Self {
            client,
            qr_url,
            omr_url,
        }
    }

    async fn post_sheet(&self, url: &Url, service: &str, sheet: &SheetUpload) -> Result<Value, AppError> {
        let part = Part::bytes(sheet.bytes.to_vec())
            .file_name(sheet.file_name.clone())
            .mime_str(&sheet.content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid sheet content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("{} service unreachable: {:?}", service, e);
                AppError::Upstream(format!("{} service unreachable", service))
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "{} service returned status: {}",
                service,
                response.status()
            )));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl RecognitionService for HttpRecognitionService {
    async fn scan_qr(&self, sheet: &SheetUpload) -> Result<QrScan, AppError> {
        let body = self.post_sheet(&self.qr_url, "QR", sheet).await?;
        serde_json::from_value(body)
            .map_err(|e| AppError::Upstream(format!("Unexpected QR service response: {}", e)))
    }

    async fn detect_marks(&self, sheet: &SheetUpload) -> Result<Value, AppError> {
        self.post_sheet(&self.omr_url, "OMR", sheet).await
    }
}
