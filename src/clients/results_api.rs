// src/clients/results_api.rs

use url::Url;

use crate::{error::AppError, models::evaluation::EvaluationRecord};

/// Stores finished evaluations on the main platform API.
#[derive(Clone)]
pub struct ResultsApi {
    client: reqwest::Client,
    url: Url,
}

impl ResultsApi {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub async fn save(&self, record: &EvaluationRecord) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Results API returned status: {}",
                response.status()
            )));
        }

        tracing::info!(
            "Saved evaluation for student {} on test {}",
            record.student_id,
            record.test_id
        );
        Ok(())
    }
}
