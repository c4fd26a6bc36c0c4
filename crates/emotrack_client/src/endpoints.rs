//! Typed wrappers for the dashboard endpoints. Their payloads belong to the
//! backend, so responses are returned as raw JSON.
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use emotrack_core::{ChatUpload, JobId, StatusReport};

use crate::{ApiClient, ClientError};

/// Query for `GET /support-insights/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportInsightsQuery {
    pub days: u32,
    pub include_nearby: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl Default for SupportInsightsQuery {
    fn default() -> Self {
        Self {
            days: 14,
            include_nearby: false,
            lat: None,
            lon: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobCreated {
    job_id: String,
}

impl ApiClient {
    async fn get_value(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let request = self.transport().get(path)?.query(query);
        self.send_json(request).await
    }

    async fn post_value(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let request = self.transport().post(path)?.json(body);
        self.send_json(request).await
    }

    pub async fn predict(&self, text: &str) -> Result<Value, ClientError> {
        self.post_value("/predict", &json!({ "text": text })).await
    }

    pub async fn timeline(&self, range: &str) -> Result<Value, ClientError> {
        self.get_value("/visualization/timeline", &[("range", range.to_string())])
            .await
    }

    pub async fn distribution(&self) -> Result<Value, ClientError> {
        self.get_value("/visualization/distribution", &[]).await
    }

    pub async fn drift(&self) -> Result<Value, ClientError> {
        self.get_value("/drift", &[]).await
    }

    pub async fn alerts(&self) -> Result<Value, ClientError> {
        self.get_value("/alerts", &[]).await
    }

    pub async fn compare(&self, range: &str) -> Result<Value, ClientError> {
        self.get_value("/compare", &[("range", range.to_string())])
            .await
    }

    pub async fn generate_report(&self, request: &Value) -> Result<Value, ClientError> {
        self.post_value("/reports/generate", request).await
    }

    /// Uploads one webcam frame, already base64-encoded by the capture side.
    pub async fn capture_self_emotion(&self, base64_image: &str) -> Result<Value, ClientError> {
        self.post_value("/self-emotion/capture", &json!({ "image": base64_image }))
            .await
    }

    pub async fn self_emotion_history(&self, range: &str) -> Result<Value, ClientError> {
        self.get_value("/self-emotion/history", &[("range", range.to_string())])
            .await
    }

    pub async fn self_emotion_distribution(&self, range: &str) -> Result<Value, ClientError> {
        self.get_value("/self-emotion/distribution", &[("range", range.to_string())])
            .await
    }

    pub async fn fusion(&self, range_days: u32) -> Result<Value, ClientError> {
        self.get_value("/analysis/fusion", &[("range_days", range_days.to_string())])
            .await
    }

    pub async fn support_insights(
        &self,
        query: &SupportInsightsQuery,
    ) -> Result<Value, ClientError> {
        let request = self.transport().get("/support-insights/")?.query(query);
        self.send_json(request).await
    }

    /// `POST /analyze/chat`: creates an analysis job for a chat archive.
    pub async fn submit_chat(&self, upload: ChatUpload) -> Result<JobId, ClientError> {
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part("file", part);
        let request = self.transport().post("/analyze/chat")?.multipart(form);
        let created: JobCreated = self.send_json(request).await?;
        Ok(created.job_id)
    }

    /// `GET /analyze/chat/status/{job_id}`.
    pub async fn chat_status(&self, job_id: &str) -> Result<StatusReport, ClientError> {
        let url = self
            .transport()
            .url_with_segment("/analyze/chat/status", Some(job_id))?;
        let request = self.transport().request(Method::GET, url);
        self.send_json(request).await
    }
}
