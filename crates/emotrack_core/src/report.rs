use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Job status as reported by `GET /analyze/chat/status/{job_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One status poll response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Payload of a completed chat analysis.
///
/// Only the fields the client presents are typed; anything else the server
/// adds is kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub total_lines_analyzed: Option<u64>,
    #[serde(default)]
    pub dominant_emotion: String,
    #[serde(default)]
    pub last_message_emotion: Option<String>,
    /// Share of each emotion among analyzed lines, 0.0..=1.0.
    #[serde(default)]
    pub distribution: BTreeMap<String, f64>,
    #[serde(default)]
    pub advice: Option<Advice>,
    #[serde(default)]
    pub recent_context: Vec<ContextLine>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Advice {
    #[serde(default)]
    pub strategy_title: String,
    #[serde(default)]
    pub strategy_content: String,
    #[serde(default)]
    pub suggested_tone: String,
    #[serde(default)]
    pub reply_tip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    pub text: String,
    pub emotion: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_queued_status_and_unknown_values_parse() {
        let queued: StatusReport =
            serde_json::from_str(r#"{"job_id":"j","status":"queued","progress":0}"#).unwrap();
        assert_eq!(queued.status, JobStatus::Queued);
        assert_eq!(queued.progress, Some(0));

        let odd: StatusReport = serde_json::from_str(r#"{"status":"warming_up"}"#).unwrap();
        assert_eq!(odd.status, JobStatus::Unknown);
        assert!(!odd.status.is_terminal());
    }

    #[test]
    fn completed_result_keeps_unknown_fields() {
        let body = r#"{
            "status": "completed",
            "progress": 100,
            "result": {
                "total_lines_analyzed": 12,
                "dominant_emotion": "happy",
                "last_message_emotion": "neutral",
                "distribution": {"happy": 0.75, "neutral": 0.25},
                "advice": {"strategy_title": "Match energy", "reply_tip": "Keep it light"},
                "recent_context": [{"text": "hi!", "emotion": "happy"}],
                "model_version": "v2"
            },
            "error": null
        }"#;
        let report: StatusReport = serde_json::from_str(body).unwrap();
        let result = report.result.unwrap();
        assert_eq!(result.dominant_emotion, "happy");
        assert_eq!(result.distribution["happy"], 0.75);
        assert_eq!(result.advice.unwrap().reply_tip, "Keep it light");
        assert_eq!(result.extra["model_version"], serde_json::json!("v2"));
    }
}
