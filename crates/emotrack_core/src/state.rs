use std::fmt;

use crate::view_model::JobView;
use crate::AnalysisResult;

/// Server-assigned job identifier, kept opaque.
pub type JobId = String;

/// Progress shown while a job runs but the server has not reported any.
pub const MIN_VISIBLE_PROGRESS: u8 = 10;
pub const FALLBACK_SUBMIT_FAILED: &str = "Failed to start analysis.";
pub const FALLBACK_STATUS_FAILED: &str = "Failed to get status.";
pub const FALLBACK_ANALYSIS_FAILED: &str = "Analysis failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, JobPhase::Submitting | JobPhase::Polling)
    }
}

/// A chat archive chosen by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ChatUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ChatUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for ChatUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobState {
    phase: JobPhase,
    upload: Option<ChatUpload>,
    job_id: Option<JobId>,
    progress: u8,
    result: Option<AnalysisResult>,
    error_message: Option<String>,
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> JobView {
        JobView {
            phase: self.phase,
            file_name: self.upload.as_ref().map(|u| u.file_name.clone()),
            job_id: self.job_id.clone(),
            progress: self.progress,
            dominant_emotion: self
                .result
                .as_ref()
                .map(|result| result.dominant_emotion.clone()),
            error_message: self.error_message.clone(),
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn upload(&self) -> Option<&ChatUpload> {
        self.upload.as_ref()
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub(crate) fn choose_file(&mut self, upload: ChatUpload) {
        *self = Self {
            upload: Some(upload),
            ..Self::default()
        };
    }

    pub(crate) fn begin_submit(&mut self) {
        self.phase = JobPhase::Submitting;
        self.job_id = None;
        self.progress = 0;
        self.result = None;
        self.error_message = None;
    }

    pub(crate) fn begin_polling(&mut self, job_id: JobId) {
        self.phase = JobPhase::Polling;
        self.job_id = Some(job_id);
        self.progress = 0;
    }

    /// Progress never moves backwards while the job runs.
    pub(crate) fn advance_progress(&mut self, reported: Option<i64>) {
        let reported = reported
            .filter(|p| *p > 0)
            .map(|p| p.min(100) as u8)
            .unwrap_or(MIN_VISIBLE_PROGRESS);
        self.progress = self.progress.max(reported);
    }

    pub(crate) fn complete(&mut self, result: AnalysisResult) {
        self.phase = JobPhase::Completed;
        self.progress = 100;
        self.result = Some(result);
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.phase = JobPhase::Failed;
        self.error_message = Some(message);
    }

    pub(crate) fn is_current_job(&self, job_id: &str) -> bool {
        self.phase == JobPhase::Polling && self.job_id.as_deref() == Some(job_id)
    }
}
