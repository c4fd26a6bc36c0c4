//! emotrack core: pure session and analysis-job state machines plus view-model helpers.
mod effect;
mod msg;
mod report;
mod session;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, PollDelay};
pub use msg::Msg;
pub use report::{Advice, AnalysisResult, ContextLine, JobStatus, StatusReport};
pub use session::{Credential, Epoch, Identity, PersistedSession, Session, SessionState};
pub use state::{
    ChatUpload, JobId, JobPhase, JobState, FALLBACK_ANALYSIS_FAILED, FALLBACK_STATUS_FAILED,
    FALLBACK_SUBMIT_FAILED, MIN_VISIBLE_PROGRESS,
};
pub use update::update;
pub use view_model::{JobView, SessionView};
