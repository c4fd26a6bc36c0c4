use crate::{Identity, JobId, JobPhase, Session};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobView {
    pub phase: JobPhase,
    pub file_name: Option<String>,
    pub job_id: Option<JobId>,
    pub progress: u8,
    pub dominant_emotion: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub identity: Option<Identity>,
}

impl SessionView {
    pub fn of(session: &Session) -> Self {
        Self {
            identity: session.identity().cloned(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}
