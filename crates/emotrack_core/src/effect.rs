use crate::{ChatUpload, JobId};

/// Side effects requested by [`crate::update`]; executed by the client driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the chosen file to the job-creation endpoint.
    SubmitUpload { upload: ChatUpload },
    /// Query the status of `job_id` once, after `delay`.
    PollStatus { job_id: JobId, delay: PollDelay },
    /// Abandon any submission or poll still outstanding for the previous job.
    CancelPolling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDelay {
    /// First poll right after the job was created.
    Immediately,
    /// Every later poll waits one configured interval.
    AfterInterval,
}
