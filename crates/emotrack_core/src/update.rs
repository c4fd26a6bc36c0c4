use crate::{
    Effect, JobState, JobStatus, Msg, PollDelay, FALLBACK_ANALYSIS_FAILED, FALLBACK_STATUS_FAILED,
    FALLBACK_SUBMIT_FAILED,
};

/// Pure update function: applies a message to job state and returns any effects.
///
/// Every poll response that keeps the job running yields exactly one new
/// `PollStatus` effect, so polls stay strictly sequential.
pub fn update(mut state: JobState, msg: Msg) -> (JobState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileChosen(upload) => {
            let was_busy = state.phase().is_busy();
            state.choose_file(upload);
            if was_busy {
                vec![Effect::CancelPolling]
            } else {
                Vec::new()
            }
        }
        Msg::SubmitClicked => {
            if state.phase().is_busy() {
                return (state, Vec::new());
            }
            let Some(upload) = state.upload().cloned() else {
                return (state, Vec::new());
            };
            state.begin_submit();
            vec![Effect::SubmitUpload { upload }]
        }
        Msg::Submitted { job_id } => {
            if state.phase() != crate::JobPhase::Submitting {
                return (state, Vec::new());
            }
            state.begin_polling(job_id.clone());
            vec![Effect::PollStatus {
                job_id,
                delay: PollDelay::Immediately,
            }]
        }
        Msg::SubmitFailed { detail } => {
            if state.phase() == crate::JobPhase::Submitting {
                state.fail(non_blank(detail).unwrap_or_else(|| FALLBACK_SUBMIT_FAILED.into()));
            }
            Vec::new()
        }
        Msg::StatusReceived { job_id, report } => {
            if !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            match report.status {
                JobStatus::Completed => {
                    state.complete(report.result.unwrap_or_default());
                    Vec::new()
                }
                JobStatus::Failed => {
                    state.fail(
                        non_blank(report.error)
                            .unwrap_or_else(|| FALLBACK_ANALYSIS_FAILED.into()),
                    );
                    Vec::new()
                }
                JobStatus::Queued
                | JobStatus::Pending
                | JobStatus::Processing
                | JobStatus::Unknown => {
                    state.advance_progress(report.progress);
                    vec![Effect::PollStatus {
                        job_id,
                        delay: PollDelay::AfterInterval,
                    }]
                }
            }
        }
        Msg::PollFailed { job_id, detail } => {
            if state.is_current_job(&job_id) {
                state.fail(non_blank(detail).unwrap_or_else(|| FALLBACK_STATUS_FAILED.into()));
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn non_blank(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}
