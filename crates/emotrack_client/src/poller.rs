use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use client_logging::{client_debug, client_info, client_trace, client_warn};
use emotrack_core::{update, ChatUpload, Effect, JobId, JobState, Msg, PollDelay, StatusReport};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{ApiClient, ClientError};

/// The two job endpoints the poller needs.
#[async_trait::async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn submit_chat(&self, upload: ChatUpload) -> Result<JobId, ClientError>;
    async fn chat_status(&self, job_id: &str) -> Result<StatusReport, ClientError>;
}

#[async_trait::async_trait]
impl AnalysisApi for ApiClient {
    async fn submit_chat(&self, upload: ChatUpload) -> Result<JobId, ClientError> {
        ApiClient::submit_chat(self, upload).await
    }

    async fn chat_status(&self, job_id: &str) -> Result<StatusReport, ClientError> {
        ApiClient::chat_status(self, job_id).await
    }
}

/// Drives one analysis job at a time from submission to a terminal state.
///
/// Job state lives in a watch channel; the background driver is the only
/// writer while a job runs, and it stops writing as soon as it is cancelled.
/// Dropping the poller tears the driver down.
pub struct JobPoller {
    api: Arc<dyn AnalysisApi>,
    interval: Duration,
    state: Arc<watch::Sender<JobState>>,
    driver: Option<Driver>,
}

struct Driver {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for JobPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPoller")
            .field("interval", &self.interval)
            .field("phase", &self.state.borrow().phase())
            .field("driving", &self.driver.is_some())
            .finish()
    }
}

impl JobPoller {
    pub fn new(api: Arc<dyn AnalysisApi>, interval: Duration) -> Self {
        let (state, _) = watch::channel(JobState::new());
        Self {
            api,
            interval,
            state: Arc::new(state),
            driver: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    /// Selects a new input. A job still running for the previous input is
    /// abandoned and its driver cancelled.
    pub fn choose_file(&mut self, upload: ChatUpload) {
        // Any driver left over belongs to a previous job.
        self.teardown();
        let effects = self.dispatch(Msg::FileChosen(upload));
        if effects.contains(&Effect::CancelPolling) {
            client_info!("Discarded running analysis job for new input");
        }
    }

    /// Starts analysis of the chosen file. Returns `false` when there is no
    /// file or a job is already running.
    pub fn submit(&mut self) -> bool {
        let effects = self.dispatch(Msg::SubmitClicked);
        let Some(first) = effects.into_iter().next() else {
            return false;
        };
        self.teardown();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(drive(
            self.api.clone(),
            self.interval,
            self.state.clone(),
            cancel.clone(),
            first,
        ));
        self.driver = Some(Driver { cancel, handle });
        true
    }

    /// Cancels the driver. No state change happens after this returns.
    pub fn teardown(&mut self) {
        if let Some(driver) = self.driver.take() {
            // Cancel under the channel lock so a driver write in progress
            // finishes first and every later one sees the cancellation.
            self.state.send_if_modified(|_| {
                driver.cancel.cancel();
                false
            });
            driver.handle.abort();
            client_debug!("Job poller driver cancelled");
        }
    }

    /// Waits until the current job is no longer submitting or polling.
    pub async fn settled(&self) -> JobState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|state| !state.phase().is_busy()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.state.send_modify(|state| {
            let (next, out) = update(std::mem::take(state), msg);
            *state = next;
            effects = out;
        });
        effects
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Executes effects one at a time; a poll is only issued after the previous
/// response has been applied.
async fn drive(
    api: Arc<dyn AnalysisApi>,
    interval: Duration,
    state: Arc<watch::Sender<JobState>>,
    cancel: CancellationToken,
    first: Effect,
) {
    let mut pending = VecDeque::from([first]);
    while let Some(effect) = pending.pop_front() {
        let msg = match effect {
            Effect::SubmitUpload { upload } => {
                let file_name = upload.file_name.clone();
                let result = tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = api.submit_chat(upload) => result,
                };
                match result {
                    Ok(job_id) => {
                        client_info!("Submitted {} as job {}", file_name, job_id);
                        Msg::Submitted { job_id }
                    }
                    Err(err) => {
                        client_warn!("Submitting {} failed: {}", file_name, err);
                        Msg::SubmitFailed {
                            detail: err.server_detail().map(ToOwned::to_owned),
                        }
                    }
                }
            }
            Effect::PollStatus { job_id, delay } => {
                if delay == PollDelay::AfterInterval {
                    client_trace!("Waiting {:?} before polling job {}", interval, job_id);
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                let result = tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = api.chat_status(&job_id) => result,
                };
                match result {
                    Ok(report) => {
                        client_debug!(
                            "Job {} status {:?} progress {:?}",
                            job_id,
                            report.status,
                            report.progress
                        );
                        Msg::StatusReceived { job_id, report }
                    }
                    Err(err) => {
                        client_warn!("Polling job {} failed: {}", job_id, err);
                        let detail = err
                            .server_detail()
                            .map(ToOwned::to_owned)
                            .unwrap_or_else(|| err.to_string());
                        Msg::PollFailed {
                            job_id,
                            detail: Some(detail),
                        }
                    }
                }
            }
            Effect::CancelPolling => continue,
        };

        let mut next = Vec::new();
        let applied = state.send_if_modified(|current| {
            if cancel.is_cancelled() {
                return false;
            }
            let (updated, effects) = update(std::mem::take(current), msg);
            *current = updated;
            next = effects;
            true
        });
        if !applied {
            return;
        }
        pending.extend(next);
    }

    let final_state = state.borrow();
    client_info!(
        "Analysis job {:?} settled in {:?}",
        final_state.job_id(),
        final_state.phase()
    );
}
