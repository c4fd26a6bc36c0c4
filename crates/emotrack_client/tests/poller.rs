use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use emotrack_client::{
    AnalysisApi, ApiClient, ClientError, ClientSettings, JobPoller, MemoryStore, RouteTracker,
};
use emotrack_core::{
    ChatUpload, JobId, JobPhase, JobStatus, StatusReport, FALLBACK_SUBMIT_FAILED,
    MIN_VISIBLE_PROGRESS,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const INTERVAL: Duration = Duration::from_millis(20);

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(client_logging::initialize_for_tests);
}

fn upload() -> ChatUpload {
    ChatUpload::new("chats.zip", b"PK\x03\x04chat".to_vec())
}

/// Serves the given bodies in order, repeating the last one.
struct Sequence {
    bodies: Vec<serde_json::Value>,
    served: AtomicUsize,
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.served.fetch_add(1, Ordering::SeqCst);
        let body = &self.bodies[n.min(self.bodies.len() - 1)];
        ResponseTemplate::new(200).set_body_json(body)
    }
}

/// Scripted in-memory backend; counts calls.
struct ScriptedApi {
    submit: Result<JobId, ClientError>,
    statuses: Mutex<VecDeque<Result<StatusReport, ClientError>>>,
    polls: AtomicUsize,
}

impl ScriptedApi {
    fn new(statuses: Vec<Result<StatusReport, ClientError>>) -> Self {
        Self {
            submit: Ok("job-1".to_string()),
            statuses: Mutex::new(statuses.into()),
            polls: AtomicUsize::new(0),
        }
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AnalysisApi for ScriptedApi {
    async fn submit_chat(&self, _upload: ChatUpload) -> Result<JobId, ClientError> {
        self.submit.clone()
    }

    async fn chat_status(&self, _job_id: &str) -> Result<StatusReport, ClientError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        match statuses.len() {
            0 => Ok(running(None)),
            1 => statuses.front().cloned().unwrap(),
            _ => statuses.pop_front().unwrap(),
        }
    }
}

fn running(progress: Option<i64>) -> StatusReport {
    StatusReport {
        job_id: None,
        status: JobStatus::Processing,
        progress,
        result: None,
        error: None,
    }
}

#[tokio::test]
async fn pending_pending_completed_polls_exactly_three_times() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-42"})))
        .expect(1)
        .mount(&server)
        .await;
    let result = json!({
        "total_lines_analyzed": 40,
        "dominant_emotion": "sadness",
        "last_message_emotion": "neutral",
        "distribution": {"sadness": 0.5, "neutral": 0.5},
        "advice": {
            "strategy_title": "Offer support",
            "strategy_content": "Listen first.",
            "suggested_tone": "gentle",
            "reply_tip": "Ask how they are."
        },
        "recent_context": [{"text": "meh", "emotion": "neutral"}]
    });
    Mock::given(method("GET"))
        .and(path("/analyze/chat/status/job-42"))
        .respond_with(Sequence {
            bodies: vec![
                json!({"job_id": "job-42", "status": "pending", "progress": 30}),
                json!({"job_id": "job-42", "status": "pending"}),
                json!({"job_id": "job-42", "status": "completed", "progress": 100, "result": result}),
            ],
            served: AtomicUsize::new(0),
        })
        .expect(3)
        .mount(&server)
        .await;

    let client = ApiClient::connect(
        &ClientSettings::with_base_url(server.uri()),
        Arc::new(MemoryStore::new()),
        Arc::new(RouteTracker::default()),
    )
    .unwrap();
    let mut poller = JobPoller::new(Arc::new(client), INTERVAL);

    let observed = Arc::new(Mutex::new(Vec::new()));
    let mut rx = poller.subscribe();
    let sink = observed.clone();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let progress = rx.borrow_and_update().progress();
            sink.lock().unwrap().push(progress);
        }
    });

    poller.choose_file(upload());
    assert!(poller.submit());
    let state = poller.settled().await;

    assert_eq!(state.phase(), JobPhase::Completed);
    assert_eq!(state.job_id(), Some("job-42"));
    assert_eq!(state.progress(), 100);
    let stored = serde_json::to_value(state.result().unwrap()).unwrap();
    assert_eq!(stored, result);

    // Nothing else is scheduled after the terminal state.
    tokio::time::sleep(INTERVAL * 5).await;
    let status_polls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/analyze/chat/status/job-42")
        .count();
    assert_eq!(status_polls, 3);

    drop(poller);
    watcher.await.unwrap();
    let progress = observed.lock().unwrap().clone();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(progress.last(), Some(&100));
}

#[tokio::test]
async fn transport_error_on_second_poll_is_terminal() {
    init_logging();
    let api = Arc::new(ScriptedApi::new(vec![
        Ok(running(Some(25))),
        Err(ClientError::Network("connection reset".to_string())),
        Ok(running(Some(50))),
    ]));
    let mut poller = JobPoller::new(api.clone(), INTERVAL);

    poller.choose_file(upload());
    assert!(poller.submit());
    let state = poller.settled().await;

    assert_eq!(state.phase(), JobPhase::Failed);
    assert_eq!(
        state.error_message(),
        Some("network error: connection reset")
    );
    assert_eq!(state.progress(), 25);

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(api.polls(), 2);
}

#[tokio::test]
async fn server_detail_wins_over_error_text() {
    init_logging();
    let api = Arc::new(ScriptedApi::new(vec![Err(ClientError::Status {
        status: 404,
        detail: Some("Job not found".to_string()),
    })]));
    let mut poller = JobPoller::new(api.clone(), INTERVAL);

    poller.choose_file(upload());
    poller.submit();
    let state = poller.settled().await;

    assert_eq!(state.phase(), JobPhase::Failed);
    assert_eq!(state.error_message(), Some("Job not found"));
}

#[tokio::test]
async fn submit_failure_surfaces_detail_or_fallback() {
    init_logging();
    let mut api = ScriptedApi::new(Vec::new());
    api.submit = Err(ClientError::Status {
        status: 400,
        detail: Some("Only .zip files are allowed".to_string()),
    });
    let api = Arc::new(api);
    let mut poller = JobPoller::new(api.clone(), INTERVAL);
    poller.choose_file(upload());
    poller.submit();
    let state = poller.settled().await;
    assert_eq!(state.error_message(), Some("Only .zip files are allowed"));
    assert_eq!(api.polls(), 0);

    let mut api = ScriptedApi::new(Vec::new());
    api.submit = Err(ClientError::Network("refused".to_string()));
    let mut poller = JobPoller::new(Arc::new(api), INTERVAL);
    poller.choose_file(upload());
    poller.submit();
    let state = poller.settled().await;
    assert_eq!(state.phase(), JobPhase::Failed);
    assert_eq!(state.error_message(), Some(FALLBACK_SUBMIT_FAILED));
}

#[tokio::test]
async fn submit_without_file_does_nothing() {
    init_logging();
    let api = Arc::new(ScriptedApi::new(Vec::new()));
    let mut poller = JobPoller::new(api.clone(), INTERVAL);
    assert!(!poller.submit());
    assert_eq!(poller.state().phase(), JobPhase::Idle);
}

#[tokio::test]
async fn teardown_suppresses_further_polls() {
    init_logging();
    let api = Arc::new(ScriptedApi::new(Vec::new()));
    let mut poller = JobPoller::new(api.clone(), INTERVAL);
    let mut rx = poller.subscribe();

    poller.choose_file(upload());
    poller.submit();
    rx.wait_for(|s| s.progress() >= MIN_VISIBLE_PROGRESS)
        .await
        .unwrap();

    poller.teardown();
    let frozen = poller.state();
    let polls = api.polls();

    tokio::time::sleep(INTERVAL * 6).await;
    assert_eq!(api.polls(), polls);
    assert_eq!(poller.state(), frozen);
    assert_eq!(frozen.phase(), JobPhase::Polling);
}

#[tokio::test]
async fn choosing_a_new_file_discards_the_running_job() {
    init_logging();
    let api = Arc::new(ScriptedApi::new(Vec::new()));
    let mut poller = JobPoller::new(api.clone(), INTERVAL);
    let mut rx = poller.subscribe();

    poller.choose_file(upload());
    poller.submit();
    rx.wait_for(|s| s.phase() == JobPhase::Polling).await.unwrap();

    poller.choose_file(ChatUpload::new("other.zip", vec![9]));
    let polls = api.polls();
    tokio::time::sleep(INTERVAL * 5).await;

    let state = poller.state();
    assert_eq!(state.phase(), JobPhase::Idle);
    assert_eq!(state.job_id(), None);
    assert_eq!(state.view().file_name.as_deref(), Some("other.zip"));
    assert_eq!(api.polls(), polls);
}
