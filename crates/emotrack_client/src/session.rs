use std::sync::{Arc, Mutex, MutexGuard};

use client_logging::{client_debug, client_info, client_warn, redact};
use emotrack_core::{Credential, Epoch, Identity, Session, SessionView};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::broadcast;

use crate::error::{map_reqwest_error, response_detail};
use crate::{AuthError, ClientError, HttpTransport, SessionStore};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(Identity),
    LoggedOut(LogoutReason),
}

/// Process-wide session context: the one owner of the bearer credential.
///
/// Cloning is cheap and every clone shares the same session. Authentication
/// endpoints are called on the bare transport so a rejected login never goes
/// through the logout-on-401 pipeline.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    transport: HttpTransport,
    store: Arc<dyn SessionStore>,
    session: Mutex<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.inner.transport.base_url().as_str())
            .field("authenticated", &self.lock().is_authenticated())
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct GoogleLoginRequest<'a> {
    access_token: &'a str,
}

#[derive(Debug, Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    email: String,
    #[serde(deserialize_with = "string_or_number")]
    user_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    msg: Option<String>,
}

impl SessionManager {
    /// Creates an anonymous manager. Call [`Self::restore`] once at start-up.
    pub fn new(transport: HttpTransport, store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                session: Mutex::new(Session::new()),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Rebuilds the session from storage without a network round-trip.
    /// Incomplete or unreadable storage leaves the session anonymous.
    pub fn restore(&self) -> SessionView {
        let restored = match self.inner.store.load() {
            Ok(persisted) => {
                let session = Session::restore(&persisted);
                if !session.is_authenticated() && !persisted.is_empty() {
                    client_warn!("Persisted session is incomplete; starting signed out");
                }
                session
            }
            Err(err) => {
                client_warn!("Failed to read persisted session: {}", err);
                Session::new()
            }
        };
        let view = SessionView::of(&restored);
        *self.lock() = restored;
        if let Some(identity) = &view.identity {
            client_info!("Restored session for user_id={}", identity.user_id);
        }
        view
    }

    /// Password login against `POST /auth/token`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let form = [("username", email.trim()), ("password", password.trim())];
        let response = self
            .inner
            .transport
            .post("/auth/token")?
            .form(&form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response_detail(response).await;
            client_debug!("Login rejected with {}: {:?}", status, detail);
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let detail = response_detail(response).await;
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            }
            .into());
        }

        let token: TokenResponse = response.json().await.map_err(map_reqwest_error)?;
        Ok(self.establish(token))
    }

    /// Registers an account. Success does not sign the user in.
    pub async fn signup(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let response = self
            .inner
            .transport
            .post("/auth/signup")?
            .json(&SignupRequest { email, password })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status().is_success() {
            client_info!("Signup accepted");
            return Ok(());
        }
        let detail = response_detail(response).await;
        Err(AuthError::Rejected(
            detail.unwrap_or_else(|| "Signup failed".to_string()),
        ))
    }

    /// Exchanges a third-party identity token for a session. Never errors;
    /// failures are logged and reported as `false`.
    pub async fn federated_login(&self, provider_token: &str) -> bool {
        match self.try_federated_login(provider_token).await {
            Ok(identity) => {
                client_info!("Federated login succeeded for user_id={}", identity.user_id);
                true
            }
            Err(err) => {
                client_warn!("Federated login failed: {}", err);
                false
            }
        }
    }

    async fn try_federated_login(&self, provider_token: &str) -> Result<Identity, AuthError> {
        client_debug!("Exchanging provider token {}", redact(provider_token));
        let response = self
            .inner
            .transport
            .post("/auth/google")?
            .json(&GoogleLoginRequest {
                access_token: provider_token,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response_detail(response).await;
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            }
            .into());
        }
        let token: TokenResponse = response.json().await.map_err(map_reqwest_error)?;
        Ok(self.establish(token))
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        self.post_for_message(
            "/auth/forgot-password",
            &ForgotPasswordRequest { email },
            "Password reset request failed",
        )
        .await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<String, AuthError> {
        self.post_for_message(
            "/auth/reset-password",
            &ResetPasswordRequest {
                token,
                new_password,
            },
            "Password reset failed",
        )
        .await
    }

    async fn post_for_message<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        fallback: &str,
    ) -> Result<String, AuthError> {
        let response = self
            .inner
            .transport
            .post(path)?
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            let detail = response_detail(response).await;
            return Err(AuthError::Rejected(
                detail.unwrap_or_else(|| fallback.to_string()),
            ));
        }
        let message: MessageResponse = match response.json().await {
            Ok(message) => message,
            Err(err) => {
                client_debug!("Ignoring unreadable {} response body: {}", path, err);
                MessageResponse::default()
            }
        };
        Ok(message.msg.unwrap_or_default())
    }

    /// Ends the session. Always succeeds and is idempotent.
    pub fn logout(&self) {
        self.end_session(None, LogoutReason::UserRequested);
    }

    /// Ends the session only if it is still the one that issued a rejected
    /// request. Returns `true` for exactly one caller per session.
    pub(crate) fn invalidate(&self, issued_with: Option<Epoch>) -> bool {
        match issued_with {
            Some(epoch) => self.end_session(Some(epoch), LogoutReason::Unauthorized),
            None => false,
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    pub fn view(&self) -> SessionView {
        SessionView::of(&self.lock())
    }

    /// Credential to attach to an outgoing request, with the epoch it belongs to.
    pub(crate) fn credential(&self) -> Option<(Credential, Epoch)> {
        self.lock()
            .credential()
            .map(|(credential, epoch)| (credential.clone(), epoch))
    }

    fn establish(&self, token: TokenResponse) -> Identity {
        let identity = Identity {
            user_id: token.user_id,
            email: token.email,
        };
        client_debug!("Received credential {}", redact(&token.access_token));
        {
            let mut session = self.lock();
            session.authenticate(Credential::new(token.access_token), identity.clone());
            // Persist under the lock; a logout waiting on it then clears what was written.
            if let Err(err) = self.inner.store.save(&session.to_persisted()) {
                client_warn!("Failed to persist session: {}", err);
            }
        }
        client_info!("Signed in as user_id={}", identity.user_id);
        let _ = self
            .inner
            .events
            .send(SessionEvent::LoggedIn(identity.clone()));
        identity
    }

    fn end_session(&self, issued_with: Option<Epoch>, reason: LogoutReason) -> bool {
        let ended = {
            let mut session = self.lock();
            let ended = match issued_with {
                Some(_) => session.invalidate(issued_with),
                None => session.logout(),
            };
            // Clear storage under the lock so a concurrent login cannot be wiped.
            if ended || issued_with.is_none() {
                if let Err(err) = self.inner.store.clear() {
                    client_warn!("Failed to clear persisted session: {}", err);
                }
            }
            ended
        };
        if ended {
            client_info!("Signed out ({:?})", reason);
            let _ = self.inner.events.send(SessionEvent::LoggedOut(reason));
        }
        ended
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Text(text) => text,
        Repr::Number(number) => number.to_string(),
    })
}
