use std::sync::Arc;

use client_logging::{client_debug, client_info, client_warn};
use emotrack_core::Epoch;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{map_reqwest_error, response_detail};
use crate::{ClientError, ClientSettings, HttpTransport, Navigator, SessionManager, SessionStore};

/// API client whose every request passes through one authorization pipeline:
/// the current credential is attached on the way out, and a 401 on the way
/// back ends the session and sends the front end to the login entry point.
#[derive(Clone)]
pub struct ApiClient {
    transport: HttpTransport,
    session: SessionManager,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.transport.base_url().as_str())
            .field("session", &self.session)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        transport: HttpTransport,
        session: SessionManager,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        client_info!(
            "[ApiClient] Creating API client with base URL: {}",
            transport.base_url()
        );
        Self {
            transport,
            session,
            navigator,
        }
    }

    /// Builds transport, session manager and client from settings in one go.
    pub fn connect(
        settings: &ClientSettings,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(settings)?;
        let session = SessionManager::new(transport.clone(), store);
        Ok(Self::new(transport, session, navigator))
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Sends `request` through the authorization pipeline and returns the
    /// successful response; any non-success status becomes an error.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let (request, issued_with) = match self.session.credential() {
            Some((credential, epoch)) => (
                request.header(AUTHORIZATION, credential.bearer_header()),
                Some(epoch),
            ),
            None => (request, None),
        };

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let detail = response_detail(response).await;
            self.on_unauthorized(issued_with);
            return Err(ClientError::Unauthorized { detail });
        }
        if !status.is_success() {
            let detail = response_detail(response).await;
            client_debug!("Request failed with {}: {:?}", status, detail);
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response)
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(map_reqwest_error)
    }

    /// Cross-cutting 401 policy. The session lock makes the logout happen once
    /// per session however many rejected requests race here; a rejection of a
    /// credential that was already replaced leaves the new session alone.
    fn on_unauthorized(&self, issued_with: Option<Epoch>) {
        let ended = self.session.invalidate(issued_with);
        if ended {
            client_warn!("Request rejected as unauthorized; session ended");
        }
        if (ended || issued_with.is_none()) && self.navigator.redirect_to_login() {
            client_info!("Redirected to login");
        }
    }
}
