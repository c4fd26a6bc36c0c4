//! emotrack client: HTTP pipeline, session management and job polling.
mod api;
mod endpoints;
mod error;
mod navigator;
mod poller;
mod session;
mod settings;
mod store;
mod transport;

pub use api::ApiClient;
pub use endpoints::SupportInsightsQuery;
pub use error::{AuthError, ClientError, StoreError};
pub use navigator::{Navigator, Route, RouteTracker};
pub use poller::{AnalysisApi, JobPoller};
pub use session::{LogoutReason, SessionEvent, SessionManager};
pub use settings::ClientSettings;
pub use store::{MemoryStore, RonFileStore, SessionStore, SESSION_FILENAME};
pub use transport::HttpTransport;
