use std::io;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unauthorized: {}", .detail.as_deref().unwrap_or("session expired"))]
    Unauthorized { detail: Option<String> },
    #[error("http status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// Human-readable message the server attached to a rejected request.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { detail } | ClientError::Status { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout(err.to_string());
    }
    if err.is_decode() {
        return ClientError::Decode(err.to_string());
    }
    ClientError::Network(err.to_string())
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Login was refused. The server's reason is deliberately not surfaced.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt session file: {0}")]
    Parse(String),
    #[error("could not serialize session: {0}")]
    Serialize(String),
}

/// Error payload the backend sends with non-success responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    detail: Option<Detail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Text(String),
    Fields(Vec<FieldError>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct FieldError {
    #[serde(default)]
    msg: String,
}

impl ErrorBody {
    pub(crate) fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Flattens `detail` into one line; field errors are joined with ", ".
    pub(crate) fn message(&self) -> Option<String> {
        let message = match self.detail.as_ref()? {
            Detail::Text(text) => text.clone(),
            Detail::Fields(fields) => fields
                .iter()
                .map(|field| field.msg.as_str())
                .filter(|msg| !msg.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Detail::Other(serde_json::Value::Null) => return None,
            Detail::Other(value) => value.to_string(),
        };
        Some(message).filter(|m| !m.trim().is_empty())
    }
}

/// Reads the body of a failed response and extracts its `detail`, if any.
pub(crate) async fn response_detail(response: reqwest::Response) -> Option<String> {
    let body = response.text().await.ok()?;
    ErrorBody::parse(&body).message()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_and_field_list_are_flattened() {
        let text = ErrorBody::parse(r#"{"detail":"Email already registered"}"#);
        assert_eq!(text.message().as_deref(), Some("Email already registered"));

        let fields = ErrorBody::parse(
            r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},
                          {"loc":["body","password"],"msg":"field required"}]}"#,
        );
        assert_eq!(
            fields.message().as_deref(),
            Some("value is not a valid email address, field required")
        );
    }

    #[test]
    fn missing_or_unparsable_detail_yields_none() {
        assert_eq!(ErrorBody::parse("<html>502</html>").message(), None);
        assert_eq!(ErrorBody::parse(r#"{"detail":null}"#).message(), None);
        assert_eq!(ErrorBody::parse(r#"{"other":1}"#).message(), None);
    }
}
