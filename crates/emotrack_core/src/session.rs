use std::fmt;

use serde::{Deserialize, Serialize};

/// Counts authentications; a request remembers the epoch its credential came from.
pub type Epoch = u64;

/// Opaque bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.chars().count())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

/// Either nobody is signed in, or both credential and identity are known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated {
        credential: Credential,
        identity: Identity,
        epoch: Epoch,
    },
}

/// Durable form of a session: one optional value per fixed storage key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl PersistedSession {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user_email.is_none() && self.user_id.is_none()
    }
}

/// Session state machine: `Anonymous -> Authenticated -> Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    state: SessionState,
    last_epoch: Epoch,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a session from storage. Any missing or blank field yields
    /// `Anonymous`; a partial identity is never produced.
    pub fn restore(persisted: &PersistedSession) -> Self {
        let mut session = Self::new();
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        };
        if let (Some(token), Some(email), Some(user_id)) = (
            present(&persisted.token),
            present(&persisted.user_email),
            present(&persisted.user_id),
        ) {
            session.authenticate(Credential::new(token), Identity { user_id, email });
        }
        session
    }

    /// Replaces whatever was there with a fresh authenticated session and
    /// returns its epoch.
    pub fn authenticate(&mut self, credential: Credential, identity: Identity) -> Epoch {
        self.last_epoch += 1;
        self.state = SessionState::Authenticated {
            credential,
            identity,
            epoch: self.last_epoch,
        };
        self.last_epoch
    }

    /// Clears the session. Returns `true` only when this call ended an
    /// authenticated session.
    pub fn logout(&mut self) -> bool {
        let was_authenticated = self.is_authenticated();
        self.state = SessionState::Anonymous;
        was_authenticated
    }

    /// Logs out only if the session that issued a rejected request is still the
    /// current one. Returns `true` when the session was ended by this call.
    pub fn invalidate(&mut self, issued_with: Option<Epoch>) -> bool {
        match (&self.state, issued_with) {
            (SessionState::Authenticated { epoch, .. }, Some(issued)) if *epoch == issued => {
                self.logout()
            }
            _ => false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn credential(&self) -> Option<(&Credential, Epoch)> {
        match &self.state {
            SessionState::Authenticated {
                credential, epoch, ..
            } => Some((credential, *epoch)),
            SessionState::Anonymous => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated { identity, .. } => Some(identity),
            SessionState::Anonymous => None,
        }
    }

    pub fn to_persisted(&self) -> PersistedSession {
        match &self.state {
            SessionState::Authenticated {
                credential,
                identity,
                ..
            } => PersistedSession {
                token: Some(credential.as_str().to_owned()),
                user_email: Some(identity.email.clone()),
                user_id: Some(identity.user_id.clone()),
            },
            SessionState::Anonymous => PersistedSession::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_does_not_leak_token() {
        let rendered = format!("{:?}", Credential::new("abc123"));
        assert!(!rendered.contains("abc123"));
        assert_eq!(Credential::new("abc").bearer_header(), "Bearer abc");
    }
}
