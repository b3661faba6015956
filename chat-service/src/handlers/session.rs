//! Session identity carried in the `x-session-id` header.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName},
};
use std::convert::Infallible;
use uuid::Uuid;

pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

const MAX_SESSION_ID_LEN: usize = 128;

/// The caller's session identity. A fresh UUID is minted when the header is
/// absent or unusable; handlers echo it back in the same header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header pair for the response.
    pub fn header(&self) -> [(HeaderName, String); 1] {
        [(SESSION_HEADER, self.0.clone())]
    }

    fn is_acceptable(value: &str) -> bool {
        !value.is_empty()
            && value.len() <= MAX_SESSION_ID_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let supplied = parts
            .headers
            .get(&SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| Self::is_acceptable(value));

        match supplied {
            Some(value) => Ok(SessionId(value.to_string())),
            None => {
                let minted = Uuid::new_v4().to_string();
                tracing::debug!(session_id = %minted, "Minted session id");
                Ok(SessionId(minted))
            }
        }
    }
}
