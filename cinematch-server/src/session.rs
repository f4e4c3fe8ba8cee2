use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use cinematch_collab::is_valid_session;

use crate::errors::ServerError;

/// The cookie a participant's session is kept in
pub const SESSION_COOKIE: &str = "session_id";

/// How long browsers keep the session cookie, in seconds
const SESSION_MAX_AGE: u64 = 60 * 60 * 24;

/// The session a client presents, which must exist for the request to proceed.
/// Whether it belongs to a participant is up to the room.
pub struct ParticipantSession(pub String);

/// The session a client presents, if any
pub struct MaybeSession(pub Option<String>);

/// Reads the session from `Authorization: Bearer` or the session cookie, in that order
fn session_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|x| x.to_str().ok())
        .and_then(|x| x.strip_prefix("Bearer "))
        .map(str::trim);

    let cookie = || {
        parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|x| x.to_str().ok())
            .flat_map(|x| x.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim())
    };

    bearer
        .or_else(cookie)
        .filter(|token| is_valid_session(token))
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_from_parts(parts)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ParticipantSession
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from_parts(parts)
            .map(Self)
            .ok_or(ServerError::NotAParticipant)
    }
}

/// Builds the `Set-Cookie` value that hands a session to the browser
pub fn session_cookie(session: &str) -> String {
    format!("{SESSION_COOKIE}={session}; Path=/; Max-Age={SESSION_MAX_AGE}; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(headers: &[(header::HeaderName, &str)]) -> Parts {
        let mut builder = Request::builder();

        for (name, value) in headers {
            builder = builder.header(name, *value);
        }

        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_session_from_cookie() {
        let parts = parts(&[(header::COOKIE, "theme=dark; session_id=abc123; other=1")]);
        assert_eq!(session_from_parts(&parts).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let parts = parts(&[
            (header::COOKIE, "session_id=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(session_from_parts(&parts).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_missing_or_malformed_session() {
        assert_eq!(session_from_parts(&parts(&[])), None);
        assert_eq!(
            session_from_parts(&parts(&[(header::COOKIE, "session_id=a b")])),
            None
        );
    }
}
