use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::workflow::Actor;

/// Header carrying the acting user's email, set by the trusted frontend
/// after session resolution. Absent for unauthenticated requests.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Actor extractor for invoice-service.
///
/// Resolves the acting identity once at the request boundary so the
/// workflow receives it as an explicit parameter instead of reading
/// ambient session state. A missing or unreadable header yields an
/// anonymous actor, not a rejection: unauthenticated mutations are
/// recorded in the audit trail without a username.
#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Add to tracing span for observability
        if let Some(ref user) = username {
            tracing::Span::current().record("username", user.as_str());
        }

        Ok(Actor(username))
    }
}
