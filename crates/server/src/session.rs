// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bearer-token extraction at the server boundary.
//!
//! Every authenticated request gets a fresh `TenantContext` built from its
//! own access token. The context lives only as long as the request's
//! handler, so tenants never leak between concurrent requests.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use dairy_api::{AuthError, AuthenticatedActor, TenantContext, authenticate_request};
use tracing::{debug, warn};

use crate::{AppState, HttpError};

/// Extractor for requests carrying a valid access token.
///
/// # Usage
///
/// ```ignore
/// async fn my_handler(
///     SessionActor(actor, mut context): SessionActor,
/// ) -> Result<Json<Response>, HttpError> {
///     // actor: AuthenticatedActor
///     // context: TenantContext holding the token's dairy center
/// }
/// ```
///
/// # Errors
///
/// Rejects with HTTP 401 if the header is missing or malformed, or the
/// token is expired, invalid, or a refresh token.
pub struct SessionActor(pub AuthenticatedActor, pub TenantContext);

/// Extractor for endpoints where a token is optional.
///
/// A missing `Authorization` header yields `None`; a present but invalid
/// one is still rejected.
pub struct OptionalSessionActor(pub Option<AuthenticatedActor>);

/// Returns the bearer token, or `None` if there is no `Authorization` header.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, SessionError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value: &str = header.to_str().map_err(|_| {
        warn!("Invalid Authorization header encoding");
        SessionError::InvalidAuthorizationHeader
    })?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or_else(|| {
            warn!("Authorization header does not start with 'Bearer '");
            SessionError::InvalidAuthorizationHeader
        })
}

fn verify(state: &AppState, token: &str) -> Result<(AuthenticatedActor, TenantContext), SessionError> {
    let (actor, context) = authenticate_request(&state.token_issuer, token).map_err(|e| {
        warn!(error = %e, "Token verification failed");
        SessionError::InvalidToken(e)
    })?;

    debug!(
        tenant_id = actor.tenant_id.value(),
        role = %actor.role,
        "Access token verified"
    );
    Ok((actor, context))
}

impl FromRequestParts<AppState> for SessionActor {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token: &str = bearer_token(parts)?.ok_or_else(|| {
            debug!("Missing Authorization header");
            SessionError::MissingAuthorizationHeader
        })?;

        let (actor, context) = verify(state, token)?;
        Ok(Self(actor, context))
    }
}

impl FromRequestParts<AppState> for OptionalSessionActor {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(Self(Some(verify(state, token)?.0))),
            None => Ok(Self(None)),
        }
    }
}

/// Session extraction errors.
#[derive(Debug)]
pub enum SessionError {
    /// Authorization header is missing.
    MissingAuthorizationHeader,
    /// Authorization header format is invalid.
    InvalidAuthorizationHeader,
    /// The token failed verification.
    InvalidToken(AuthError),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::MissingAuthorizationHeader => String::from("Missing Authorization header"),
            Self::InvalidAuthorizationHeader => String::from(
                "Invalid Authorization header format. Expected: 'Bearer <token>'",
            ),
            Self::InvalidToken(AuthError::TokenExpired) => String::from("Token has expired"),
            Self::InvalidToken(_) => String::from("Invalid token"),
        };

        HttpError::new(StatusCode::UNAUTHORIZED, message).into_response()
    }
}
