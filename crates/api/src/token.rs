// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Signed access and refresh tokens.
//!
//! Tokens are HS512 JWTs. Both classes carry the subject (phone), the
//! tenant (`dairyCenterId`), the farmer's member code when there is one, and
//! an explicit `tokenType` claim. Only access tokens carry `roles`.
//! Verification always names the expected class, so a refresh token is
//! never accepted where an access token is required and vice versa.

use dairy_domain::{MemberCode, TenantId};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::auth::{AuthenticatedActor, Role};
use crate::error::AuthError;

/// Minimum HS512 secret length, in bytes.
pub const MIN_SECRET_LENGTH: usize = 64;

/// Errors raised while building a token configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenConfigError {
    /// The signing secret is shorter than HS512 needs.
    #[error("Token secret must be at least {min_length} bytes (got {actual})")]
    SecretTooShort { min_length: usize, actual: usize },

    /// A token lifetime is zero or negative.
    #[error("{which} token lifetime must be positive")]
    NonPositiveTtl { which: &'static str },
}

/// Signing secret and lifetimes.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenConfig {
    /// Validates and builds a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is shorter than [`MIN_SECRET_LENGTH`]
    /// or either lifetime is not positive.
    pub fn new(
        secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenConfigError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(TokenConfigError::SecretTooShort {
                min_length: MIN_SECRET_LENGTH,
                actual: secret.len(),
            });
        }
        if !access_ttl.is_positive() {
            return Err(TokenConfigError::NonPositiveTtl { which: "Access" });
        }
        if !refresh_ttl.is_positive() {
            return Err(TokenConfigError::NonPositiveTtl { which: "Refresh" });
        }

        Ok(Self {
            secret: secret.to_vec(),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Returns the access token lifetime.
    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Returns the refresh token lifetime.
    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

/// Which of the two token classes a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

/// JWT claim set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Subject: the principal's phone number.
    pub sub: String,
    pub dairy_center_id: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_code: Option<String>,
    pub token_type: TokenClass,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// A freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
    /// Lifetime in whole seconds.
    pub expires_in: i64,
}

/// The identity recovered from a verified refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshIdentity {
    pub phone: String,
    pub tenant_id: TenantId,
    pub member_code: Option<MemberCode>,
}

/// Mints and verifies tokens.
pub struct TokenIssuer {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    /// Creates an issuer from a validated configuration.
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key: EncodingKey = EncodingKey::from_secret(&config.secret);
        let decoding_key: DecodingKey = DecodingKey::from_secret(&config.secret);
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issues an access token for `actor`, valid from now.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_access(&self, actor: &AuthenticatedActor) -> Result<IssuedToken, AuthError> {
        self.issue_at(actor, TokenClass::Access, OffsetDateTime::now_utc())
    }

    /// Issues a refresh token for `actor`, valid from now.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_refresh(&self, actor: &AuthenticatedActor) -> Result<IssuedToken, AuthError> {
        self.issue_at(actor, TokenClass::Refresh, OffsetDateTime::now_utc())
    }

    /// Issues a token of the given class as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue_at(
        &self,
        actor: &AuthenticatedActor,
        class: TokenClass,
        now: OffsetDateTime,
    ) -> Result<IssuedToken, AuthError> {
        let ttl: Duration = match class {
            TokenClass::Access => self.config.access_ttl,
            TokenClass::Refresh => self.config.refresh_ttl,
        };
        let expires_at: OffsetDateTime = now + ttl;

        let roles: Vec<String> = match class {
            TokenClass::Access => vec![actor.role.as_claim().to_string()],
            TokenClass::Refresh => Vec::new(),
        };

        let claims: TokenClaims = TokenClaims {
            sub: actor.phone.clone(),
            dairy_center_id: actor.tenant_id.value(),
            roles,
            member_code: actor.member_code.as_ref().map(|c| c.value().to_string()),
            token_type: class,
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            jti: format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>()),
        };

        let token: String = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenInvalid {
                reason: format!("Failed to sign token: {e}"),
            })?;

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: ttl.whole_seconds(),
        })
    }

    /// Verifies a token's signature, expiry and class.
    ///
    /// No leeway is applied to `exp`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` if the token is past its expiry and
    /// `AuthError::TokenInvalid` for a bad signature, missing claims or a
    /// class other than `expected`.
    pub fn verify(&self, token: &str, expected: TokenClass) -> Result<TokenClaims, AuthError> {
        let mut validation: Validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims: TokenClaims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid {
                    reason: e.to_string(),
                },
            })?
            .claims;

        if claims.token_type != expected {
            debug!(
                expected = ?expected,
                actual = ?claims.token_type,
                "Token class mismatch"
            );
            return Err(AuthError::TokenInvalid {
                reason: format!(
                    "expected {expected:?} token, got {:?} token",
                    claims.token_type
                ),
            });
        }

        if claims.sub.is_empty() {
            return Err(AuthError::TokenInvalid {
                reason: String::from("empty subject"),
            });
        }

        Ok(claims)
    }

    /// Verifies an access token and returns the actor it identifies.
    ///
    /// # Errors
    ///
    /// Returns an error if verification fails, the role claim is missing or
    /// unknown, or a farmer token has no member code.
    pub fn verify_access(&self, token: &str) -> Result<AuthenticatedActor, AuthError> {
        let claims: TokenClaims = self.verify(token, TokenClass::Access)?;

        let role: Role = claims
            .roles
            .first()
            .and_then(|r| Role::from_claim(r))
            .ok_or_else(|| AuthError::TokenInvalid {
                reason: String::from("missing or unknown role claim"),
            })?;

        let member_code: Option<MemberCode> = claims.member_code.as_deref().map(MemberCode::new);
        if role == Role::Farmer && member_code.is_none() {
            return Err(AuthError::TokenInvalid {
                reason: String::from("farmer token without member code"),
            });
        }

        Ok(AuthenticatedActor {
            phone: claims.sub,
            tenant_id: TenantId::new(claims.dairy_center_id),
            role,
            member_code,
        })
    }

    /// Verifies a refresh token and returns the identity it names.
    ///
    /// # Errors
    ///
    /// Returns an error if verification fails.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshIdentity, AuthError> {
        let claims: TokenClaims = self.verify(token, TokenClass::Refresh)?;

        Ok(RefreshIdentity {
            phone: claims.sub,
            tenant_id: TenantId::new(claims.dairy_center_id),
            member_code: claims.member_code.as_deref().map(MemberCode::new),
        })
    }
}
