// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dual-actor authentication and role-based authorization.
//!
//! Farmers and staff share no identity table. A login carrying a member
//! code is resolved as a farmer by `(tenant, phone, member code)`; any
//! other login is resolved as staff by `(tenant, phone)`. Every failure
//! collapses to `AuthError::InvalidCredentials`, and every failure runs
//! one password verification, so response time does not reveal whether
//! the principal exists.

use dairy_domain::{FarmerPrincipal, MemberCode, StaffPrincipal, TenantId};
use dairy_persistence::Persistence;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AuthError;

/// Role of an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A farmer; may read their own collection records.
    Farmer,
    /// Dairy staff; may upload collection files and read tenant-wide data.
    DairyStaff,
}

impl Role {
    /// Returns the role string carried in token claims.
    #[must_use]
    pub const fn as_claim(&self) -> &'static str {
        match self {
            Self::Farmer => "ROLE_FARMER",
            Self::DairyStaff => "ROLE_DAIRY_STAFF",
        }
    }

    /// Parses a role claim string.
    #[must_use]
    pub fn from_claim(claim: &str) -> Option<Self> {
        match claim {
            "ROLE_FARMER" => Some(Self::Farmer),
            "ROLE_DAIRY_STAFF" => Some(Self::DairyStaff),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_claim())
    }
}

/// Represents an authenticated actor in the system.
///
/// This is the identity carried by an access token; the tenant here is the
/// one every subsequent data access is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The actor's phone number (token subject).
    pub phone: String,
    /// The tenant the actor belongs to.
    pub tenant_id: TenantId,
    /// The actor's role.
    pub role: Role,
    /// The member code, for farmers only.
    pub member_code: Option<MemberCode>,
}

impl AuthenticatedActor {
    /// Returns whether this actor is dairy staff.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self.role, Role::DairyStaff)
    }
}

/// A principal whose password has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiedPrincipal {
    Farmer(FarmerPrincipal),
    Staff(StaffPrincipal),
}

impl VerifiedPrincipal {
    /// Returns the principal's tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        match self {
            Self::Farmer(farmer) => farmer.tenant_id,
            Self::Staff(staff) => staff.tenant_id,
        }
    }

    /// Returns the principal's phone number.
    #[must_use]
    pub fn phone(&self) -> &str {
        match self {
            Self::Farmer(farmer) => &farmer.phone,
            Self::Staff(staff) => &staff.phone,
        }
    }

    /// Returns the principal's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Farmer(farmer) => &farmer.name,
            Self::Staff(staff) => &staff.name,
        }
    }

    /// Returns the role matching the principal kind.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Farmer(_) => Role::Farmer,
            Self::Staff(_) => Role::DairyStaff,
        }
    }

    /// Returns the member code for farmers.
    #[must_use]
    pub const fn member_code(&self) -> Option<&MemberCode> {
        match self {
            Self::Farmer(farmer) => Some(&farmer.member_code),
            Self::Staff(_) => None,
        }
    }

    /// Builds the actor identity carried in tokens.
    #[must_use]
    pub fn to_actor(&self) -> AuthenticatedActor {
        AuthenticatedActor {
            phone: self.phone().to_string(),
            tenant_id: self.tenant_id(),
            role: self.role(),
            member_code: self.member_code().cloned(),
        }
    }
}

/// Raw login input.
#[derive(Debug, Clone, Copy)]
pub struct LoginInput<'a> {
    /// The tenant the caller claims to belong to.
    pub tenant_id: TenantId,
    pub phone: &'a str,
    pub password: &'a str,
    /// Present (and non-blank) for farmers only.
    pub member_code: Option<&'a str>,
}

/// Checks a presented password against a stored hash.
pub trait PasswordVerifier {
    /// Returns whether `password` matches `password_hash`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is malformed.
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError>;
}

/// Verifies bcrypt hashes as stored by the persistence layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptVerifier;

impl PasswordVerifier for BcryptVerifier {
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        Ok(Persistence::verify_password(password, password_hash)?)
    }
}

/// Resolves login input to exactly one stored principal.
pub struct CredentialResolver;

impl CredentialResolver {
    /// Resolves and verifies a login with bcrypt.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_with`].
    pub fn resolve(
        persistence: &mut Persistence,
        input: &LoginInput<'_>,
    ) -> Result<VerifiedPrincipal, AuthError> {
        Self::resolve_with(persistence, &BcryptVerifier, input)
    }

    /// Resolves and verifies a login.
    ///
    /// A blank member code counts as absent. When no principal matches, the
    /// password is still verified once, against the persistence layer's
    /// decoy hash, before the login is refused.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no principal matches or the
    /// password is wrong, `AuthError::Storage` if lookup fails.
    pub fn resolve_with<V>(
        persistence: &mut Persistence,
        verifier: &V,
        input: &LoginInput<'_>,
    ) -> Result<VerifiedPrincipal, AuthError>
    where
        V: PasswordVerifier + ?Sized,
    {
        let member_code: Option<MemberCode> = input
            .member_code
            .map(MemberCode::new)
            .filter(|code| !code.value().is_empty());

        let principal: Option<(VerifiedPrincipal, String)> = match member_code {
            Some(code) => persistence
                .find_farmer(input.tenant_id, input.phone, &code)?
                .map(|farmer| {
                    let hash: String = farmer.password_hash.clone();
                    (VerifiedPrincipal::Farmer(farmer), hash)
                }),
            None => persistence
                .find_staff(input.tenant_id, input.phone)?
                .map(|staff| {
                    let hash: String = staff.password_hash.clone();
                    (VerifiedPrincipal::Staff(staff), hash)
                }),
        };

        let Some((principal, password_hash)) = principal else {
            let decoy_hash: String = persistence.decoy_password_hash()?;
            verifier.verify(input.password, &decoy_hash)?;
            warn!(
                tenant_id = input.tenant_id.value(),
                farmer = input.member_code.is_some(),
                "Login rejected: no matching principal"
            );
            return Err(AuthError::InvalidCredentials);
        };

        if !verifier.verify(input.password, &password_hash)? {
            warn!(
                tenant_id = input.tenant_id.value(),
                role = %principal.role(),
                "Login rejected: password mismatch"
            );
            return Err(AuthError::InvalidCredentials);
        }

        info!(
            tenant_id = input.tenant_id.value(),
            role = %principal.role(),
            "Login succeeded"
        );
        Ok(principal)
    }

    /// Re-loads the principal behind a previously issued identity.
    ///
    /// Used when exchanging a refresh token: no password is checked, but the
    /// principal must still exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the principal no longer exists.
    pub fn reload(
        persistence: &mut Persistence,
        tenant_id: TenantId,
        phone: &str,
        member_code: Option<&MemberCode>,
    ) -> Result<VerifiedPrincipal, AuthError> {
        let principal: Option<VerifiedPrincipal> = match member_code {
            Some(code) => persistence
                .find_farmer(tenant_id, phone, code)?
                .map(VerifiedPrincipal::Farmer),
            None => persistence
                .find_staff(tenant_id, phone)?
                .map(VerifiedPrincipal::Staff),
        };

        principal.ok_or(AuthError::InvalidCredentials)
    }
}

/// Authorization service for role checks.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Only staff may upload collection files.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff.
    pub fn authorize_upload_collection(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_staff(actor, "upload_collection")
    }

    /// Only staff may read a whole tenant's monthly records.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff.
    pub fn authorize_view_dairy_records(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_staff(actor, "view_dairy_records")
    }

    /// Only staff may list a tenant's staff.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff.
    pub fn authorize_list_staff(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_staff(actor, "list_staff")
    }

    /// Only staff may add staff once a tenant has any.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff.
    pub fn authorize_create_staff(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_staff(actor, "create_staff")
    }

    /// Staff may read any member code; farmers only their own.
    ///
    /// # Errors
    ///
    /// Returns an error if a farmer asks for another member code.
    pub fn authorize_view_member_records(
        actor: &AuthenticatedActor,
        member_code: &MemberCode,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::DairyStaff => Ok(()),
            Role::Farmer if actor.member_code.as_ref() == Some(member_code) => Ok(()),
            Role::Farmer => Err(AuthError::Unauthorized {
                action: String::from("view_member_records"),
                required_role: String::from("ROLE_DAIRY_STAFF or owning ROLE_FARMER"),
            }),
        }
    }

    fn require_staff(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::DairyStaff => Ok(()),
            Role::Farmer => Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from(Role::DairyStaff.as_claim()),
            }),
        }
    }
}
