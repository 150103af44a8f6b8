// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use dairy_domain::DomainError;
use dairy_persistence::PersistenceError;

use crate::csv_ingest::CsvIngestError;
use crate::password_policy::PasswordPolicyError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login input did not resolve to a principal with that password.
    ///
    /// Unknown phone, wrong member code and wrong password all produce this
    /// same variant.
    InvalidCredentials,
    /// The presented token is past its expiry.
    TokenExpired,
    /// The presented token failed signature, class or claim checks.
    TokenInvalid {
        /// Why the token was rejected. Logged, not shown to clients.
        reason: String,
    },
    /// A tenant-scoped operation ran without a tenant in context.
    TenantContextMissing {
        /// The operation that was refused.
        operation: String,
    },
    /// The actor's role does not permit the action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// Credential storage could not be read.
    Storage {
        /// The underlying failure.
        message: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::TokenExpired => write!(f, "Token has expired"),
            Self::TokenInvalid { reason } => write!(f, "Invalid token: {reason}"),
            Self::TenantContextMissing { operation } => {
                write!(f, "No dairy center in context for '{operation}'")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::Storage { message } => write!(f, "Credential storage error: {message}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<PersistenceError> for AuthError {
    fn from(err: PersistenceError) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

/// API-level errors.
///
/// These are distinct from domain and storage errors and represent the API
/// contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed (bad credentials, expired or invalid token).
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A domain rule was violated (duplicates).
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An uploaded CSV file could not be processed as a whole.
    InvalidCsvFormat {
        /// Why the file was rejected.
        reason: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::InvalidCsvFormat { reason } => write!(f, "Invalid CSV file: {reason}"),
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid { .. } => Self::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::TenantContextMissing { operation } => Self::Unauthorized {
                action: operation,
                required_role: String::from("dairy-center-scoped"),
            },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
            AuthError::Storage { message } => Self::Internal { message },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        Self::Internal {
            message: err.to_string(),
        }
    }
}

impl From<CsvIngestError> for ApiError {
    fn from(err: CsvIngestError) -> Self {
        match err {
            CsvIngestError::Storage(storage_err) => Self::from(storage_err),
            CsvIngestError::EmptyFile
            | CsvIngestError::Unreadable { .. }
            | CsvIngestError::NoRecords => Self::InvalidCsvFormat {
                reason: err.to_string(),
            },
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidPhone(msg) => ApiError::InvalidInput {
            field: String::from("phone"),
            message: msg,
        },
        DomainError::InvalidName(msg) => ApiError::InvalidInput {
            field: String::from("name"),
            message: msg,
        },
        DomainError::InvalidMemberCode(msg) => ApiError::InvalidInput {
            field: String::from("dairyGivenId"),
            message: msg,
        },
        DomainError::InvalidTenantName(msg) => ApiError::InvalidInput {
            field: String::from("name"),
            message: msg,
        },
        DomainError::InvalidLocation(msg) => ApiError::InvalidInput {
            field: String::from("location"),
            message: msg,
        },
        DomainError::InvalidAuxiliaryDate { value } => ApiError::InvalidInput {
            field: String::from("nepaliDate"),
            message: format!("Invalid auxiliary date format: {value}"),
        },
        DomainError::TenantNotFound(tenant_id) => ApiError::ResourceNotFound {
            resource_type: String::from("Dairy center"),
            message: format!("Dairy center {tenant_id} does not exist"),
        },
        DomainError::DuplicateTenant { name } => ApiError::DomainRuleViolation {
            rule: String::from("unique_dairy_center_name"),
            message: format!("Dairy center with name '{name}' already exists"),
        },
        DomainError::DuplicateFarmer {
            tenant_id,
            phone,
            member_code,
        } => ApiError::DomainRuleViolation {
            rule: String::from("unique_farmer"),
            message: format!(
                "Farmer with phone '{phone}' and member code '{member_code}' already exists in dairy center {tenant_id}"
            ),
        },
        DomainError::DuplicateStaff { tenant_id, phone } => ApiError::DomainRuleViolation {
            rule: String::from("unique_staff"),
            message: format!(
                "Staff with phone '{phone}' already exists in dairy center {tenant_id}"
            ),
        },
    }
}
