// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request-scoped tenant context and the guard that enforces it.
//!
//! A `TenantContext` is an ordinary value owned by one request. It is not
//! `Clone` and there is no global instance, so a tenant set for one request
//! cannot be observed by another one running in parallel.
//!
//! `AccessGuard::enforce` wraps every tenant-scoped entry point: the wrapped
//! operation only runs when a tenant is present, receives that tenant as an
//! explicit argument, and the context is cleared when it returns (or
//! unwinds).

use dairy_domain::TenantId;
use tracing::{debug, warn};

use crate::error::AuthError;

/// The tenant a single request is acting as.
#[derive(Debug, Default)]
pub struct TenantContext {
    tenant_id: Option<TenantId>,
}

impl TenantContext {
    /// Creates an empty context.
    #[must_use]
    pub const fn new() -> Self {
        Self { tenant_id: None }
    }

    /// Creates a context already holding a tenant.
    #[must_use]
    pub const fn with_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
        }
    }

    /// Stores the tenant for this request, replacing any previous value.
    pub fn set(&mut self, tenant_id: TenantId) {
        if let Some(previous) = self.tenant_id.filter(|previous| *previous != tenant_id) {
            debug!(
                previous = previous.value(),
                tenant_id = tenant_id.value(),
                "Replacing dairy center in request context"
            );
        }
        self.tenant_id = Some(tenant_id);
    }

    /// Returns the stored tenant, if any.
    #[must_use]
    pub const fn get(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Removes the stored tenant unconditionally.
    pub const fn clear(&mut self) {
        self.tenant_id = None;
    }
}

/// Clears the borrowed context when dropped, including during unwinding.
struct ClearOnDrop<'a> {
    context: &'a mut TenantContext,
}

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.context.clear();
    }
}

/// Enforcement point for tenant-scoped operations.
pub struct AccessGuard;

impl AccessGuard {
    /// Runs `op` with the tenant held by `context`.
    ///
    /// If the context is empty `op` is not invoked. Whatever `op` returns,
    /// the context is empty afterwards.
    ///
    /// # Arguments
    ///
    /// * `context` - The request's tenant context
    /// * `operation` - Name of the operation, for logging and errors
    /// * `op` - The tenant-scoped operation
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TenantContextMissing` (converted into `E`) if no
    /// tenant is set, otherwise whatever `op` returns.
    pub fn enforce<T, E, F>(context: &mut TenantContext, operation: &str, op: F) -> Result<T, E>
    where
        F: FnOnce(TenantId) -> Result<T, E>,
        E: From<AuthError>,
    {
        let guard: ClearOnDrop<'_> = ClearOnDrop { context };

        let Some(tenant_id) = guard.context.get() else {
            warn!(operation, "Refusing tenant-scoped operation without a dairy center");
            return Err(E::from(AuthError::TenantContextMissing {
                operation: operation.to_string(),
            }));
        };

        op(tenant_id)
    }
}
