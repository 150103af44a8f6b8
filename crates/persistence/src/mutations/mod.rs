// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! Uniqueness of tenants, farmers and staff is enforced by table
//! constraints, so concurrent duplicate inserts surface as
//! `PersistenceError::UniqueViolation` rather than as two rows.
//!
//! ## Module Organization
//!
//! - `tenants`: Tenant onboarding
//! - `principals`: Farmer registration and staff creation
//! - `collection_records`: Batched record inserts

pub mod collection_records;
pub mod principals;
pub mod tenants;
