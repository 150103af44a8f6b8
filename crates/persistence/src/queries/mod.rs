// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! Every tenant-scoped query takes the tenant identifier as an explicit
//! parameter; none of them reads ambient request state.
//!
//! ## Module Organization
//!
//! - `tenants`: Tenant lookup and listing
//! - `principals`: Farmer and staff lookup
//! - `collection_records`: Collection record listings and existence checks

pub mod collection_records;
pub mod principals;
pub mod tenants;
