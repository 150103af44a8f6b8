// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod tenant_tests;

use dairy_domain::{AuxiliaryDate, CollectionRecord, MemberCode, Tenant, TenantId};
use time::macros::{date, time};

use crate::{MIN_BCRYPT_COST, Persistence, SqlitePersistence};

/// Opens a fresh in-memory database with the cheapest bcrypt cost.
pub fn create_test_persistence() -> Persistence {
    SqlitePersistence::new_in_memory()
        .unwrap()
        .with_bcrypt_cost(MIN_BCRYPT_COST)
}

pub fn create_test_tenant(persistence: &mut Persistence, name: &str) -> Tenant {
    persistence
        .create_tenant(name, "Chitwan", Some("056-520000"))
        .unwrap()
}

pub fn create_test_record(tenant_id: TenantId, member_code: &str, aux: &str) -> CollectionRecord {
    CollectionRecord {
        record_id: None,
        tenant_id,
        member_code: MemberCode::new(member_code),
        collection_date: date!(2025 - 10 - 13),
        auxiliary_date: AuxiliaryDate::parse(aux).unwrap(),
        collection_time: time!(06:30),
        volume_litres: 12.5,
        fat_percentage: 4.2,
        snf: 8.5,
        rate: 55.0,
        amount: 687.5,
        remark: None,
    }
}
