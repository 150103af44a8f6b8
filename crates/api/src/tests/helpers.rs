// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use dairy_domain::{MemberCode, TenantId};
use dairy_persistence::{MIN_BCRYPT_COST, Persistence};
use time::Duration;

use crate::{AuthenticatedActor, Role, TokenConfig, TokenIssuer};

/// A 64-byte HS512 test secret.
pub const TEST_SECRET: &[u8] = b"test-secret-0123456789-abcdefghijklmnopqrstuvwxyz-0123456789-abcd";

pub const FARMER_PHONE: &str = "9812345678";
pub const STAFF_PHONE: &str = "9800000001";
pub const TEST_PASSWORD: &str = "milk-secret";

pub const CSV_HEADER: &str = "Coll_date,Ne_date,Coll_time,Mem_code,Volume_lt,Fat_per,Snf,Rate,Amount,Remark";

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory()
        .unwrap()
        .with_bcrypt_cost(MIN_BCRYPT_COST)
}

pub fn create_test_issuer() -> TokenIssuer {
    let config: TokenConfig =
        TokenConfig::new(TEST_SECRET, Duration::minutes(60), Duration::days(7)).unwrap();
    TokenIssuer::new(config)
}

pub fn create_test_tenant(persistence: &mut Persistence, name: &str) -> TenantId {
    persistence
        .create_tenant(name, "Chitwan", None)
        .unwrap()
        .tenant_id
}

pub fn register_test_farmer(
    persistence: &mut Persistence,
    tenant_id: TenantId,
    name: &str,
    phone: &str,
    member_code: &str,
) {
    persistence
        .create_farmer(
            tenant_id,
            name,
            phone,
            &MemberCode::new(member_code),
            TEST_PASSWORD,
        )
        .unwrap();
}

pub fn create_test_staff(persistence: &mut Persistence, tenant_id: TenantId, phone: &str) {
    persistence
        .create_staff(tenant_id, "Sita Sharma", phone, TEST_PASSWORD)
        .unwrap();
}

pub fn staff_actor(tenant_id: TenantId) -> AuthenticatedActor {
    AuthenticatedActor {
        phone: String::from(STAFF_PHONE),
        tenant_id,
        role: Role::DairyStaff,
        member_code: None,
    }
}

pub fn farmer_actor(tenant_id: TenantId, member_code: &str) -> AuthenticatedActor {
    AuthenticatedActor {
        phone: String::from(FARMER_PHONE),
        tenant_id,
        role: Role::Farmer,
        member_code: Some(MemberCode::new(member_code)),
    }
}

/// Builds a valid data row for `member_code` at the given day and shift.
pub fn csv_row(member_code: &str, day: u8, time: &str) -> String {
    format!("2025-10-{day:02},{day:02}/06/2082,{time},{member_code},10.5,4.2,8.5,65.0,682.5,")
}

/// Joins the standard header and `rows` into a CSV upload body.
pub fn csv_file(rows: &[String]) -> Vec<u8> {
    let mut body: String = String::from(CSV_HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    body.into_bytes()
}
