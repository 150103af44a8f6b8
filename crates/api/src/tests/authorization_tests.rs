// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dairy_domain::{MemberCode, TenantId};

use crate::tests::helpers::{farmer_actor, staff_actor};
use crate::{AuthError, AuthorizationService};

#[test]
fn test_staff_may_upload_and_view_tenant_records() {
    let staff = staff_actor(TenantId::new(1));

    assert!(AuthorizationService::authorize_upload_collection(&staff).is_ok());
    assert!(AuthorizationService::authorize_view_dairy_records(&staff).is_ok());
    assert!(AuthorizationService::authorize_list_staff(&staff).is_ok());
    assert!(AuthorizationService::authorize_create_staff(&staff).is_ok());
}

#[test]
fn test_farmer_may_not_upload() {
    let farmer = farmer_actor(TenantId::new(1), "M-101");

    let result = AuthorizationService::authorize_upload_collection(&farmer);

    assert_eq!(
        result,
        Err(AuthError::Unauthorized {
            action: String::from("upload_collection"),
            required_role: String::from("ROLE_DAIRY_STAFF"),
        })
    );
}

#[test]
fn test_farmer_may_not_view_tenant_records_or_staff() {
    let farmer = farmer_actor(TenantId::new(1), "M-101");

    assert!(AuthorizationService::authorize_view_dairy_records(&farmer).is_err());
    assert!(AuthorizationService::authorize_list_staff(&farmer).is_err());
    assert!(AuthorizationService::authorize_create_staff(&farmer).is_err());
}

#[test]
fn test_farmer_may_view_only_own_member_records() {
    let farmer = farmer_actor(TenantId::new(1), "M-101");

    assert!(
        AuthorizationService::authorize_view_member_records(&farmer, &MemberCode::new("M-101"))
            .is_ok()
    );
    assert!(
        AuthorizationService::authorize_view_member_records(&farmer, &MemberCode::new("M-102"))
            .is_err()
    );
}

#[test]
fn test_staff_may_view_any_member_records() {
    let staff = staff_actor(TenantId::new(1));

    assert!(
        AuthorizationService::authorize_view_member_records(&staff, &MemberCode::new("M-555"))
            .is_ok()
    );
}
