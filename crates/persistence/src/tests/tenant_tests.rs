// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dairy_domain::{Tenant, TenantId};

use super::{create_test_persistence, create_test_tenant};
use crate::PersistenceError;

#[test]
fn test_create_tenant_defaults_to_active() {
    let mut persistence = create_test_persistence();

    let tenant: Tenant = persistence
        .create_tenant("Gokul Dairy", "Chitwan", None)
        .unwrap();

    assert_eq!(tenant.name, "Gokul Dairy");
    assert_eq!(tenant.location, "Chitwan");
    assert_eq!(tenant.contact, None);
    assert!(tenant.is_active);
}

#[test]
fn test_tenant_name_is_unique_ignoring_case() {
    let mut persistence = create_test_persistence();
    create_test_tenant(&mut persistence, "Gokul Dairy");

    let result: Result<Tenant, PersistenceError> =
        persistence.create_tenant("GOKUL dairy", "Pokhara", None);

    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));
}

#[test]
fn test_find_tenant_by_name_ignores_case() {
    let mut persistence = create_test_persistence();
    let created: Tenant = create_test_tenant(&mut persistence, "Gokul Dairy");

    let found: Tenant = persistence
        .find_tenant_by_name("gokul DAIRY")
        .unwrap()
        .unwrap();

    assert_eq!(found.tenant_id, created.tenant_id);
}

#[test]
fn test_get_tenant_returns_none_for_unknown_id() {
    let mut persistence = create_test_persistence();
    assert!(persistence.get_tenant(TenantId::new(999)).unwrap().is_none());
}

#[test]
fn test_list_tenants_pages_in_id_order() {
    let mut persistence = create_test_persistence();
    for name in ["A Dairy", "B Dairy", "C Dairy"] {
        create_test_tenant(&mut persistence, name);
    }

    let (first_page, total) = persistence.list_tenants(0, 2).unwrap();
    assert_eq!(total, 3);
    assert_eq!(
        first_page.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        vec!["A Dairy", "B Dairy"]
    );

    let (second_page, total) = persistence.list_tenants(2, 2).unwrap();
    assert_eq!(total, 3);
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].name, "C Dairy");
}

#[test]
fn test_tenant_name_is_unique_ignoring_non_ascii_case() {
    let mut persistence = create_test_persistence();
    create_test_tenant(&mut persistence, "Éclair Dairy");

    let result: Result<Tenant, PersistenceError> =
        persistence.create_tenant("éCLAIR DAIRY", "Pokhara", None);

    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));
}

#[test]
fn test_find_tenant_by_name_folds_non_ascii_letters() {
    let mut persistence = create_test_persistence();
    let created: Tenant = create_test_tenant(&mut persistence, "ÅRHUS MEJERI");

    let found: Tenant = persistence
        .find_tenant_by_name("århus mejeri")
        .unwrap()
        .unwrap();

    assert_eq!(found.tenant_id, created.tenant_id);
    assert_eq!(found.name, "ÅRHUS MEJERI");
}
