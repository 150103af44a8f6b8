// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dairy_domain::{MemberCode, TenantId};
use dairy_persistence::Persistence;

use crate::tests::helpers::{
    FARMER_PHONE, create_test_persistence, create_test_tenant, csv_file, csv_row, farmer_actor,
    register_test_farmer, staff_actor,
};
use crate::{
    ApiError, CollectionRecordInfo, CollectionRecordListResponse, CsvIngestionPipeline,
    TenantContext, UNKNOWN_FARMER_NAME, dairy_monthly_records, farmer_monthly_records,
    farmer_records,
};

/// One tenant with a registered farmer `M-101` and records for `M-101`
/// and the unregistered `M-202`, all in auxiliary month 06/2082.
fn setup() -> (Persistence, TenantId) {
    let mut persistence: Persistence = create_test_persistence();
    let tenant_id: TenantId = create_test_tenant(&mut persistence, "Shree Dairy");
    register_test_farmer(&mut persistence, tenant_id, "Ram Bahadur", FARMER_PHONE, "M-101");

    let rows: Vec<String> = vec![
        csv_row("M-101", 2, "17:30"),
        csv_row("M-101", 2, "06:30"),
        csv_row("M-202", 1, "06:30"),
        csv_row("M-101", 1, "06:30"),
    ];
    CsvIngestionPipeline::default()
        .ingest(&csv_file(&rows), tenant_id, &mut persistence)
        .unwrap();

    (persistence, tenant_id)
}

#[test]
fn test_farmer_reads_own_monthly_records_in_order() {
    let (mut persistence, tenant_id) = setup();
    let mut context: TenantContext = TenantContext::with_tenant(tenant_id);

    let response: CollectionRecordListResponse = farmer_monthly_records(
        &mut persistence,
        &mut context,
        &farmer_actor(tenant_id, "M-101"),
        &MemberCode::new("M-101"),
        "06",
        "2082",
    )
    .unwrap();

    let order: Vec<(String, String)> = response
        .records
        .iter()
        .map(|r| (r.collection_date.clone(), r.collection_time.clone()))
        .collect();
    assert_eq!(
        order,
        vec![
            (String::from("2025-10-01"), String::from("06:30")),
            (String::from("2025-10-02"), String::from("06:30")),
            (String::from("2025-10-02"), String::from("17:30")),
        ]
    );
    assert_eq!(response.message, "Monthly records retrieved");

    let first: &CollectionRecordInfo = &response.records[0];
    assert_eq!(first.farmer_name, "Ram Bahadur");
    assert_eq!(first.dairy_center_name, "Shree Dairy");
    assert_eq!(first.nepali_date, "01/06/2082");
    assert_eq!(first.nepali_month, "06");
    assert!(first.id.is_some());
    assert_eq!(context.get(), None);
}

#[test]
fn test_farmer_cannot_read_other_member_records() {
    let (mut persistence, tenant_id) = setup();
    let mut context: TenantContext = TenantContext::with_tenant(tenant_id);

    let result = farmer_monthly_records(
        &mut persistence,
        &mut context,
        &farmer_actor(tenant_id, "M-101"),
        &MemberCode::new("M-202"),
        "06",
        "2082",
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert_eq!(context.get(), None);
}

#[test]
fn test_unregistered_member_code_shows_unknown_farmer() {
    let (mut persistence, tenant_id) = setup();
    let mut context: TenantContext = TenantContext::with_tenant(tenant_id);

    let response: CollectionRecordListResponse = farmer_records(
        &mut persistence,
        &mut context,
        &staff_actor(tenant_id),
        &MemberCode::new("M-202"),
    )
    .unwrap();

    assert_eq!(response.records.len(), 1);
    assert_eq!(response.records[0].farmer_name, UNKNOWN_FARMER_NAME);
}

#[test]
fn test_empty_month_has_descriptive_message() {
    let (mut persistence, tenant_id) = setup();
    let mut context: TenantContext = TenantContext::with_tenant(tenant_id);

    let response: CollectionRecordListResponse = farmer_monthly_records(
        &mut persistence,
        &mut context,
        &staff_actor(tenant_id),
        &MemberCode::new("M-101"),
        "07",
        "2082",
    )
    .unwrap();

    assert!(response.records.is_empty());
    assert_eq!(response.message, "No records found for farmer M-101 in 07/2082");
}

#[test]
fn test_staff_reads_whole_dairy_month() {
    let (mut persistence, tenant_id) = setup();
    let mut context: TenantContext = TenantContext::with_tenant(tenant_id);

    let response: CollectionRecordListResponse = dairy_monthly_records(
        &mut persistence,
        &mut context,
        &staff_actor(tenant_id),
        "06",
        "2082",
    )
    .unwrap();

    assert_eq!(response.records.len(), 4);
    assert_eq!(response.message, "Dairy monthly records retrieved");
}

#[test]
fn test_farmer_cannot_read_whole_dairy_month() {
    let (mut persistence, tenant_id) = setup();
    let mut context: TenantContext = TenantContext::with_tenant(tenant_id);

    let result = dairy_monthly_records(
        &mut persistence,
        &mut context,
        &farmer_actor(tenant_id, "M-101"),
        "06",
        "2082",
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_other_tenant_sees_none_of_the_records() {
    let (mut persistence, _) = setup();
    let other_tenant: TenantId = create_test_tenant(&mut persistence, "Other Dairy");
    let mut context: TenantContext = TenantContext::with_tenant(other_tenant);

    let response: CollectionRecordListResponse = dairy_monthly_records(
        &mut persistence,
        &mut context,
        &staff_actor(other_tenant),
        "06",
        "2082",
    )
    .unwrap();

    assert!(response.records.is_empty());
    assert_eq!(response.message, "No records found for 06/2082");
}
