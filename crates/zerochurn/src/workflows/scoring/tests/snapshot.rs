use chrono::NaiveDate;

use crate::workflows::scoring::{
    AccountSnapshot, AccountSnapshotInput, HealthStatus, PaymentHealth,
};

#[test]
fn builder_clamps_negative_counts_and_notes_them() {
    let snapshot = AccountSnapshot::builder()
        .vehicle_count(-4)
        .mrr(-120.0)
        .build();

    assert_eq!(snapshot.vehicle_count(), Some(0));
    assert_eq!(snapshot.mrr(), Some(0.0));
    assert_eq!(
        snapshot.notes(),
        ["vehicle count -4 clamped to 0", "MRR -120.00 clamped to 0"]
    );
}

#[test]
fn builder_clamps_percentages_into_range() {
    let snapshot = AccountSnapshot::builder()
        .setup_score(140.0)
        .engagement_score(f64::NAN)
        .payment_score(-5.0)
        .build();

    assert_eq!(snapshot.setup_score(), Some(100));
    assert_eq!(snapshot.engagement_score(), None);
    assert_eq!(snapshot.payment_score(), Some(0));
    assert_eq!(snapshot.notes().len(), 3);
    assert_eq!(snapshot.notes()[0], "setup score 140 clamped to 100");
}

#[test]
fn unknown_labels_fall_back_with_notes() {
    let snapshot = AccountSnapshot::builder()
        .payment_health_label("overdue-ish")
        .health_status_label("purple")
        .build();

    assert_eq!(snapshot.payment_health(), None);
    assert_eq!(snapshot.health_status(), Some(HealthStatus::Unknown));
    assert_eq!(snapshot.notes().len(), 2);
}

#[test]
fn labels_accept_upstream_spellings() {
    assert_eq!(PaymentHealth::from_label("At Risk"), Some(PaymentHealth::AtRisk));
    assert_eq!(PaymentHealth::from_label("at-risk"), Some(PaymentHealth::AtRisk));
    assert_eq!(HealthStatus::from_label(" GREEN "), Some(HealthStatus::Green));
}

#[test]
fn trip_velocity_prefers_thirty_day_count() {
    let snapshot = AccountSnapshot::builder()
        .total_trips(9_000)
        .trips_last_30_days(42)
        .subscription_lifetime_days(300)
        .build();

    assert_eq!(snapshot.trip_velocity(), Some(42));
    assert!(!snapshot.trip_velocity_is_derived());
}

#[test]
fn trip_velocity_spreads_lifetime_trips_over_at_least_a_month() {
    let established = AccountSnapshot::builder()
        .total_trips(900)
        .subscription_lifetime_days(300)
        .build();
    let brand_new = AccountSnapshot::builder()
        .total_trips(900)
        .subscription_lifetime_days(10)
        .build();
    let no_lifetime = AccountSnapshot::builder().total_trips(900).build();

    assert_eq!(established.trip_velocity(), Some(90));
    assert!(established.trip_velocity_is_derived());
    assert_eq!(brand_new.trip_velocity(), Some(900));
    assert_eq!(no_lifetime.trip_velocity(), None);
}

#[test]
fn days_until_renewal_is_signed() {
    let snapshot = AccountSnapshot::builder()
        .contract_end_date(NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date"))
        .build();

    let early = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
    let late = NaiveDate::from_ymd_opt(2025, 4, 10).expect("valid date");
    assert_eq!(snapshot.days_until_renewal(early), Some(30));
    assert_eq!(snapshot.days_until_renewal(late), Some(-10));
}

#[test]
fn input_payload_maps_upstream_field_names() {
    let input: AccountSnapshotInput = serde_json::from_value(serde_json::json!({
        "companyId": "acct-9",
        "mrr": 1250.5,
        "plan": "standard",
        "contractEndDate": "2025-06-30",
        "tripsLast30Days": 33,
        "healthScore": "yellow",
        "paymentHealth": "good",
        "activeAddOns": ["Payments", " "]
    }))
    .expect("payload deserializes");

    let snapshot = input.into_snapshot();
    assert_eq!(snapshot.company_id(), Some("acct-9"));
    assert_eq!(snapshot.plan_code(), Some("standard"));
    assert_eq!(snapshot.trip_velocity(), Some(33));
    assert_eq!(snapshot.health_status(), Some(HealthStatus::Yellow));
    assert_eq!(snapshot.payment_health(), Some(PaymentHealth::Good));
    assert!(snapshot.has_add_on("payments"));
    assert_eq!(snapshot.active_add_ons().len(), 1);
    assert!(snapshot.notes().is_empty());
}

#[test]
fn display_name_falls_back_to_id() {
    let named = AccountSnapshot::builder()
        .company_id("acct-1")
        .company_name("Acme")
        .build();
    let unnamed = AccountSnapshot::builder().company_id("acct-2").build();

    assert_eq!(named.display_name(), "Acme");
    assert_eq!(unnamed.display_name(), "acct-2");
    assert_eq!(AccountSnapshot::default().display_name(), "unnamed account");
}
