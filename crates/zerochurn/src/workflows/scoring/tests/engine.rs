use chrono::NaiveDate;

use super::common::*;
use crate::workflows::scoring::{
    AccountSnapshot, PaymentHealth, RevenueImpact, ScoreKind, ScoreLevel, Urgency,
};

#[test]
fn established_fleet_scores_high_propensity() {
    let report = engine().score_propensity(&healthy_fleet(), as_of());

    assert_eq!(report.score.kind, ScoreKind::ExpansionPropensity);
    assert_eq!(report.score.level, ScoreLevel::High);
    assert_eq!(report.fit.revenue_impact, RevenueImpact::Aligned);
    assert_eq!(report.score.subscores.fit, 60);
    assert!(report
        .score
        .positive_signals
        .contains(&"High trip velocity (120 trips/month)".to_string()));
    assert!(report
        .score
        .positive_signals
        .contains(&"Customer for over a year (400 days)".to_string()));
    assert!(report.score.negative_signals.is_empty());
}

#[test]
fn signals_follow_subscore_family_order() {
    let result = engine().score_health(&healthy_fleet());

    assert_eq!(
        result.positive_signals,
        vec![
            "High trip velocity (120 trips/month)",
            "Large fleet (25 vehicles)",
            "Active in the last day",
            "Healthy account (green)",
            "Payments in good standing",
            "Reliable payment history (95)",
            "Customer for over a year (400 days)",
        ]
    );
}

#[test]
fn zero_weight_families_leave_no_signals() {
    let snapshot = AccountSnapshot::builder()
        .mrr(150.0)
        .plan_code("starter")
        .trips_last_30_days(10)
        .health_status_label("yellow")
        .build();
    let engine = engine();

    let health = engine.score_health(&snapshot);
    let churn = engine.score_churn_risk(&snapshot);
    let propensity = engine.score_propensity(&snapshot, as_of());

    assert_eq!(propensity.fit.revenue_impact, RevenueImpact::Aligned);
    for result in [&health, &churn] {
        assert!(!result
            .positive_signals
            .contains(&"Plan aligned with usage".to_string()));
    }
    assert!(propensity
        .score
        .positive_signals
        .contains(&"Plan aligned with usage".to_string()));
}

#[test]
fn scoring_is_deterministic() {
    let engine = engine();
    let snapshot = outgrown_starter();

    assert_eq!(
        engine.score_propensity(&snapshot, as_of()),
        engine.score_propensity(&snapshot, as_of())
    );
    assert_eq!(engine.score_health(&snapshot), engine.score_health(&snapshot));
    assert_eq!(
        engine.score_churn_risk(&snapshot),
        engine.score_churn_risk(&snapshot)
    );
}

#[test]
fn critical_payment_caps_urgency_at_low() {
    let snapshot = AccountSnapshot::builder()
        .mrr(5_000.0)
        .plan_code("pro-mid")
        .trips_last_30_days(120)
        .vehicle_count(25)
        .days_since_last_login(0)
        .payment_health(PaymentHealth::Critical)
        .health_status_label("green")
        .subscription_lifetime_days(400)
        .contract_end_date(NaiveDate::from_ymd_opt(2025, 3, 20).expect("valid date"))
        .build();

    let engine = engine();
    let report = engine.score_propensity(&snapshot, as_of());
    let health = engine.score_health(&snapshot);

    assert_eq!(report.urgency, Urgency::Low);
    assert!(report
        .score
        .notes
        .contains(&"Urgency capped at low: payment issues".to_string()));
    assert_eq!(health.subscores.health, 45);
    assert!(health
        .negative_signals
        .iter()
        .any(|signal| signal.starts_with("Payment issues")));
}

#[test]
fn renewal_inside_window_raises_urgency() {
    let engine = engine();
    let mut snapshot = healthy_fleet();
    let without_renewal = engine.score_propensity(&snapshot, as_of());
    assert_eq!(without_renewal.urgency, Urgency::Medium);

    snapshot = AccountSnapshot::builder()
        .mrr(5_000.0)
        .plan_code("pro-mid")
        .trips_last_30_days(120)
        .vehicle_count(25)
        .days_since_last_login(0)
        .payment_health(PaymentHealth::Good)
        .payment_score(95.0)
        .health_status_label("green")
        .subscription_lifetime_days(400)
        .contract_end_date(NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date"))
        .build();
    let with_renewal = engine.score_propensity(&snapshot, as_of());
    assert_eq!(with_renewal.urgency, Urgency::High);
}

#[test]
fn undermonetized_account_reports_opportunities() {
    let report = engine().score_propensity(&outgrown_starter(), as_of());

    assert_eq!(report.fit.revenue_impact, RevenueImpact::Undermonetized);
    assert_eq!(report.score.subscores.fit, 90);
    assert_eq!(report.opportunities.len(), 3);
    assert_eq!(report.estimated_value, 548.0);
    assert!(report
        .score
        .positive_signals
        .contains(&"60 trips/month exceeds Starter tier allowance of 20".to_string()));
}

#[test]
fn empty_snapshot_scores_neutral_without_signals() {
    let snapshot = AccountSnapshot::builder().mrr(0.0).build();
    let engine = engine();

    let propensity = engine.score_propensity(&snapshot, as_of());
    let health = engine.score_health(&snapshot);
    let churn = engine.score_churn_risk(&snapshot);

    assert_eq!(propensity.score.score, 50);
    assert_eq!(propensity.score.level, ScoreLevel::Medium);
    assert_eq!(propensity.urgency, Urgency::Low);
    assert!(propensity.opportunities.is_empty());
    assert_eq!(health.score, 50);
    assert_eq!(health.level, ScoreLevel::Yellow);
    assert_eq!(churn.score, 50);
    assert_eq!(churn.level, ScoreLevel::Medium);

    for result in [&propensity.score, &health, &churn] {
        assert!(result.positive_signals.is_empty());
        assert!(result.negative_signals.is_empty());
    }
    let fit_note = "No usage metrics available to classify fit".to_string();
    assert!(propensity.score.notes.contains(&fit_note));
    assert!(!health.notes.contains(&fit_note));
    assert!(!churn.notes.contains(&fit_note));
}

#[test]
fn worst_case_snapshot_stays_in_bounds() {
    let snapshot = AccountSnapshot::builder()
        .mrr(50.0)
        .plan_code("enterprise")
        .trips_last_30_days(0)
        .vehicle_count(1)
        .member_count(1)
        .days_since_last_login(400)
        .setup_score(0.0)
        .engagement_score(0.0)
        .health_status_label("red")
        .payment_health_label("failed")
        .payment_score(0.0)
        .subscription_lifetime_days(5)
        .build();
    let engine = engine();

    let health = engine.score_health(&snapshot);
    let churn = engine.score_churn_risk(&snapshot);

    assert_eq!(health.subscores.engagement, 0);
    assert_eq!(health.subscores.health, 0);
    assert_eq!(health.level, ScoreLevel::Red);
    assert!(health.score <= 100);
    assert_eq!(churn.level, ScoreLevel::High);
    assert!(churn.score <= 100);
}

#[test]
fn derived_trip_velocity_is_noted() {
    let snapshot = AccountSnapshot::builder()
        .total_trips(2_400)
        .subscription_lifetime_days(720)
        .build();

    let result = engine().score_health(&snapshot);
    assert!(result
        .notes
        .contains(&"Trip velocity derived from lifetime trips (100 trips/month)".to_string()));
}
