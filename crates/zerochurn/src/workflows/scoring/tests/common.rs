use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::workflows::scoring::{AccountSnapshot, HealthStatus, PaymentHealth, ScoringEngine};

pub(super) fn engine() -> ScoringEngine {
    ScoringEngine::new(EngineConfig::default())
}

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
}

/// Established, healthy fleet paying for the tier its usage fits.
pub(super) fn healthy_fleet() -> AccountSnapshot {
    AccountSnapshot::builder()
        .company_id("acct-100")
        .company_name("Northwind Logistics")
        .mrr(5_000.0)
        .plan_code("pro-mid")
        .trips_last_30_days(120)
        .vehicle_count(25)
        .days_since_last_login(0)
        .payment_health(PaymentHealth::Good)
        .payment_score(95.0)
        .health_status(HealthStatus::Green)
        .subscription_lifetime_days(400)
        .build()
}

/// Small account whose usage has outgrown the Starter tier.
pub(super) fn outgrown_starter() -> AccountSnapshot {
    AccountSnapshot::builder()
        .company_id("acct-200")
        .company_name("Metro Couriers")
        .mrr(300.0)
        .plan_code("starter")
        .trips_last_30_days(60)
        .vehicle_count(6)
        .active_add_on("Driver_App")
        .build()
}
