
use chrono::NaiveDate;

use crate::workflows::scoring::{AccountSnapshot, HealthStatus, PaymentHealth};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
}

fn enterprise_renewing() -> AccountSnapshot {
    AccountSnapshot::builder()
        .company_name("Atlas Freight")
        .mrr(7_500.0)
        .plan_code("enterprise")
        .trips_last_30_days(180)
        .days_since_last_login(2)
        .health_status(HealthStatus::Green)
        .payment_health(PaymentHealth::Good)
        .subscription_lifetime_days(900)
        .contract_end_date(NaiveDate::from_ymd_opt(2025, 4, 15).expect("valid date"))
        .build()
}

fn failing_payment_green() -> AccountSnapshot {
    AccountSnapshot::builder()
        .mrr(800.0)
        .trips_last_30_days(140)
        .health_status(HealthStatus::Green)
        .payment_health(PaymentHealth::Critical)
        .subscription_lifetime_days(300)
        .build()
}
