use super::fit::{MisalignmentResult, RevenueImpact};
use super::signals::SignalLog;
use super::snapshot::{HealthStatus, PaymentHealth};

/// Starting value for every subscore family before bands are applied.
pub const BASE_SUBSCORE: i32 = 50;

/// Unclamped subscore for one metric family plus the signals explaining its movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscoreDraft {
    pub base: i32,
    pub delta: i32,
    pub signals: SignalLog,
}

impl SubscoreDraft {
    fn new() -> Self {
        Self {
            base: BASE_SUBSCORE,
            delta: 0,
            signals: SignalLog::default(),
        }
    }

    fn raise(&mut self, points: i32, signal: String) {
        self.delta += points;
        self.signals.positive(signal);
    }

    fn lower(&mut self, points: i32, signal: String) {
        self.delta -= points;
        self.signals.negative(signal);
    }

    pub fn raw(&self) -> i32 {
        self.base + self.delta
    }

    pub fn value(&self) -> u8 {
        clamp_score(self.raw())
    }
}

pub fn clamp_score(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}

/// Trip velocity, fleet size, and team adoption.
///
/// Missing metrics are neutral. A zero trip count is real data and lands in the low band.
pub fn normalize_usage(
    trip_velocity: Option<u32>,
    vehicle_count: Option<u32>,
    member_count: Option<u32>,
) -> SubscoreDraft {
    let mut draft = SubscoreDraft::new();

    match trip_velocity {
        Some(trips) if trips > 100 => {
            draft.raise(30, format!("High trip velocity ({trips} trips/month)"));
        }
        Some(trips) if trips > 50 => {
            draft.raise(20, format!("Strong trip velocity ({trips} trips/month)"));
        }
        Some(trips) if trips > 20 => {
            draft.raise(10, format!("Steady trip volume ({trips} trips/month)"));
        }
        Some(trips) if trips < 5 => {
            draft.lower(20, format!("Low trip velocity ({trips} trips/month)"));
        }
        _ => {}
    }

    match vehicle_count {
        Some(vehicles) if vehicles >= 20 => {
            draft.raise(10, format!("Large fleet ({vehicles} vehicles)"));
        }
        Some(vehicles) if vehicles >= 10 => {
            draft.raise(5, format!("Growing fleet ({vehicles} vehicles)"));
        }
        _ => {}
    }

    match member_count {
        Some(members) if members >= 10 => {
            draft.raise(10, format!("Broad team adoption ({members} users)"));
        }
        Some(members) if members >= 5 => {
            draft.raise(5, format!("Multiple active users ({members} users)"));
        }
        Some(members) if members <= 1 => {
            draft.lower(5, "Single-user account".to_string());
        }
        _ => {}
    }

    draft
}

/// Login recency, onboarding completeness, and the product engagement index.
pub fn normalize_engagement(
    days_since_last_login: Option<u32>,
    setup_score: Option<u8>,
    engagement_score: Option<u8>,
) -> SubscoreDraft {
    let mut draft = SubscoreDraft::new();

    match days_since_last_login {
        Some(days) if days <= 1 => draft.raise(20, "Active in the last day".to_string()),
        Some(days) if days <= 7 => draft.raise(10, "Active this week".to_string()),
        Some(days) if days > 30 => draft.lower(25, format!("No login in {days} days")),
        Some(days) if days > 14 => draft.lower(10, format!("Last login {days} days ago")),
        _ => {}
    }

    match setup_score {
        Some(score) if score >= 80 => draft.raise(15, format!("Setup {score}% complete")),
        Some(score) if score < 40 => draft.lower(15, format!("Setup only {score}% complete")),
        _ => {}
    }

    match engagement_score {
        Some(score) if score >= 70 => {
            draft.raise(15, format!("High engagement score ({score})"));
        }
        Some(score) if score < 30 => {
            draft.lower(15, format!("Low engagement score ({score})"));
        }
        _ => {}
    }

    draft
}

/// CRM health plus billing health.
///
/// The numeric health score only counts when the categorical status is missing or unknown so
/// the same judgement is never applied twice.
pub fn normalize_health(
    health_status: Option<HealthStatus>,
    numeric_health_score: Option<u8>,
    payment_health: Option<PaymentHealth>,
    payment_score: Option<u8>,
) -> SubscoreDraft {
    let mut draft = SubscoreDraft::new();

    match health_status {
        Some(HealthStatus::Green) => draft.raise(25, "Healthy account (green)".to_string()),
        Some(HealthStatus::Yellow) => draft.lower(10, "Health status yellow".to_string()),
        Some(HealthStatus::Red) => draft.lower(30, "Health status red".to_string()),
        Some(HealthStatus::Unknown) => draft
            .signals
            .note("Health status unknown; treated as neutral"),
        None => {}
    }

    if matches!(health_status, None | Some(HealthStatus::Unknown)) {
        match numeric_health_score {
            Some(score) if score >= 70 => {
                draft.raise(15, format!("Strong numeric health score ({score})"));
            }
            Some(score) if score < 40 => {
                draft.lower(15, format!("Weak numeric health score ({score})"));
            }
            _ => {}
        }
    }

    match payment_health {
        Some(PaymentHealth::Good) => draft.raise(10, "Payments in good standing".to_string()),
        Some(PaymentHealth::AtRisk) => {
            draft.lower(15, "Payment issues: payments at risk".to_string());
        }
        Some(PaymentHealth::Critical) => {
            draft.lower(30, "Payment issues: critical payment health".to_string());
        }
        None => {}
    }

    match payment_score {
        Some(score) if score >= 90 => {
            draft.raise(5, format!("Reliable payment history ({score})"));
        }
        Some(score) if score < 50 => draft.lower(10, format!("Weak payment score ({score})")),
        _ => {}
    }

    draft
}

pub fn normalize_tenure(subscription_lifetime_days: Option<u32>) -> SubscoreDraft {
    let mut draft = SubscoreDraft::new();

    match subscription_lifetime_days {
        Some(days) if days >= 730 => draft.raise(40, "Customer for 2+ years".to_string()),
        Some(days) if days >= 365 => {
            draft.raise(30, format!("Customer for over a year ({days} days)"));
        }
        Some(days) if days >= 180 => {
            draft.raise(15, format!("Established customer ({days} days)"));
        }
        Some(days) if days < 90 => draft.lower(20, format!("New customer ({days} days)")),
        _ => {}
    }

    draft
}

/// Commercial fit derived from the misalignment evaluation.
pub fn normalize_fit(fit: &MisalignmentResult) -> SubscoreDraft {
    let mut draft = SubscoreDraft::new();

    if fit.usage_tier.is_none() {
        draft
            .signals
            .note("Fit treated as neutral without usage data");
        return draft;
    }

    match fit.revenue_impact {
        RevenueImpact::Undermonetized => draft.raise(40, fit.reason.clone()),
        RevenueImpact::Aligned => draft.raise(10, "Plan aligned with usage".to_string()),
        RevenueImpact::AtRisk => draft.lower(25, fit.reason.clone()),
    }

    draft
}
