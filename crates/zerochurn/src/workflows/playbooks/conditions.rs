use super::{AccountState, Segment};
use crate::workflows::scoring::{HealthStatus, PaymentHealth};
use serde::{Deserialize, Serialize};

/// Declarative predicate over an [`AccountState`].
///
/// Comparisons against a missing metric never match, and neither does their negation: `not`
/// only holds when every input it depends on is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    PaymentHealthIs { value: PaymentHealth },
    HealthStatusIs { value: HealthStatus },
    NumericHealthBelow { threshold: u8 },
    RenewalWithinDays { days: u32 },
    InactiveForDays { days: u32 },
    TripsBelow { trips: u32 },
    TripsAtLeast { trips: u32 },
    RiskSignalsAtLeast { count: u32 },
    SegmentIs { segment: Segment },
    MrrAtLeast { amount: f64 },
    TenureUnderDays { days: u32 },
    TenureAtLeastDays { days: u32 },
    SetupBelow { score: u8 },
    AllOf { conditions: Vec<TriggerCondition> },
    AnyOf { conditions: Vec<TriggerCondition> },
    Not { condition: Box<TriggerCondition> },
}

impl TriggerCondition {
    /// `Some(facts)` when the condition holds, listing the account facts that satisfied it.
    pub fn evaluate(&self, state: &AccountState<'_>) -> Option<Vec<String>> {
        let snapshot = state.snapshot;
        match self {
            Self::PaymentHealthIs { value } => (snapshot.payment_health() == Some(*value))
                .then(|| vec![format!("payment health is {}", value.label())]),
            Self::HealthStatusIs { value } => (snapshot.health_status() == Some(*value))
                .then(|| vec![format!("health status is {}", value.label())]),
            Self::NumericHealthBelow { threshold } => snapshot
                .numeric_health_score()
                .filter(|score| score < threshold)
                .map(|score| vec![format!("numeric health {score} below {threshold}")]),
            Self::RenewalWithinDays { days } => snapshot
                .days_until_renewal(state.as_of)
                .filter(|remaining| (0..=i64::from(*days)).contains(remaining))
                .map(|remaining| vec![format!("renewal in {remaining} days")]),
            Self::InactiveForDays { days } => snapshot
                .days_since_last_login()
                .filter(|idle| idle >= days)
                .map(|idle| vec![format!("no login in {idle} days")]),
            Self::TripsBelow { trips } => snapshot
                .trip_velocity()
                .filter(|velocity| velocity < trips)
                .map(|velocity| vec![format!("{velocity} trips/month below {trips}")]),
            Self::TripsAtLeast { trips } => snapshot
                .trip_velocity()
                .filter(|velocity| velocity >= trips)
                .map(|velocity| vec![format!("{velocity} trips/month")]),
            Self::RiskSignalsAtLeast { count } => (state.risk_signal_count >= *count)
                .then(|| vec![format!("{} risk signals", state.risk_signal_count)]),
            Self::SegmentIs { segment } => (state.segment == *segment)
                .then(|| vec![format!("{} segment", segment.label())]),
            Self::MrrAtLeast { amount } => snapshot
                .mrr()
                .filter(|mrr| mrr >= amount)
                .map(|mrr| vec![format!("MRR ${mrr:.0}")]),
            Self::TenureUnderDays { days } => snapshot
                .subscription_lifetime_days()
                .filter(|tenure| tenure < days)
                .map(|tenure| vec![format!("customer for {tenure} days")]),
            Self::TenureAtLeastDays { days } => snapshot
                .subscription_lifetime_days()
                .filter(|tenure| tenure >= days)
                .map(|tenure| vec![format!("customer for {tenure} days")]),
            Self::SetupBelow { score } => snapshot
                .setup_score()
                .filter(|setup| setup < score)
                .map(|setup| vec![format!("setup {setup}% complete")]),
            Self::AllOf { conditions } => {
                if conditions.is_empty() {
                    return None;
                }
                let mut facts = Vec::new();
                for condition in conditions {
                    facts.extend(condition.evaluate(state)?);
                }
                Some(facts)
            }
            Self::AnyOf { conditions } => conditions
                .iter()
                .find_map(|condition| condition.evaluate(state)),
            Self::Not { condition } => {
                if !condition.is_known(state) || condition.matches(state) {
                    return None;
                }
                Some(vec![format!("not {}", condition.describe())])
            }
        }
    }

    /// Whether the account carries enough data to decide this condition either way.
    pub fn is_known(&self, state: &AccountState<'_>) -> bool {
        let snapshot = state.snapshot;
        match self {
            Self::PaymentHealthIs { .. } => snapshot.payment_health().is_some(),
            Self::HealthStatusIs { .. } => snapshot.health_status().is_some(),
            Self::NumericHealthBelow { .. } => snapshot.numeric_health_score().is_some(),
            Self::RenewalWithinDays { .. } => snapshot.contract_end_date().is_some(),
            Self::InactiveForDays { .. } => snapshot.days_since_last_login().is_some(),
            Self::TripsBelow { .. } | Self::TripsAtLeast { .. } => {
                snapshot.trip_velocity().is_some()
            }
            Self::RiskSignalsAtLeast { .. } | Self::SegmentIs { .. } => true,
            Self::MrrAtLeast { .. } => snapshot.mrr().is_some(),
            Self::TenureUnderDays { .. } | Self::TenureAtLeastDays { .. } => {
                snapshot.subscription_lifetime_days().is_some()
            }
            Self::SetupBelow { .. } => snapshot.setup_score().is_some(),
            // A single known failing branch settles `all_of`; a single match settles `any_of`.
            Self::AllOf { conditions } => {
                conditions.iter().all(|condition| condition.is_known(state))
                    || conditions.iter().any(|condition| {
                        condition.is_known(state) && !condition.matches(state)
                    })
            }
            Self::AnyOf { conditions } => {
                conditions.iter().all(|condition| condition.is_known(state))
                    || conditions.iter().any(|condition| condition.matches(state))
            }
            Self::Not { condition } => condition.is_known(state),
        }
    }

    pub fn matches(&self, state: &AccountState<'_>) -> bool {
        self.evaluate(state).is_some()
    }

    /// Static description of the predicate, independent of any account.
    pub fn describe(&self) -> String {
        match self {
            Self::PaymentHealthIs { value } => format!("payment health is {}", value.label()),
            Self::HealthStatusIs { value } => format!("health status is {}", value.label()),
            Self::NumericHealthBelow { threshold } => format!("numeric health below {threshold}"),
            Self::RenewalWithinDays { days } => format!("renewal within {days} days"),
            Self::InactiveForDays { days } => format!("inactive for {days}+ days"),
            Self::TripsBelow { trips } => format!("fewer than {trips} trips/month"),
            Self::TripsAtLeast { trips } => format!("at least {trips} trips/month"),
            Self::RiskSignalsAtLeast { count } => format!("{count}+ risk signals"),
            Self::SegmentIs { segment } => format!("{} segment", segment.label()),
            Self::MrrAtLeast { amount } => format!("MRR at least ${amount:.0}"),
            Self::TenureUnderDays { days } => format!("customer for under {days} days"),
            Self::TenureAtLeastDays { days } => format!("customer for {days}+ days"),
            Self::SetupBelow { score } => format!("setup below {score}%"),
            Self::AllOf { conditions } => join_descriptions(conditions, " and "),
            Self::AnyOf { conditions } => join_descriptions(conditions, " or "),
            Self::Not { condition } => format!("not {}", condition.describe()),
        }
    }
}

fn join_descriptions(conditions: &[TriggerCondition], separator: &str) -> String {
    let parts: Vec<String> = conditions.iter().map(TriggerCondition::describe).collect();
    format!("({})", parts.join(separator))
}
