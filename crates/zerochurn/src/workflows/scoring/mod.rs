//! Deterministic scoring engine.
//!
//! Raw account metrics flow through the normalizer (one bounded subscore per metric family),
//! the fit evaluator (tier misalignment), and the composer (weighted score plus level). Every
//! branch that moves a subscore records a signal so results can be explained without rerunning
//! the engine.

pub mod composer;
pub mod fit;
pub mod normalizer;
pub mod signals;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use composer::{
    LevelBand, LevelTable, ProfileError, ScoreKind, ScoreLevel, ScoreProfile, Subscores, Weights,
};
pub use fit::{
    AddOnDefinition, MisalignmentResult, Opportunity, OpportunityKind, RevenueImpact,
    TierCatalog, TierDefinition,
};
pub use signals::SignalLog;
pub use snapshot::{
    AccountSnapshot, AccountSnapshotBuilder, AccountSnapshotInput, HealthStatus, PaymentHealth,
};

use crate::config::EngineConfig;
use chrono::NaiveDate;
use normalizer::{
    normalize_engagement, normalize_fit, normalize_health, normalize_tenure, normalize_usage,
};
use serde::{Deserialize, Serialize};

/// Composite score with the subscores and signals that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub kind: ScoreKind,
    pub score: u8,
    pub level: ScoreLevel,
    pub subscores: Subscores,
    pub positive_signals: Vec<String>,
    pub negative_signals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// How soon an expansion conversation should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropensityReport {
    pub score: ScoreResult,
    pub fit: MisalignmentResult,
    pub urgency: Urgency,
    pub opportunities: Vec<Opportunity>,
    pub estimated_value: f64,
}

/// Stateless scoring facade over an [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: EngineConfig,
}

impl ScoringEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluate_fit(&self, snapshot: &AccountSnapshot) -> MisalignmentResult {
        fit::evaluate_fit(
            snapshot.mrr(),
            snapshot.plan_code(),
            snapshot.vehicle_count(),
            snapshot.driver_count(),
            snapshot.trip_velocity(),
            &self.config.tiers,
        )
    }

    pub fn score_health(&self, snapshot: &AccountSnapshot) -> ScoreResult {
        let fit = self.evaluate_fit(snapshot);
        score_with(&self.config.health, snapshot, &fit)
    }

    pub fn score_churn_risk(&self, snapshot: &AccountSnapshot) -> ScoreResult {
        let fit = self.evaluate_fit(snapshot);
        score_with(&self.config.churn_risk, snapshot, &fit)
    }

    /// Expansion propensity with fit, urgency, and the upsell opportunities behind it.
    pub fn score_propensity(&self, snapshot: &AccountSnapshot, as_of: NaiveDate) -> PropensityReport {
        let fit = self.evaluate_fit(snapshot);
        let mut score = score_with(&self.config.propensity, snapshot, &fit);
        let mut urgency_notes = Vec::new();
        let urgency = expansion_urgency(
            snapshot,
            score.level,
            &fit,
            as_of,
            self.config.renewal_window_days,
            &mut urgency_notes,
        );
        score.notes.extend(urgency_notes);
        let opportunities =
            fit::opportunities(snapshot, &fit, &self.config.tiers, &self.config.add_ons);
        let estimated_value = fit::estimated_value(&opportunities);

        PropensityReport {
            score,
            fit,
            urgency,
            opportunities,
            estimated_value,
        }
    }
}

fn score_with(
    profile: &ScoreProfile,
    snapshot: &AccountSnapshot,
    fit: &MisalignmentResult,
) -> ScoreResult {
    let mut signals = SignalLog::default();
    for note in snapshot.notes() {
        signals.note(note.clone());
    }

    let trip_velocity = snapshot.trip_velocity();
    if snapshot.trip_velocity_is_derived() {
        if let Some(trips) = trip_velocity {
            signals.note(format!(
                "Trip velocity derived from lifetime trips ({trips} trips/month)"
            ));
        }
    }

    let usage = normalize_usage(
        trip_velocity,
        snapshot.vehicle_count(),
        snapshot.member_count(),
    );
    let engagement = normalize_engagement(
        snapshot.days_since_last_login(),
        snapshot.setup_score(),
        snapshot.engagement_score(),
    );
    let health = normalize_health(
        snapshot.health_status(),
        snapshot.numeric_health_score(),
        snapshot.payment_health(),
        snapshot.payment_score(),
    );
    let tenure = normalize_tenure(snapshot.subscription_lifetime_days());
    let fit_draft = normalize_fit(fit);

    let subscores = Subscores {
        usage: usage.value(),
        engagement: engagement.value(),
        health: health.value(),
        tenure: tenure.value(),
        fit: fit_draft.value(),
    };

    // A family with zero weight cannot move the score, so it contributes no explanation.
    let weights = &profile.weights;
    if weights.fit > 0.0 {
        for note in &fit.notes {
            signals.note(note.clone());
        }
    }
    for (draft, weight) in [
        (usage, weights.usage),
        (engagement, weights.engagement),
        (health, weights.health),
        (tenure, weights.tenure),
        (fit_draft, weights.fit),
    ] {
        if weight > 0.0 {
            signals.append(draft.signals);
        }
    }

    let (score, level) = profile.compose(&subscores);

    ScoreResult {
        kind: profile.kind,
        score,
        level,
        subscores,
        positive_signals: signals.positive,
        negative_signals: signals.negative,
        notes: signals.notes,
    }
}

/// Payment trouble or a red account caps urgency at low whatever the positives say.
fn expansion_urgency(
    snapshot: &AccountSnapshot,
    level: ScoreLevel,
    fit: &MisalignmentResult,
    as_of: NaiveDate,
    renewal_window_days: u32,
    notes: &mut Vec<String>,
) -> Urgency {
    if snapshot.payment_health() == Some(PaymentHealth::Critical) {
        notes.push("Urgency capped at low: payment issues".to_string());
        return Urgency::Low;
    }
    if snapshot.health_status() == Some(HealthStatus::Red) {
        notes.push("Urgency capped at low: account health red".to_string());
        return Urgency::Low;
    }

    let undermonetized = fit.revenue_impact == RevenueImpact::Undermonetized;
    let renewal_close = snapshot
        .days_until_renewal(as_of)
        .map(|days| (0..=i64::from(renewal_window_days)).contains(&days))
        .unwrap_or(false);
    let high_propensity = level == ScoreLevel::High;

    if high_propensity && (undermonetized || renewal_close) {
        Urgency::High
    } else if high_propensity || undermonetized {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}
