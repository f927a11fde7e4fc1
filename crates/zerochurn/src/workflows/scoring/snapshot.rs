use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Billing health reported by the payment processor sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentHealth {
    Good,
    AtRisk,
    Critical,
}

impl PaymentHealth {
    pub fn from_label(value: &str) -> Option<Self> {
        match normalize_label(value).as_str() {
            "good" | "healthy" => Some(Self::Good),
            "at_risk" | "atrisk" | "warning" => Some(Self::AtRisk),
            "critical" | "failed" => Some(Self::Critical),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::AtRisk => "at_risk",
            Self::Critical => "critical",
        }
    }
}

/// Categorical health judgement carried over from the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl HealthStatus {
    pub fn from_label(value: &str) -> Option<Self> {
        match normalize_label(value).as_str() {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            "unknown" | "" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Unknown => "unknown",
        }
    }
}

fn normalize_label(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// One account at one evaluation instant.
///
/// Every field is optional because upstream syncs are routinely incomplete. Values are
/// range-checked by [`AccountSnapshotBuilder`]; anything it had to clamp or discard is kept in
/// [`AccountSnapshot::notes`] so scoring results can surface it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountSnapshot {
    company_id: Option<String>,
    company_name: Option<String>,
    mrr: Option<f64>,
    plan_code: Option<String>,
    contract_end_date: Option<NaiveDate>,
    total_trips: Option<u32>,
    trips_last_30_days: Option<u32>,
    vehicle_count: Option<u32>,
    driver_count: Option<u32>,
    member_count: Option<u32>,
    days_since_last_login: Option<u32>,
    setup_score: Option<u8>,
    engagement_score: Option<u8>,
    payment_health: Option<PaymentHealth>,
    payment_score: Option<u8>,
    health_status: Option<HealthStatus>,
    numeric_health_score: Option<u8>,
    subscription_lifetime_days: Option<u32>,
    active_add_ons: BTreeSet<String>,
    notes: Vec<String>,
}

impl AccountSnapshot {
    pub fn builder() -> AccountSnapshotBuilder {
        AccountSnapshotBuilder::default()
    }

    pub fn company_id(&self) -> Option<&str> {
        self.company_id.as_deref()
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn mrr(&self) -> Option<f64> {
        self.mrr
    }

    pub fn plan_code(&self) -> Option<&str> {
        self.plan_code.as_deref()
    }

    pub fn contract_end_date(&self) -> Option<NaiveDate> {
        self.contract_end_date
    }

    pub fn total_trips(&self) -> Option<u32> {
        self.total_trips
    }

    pub fn trips_last_30_days(&self) -> Option<u32> {
        self.trips_last_30_days
    }

    pub fn vehicle_count(&self) -> Option<u32> {
        self.vehicle_count
    }

    pub fn driver_count(&self) -> Option<u32> {
        self.driver_count
    }

    pub fn member_count(&self) -> Option<u32> {
        self.member_count
    }

    pub fn days_since_last_login(&self) -> Option<u32> {
        self.days_since_last_login
    }

    pub fn setup_score(&self) -> Option<u8> {
        self.setup_score
    }

    pub fn engagement_score(&self) -> Option<u8> {
        self.engagement_score
    }

    pub fn payment_health(&self) -> Option<PaymentHealth> {
        self.payment_health
    }

    pub fn payment_score(&self) -> Option<u8> {
        self.payment_score
    }

    pub fn health_status(&self) -> Option<HealthStatus> {
        self.health_status
    }

    pub fn numeric_health_score(&self) -> Option<u8> {
        self.numeric_health_score
    }

    pub fn subscription_lifetime_days(&self) -> Option<u32> {
        self.subscription_lifetime_days
    }

    pub fn active_add_ons(&self) -> &BTreeSet<String> {
        &self.active_add_ons
    }

    pub fn has_add_on(&self, code: &str) -> bool {
        self.active_add_ons.contains(code)
    }

    /// Data-quality notes recorded while the snapshot was built.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Monthly trip velocity.
    ///
    /// Prefers the reported 30-day count. Without it, lifetime trips are spread evenly across the
    /// subscription lifetime (never less than one month).
    pub fn trip_velocity(&self) -> Option<u32> {
        if let Some(trips) = self.trips_last_30_days {
            return Some(trips);
        }

        let total = self.total_trips?;
        let lifetime = self.subscription_lifetime_days?.max(30);
        let per_month = (u64::from(total) * 30) / u64::from(lifetime);
        Some(per_month.min(u64::from(u32::MAX)) as u32)
    }

    pub fn trip_velocity_is_derived(&self) -> bool {
        self.trips_last_30_days.is_none() && self.trip_velocity().is_some()
    }

    /// Signed days from `as_of` to the contract end; negative once the contract has lapsed.
    pub fn days_until_renewal(&self, as_of: NaiveDate) -> Option<i64> {
        self.contract_end_date
            .map(|end_date| (end_date - as_of).num_days())
    }

    pub fn display_name(&self) -> &str {
        self.company_name
            .as_deref()
            .or(self.company_id.as_deref())
            .unwrap_or("unnamed account")
    }
}

/// The single construction path for [`AccountSnapshot`].
///
/// Out-of-range values are clamped rather than rejected and each clamp is noted.
#[derive(Debug, Clone, Default)]
pub struct AccountSnapshotBuilder {
    snapshot: AccountSnapshot,
}

impl AccountSnapshotBuilder {
    pub fn company_id(mut self, value: impl Into<String>) -> Self {
        self.snapshot.company_id = non_blank(value.into());
        self
    }

    pub fn company_name(mut self, value: impl Into<String>) -> Self {
        self.snapshot.company_name = non_blank(value.into());
        self
    }

    pub fn mrr(mut self, value: f64) -> Self {
        self.snapshot.mrr = if !value.is_finite() {
            self.note(format!("MRR {value} is not a number; treated as missing"));
            None
        } else if value < 0.0 {
            self.note(format!("MRR {value:.2} clamped to 0"));
            Some(0.0)
        } else {
            Some(value)
        };
        self
    }

    pub fn plan_code(mut self, value: impl Into<String>) -> Self {
        self.snapshot.plan_code = non_blank(value.into());
        self
    }

    pub fn contract_end_date(mut self, value: NaiveDate) -> Self {
        self.snapshot.contract_end_date = Some(value);
        self
    }

    pub fn total_trips(mut self, value: i64) -> Self {
        self.snapshot.total_trips = Some(self.count("total trips", value));
        self
    }

    pub fn trips_last_30_days(mut self, value: i64) -> Self {
        self.snapshot.trips_last_30_days = Some(self.count("trips in the last 30 days", value));
        self
    }

    pub fn vehicle_count(mut self, value: i64) -> Self {
        self.snapshot.vehicle_count = Some(self.count("vehicle count", value));
        self
    }

    pub fn driver_count(mut self, value: i64) -> Self {
        self.snapshot.driver_count = Some(self.count("driver count", value));
        self
    }

    pub fn member_count(mut self, value: i64) -> Self {
        self.snapshot.member_count = Some(self.count("member count", value));
        self
    }

    pub fn days_since_last_login(mut self, value: i64) -> Self {
        self.snapshot.days_since_last_login = Some(self.count("days since last login", value));
        self
    }

    pub fn setup_score(mut self, value: f64) -> Self {
        self.snapshot.setup_score = self.percentage("setup score", value);
        self
    }

    pub fn engagement_score(mut self, value: f64) -> Self {
        self.snapshot.engagement_score = self.percentage("engagement score", value);
        self
    }

    pub fn payment_health(mut self, value: PaymentHealth) -> Self {
        self.snapshot.payment_health = Some(value);
        self
    }

    /// Accepts the raw upstream label; unrecognized labels are dropped with a note.
    pub fn payment_health_label(mut self, value: &str) -> Self {
        self.snapshot.payment_health = PaymentHealth::from_label(value);
        if self.snapshot.payment_health.is_none() {
            self.note(format!(
                "Unrecognized payment health '{value}'; treated as missing"
            ));
        }
        self
    }

    pub fn payment_score(mut self, value: f64) -> Self {
        self.snapshot.payment_score = self.percentage("payment score", value);
        self
    }

    pub fn health_status(mut self, value: HealthStatus) -> Self {
        self.snapshot.health_status = Some(value);
        self
    }

    /// Accepts the raw upstream label; unrecognized labels fall back to `unknown`.
    pub fn health_status_label(mut self, value: &str) -> Self {
        let status = HealthStatus::from_label(value);
        if status.is_none() {
            self.note(format!(
                "Unrecognized health status '{value}'; treated as unknown"
            ));
        }
        self.snapshot.health_status = Some(status.unwrap_or(HealthStatus::Unknown));
        self
    }

    pub fn numeric_health_score(mut self, value: f64) -> Self {
        self.snapshot.numeric_health_score = self.percentage("numeric health score", value);
        self
    }

    pub fn subscription_lifetime_days(mut self, value: i64) -> Self {
        self.snapshot.subscription_lifetime_days =
            Some(self.count("subscription lifetime days", value));
        self
    }

    pub fn active_add_on(mut self, code: impl Into<String>) -> Self {
        if let Some(code) = non_blank(code.into()) {
            self.snapshot
                .active_add_ons
                .insert(code.to_ascii_lowercase());
        }
        self
    }

    pub fn build(self) -> AccountSnapshot {
        self.snapshot
    }

    fn note(&mut self, message: String) {
        self.snapshot.notes.push(message);
    }

    fn count(&mut self, field: &str, value: i64) -> u32 {
        if value < 0 {
            self.note(format!("{field} {value} clamped to 0"));
            0
        } else if value > i64::from(u32::MAX) {
            self.note(format!("{field} {value} clamped to {}", u32::MAX));
            u32::MAX
        } else {
            value as u32
        }
    }

    fn percentage(&mut self, field: &str, value: f64) -> Option<u8> {
        if !value.is_finite() {
            self.note(format!("{field} {value} is not a number; treated as missing"));
            return None;
        }

        let clamped = value.clamp(0.0, 100.0);
        if clamped != value {
            self.note(format!("{field} {value} clamped to {clamped}"));
        }
        Some(clamped.round() as u8)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Loosely-typed account payload as delivered by CRM, billing, and usage syncs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountSnapshotInput {
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub mrr: Option<f64>,
    #[serde(alias = "plan")]
    pub plan_code: Option<String>,
    pub contract_end_date: Option<NaiveDate>,
    pub total_trips: Option<i64>,
    pub trips_last_30_days: Option<i64>,
    pub vehicle_count: Option<i64>,
    pub driver_count: Option<i64>,
    pub member_count: Option<i64>,
    pub days_since_last_login: Option<i64>,
    pub setup_score: Option<f64>,
    pub engagement_score: Option<f64>,
    pub payment_health: Option<String>,
    pub payment_score: Option<f64>,
    #[serde(rename = "healthScore")]
    pub health_status: Option<String>,
    pub numeric_health_score: Option<f64>,
    pub subscription_lifetime_days: Option<i64>,
    pub active_add_ons: Vec<String>,
}

impl AccountSnapshotInput {
    pub fn into_snapshot(self) -> AccountSnapshot {
        let mut builder = AccountSnapshot::builder();

        if let Some(value) = self.company_id {
            builder = builder.company_id(value);
        }
        if let Some(value) = self.company_name {
            builder = builder.company_name(value);
        }
        if let Some(value) = self.mrr {
            builder = builder.mrr(value);
        }
        if let Some(value) = self.plan_code {
            builder = builder.plan_code(value);
        }
        if let Some(value) = self.contract_end_date {
            builder = builder.contract_end_date(value);
        }
        if let Some(value) = self.total_trips {
            builder = builder.total_trips(value);
        }
        if let Some(value) = self.trips_last_30_days {
            builder = builder.trips_last_30_days(value);
        }
        if let Some(value) = self.vehicle_count {
            builder = builder.vehicle_count(value);
        }
        if let Some(value) = self.driver_count {
            builder = builder.driver_count(value);
        }
        if let Some(value) = self.member_count {
            builder = builder.member_count(value);
        }
        if let Some(value) = self.days_since_last_login {
            builder = builder.days_since_last_login(value);
        }
        if let Some(value) = self.setup_score {
            builder = builder.setup_score(value);
        }
        if let Some(value) = self.engagement_score {
            builder = builder.engagement_score(value);
        }
        if let Some(value) = self.payment_health.as_deref() {
            builder = builder.payment_health_label(value);
        }
        if let Some(value) = self.payment_score {
            builder = builder.payment_score(value);
        }
        if let Some(value) = self.health_status.as_deref() {
            builder = builder.health_status_label(value);
        }
        if let Some(value) = self.numeric_health_score {
            builder = builder.numeric_health_score(value);
        }
        if let Some(value) = self.subscription_lifetime_days {
            builder = builder.subscription_lifetime_days(value);
        }
        for code in self.active_add_ons {
            builder = builder.active_add_on(code);
        }

        builder.build()
    }
}

impl From<AccountSnapshotInput> for AccountSnapshot {
    fn from(value: AccountSnapshotInput) -> Self {
        value.into_snapshot()
    }
}
