use super::snapshot::AccountSnapshot;
use serde::{Deserialize, Serialize};

/// One commercial tier with its usage allowances and monthly price band.
///
/// `None` allowances are unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub name: String,
    pub plan_codes: Vec<String>,
    pub max_vehicles: Option<u32>,
    pub max_drivers: Option<u32>,
    pub max_trips: Option<u32>,
    pub price_floor: f64,
    pub price_ceiling: Option<f64>,
}

impl TierDefinition {
    fn allowance(&self, metric: UsageMetric) -> Option<u32> {
        match metric {
            UsageMetric::Trips => self.max_trips,
            UsageMetric::Vehicles => self.max_vehicles,
            UsageMetric::Drivers => self.max_drivers,
        }
    }

    fn admits(&self, metric: UsageMetric, value: u32) -> bool {
        self.allowance(metric)
            .map(|limit| value <= limit)
            .unwrap_or(true)
    }
}

/// Ordered tier catalog, lowest tier first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCatalog {
    pub tiers: Vec<TierDefinition>,
    /// How many tiers above its usage an account must pay for before it counts as at risk.
    #[serde(default = "default_at_risk_tier_gap")]
    pub at_risk_tier_gap: usize,
}

fn default_at_risk_tier_gap() -> usize {
    2
}

impl TierCatalog {
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                tier("Starter", &["starter", "free", "basic"], Some((5, 10, 20)), 0.0, Some(499.0)),
                tier("Standard", &["standard", "pro-low"], Some((15, 30, 75)), 500.0, Some(1_499.0)),
                tier("Pro", &["pro", "pro-mid"], Some((40, 80, 200)), 1_500.0, Some(4_999.0)),
                tier("Enterprise", &["enterprise", "pro-high", "elite"], None, 5_000.0, None),
            ],
            at_risk_tier_gap: default_at_risk_tier_gap(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.tiers
            .iter()
            .position(|tier| tier.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&TierDefinition> {
        self.position(name).map(|index| &self.tiers[index])
    }

    fn index_for_plan(&self, plan_code: &str) -> Option<usize> {
        self.tiers.iter().position(|tier| {
            tier.plan_codes
                .iter()
                .any(|code| code.eq_ignore_ascii_case(plan_code))
        })
    }

    fn index_for_mrr(&self, mrr: f64) -> usize {
        self.tiers
            .iter()
            .rposition(|tier| tier.price_floor <= mrr)
            .unwrap_or(0)
    }

    fn index_for_usage(&self, metric: UsageMetric, value: u32) -> usize {
        self.tiers
            .iter()
            .position(|tier| tier.admits(metric, value))
            .unwrap_or(self.tiers.len().saturating_sub(1))
    }

    fn name_at(&self, index: usize) -> String {
        self.tiers
            .get(index)
            .map(|tier| tier.name.clone())
            .unwrap_or_else(|| "Unclassified".to_string())
    }
}

fn tier(
    name: &str,
    plan_codes: &[&str],
    allowances: Option<(u32, u32, u32)>,
    price_floor: f64,
    price_ceiling: Option<f64>,
) -> TierDefinition {
    TierDefinition {
        name: name.to_string(),
        plan_codes: plan_codes.iter().map(|code| code.to_string()).collect(),
        max_vehicles: allowances.map(|(vehicles, _, _)| vehicles),
        max_drivers: allowances.map(|(_, drivers, _)| drivers),
        max_trips: allowances.map(|(_, _, trips)| trips),
        price_floor,
        price_ceiling,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UsageMetric {
    Trips,
    Vehicles,
    Drivers,
}

impl UsageMetric {
    const fn unit(self) -> &'static str {
        match self {
            Self::Trips => "trips/month",
            Self::Vehicles => "vehicles",
            Self::Drivers => "drivers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueImpact {
    Undermonetized,
    Aligned,
    AtRisk,
}

impl RevenueImpact {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Undermonetized => "undermonetized",
            Self::Aligned => "aligned",
            Self::AtRisk => "at_risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MisalignmentResult {
    pub is_misaligned: bool,
    pub revenue_impact: RevenueImpact,
    pub current_tier: String,
    /// `None` when no usage metric was available to place the account.
    pub usage_tier: Option<String>,
    pub recommended_tier: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Compare the tier an account pays for with the tier its usage lands in.
pub fn evaluate_fit(
    mrr: Option<f64>,
    plan_code: Option<&str>,
    vehicle_count: Option<u32>,
    driver_count: Option<u32>,
    trip_velocity: Option<u32>,
    catalog: &TierCatalog,
) -> MisalignmentResult {
    let mut notes = Vec::new();
    let lowest = catalog.name_at(0);

    let current_index = match (plan_code.map(str::trim).filter(|code| !code.is_empty()), mrr) {
        (Some(code), _) => match catalog.index_for_plan(code) {
            Some(index) => index,
            None => {
                notes.push(format!(
                    "Unrecognized plan code '{code}'; assuming {lowest} tier"
                ));
                0
            }
        },
        (None, Some(mrr)) => {
            let index = catalog.index_for_mrr(mrr);
            notes.push(format!(
                "No plan code; tier inferred from MRR ${mrr:.2} ({})",
                catalog.name_at(index)
            ));
            index
        }
        (None, None) => {
            notes.push(format!("No plan code or MRR; assuming {lowest} tier"));
            0
        }
    };
    let current_tier = catalog.name_at(current_index);

    let usage = [
        (UsageMetric::Trips, trip_velocity),
        (UsageMetric::Vehicles, vehicle_count),
        (UsageMetric::Drivers, driver_count),
    ]
    .into_iter()
    .filter_map(|(metric, value)| value.map(|value| (metric, value)))
    .fold(None, |best: Option<(usize, UsageMetric, u32)>, (metric, value)| {
        let index = catalog.index_for_usage(metric, value);
        match best {
            Some((best_index, _, _)) if best_index >= index => best,
            _ => Some((index, metric, value)),
        }
    });

    let Some((usage_index, metric, value)) = usage else {
        notes.push("No usage metrics available to classify fit".to_string());
        return MisalignmentResult {
            is_misaligned: false,
            revenue_impact: RevenueImpact::Aligned,
            current_tier: current_tier.clone(),
            usage_tier: None,
            recommended_tier: current_tier,
            reason: "Insufficient usage data".to_string(),
            notes,
        };
    };
    let usage_tier = catalog.name_at(usage_index);

    let (revenue_impact, reason) = if current_index < usage_index {
        let reason = match catalog
            .tiers
            .get(current_index)
            .and_then(|tier| tier.allowance(metric))
        {
            Some(limit) => format!(
                "{value} {} exceeds {current_tier} tier allowance of {limit}",
                metric.unit()
            ),
            None => format!(
                "{value} {} fits {usage_tier}, above the {current_tier} tier",
                metric.unit()
            ),
        };
        (RevenueImpact::Undermonetized, reason)
    } else if current_index - usage_index >= catalog.at_risk_tier_gap.max(1) {
        (
            RevenueImpact::AtRisk,
            format!(
                "Paying for {current_tier} but usage fits {usage_tier} ({value} {})",
                metric.unit()
            ),
        )
    } else {
        (
            RevenueImpact::Aligned,
            format!("Usage fits {current_tier} tier"),
        )
    };

    let is_misaligned = revenue_impact != RevenueImpact::Aligned;
    let recommended_tier = if is_misaligned {
        usage_tier.clone()
    } else {
        current_tier.clone()
    };

    MisalignmentResult {
        is_misaligned,
        revenue_impact,
        current_tier,
        usage_tier: Some(usage_tier),
        recommended_tier,
        reason,
        notes,
    }
}

/// Optional product sold on top of a tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOnDefinition {
    pub code: String,
    pub name: String,
    pub monthly_price: f64,
    pub min_vehicles: u32,
}

impl AddOnDefinition {
    pub fn standard_catalog() -> Vec<Self> {
        vec![
            add_on("driver_app", "Driver App", 99.0, 3),
            add_on("customer_portal", "Customer Portal", 149.0, 1),
            add_on("payments", "Integrated Payments", 199.0, 5),
            add_on("dispatch_ai", "AI Dispatch", 299.0, 15),
        ]
    }
}

fn add_on(code: &str, name: &str, monthly_price: f64, min_vehicles: u32) -> AddOnDefinition {
    AddOnDefinition {
        code: code.to_string(),
        name: name.to_string(),
        monthly_price,
        min_vehicles,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    TierUpgrade,
    AddOn,
}

/// Candidate expansion item; its value is `potential_value - current_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    pub code: String,
    pub title: String,
    pub current_value: f64,
    pub potential_value: f64,
    pub rationale: String,
}

impl Opportunity {
    pub fn value_gap(&self) -> f64 {
        self.potential_value - self.current_value
    }
}

/// Enumerate upsell items: a tier upgrade for undermonetized accounts and every add-on the
/// fleet qualifies for but has not bought.
pub fn opportunities(
    snapshot: &AccountSnapshot,
    fit: &MisalignmentResult,
    catalog: &TierCatalog,
    add_ons: &[AddOnDefinition],
) -> Vec<Opportunity> {
    let mut found = Vec::new();

    if fit.revenue_impact == RevenueImpact::Undermonetized {
        if let Some(target) = catalog.get(&fit.recommended_tier) {
            let current_value = snapshot.mrr().unwrap_or(0.0);
            if target.price_floor > current_value {
                found.push(Opportunity {
                    kind: OpportunityKind::TierUpgrade,
                    code: target.name.to_ascii_lowercase(),
                    title: format!("Upgrade to {}", target.name),
                    current_value,
                    potential_value: target.price_floor,
                    rationale: fit.reason.clone(),
                });
            }
        }
    }

    let vehicles = snapshot.vehicle_count().unwrap_or(0);
    for definition in add_ons {
        if snapshot.has_add_on(&definition.code.to_ascii_lowercase()) {
            continue;
        }
        if vehicles == 0 || vehicles < definition.min_vehicles {
            continue;
        }

        found.push(Opportunity {
            kind: OpportunityKind::AddOn,
            code: definition.code.clone(),
            title: format!("Add {}", definition.name),
            current_value: 0.0,
            potential_value: definition.monthly_price,
            rationale: format!(
                "{vehicles} vehicles meets the {} minimum of {}",
                definition.name, definition.min_vehicles
            ),
        });
    }

    found
}

pub fn estimated_value(opportunities: &[Opportunity]) -> f64 {
    opportunities.iter().map(Opportunity::value_gap).sum()
}
