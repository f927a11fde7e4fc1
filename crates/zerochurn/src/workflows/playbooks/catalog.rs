use super::conditions::TriggerCondition;
use super::{AccountState, Priority, Segment, TriggeredPlaybook};
use crate::workflows::scoring::{HealthStatus, PaymentHealth};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Follow-up actions attached to a trigger, split by how they are carried out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerActions {
    pub critical: Vec<String>,
    pub tasks: Vec<String>,
    pub automated: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub id: String,
    pub name: String,
    pub priority: Priority,
    pub description: String,
    pub condition: TriggerCondition,
    #[serde(default)]
    pub actions: TriggerActions,
}

impl TriggerDefinition {
    pub fn evaluate(&self, state: &AccountState<'_>) -> Option<TriggeredPlaybook> {
        let matched_conditions = self.condition.evaluate(state)?;
        Some(TriggeredPlaybook {
            playbook_type: self.id.clone(),
            name: self.name.clone(),
            priority: self.priority,
            description: self.description.clone(),
            matched_conditions,
        })
    }
}

/// Action lists merged across every fired trigger, first-seen order, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookActions {
    pub critical_actions: Vec<String>,
    pub tasks: Vec<String>,
    pub automated_actions: Vec<String>,
}

impl PlaybookActions {
    pub fn is_empty(&self) -> bool {
        self.critical_actions.is_empty()
            && self.tasks.is_empty()
            && self.automated_actions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCatalog {
    pub triggers: Vec<TriggerDefinition>,
}

impl TriggerCatalog {
    pub fn get(&self, id: &str) -> Option<&TriggerDefinition> {
        self.triggers.iter().find(|definition| definition.id == id)
    }

    /// First duplicated trigger id, if any.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.triggers
            .iter()
            .map(|definition| definition.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    pub fn actions_for(&self, playbook_types: &[&str]) -> PlaybookActions {
        let mut actions = PlaybookActions::default();
        for playbook_type in playbook_types {
            let Some(definition) = self.get(playbook_type) else {
                continue;
            };
            push_unique(&mut actions.critical_actions, &definition.actions.critical);
            push_unique(&mut actions.tasks, &definition.actions.tasks);
            push_unique(&mut actions.automated_actions, &definition.actions.automated);
        }
        actions
    }

    pub fn standard() -> Self {
        use TriggerCondition::*;

        Self {
            triggers: vec![
                definition(
                    "payment_failed",
                    "Payment Recovery",
                    Priority::Critical,
                    "Billing is failing; recover payment before the account lapses",
                    PaymentHealthIs {
                        value: PaymentHealth::Critical,
                    },
                    actions(
                        &["Call billing contact within 24 hours"],
                        &["Review failed invoices with finance"],
                        &["Send payment update reminder"],
                    ),
                ),
                definition(
                    "health_red",
                    "Health Drop Response",
                    Priority::High,
                    "Account health is red and needs a recovery plan",
                    HealthStatusIs {
                        value: HealthStatus::Red,
                    },
                    actions(
                        &["Escalate to account owner"],
                        &["Schedule recovery call", "Draft success plan"],
                        &["Post health-drop alert"],
                    ),
                ),
                definition(
                    "inactive_account",
                    "Re-engagement",
                    Priority::High,
                    "No one has logged in for a month",
                    InactiveForDays { days: 30 },
                    actions(
                        &[],
                        &["Reach out to primary admin"],
                        &["Enroll in win-back email sequence"],
                    ),
                ),
                definition(
                    "multiple_risk_signals",
                    "Churn Risk Review",
                    Priority::High,
                    "Several independent risk signals are present",
                    RiskSignalsAtLeast { count: 3 },
                    actions(&[], &["Run churn risk review with CSM lead"], &[]),
                ),
                definition(
                    "enterprise_renewal",
                    "Enterprise Renewal",
                    Priority::High,
                    "Enterprise contract renews within a quarter",
                    AllOf {
                        conditions: vec![
                            SegmentIs {
                                segment: Segment::Enterprise,
                            },
                            RenewalWithinDays { days: 90 },
                        ],
                    },
                    actions(
                        &[],
                        &["Prepare renewal proposal", "Confirm executive sponsor"],
                        &[],
                    ),
                ),
                definition(
                    "renewal_approaching",
                    "Renewal Prep",
                    Priority::Medium,
                    "Contract renews within 60 days",
                    RenewalWithinDays { days: 60 },
                    actions(&[], &["Prepare renewal proposal"], &["Send renewal reminder"]),
                ),
                definition(
                    "onboarding_stalled",
                    "Onboarding Rescue",
                    Priority::Medium,
                    "New account has not finished setup",
                    AllOf {
                        conditions: vec![TenureUnderDays { days: 90 }, SetupBelow { score: 50 }],
                    },
                    actions(
                        &[],
                        &["Book onboarding session"],
                        &["Send setup checklist email"],
                    ),
                ),
                definition(
                    "usage_decline",
                    "Usage Recovery",
                    Priority::Medium,
                    "Trip volume has dropped below a sustainable level",
                    TripsBelow { trips: 5 },
                    actions(&[], &["Review usage trends with customer"], &[]),
                ),
                definition(
                    "expansion_ready",
                    "Expansion Outreach",
                    Priority::Low,
                    "Healthy, high-usage account ready for an expansion conversation",
                    AllOf {
                        conditions: vec![
                            HealthStatusIs {
                                value: HealthStatus::Green,
                            },
                            TripsAtLeast { trips: 100 },
                        ],
                    },
                    actions(&[], &["Pitch next tier or add-ons"], &[]),
                ),
                definition(
                    "qbr_prep",
                    "QBR Prep",
                    Priority::Low,
                    "Large established account due a quarterly business review",
                    AllOf {
                        conditions: vec![
                            MrrAtLeast { amount: 5_000.0 },
                            TenureAtLeastDays { days: 90 },
                        ],
                    },
                    actions(&[], &["Prepare QBR deck"], &["Generate QBR metrics pack"]),
                ),
            ],
        }
    }
}

fn definition(
    id: &str,
    name: &str,
    priority: Priority,
    description: &str,
    condition: TriggerCondition,
    actions: TriggerActions,
) -> TriggerDefinition {
    TriggerDefinition {
        id: id.to_string(),
        name: name.to_string(),
        priority,
        description: description.to_string(),
        condition,
        actions,
    }
}

fn actions(critical: &[&str], tasks: &[&str], automated: &[&str]) -> TriggerActions {
    let owned = |items: &[&str]| -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    };
    TriggerActions {
        critical: owned(critical),
        tasks: owned(tasks),
        automated: owned(automated),
    }
}

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
