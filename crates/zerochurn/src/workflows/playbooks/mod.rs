//! Declarative playbook triggers.
//!
//! A [`TriggerCatalog`] is an ordered list of predicates over an [`AccountState`]. Evaluation
//! is a single stateless pass: every matching definition fires, in catalog order, and what to
//! do about the fired triggers is resolved separately through [`playbook_actions`].

mod catalog;
mod conditions;

#[cfg(test)]
mod tests;

pub use catalog::{PlaybookActions, TriggerActions, TriggerCatalog, TriggerDefinition};
pub use conditions::TriggerCondition;

use crate::workflows::scoring::AccountSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Shared priority scale. Declaration order is the total order: critical sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Commercial segment derived from MRR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Enterprise,
    MidMarket,
    Smb,
    SelfServe,
}

impl Segment {
    pub fn from_mrr(mrr: Option<f64>) -> Self {
        match mrr {
            Some(value) if value >= 5_000.0 => Self::Enterprise,
            Some(value) if value >= 1_000.0 => Self::MidMarket,
            Some(value) if value >= 200.0 => Self::Smb,
            _ => Self::SelfServe,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Enterprise => "enterprise",
            Self::MidMarket => "mid_market",
            Self::Smb => "smb",
            Self::SelfServe => "self_serve",
        }
    }
}

/// Everything a trigger predicate may look at for one account.
#[derive(Debug, Clone, Copy)]
pub struct AccountState<'a> {
    pub snapshot: &'a AccountSnapshot,
    pub as_of: NaiveDate,
    pub segment: Segment,
    pub risk_signal_count: u32,
}

impl<'a> AccountState<'a> {
    pub fn new(snapshot: &'a AccountSnapshot, as_of: NaiveDate) -> Self {
        Self {
            snapshot,
            as_of,
            segment: Segment::from_mrr(snapshot.mrr()),
            risk_signal_count: 0,
        }
    }

    pub fn with_risk_signals(mut self, count: u32) -> Self {
        self.risk_signal_count = count;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredPlaybook {
    pub playbook_type: String,
    pub name: String,
    pub priority: Priority,
    pub description: String,
    /// Human-readable account facts that satisfied the trigger.
    pub matched_conditions: Vec<String>,
}

/// Fire every matching trigger in catalog order.
pub fn evaluate_triggers(catalog: &TriggerCatalog, state: &AccountState<'_>) -> Vec<TriggeredPlaybook> {
    catalog
        .triggers
        .iter()
        .filter_map(|definition| definition.evaluate(state))
        .collect()
}

/// Same set as [`evaluate_triggers`], stably sorted by priority.
pub fn evaluate_sorted(catalog: &TriggerCatalog, state: &AccountState<'_>) -> Vec<TriggeredPlaybook> {
    let mut triggered = evaluate_triggers(catalog, state);
    triggered.sort_by_key(|playbook| playbook.priority);
    triggered
}

pub fn highest_priority(triggered: &[TriggeredPlaybook]) -> Option<Priority> {
    triggered.iter().map(|playbook| playbook.priority).min()
}

/// Resolve fired triggers into categorized follow-up actions.
pub fn playbook_actions(catalog: &TriggerCatalog, triggered: &[TriggeredPlaybook]) -> PlaybookActions {
    let types: Vec<&str> = triggered
        .iter()
        .map(|playbook| playbook.playbook_type.as_str())
        .collect();
    catalog.actions_for(&types)
}
