//! Deal-pipeline analytics grouped by stage and owner.

mod accumulator;

pub use accumulator::RunningStats;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    Appointment,
    Qualified,
    Presentation,
    Decision,
    Contract,
    Won,
    Lost,
}

impl DealStage {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Appointment => "Appointment Scheduled",
            Self::Qualified => "Qualified to Buy",
            Self::Presentation => "Presentation Scheduled",
            Self::Decision => "Decision Maker Bought-In",
            Self::Contract => "Contract Sent",
            Self::Won => "Closed Won",
            Self::Lost => "Closed Lost",
        }
    }

    /// Close probability used for the weighted pipeline.
    pub const fn win_probability(self) -> f64 {
        match self {
            Self::Appointment => 0.1,
            Self::Qualified => 0.2,
            Self::Presentation => 0.4,
            Self::Decision => 0.6,
            Self::Contract => 0.8,
            Self::Won => 1.0,
            Self::Lost => 0.0,
        }
    }

    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub stage: DealStage,
    pub owner: OwnerId,
    pub amount: f64,
    #[serde(default)]
    pub days_in_stage: u32,
}

/// Per-group deal statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealAggregate {
    pub amount: RunningStats,
    pub days_in_stage: RunningStats,
    pub weighted_value: f64,
}

impl DealAggregate {
    pub fn add(&mut self, deal: &Deal) {
        self.amount.add(deal.amount);
        self.days_in_stage.add(f64::from(deal.days_in_stage));
        self.weighted_value += deal.amount * deal.stage.win_probability();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total_deals: usize,
    pub open_deals: usize,
    pub open_value: f64,
    pub weighted_value: f64,
    /// Won deals over closed deals; `None` until something has closed.
    pub win_rate: Option<f64>,
    pub by_stage: BTreeMap<DealStage, DealAggregate>,
    pub by_owner: BTreeMap<OwnerId, DealAggregate>,
}

impl PipelineSummary {
    pub fn from_deals<'a>(deals: impl IntoIterator<Item = &'a Deal>) -> Self {
        let mut summary = Self::default();
        let mut won = 0usize;
        let mut closed = 0usize;

        for deal in deals {
            summary.total_deals += 1;
            summary.by_stage.entry(deal.stage).or_default().add(deal);
            summary
                .by_owner
                .entry(deal.owner.clone())
                .or_default()
                .add(deal);

            if deal.stage.is_open() {
                summary.open_deals += 1;
                summary.open_value += deal.amount;
                summary.weighted_value += deal.amount * deal.stage.win_probability();
            } else {
                closed += 1;
                if deal.stage == DealStage::Won {
                    won += 1;
                }
            }
        }

        summary.win_rate = (closed > 0).then(|| won as f64 / closed as f64);
        summary
    }
}
