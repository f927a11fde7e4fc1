use serde::{Deserialize, Serialize};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Per-family subscores, each within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscores {
    pub usage: u8,
    pub engagement: u8,
    pub health: u8,
    pub tenure: u8,
    pub fit: u8,
}

impl Subscores {
    /// Mirror every subscore (`100 - s`) so risk can be composed with the same weights.
    pub fn inverted(self) -> Self {
        Self {
            usage: 100 - self.usage.min(100),
            engagement: 100 - self.engagement.min(100),
            health: 100 - self.health.min(100),
            tenure: 100 - self.tenure.min(100),
            fit: 100 - self.fit.min(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub usage: f64,
    pub engagement: f64,
    pub health: f64,
    pub tenure: f64,
    pub fit: f64,
}

impl Weights {
    pub fn total(&self) -> f64 {
        self.usage + self.engagement + self.health + self.tenure + self.fit
    }

    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("usage", self.usage),
            ("engagement", self.engagement),
            ("health", self.health),
            ("tenure", self.tenure),
            ("fit", self.fit),
        ]
    }
}

/// Discrete judgement attached to a composed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLevel {
    High,
    Medium,
    Low,
    Green,
    Yellow,
    Red,
}

impl ScoreLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBand {
    pub min_score: u8,
    pub level: ScoreLevel,
}

/// Thresholds evaluated top-down; the first band whose `min_score` the score reaches wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTable {
    pub bands: Vec<LevelBand>,
    pub floor: ScoreLevel,
}

impl LevelTable {
    pub fn classify(&self, score: u8) -> ScoreLevel {
        self.bands
            .iter()
            .find(|band| score >= band.min_score)
            .map(|band| band.level)
            .unwrap_or(self.floor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    ExpansionPropensity,
    AccountHealth,
    ChurnRisk,
}

impl ScoreKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ExpansionPropensity => "expansion propensity",
            Self::AccountHealth => "account health",
            Self::ChurnRisk => "churn risk",
        }
    }
}

/// Weights and level table for one score kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreProfile {
    pub kind: ScoreKind,
    pub weights: Weights,
    pub levels: LevelTable,
    /// Compose `100 - subscore` instead of the subscore (risk-style scores).
    #[serde(default)]
    pub inverted: bool,
}

impl ScoreProfile {
    pub fn expansion_propensity() -> Self {
        Self {
            kind: ScoreKind::ExpansionPropensity,
            weights: Weights {
                usage: 0.25,
                engagement: 0.20,
                health: 0.20,
                tenure: 0.10,
                fit: 0.25,
            },
            levels: LevelTable {
                bands: vec![
                    LevelBand {
                        min_score: 70,
                        level: ScoreLevel::High,
                    },
                    LevelBand {
                        min_score: 45,
                        level: ScoreLevel::Medium,
                    },
                ],
                floor: ScoreLevel::Low,
            },
            inverted: false,
        }
    }

    pub fn account_health() -> Self {
        Self {
            kind: ScoreKind::AccountHealth,
            weights: Weights {
                usage: 0.30,
                engagement: 0.25,
                health: 0.35,
                tenure: 0.10,
                fit: 0.0,
            },
            levels: LevelTable {
                bands: vec![
                    LevelBand {
                        min_score: 70,
                        level: ScoreLevel::Green,
                    },
                    LevelBand {
                        min_score: 40,
                        level: ScoreLevel::Yellow,
                    },
                ],
                floor: ScoreLevel::Red,
            },
            inverted: false,
        }
    }

    pub fn churn_risk() -> Self {
        Self {
            kind: ScoreKind::ChurnRisk,
            weights: Weights {
                usage: 0.25,
                engagement: 0.30,
                health: 0.35,
                tenure: 0.10,
                fit: 0.0,
            },
            levels: LevelTable {
                bands: vec![
                    LevelBand {
                        min_score: 60,
                        level: ScoreLevel::High,
                    },
                    LevelBand {
                        min_score: 35,
                        level: ScoreLevel::Medium,
                    },
                ],
                floor: ScoreLevel::Low,
            },
            inverted: true,
        }
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        for (component, value) in self.weights.entries() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ProfileError::InvalidWeight {
                    kind: self.kind,
                    component,
                    value,
                });
            }
        }

        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ProfileError::WeightsDoNotSumToOne {
                kind: self.kind,
                total,
            });
        }

        let descending = self
            .levels
            .bands
            .windows(2)
            .all(|pair| pair[0].min_score > pair[1].min_score);
        if !descending {
            return Err(ProfileError::UnorderedBands { kind: self.kind });
        }

        Ok(())
    }

    pub fn compose(&self, subscores: &Subscores) -> (u8, ScoreLevel) {
        let basis = if self.inverted {
            subscores.inverted()
        } else {
            *subscores
        };
        compose(&basis, &self.weights, &self.levels)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("{} weight for {component} must be within 0..=1 (found {value})", .kind.label())]
    InvalidWeight {
        kind: ScoreKind,
        component: &'static str,
        value: f64,
    },
    #[error("{} weights sum to {total:.4}, expected 1.0", .kind.label())]
    WeightsDoNotSumToOne { kind: ScoreKind, total: f64 },
    #[error("{} level bands must be listed from highest to lowest threshold", .kind.label())]
    UnorderedBands { kind: ScoreKind },
}

/// `round(Σ subscore · weight)`, clamped to 0..=100.
pub fn weighted_score(subscores: &Subscores, weights: &Weights) -> u8 {
    let total = f64::from(subscores.usage) * weights.usage
        + f64::from(subscores.engagement) * weights.engagement
        + f64::from(subscores.health) * weights.health
        + f64::from(subscores.tenure) * weights.tenure
        + f64::from(subscores.fit) * weights.fit;

    total.round().clamp(0.0, 100.0) as u8
}

pub fn compose(subscores: &Subscores, weights: &Weights, levels: &LevelTable) -> (u8, ScoreLevel) {
    let score = weighted_score(subscores, weights);
    (score, levels.classify(score))
}
