use super::ConfigError;
use crate::workflows::playbooks::TriggerCatalog;
use crate::workflows::scoring::{AddOnDefinition, ScoreProfile, TierCatalog};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every table the scoring engine and trigger catalog read.
///
/// Any section omitted from an override file keeps its built-in value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub propensity: ScoreProfile,
    pub health: ScoreProfile,
    pub churn_risk: ScoreProfile,
    pub tiers: TierCatalog,
    pub add_ons: Vec<AddOnDefinition>,
    pub triggers: TriggerCatalog,
    /// Renewal proximity that lifts expansion urgency.
    pub renewal_window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            propensity: ScoreProfile::expansion_propensity(),
            health: ScoreProfile::account_health(),
            churn_risk: ScoreProfile::churn_risk(),
            tiers: TierCatalog::standard(),
            add_ons: AddOnDefinition::standard_catalog(),
            triggers: TriggerCatalog::standard(),
            renewal_window_days: 60,
        }
    }
}

impl EngineConfig {
    /// Built-in tables, or the JSON file at `path` layered over them.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::EngineFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        tracing::info!(path = %path.display(), "loaded engine config override");
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|source| ConfigError::EngineFormat { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.propensity.validate()?;
        self.health.validate()?;
        self.churn_risk.validate()?;

        if self.tiers.is_empty() {
            return Err(ConfigError::EmptyTierCatalog);
        }
        if let Some(id) = self.triggers.duplicate_id() {
            return Err(ConfigError::DuplicateTrigger(id.to_string()));
        }

        Ok(())
    }
}
