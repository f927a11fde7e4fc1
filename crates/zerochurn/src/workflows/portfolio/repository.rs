use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::playbooks::{PlaybookActions, Priority};
use crate::workflows::scoring::{AccountSnapshot, AccountSnapshotInput};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of an account export: the account id plus its raw snapshot fields.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    #[serde(flatten)]
    pub snapshot: AccountSnapshotInput,
}

impl AccountRecord {
    pub fn into_parts(self) -> (AccountId, AccountSnapshot) {
        (self.id, self.snapshot.into_snapshot())
    }
}

/// Read side of the CRM/billing/usage sync.
pub trait AccountSource: Send + Sync {
    fn account_ids(&self) -> Result<Vec<AccountId>, RepositoryError>;
    fn fetch(&self, id: &AccountId) -> Result<Option<AccountSnapshot>, RepositoryError>;
}

/// CSM task store.
pub trait TaskRepository: Send + Sync {
    /// Whether a task for this account and playbook was created on or after `since`.
    fn exists_since(
        &self,
        account_id: &AccountId,
        playbook_type: &str,
        since: NaiveDate,
    ) -> Result<bool, RepositoryError>;
    fn insert(&self, task: SuccessTask) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (chat channel, e-mail, CRM timeline).
pub trait AlertPublisher: Send + Sync {
    /// Whether an alert with this template was raised for the account on or after `since`.
    fn published_since(
        &self,
        account_id: &AccountId,
        template: &str,
        since: NaiveDate,
    ) -> Result<bool, AlertError>;
    fn publish(&self, alert: HealthAlert) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Follow-up work created for a CSM when a playbook fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessTask {
    pub account_id: AccountId,
    pub playbook_type: String,
    pub title: String,
    pub priority: Priority,
    pub created_on: NaiveDate,
    pub actions: PlaybookActions,
    pub matched_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub template: String,
    pub account_id: AccountId,
    pub raised_on: NaiveDate,
    pub details: BTreeMap<String, String>,
}
