use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use zerochurn::error::AppError;
use zerochurn::workflows::portfolio::{
    AccountId, AccountRecord, AccountSource, AlertError, AlertPublisher, HealthAlert,
    RepositoryError, SuccessTask, TaskRepository,
};
use zerochurn::workflows::scoring::AccountSnapshot;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Account snapshots loaded once from a JSON export, kept in export order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAccountSource {
    order: Arc<Vec<AccountId>>,
    snapshots: Arc<HashMap<AccountId, AccountSnapshot>>,
}

impl InMemoryAccountSource {
    pub(crate) fn from_records(records: Vec<AccountRecord>) -> Self {
        let mut order = Vec::with_capacity(records.len());
        let mut snapshots = HashMap::with_capacity(records.len());

        for record in records {
            let (id, snapshot) = record.into_parts();
            if snapshots.insert(id.clone(), snapshot).is_some() {
                warn!(account = %id, "duplicate account id in export; keeping the last row");
            } else {
                order.push(id);
            }
        }

        Self {
            order: Arc::new(order),
            snapshots: Arc::new(snapshots),
        }
    }

    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let records: Vec<AccountRecord> = serde_json::from_str(&raw)?;
        let source = Self::from_records(records);
        info!(path = %path.display(), accounts = source.len(), "loaded account export");
        Ok(source)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Accounts in export order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&AccountId, &AccountSnapshot)> {
        self.order
            .iter()
            .filter_map(|id| self.snapshots.get(id).map(|snapshot| (id, snapshot)))
    }
}

impl AccountSource for InMemoryAccountSource {
    fn account_ids(&self) -> Result<Vec<AccountId>, RepositoryError> {
        Ok(self.order.as_ref().clone())
    }

    fn fetch(&self, id: &AccountId) -> Result<Option<AccountSnapshot>, RepositoryError> {
        Ok(self.snapshots.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTaskRepository {
    tasks: Arc<Mutex<Vec<SuccessTask>>>,
}

impl TaskRepository for InMemoryTaskRepository {
    fn exists_since(
        &self,
        account_id: &AccountId,
        playbook_type: &str,
        since: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let guard = self
            .tasks
            .lock()
            .map_err(|_| RepositoryError::Unavailable("task store lock poisoned".to_string()))?;
        Ok(guard.iter().any(|task| {
            &task.account_id == account_id
                && task.playbook_type == playbook_type
                && task.created_on >= since
        }))
    }

    fn insert(&self, task: SuccessTask) -> Result<(), RepositoryError> {
        let mut guard = self
            .tasks
            .lock()
            .map_err(|_| RepositoryError::Unavailable("task store lock poisoned".to_string()))?;
        guard.push(task);
        Ok(())
    }
}

impl InMemoryTaskRepository {
    pub(crate) fn tasks(&self) -> Vec<SuccessTask> {
        match self.tasks.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAlertPublisher {
    events: Arc<Mutex<Vec<HealthAlert>>>,
}

impl AlertPublisher for InMemoryAlertPublisher {
    fn published_since(
        &self,
        account_id: &AccountId,
        template: &str,
        since: NaiveDate,
    ) -> Result<bool, AlertError> {
        let guard = self
            .events
            .lock()
            .map_err(|_| AlertError::Transport("alert log lock poisoned".to_string()))?;
        Ok(guard.iter().any(|alert| {
            &alert.account_id == account_id
                && alert.template == template
                && alert.raised_on >= since
        }))
    }

    fn publish(&self, alert: HealthAlert) -> Result<(), AlertError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AlertError::Transport("alert log lock poisoned".to_string()))?;
        info!(
            account = %alert.account_id,
            template = %alert.template,
            "health alert dispatched"
        );
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<HealthAlert> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerochurn::workflows::scoring::AccountSnapshotInput;

    fn record(id: &str, company: &str, mrr: f64) -> AccountRecord {
        AccountRecord {
            id: AccountId(id.to_string()),
            snapshot: AccountSnapshotInput {
                company_name: Some(company.to_string()),
                mrr: Some(mrr),
                ..AccountSnapshotInput::default()
            },
        }
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_snapshot() {
        let source = InMemoryAccountSource::from_records(vec![
            record("acct-1", "First", 100.0),
            record("acct-2", "Second", 200.0),
            record("acct-1", "First (corrected)", 150.0),
        ]);

        let ids = source.account_ids().expect("ids listed");
        assert_eq!(
            ids,
            vec![AccountId("acct-1".to_string()), AccountId("acct-2".to_string())]
        );
        let snapshot = source
            .fetch(&AccountId("acct-1".to_string()))
            .expect("fetch succeeds")
            .expect("account present");
        assert_eq!(snapshot.company_name(), Some("First (corrected)"));
        assert_eq!(snapshot.mrr(), Some(150.0));
    }

    #[test]
    fn task_lookup_respects_window_start() {
        let repository = InMemoryTaskRepository::default();
        let created_on = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
        repository
            .insert(SuccessTask {
                account_id: AccountId("acct-1".to_string()),
                playbook_type: "qbr_prep".to_string(),
                title: "QBR prep: First".to_string(),
                priority: zerochurn::workflows::playbooks::Priority::Medium,
                created_on,
                actions: Default::default(),
                matched_conditions: Vec::new(),
            })
            .expect("insert succeeds");

        let id = AccountId("acct-1".to_string());
        assert!(repository
            .exists_since(&id, "qbr_prep", created_on)
            .expect("lookup succeeds"));
        assert!(!repository
            .exists_since(&id, "qbr_prep", created_on.succ_opt().expect("next day"))
            .expect("lookup succeeds"));
        assert!(!repository
            .exists_since(&id, "payment_failed", created_on)
            .expect("lookup succeeds"));
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(parse_date("2025-03-01").is_ok());
        assert!(parse_date("03/01/2025").is_err());
    }
}
