use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::{EngineConfig, PortfolioConfig};
use crate::workflows::portfolio::{
    AccountId, AccountSource, AlertError, AlertPublisher, HealthAlert, PortfolioService,
    RepositoryError, SuccessTask, TaskRepository,
};
use crate::workflows::scoring::{AccountSnapshot, HealthStatus, PaymentHealth, ScoringEngine};

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
}

/// Red, failing-payment account that fires several playbooks.
pub(super) fn struggling_account() -> AccountSnapshot {
    AccountSnapshot::builder()
        .company_id("acct-struggling")
        .company_name("Harbor Shuttle Co")
        .mrr(450.0)
        .plan_code("starter")
        .trips_last_30_days(2)
        .vehicle_count(3)
        .member_count(1)
        .days_since_last_login(45)
        .setup_score(30.0)
        .health_status(HealthStatus::Red)
        .payment_health(PaymentHealth::Critical)
        .subscription_lifetime_days(400)
        .build()
}

/// Green, well-used account that only qualifies for expansion outreach.
pub(super) fn thriving_account() -> AccountSnapshot {
    AccountSnapshot::builder()
        .company_id("acct-thriving")
        .company_name("Summit Transit")
        .mrr(2_400.0)
        .plan_code("pro")
        .trips_last_30_days(150)
        .vehicle_count(25)
        .driver_count(40)
        .member_count(12)
        .days_since_last_login(0)
        .setup_score(95.0)
        .engagement_score(80.0)
        .health_status(HealthStatus::Green)
        .payment_health(PaymentHealth::Good)
        .subscription_lifetime_days(800)
        .build()
}

pub(super) fn portfolio_config() -> PortfolioConfig {
    PortfolioConfig {
        cache_ttl_secs: 3_600,
        task_dedupe_days: 7,
        engine_config_path: None,
        accounts_path: None,
    }
}

pub(super) type MemoryService = PortfolioService<MemoryAccounts, MemoryTasks, MemoryAlerts>;

pub(super) fn build_service(
    accounts: Vec<(&str, AccountSnapshot)>,
) -> (Arc<MemoryService>, Arc<MemoryAccounts>, Arc<MemoryTasks>, Arc<MemoryAlerts>) {
    let accounts = Arc::new(MemoryAccounts::with(accounts));
    let tasks = Arc::new(MemoryTasks::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service = PortfolioService::new(
        ScoringEngine::new(EngineConfig::default()),
        accounts.clone(),
        tasks.clone(),
        alerts.clone(),
        &portfolio_config(),
    );
    (Arc::new(service), accounts, tasks, alerts)
}

#[derive(Default)]
pub(super) struct MemoryAccounts {
    records: Mutex<BTreeMap<AccountId, AccountSnapshot>>,
    ids: Mutex<Vec<AccountId>>,
    fetches: Mutex<usize>,
}

impl MemoryAccounts {
    pub(super) fn with(accounts: Vec<(&str, AccountSnapshot)>) -> Self {
        let store = Self::default();
        for (id, snapshot) in accounts {
            store.put(id, snapshot);
        }
        store
    }

    pub(super) fn put(&self, id: &str, snapshot: AccountSnapshot) {
        let id = AccountId(id.to_string());
        let mut ids = self.ids.lock().expect("accounts mutex poisoned");
        if !ids.contains(&id) {
            ids.push(id.clone());
        }
        self.records
            .lock()
            .expect("accounts mutex poisoned")
            .insert(id, snapshot);
    }

    /// Listed by id but absent from the store, as after an upstream delete.
    pub(super) fn list_only(&self, id: &str) {
        self.ids
            .lock()
            .expect("accounts mutex poisoned")
            .push(AccountId(id.to_string()));
    }

    pub(super) fn fetches(&self) -> usize {
        *self.fetches.lock().expect("accounts mutex poisoned")
    }
}

impl AccountSource for MemoryAccounts {
    fn account_ids(&self) -> Result<Vec<AccountId>, RepositoryError> {
        Ok(self.ids.lock().expect("accounts mutex poisoned").clone())
    }

    fn fetch(&self, id: &AccountId) -> Result<Option<AccountSnapshot>, RepositoryError> {
        *self.fetches.lock().expect("accounts mutex poisoned") += 1;
        Ok(self
            .records
            .lock()
            .expect("accounts mutex poisoned")
            .get(id)
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryTasks {
    tasks: Mutex<Vec<SuccessTask>>,
}

impl MemoryTasks {
    pub(super) fn tasks(&self) -> Vec<SuccessTask> {
        self.tasks.lock().expect("task mutex poisoned").clone()
    }
}

impl TaskRepository for MemoryTasks {
    fn exists_since(
        &self,
        account_id: &AccountId,
        playbook_type: &str,
        since: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let tasks = self.tasks.lock().expect("task mutex poisoned");
        Ok(tasks.iter().any(|task| {
            &task.account_id == account_id
                && task.playbook_type == playbook_type
                && task.created_on >= since
        }))
    }

    fn insert(&self, task: SuccessTask) -> Result<(), RepositoryError> {
        self.tasks.lock().expect("task mutex poisoned").push(task);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryAlerts {
    events: Mutex<Vec<HealthAlert>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<HealthAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn published_since(
        &self,
        account_id: &AccountId,
        template: &str,
        since: NaiveDate,
    ) -> Result<bool, AlertError> {
        let events = self.events.lock().expect("alert mutex poisoned");
        Ok(events.iter().any(|alert| {
            &alert.account_id == account_id
                && alert.template == template
                && alert.raised_on >= since
        }))
    }

    fn publish(&self, alert: HealthAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) struct UnavailableTasks;

impl TaskRepository for UnavailableTasks {
    fn exists_since(
        &self,
        _account_id: &AccountId,
        _playbook_type: &str,
        _since: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("task store offline".to_string()))
    }

    fn insert(&self, _task: SuccessTask) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("task store offline".to_string()))
    }
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}
