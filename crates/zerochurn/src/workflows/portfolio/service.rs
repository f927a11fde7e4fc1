use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::cache::{Clock, SystemClock, TtlCache};
use super::repository::{
    AccountId, AccountSource, AlertError, AlertPublisher, HealthAlert, RepositoryError,
    SuccessTask, TaskRepository,
};
use crate::config::PortfolioConfig;
use crate::workflows::playbooks::{
    evaluate_sorted, highest_priority, playbook_actions, AccountState, PlaybookActions, Priority,
    Segment, TriggeredPlaybook,
};
use crate::workflows::scoring::{
    AccountSnapshot, PropensityReport, ScoreLevel, ScoreResult, ScoringEngine,
};

/// Fired playbooks for one account, sorted most urgent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybookEvaluation {
    pub segment: Segment,
    pub risk_signal_count: u32,
    pub triggered: Vec<TriggeredPlaybook>,
    pub highest_priority: Option<Priority>,
    pub actions: PlaybookActions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountReport {
    pub account_id: AccountId,
    pub company_name: String,
    pub as_of: NaiveDate,
    pub propensity: PropensityReport,
    pub health: ScoreResult,
    pub churn_risk: ScoreResult,
    pub playbooks: PlaybookEvaluation,
}

/// Score churn risk and run the trigger catalog against the result.
pub fn evaluate_playbooks(
    engine: &ScoringEngine,
    snapshot: &AccountSnapshot,
    as_of: NaiveDate,
) -> PlaybookEvaluation {
    let churn_risk = engine.score_churn_risk(snapshot);
    playbooks_for(engine, snapshot, as_of, &churn_risk)
}

/// Every negative churn signal counts once towards `risk_signals_at_least` triggers.
fn playbooks_for(
    engine: &ScoringEngine,
    snapshot: &AccountSnapshot,
    as_of: NaiveDate,
    churn_risk: &ScoreResult,
) -> PlaybookEvaluation {
    let risk_signal_count = u32::try_from(churn_risk.negative_signals.len()).unwrap_or(u32::MAX);
    let state = AccountState::new(snapshot, as_of).with_risk_signals(risk_signal_count);
    let catalog = &engine.config().triggers;
    let triggered = evaluate_sorted(catalog, &state);

    PlaybookEvaluation {
        segment: state.segment,
        risk_signal_count,
        highest_priority: highest_priority(&triggered),
        actions: playbook_actions(catalog, &triggered),
        triggered,
    }
}

/// Every score and fired playbook for one account at one date.
pub fn assess_account(
    engine: &ScoringEngine,
    account_id: AccountId,
    snapshot: &AccountSnapshot,
    as_of: NaiveDate,
) -> AccountReport {
    let churn_risk = engine.score_churn_risk(snapshot);
    let playbooks = playbooks_for(engine, snapshot, as_of, &churn_risk);

    AccountReport {
        company_name: snapshot.display_name().to_string(),
        account_id,
        as_of,
        propensity: engine.score_propensity(snapshot, as_of),
        health: engine.score_health(snapshot),
        churn_risk,
        playbooks,
    }
}

/// Counters for one playbook sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub accounts_evaluated: usize,
    pub accounts_missing: usize,
    pub accounts_failed: usize,
    pub tasks_created: usize,
    pub tasks_deduplicated: usize,
    pub alerts_published: usize,
    pub alerts_deduplicated: usize,
    /// Set when the shutdown flag stopped the sweep before every account was visited.
    pub interrupted: bool,
}

/// Caller layer composing the engine with account, task, and alert collaborators.
pub struct PortfolioService<S, T, A> {
    engine: Arc<ScoringEngine>,
    accounts: Arc<S>,
    tasks: Arc<T>,
    alerts: Arc<A>,
    reports: TtlCache<(AccountId, NaiveDate), AccountReport>,
    task_dedupe_days: u32,
}

impl<S, T, A> PortfolioService<S, T, A>
where
    S: AccountSource + 'static,
    T: TaskRepository + 'static,
    A: AlertPublisher + 'static,
{
    pub fn new(
        engine: ScoringEngine,
        accounts: Arc<S>,
        tasks: Arc<T>,
        alerts: Arc<A>,
        config: &PortfolioConfig,
    ) -> Self {
        Self::with_clock(engine, accounts, tasks, alerts, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        engine: ScoringEngine,
        accounts: Arc<S>,
        tasks: Arc<T>,
        alerts: Arc<A>,
        config: &PortfolioConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            accounts,
            tasks,
            alerts,
            reports: TtlCache::new(config.cache_ttl(), clock),
            task_dedupe_days: config.task_dedupe_days,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Report for a stored account, served from cache while fresh.
    pub fn account_report(
        &self,
        account_id: &AccountId,
        as_of: NaiveDate,
    ) -> Result<AccountReport, PortfolioServiceError> {
        let key = (account_id.clone(), as_of);
        if let Some(hit) = self.reports.get(&key) {
            debug!(
                account = %account_id,
                age_secs = hit.age.num_seconds(),
                "account report served from cache"
            );
            return Ok(hit.value);
        }

        let report = self.fresh_report(account_id, as_of)?;
        Ok(report)
    }

    /// Drop any cached reports for the account, e.g. after its snapshot changed upstream.
    pub fn invalidate(&self, account_id: &AccountId, as_of: NaiveDate) -> bool {
        self.reports.invalidate(&(account_id.clone(), as_of))
    }

    /// Evaluate every account and open tasks for fired playbooks.
    ///
    /// A task is created at most once per account and playbook inside the de-duplication
    /// window, and the health-drop alert at most once per account in the same window, so
    /// re-running a sweep for the same date creates nothing new. The shutdown flag
    /// is checked before each account; work already done is kept.
    pub fn run_playbook_sweep(
        &self,
        as_of: NaiveDate,
        shutdown: &AtomicBool,
    ) -> Result<SweepSummary, PortfolioServiceError> {
        let account_ids = self.accounts.account_ids()?;
        info!(accounts = account_ids.len(), %as_of, "playbook sweep started");

        let mut summary = SweepSummary::default();
        for account_id in account_ids {
            if shutdown.load(Ordering::Acquire) {
                summary.interrupted = true;
                warn!(%as_of, "playbook sweep interrupted by shutdown");
                break;
            }

            if let Err(err) = self.sweep_account(&account_id, as_of, &mut summary) {
                summary.accounts_failed += 1;
                warn!(account = %account_id, error = %err, "account skipped during sweep");
            }
        }

        info!(
            evaluated = summary.accounts_evaluated,
            tasks_created = summary.tasks_created,
            tasks_deduplicated = summary.tasks_deduplicated,
            alerts = summary.alerts_published,
            alerts_deduplicated = summary.alerts_deduplicated,
            failed = summary.accounts_failed,
            "playbook sweep finished"
        );
        Ok(summary)
    }

    fn sweep_account(
        &self,
        account_id: &AccountId,
        as_of: NaiveDate,
        summary: &mut SweepSummary,
    ) -> Result<(), PortfolioServiceError> {
        let report = match self.fresh_report(account_id, as_of) {
            Ok(report) => report,
            Err(PortfolioServiceError::Repository(RepositoryError::NotFound)) => {
                summary.accounts_missing += 1;
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        summary.accounts_evaluated += 1;

        let since = as_of
            .checked_sub_signed(Duration::days(i64::from(self.task_dedupe_days)))
            .unwrap_or(NaiveDate::MIN);
        let catalog = &self.engine.config().triggers;

        for playbook in &report.playbooks.triggered {
            if self
                .tasks
                .exists_since(account_id, &playbook.playbook_type, since)?
            {
                summary.tasks_deduplicated += 1;
                continue;
            }

            self.tasks.insert(SuccessTask {
                account_id: account_id.clone(),
                playbook_type: playbook.playbook_type.clone(),
                title: format!("{}: {}", playbook.name, report.company_name),
                priority: playbook.priority,
                created_on: as_of,
                actions: catalog.actions_for(&[playbook.playbook_type.as_str()]),
                matched_conditions: playbook.matched_conditions.clone(),
            })?;
            summary.tasks_created += 1;
        }

        if report.health.level == ScoreLevel::Red {
            if self
                .alerts
                .published_since(account_id, HEALTH_DROP_TEMPLATE, since)?
            {
                summary.alerts_deduplicated += 1;
            } else {
                self.alerts.publish(health_drop_alert(&report))?;
                summary.alerts_published += 1;
            }
        }

        Ok(())
    }

    fn fresh_report(
        &self,
        account_id: &AccountId,
        as_of: NaiveDate,
    ) -> Result<AccountReport, PortfolioServiceError> {
        let snapshot = self
            .accounts
            .fetch(account_id)?
            .ok_or(RepositoryError::NotFound)?;
        let report = assess_account(&self.engine, account_id.clone(), &snapshot, as_of);
        self.reports
            .insert((account_id.clone(), as_of), report.clone());
        Ok(report)
    }
}

const HEALTH_DROP_TEMPLATE: &str = "health_drop";

fn health_drop_alert(report: &AccountReport) -> HealthAlert {
    let mut details = BTreeMap::new();
    details.insert("company".to_string(), report.company_name.clone());
    details.insert("health_score".to_string(), report.health.score.to_string());
    details.insert(
        "churn_risk".to_string(),
        report.churn_risk.level.label().to_string(),
    );
    if let Some(signal) = report.health.negative_signals.first() {
        details.insert("top_risk".to_string(), signal.clone());
    }

    HealthAlert {
        template: HEALTH_DROP_TEMPLATE.to_string(),
        account_id: report.account_id.clone(),
        raised_on: report.as_of,
        details,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PortfolioServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}
