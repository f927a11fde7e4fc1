use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::common::*;
use crate::config::EngineConfig;
use crate::workflows::playbooks::Priority;
use crate::workflows::portfolio::{
    AccountId, PortfolioService, PortfolioServiceError, RepositoryError,
};
use crate::workflows::scoring::{ScoreLevel, ScoringEngine};

fn playbook_types(tasks: &[crate::workflows::portfolio::SuccessTask]) -> Vec<&str> {
    tasks.iter().map(|task| task.playbook_type.as_str()).collect()
}

#[test]
fn report_combines_scores_and_sorted_playbooks() {
    let (service, _, _, _) = build_service(vec![("acct-1", struggling_account())]);

    let report = service
        .account_report(&AccountId("acct-1".to_string()), as_of())
        .expect("report builds");

    assert_eq!(report.company_name, "Harbor Shuttle Co");
    assert_eq!(report.health.level, ScoreLevel::Red);
    assert_eq!(report.churn_risk.level, ScoreLevel::High);
    assert_eq!(report.playbooks.highest_priority, Some(Priority::Critical));
    assert_eq!(report.playbooks.triggered[0].playbook_type, "payment_failed");
    let priorities: Vec<Priority> = report
        .playbooks
        .triggered
        .iter()
        .map(|playbook| playbook.priority)
        .collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted, "playbooks are ordered most urgent first");
    assert!(report
        .playbooks
        .actions
        .critical_actions
        .contains(&"Call billing contact within 24 hours".to_string()));
}

#[test]
fn report_is_served_from_cache_until_invalidated() {
    let (service, accounts, _, _) = build_service(vec![("acct-1", thriving_account())]);
    let id = AccountId("acct-1".to_string());

    let first = service.account_report(&id, as_of()).expect("first report");
    let second = service.account_report(&id, as_of()).expect("cached report");
    assert_eq!(first, second);
    assert_eq!(accounts.fetches(), 1, "second lookup is a cache hit");

    assert!(service.invalidate(&id, as_of()));
    service.account_report(&id, as_of()).expect("recomputed report");
    assert_eq!(accounts.fetches(), 2);
}

#[test]
fn report_propagates_not_found() {
    let (service, _, _, _) = build_service(Vec::new());

    match service.account_report(&AccountId("missing".to_string()), as_of()) {
        Err(PortfolioServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn sweep_creates_tasks_and_alerts_for_fired_playbooks() {
    let (service, _, tasks, alerts) = build_service(vec![
        ("acct-struggling", struggling_account()),
        ("acct-thriving", thriving_account()),
    ]);

    let summary = service
        .run_playbook_sweep(as_of(), &AtomicBool::new(false))
        .expect("sweep runs");

    assert_eq!(summary.accounts_evaluated, 2);
    assert_eq!(summary.tasks_created, 6);
    assert_eq!(summary.alerts_published, 1);
    assert!(!summary.interrupted);

    let created = tasks.tasks();
    assert_eq!(
        playbook_types(&created),
        vec![
            "payment_failed",
            "health_red",
            "inactive_account",
            "multiple_risk_signals",
            "usage_decline",
            "expansion_ready",
        ]
    );
    assert_eq!(created[0].title, "Payment Recovery: Harbor Shuttle Co");
    assert_eq!(created[0].created_on, as_of());

    let events = alerts.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "health_drop");
    assert_eq!(events[0].account_id, AccountId("acct-struggling".to_string()));
}

#[test]
fn repeated_sweep_creates_each_task_and_alert_at_most_once() {
    let (service, _, tasks, alerts) = build_service(vec![("acct-1", struggling_account())]);
    let shutdown = AtomicBool::new(false);

    let first = service
        .run_playbook_sweep(as_of(), &shutdown)
        .expect("first sweep");
    let second = service
        .run_playbook_sweep(as_of(), &shutdown)
        .expect("second sweep");

    assert_eq!(first.tasks_created, 5);
    assert_eq!(second.tasks_created, 0);
    assert_eq!(second.tasks_deduplicated, 5);
    assert_eq!(tasks.tasks().len(), 5);

    assert_eq!(first.alerts_published, 1);
    assert_eq!(second.alerts_published, 0);
    assert_eq!(second.alerts_deduplicated, 1);
    assert_eq!(alerts.events().len(), 1);
}

#[test]
fn sweep_outside_dedupe_window_creates_fresh_tasks() {
    let (service, _, tasks, alerts) = build_service(vec![("acct-1", struggling_account())]);
    let shutdown = AtomicBool::new(false);

    service
        .run_playbook_sweep(as_of(), &shutdown)
        .expect("first sweep");
    let later = as_of() + chrono::Duration::days(8);
    let summary = service
        .run_playbook_sweep(later, &shutdown)
        .expect("later sweep");

    assert_eq!(summary.tasks_deduplicated, 0);
    assert_eq!(tasks.tasks().len(), 10);
    assert_eq!(summary.alerts_published, 1);
    assert_eq!(alerts.events()[1].raised_on, later);
}

#[test]
fn sweep_stops_when_shutdown_is_requested() {
    let (service, _, tasks, alerts) = build_service(vec![("acct-1", struggling_account())]);

    let summary = service
        .run_playbook_sweep(as_of(), &AtomicBool::new(true))
        .expect("sweep returns");

    assert!(summary.interrupted);
    assert_eq!(summary.accounts_evaluated, 0);
    assert!(tasks.tasks().is_empty());
    assert!(alerts.events().is_empty());
}

#[test]
fn sweep_counts_missing_accounts_without_failing() {
    let (service, accounts, _, _) = build_service(vec![("acct-1", thriving_account())]);
    accounts.list_only("acct-deleted");

    let summary = service
        .run_playbook_sweep(as_of(), &AtomicBool::new(false))
        .expect("sweep runs");

    assert_eq!(summary.accounts_evaluated, 1);
    assert_eq!(summary.accounts_missing, 1);
    assert_eq!(summary.accounts_failed, 0);
}

#[test]
fn sweep_records_task_store_failures_per_account() {
    let accounts = Arc::new(MemoryAccounts::with(vec![("acct-1", struggling_account())]));
    let alerts = Arc::new(MemoryAlerts::default());
    let service = PortfolioService::new(
        ScoringEngine::new(EngineConfig::default()),
        accounts,
        Arc::new(UnavailableTasks),
        alerts.clone(),
        &portfolio_config(),
    );

    let summary = service
        .run_playbook_sweep(as_of(), &AtomicBool::new(false))
        .expect("sweep itself succeeds");

    assert_eq!(summary.accounts_failed, 1);
    assert_eq!(summary.tasks_created, 0);
    assert!(
        alerts.events().is_empty(),
        "alert is not sent once task creation failed"
    );
}
