use crate::infra::{InMemoryAccountSource, InMemoryAlertPublisher, InMemoryTaskRepository};
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;
use zerochurn::config::{AppConfig, EngineConfig};
use zerochurn::error::AppError;
use zerochurn::telemetry;
use zerochurn::workflows::portfolio::{
    assess_account, AccountId, AccountReport, Clock, PortfolioService, SweepSummary,
    SystemClock,
};
use zerochurn::workflows::scoring::{
    AccountSnapshot, HealthStatus, PaymentHealth, ScoreResult, ScoringEngine,
};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Account export: a JSON array of account objects, each with an `id`
    #[arg(long)]
    pub(crate) accounts: PathBuf,
    /// Only report this account id
    #[arg(long)]
    pub(crate) account: Option<String>,
    /// Evaluation date (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Print full JSON reports instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// Account export: a JSON array of account objects, each with an `id`
    #[arg(long)]
    pub(crate) accounts: PathBuf,
    /// Evaluation date (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// List every task opened by the sweep
    #[arg(long)]
    pub(crate) list_tasks: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        accounts,
        account,
        as_of,
        json,
    } = args;

    let config = AppConfig::load()?;
    let engine = ScoringEngine::new(EngineConfig::load(
        config.portfolio.engine_config_path.as_deref(),
    )?);
    let source = InMemoryAccountSource::from_path(&accounts)?;
    let as_of = as_of.unwrap_or_else(|| SystemClock.today());

    let mut reported = 0usize;
    for (id, snapshot) in source.iter() {
        if account.as_deref().is_some_and(|wanted| wanted != id.0) {
            continue;
        }

        let report = assess_account(&engine, id.clone(), snapshot, as_of);
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            render_account_report(&report);
        }
        reported += 1;
    }

    if reported == 0 {
        println!("No matching accounts in {}", accounts.display());
    }
    Ok(())
}

pub(crate) async fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let SweepArgs {
        accounts,
        as_of,
        list_tasks,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let engine = ScoringEngine::new(EngineConfig::load(
        config.portfolio.engine_config_path.as_deref(),
    )?);
    let source = InMemoryAccountSource::from_path(&accounts)?;
    let tasks = InMemoryTaskRepository::default();
    let alerts = InMemoryAlertPublisher::default();
    let service = Arc::new(PortfolioService::new(
        engine,
        Arc::new(source),
        Arc::new(tasks.clone()),
        Arc::new(alerts.clone()),
        &config.portfolio,
    ));
    let as_of = as_of.unwrap_or_else(|| SystemClock.today());

    let shutdown = Arc::new(AtomicBool::new(false));
    let signal_flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing the current account");
            signal_flag.store(true, Ordering::Release);
        }
    });

    let worker = service.clone();
    let summary =
        tokio::task::spawn_blocking(move || worker.run_playbook_sweep(as_of, &shutdown))
            .await
            .map_err(std::io::Error::other)??;

    render_sweep_summary(as_of, &summary);
    if list_tasks {
        println!("\nTasks");
        for task in tasks.tasks() {
            println!(
                "- [{}] {} (account {})",
                task.priority.label(),
                task.title,
                task.account_id
            );
        }
    }
    let events = alerts.events();
    if !events.is_empty() {
        println!("\nHealth alerts");
        for alert in events {
            let company = alert.details.get("company").map(String::as_str);
            println!(
                "- {} for {}",
                alert.template,
                company.unwrap_or(alert.account_id.0.as_str())
            );
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let as_of = args
        .as_of
        .unwrap_or_else(|| SystemClock.today());
    let engine = ScoringEngine::new(EngineConfig::default());

    println!("ZeroChurn engine demo (as of {as_of})");
    for (id, snapshot) in demo_accounts(as_of) {
        let report = assess_account(&engine, AccountId(id.to_string()), &snapshot, as_of);
        println!();
        render_account_report(&report);
    }

    Ok(())
}

/// A healthy fleet, an outgrown starter plan, and an account in trouble.
fn demo_accounts(as_of: NaiveDate) -> Vec<(&'static str, AccountSnapshot)> {
    let renewal = as_of + chrono::Duration::days(45);
    vec![
        (
            "acct-northwind",
            AccountSnapshot::builder()
                .company_name("Northwind Logistics")
                .mrr(5_000.0)
                .plan_code("pro-mid")
                .trips_last_30_days(120)
                .vehicle_count(25)
                .days_since_last_login(0)
                .payment_health(PaymentHealth::Good)
                .payment_score(95.0)
                .health_status(HealthStatus::Green)
                .subscription_lifetime_days(400)
                .contract_end_date(renewal)
                .build(),
        ),
        (
            "acct-metro",
            AccountSnapshot::builder()
                .company_name("Metro Couriers")
                .mrr(300.0)
                .plan_code("starter")
                .trips_last_30_days(60)
                .vehicle_count(6)
                .member_count(3)
                .days_since_last_login(4)
                .health_status(HealthStatus::Yellow)
                .payment_health(PaymentHealth::Good)
                .subscription_lifetime_days(200)
                .active_add_on("driver_app")
                .build(),
        ),
        (
            "acct-harbor",
            AccountSnapshot::builder()
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
                .build(),
        ),
    ]
}

fn render_account_report(report: &AccountReport) {
    println!("{} ({})", report.company_name, report.account_id);

    let propensity = &report.propensity;
    println!(
        "  Expansion propensity {} ({}) | urgency {} | est. value ${:.0}/mo",
        propensity.score.score,
        propensity.score.level.label(),
        propensity.urgency.label(),
        propensity.estimated_value
    );
    println!(
        "  Fit: {} on {} ({})",
        propensity.fit.revenue_impact.label(),
        propensity.fit.current_tier,
        propensity.fit.reason
    );
    for opportunity in &propensity.opportunities {
        println!("    - {}: {}", opportunity.title, opportunity.rationale);
    }

    render_score("Health", &report.health);
    render_score("Churn risk", &report.churn_risk);

    let playbooks = &report.playbooks;
    if playbooks.triggered.is_empty() {
        println!("  Playbooks: none triggered");
        return;
    }
    println!(
        "  Playbooks ({} risk signals)",
        playbooks.risk_signal_count
    );
    for playbook in &playbooks.triggered {
        println!(
            "    - [{}] {}: {}",
            playbook.priority.label(),
            playbook.name,
            playbook.matched_conditions.join("; ")
        );
    }
    for action in &playbooks.actions.critical_actions {
        println!("    ! {action}");
    }
}

fn render_score(label: &str, result: &ScoreResult) {
    println!("  {label} {} ({})", result.score, result.level.label());
    if let Some(signal) = result.negative_signals.first() {
        println!("    top risk: {signal}");
    }
    if let Some(signal) = result.positive_signals.first() {
        println!("    top strength: {signal}");
    }
}

fn render_sweep_summary(as_of: NaiveDate, summary: &SweepSummary) {
    println!("Playbook sweep for {as_of}");
    println!(
        "- {} accounts evaluated | {} missing | {} failed",
        summary.accounts_evaluated, summary.accounts_missing, summary.accounts_failed
    );
    println!(
        "- {} tasks created | {} already open | {} health alerts",
        summary.tasks_created, summary.tasks_deduplicated, summary.alerts_published
    );
    if summary.interrupted {
        println!("- Sweep interrupted before every account was visited");
    }
}
