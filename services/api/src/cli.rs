use crate::demo::{run_demo, run_score, run_sweep, DemoArgs, ScoreArgs, SweepArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use zerochurn::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "ZeroChurn",
    about = "Score accounts, evaluate playbooks, and serve the ZeroChurn API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print propensity, health, churn risk, and playbooks for accounts in a JSON export
    Score(ScoreArgs),
    /// Run a playbook sweep over an account export and list the tasks it would open
    Sweep(SweepArgs),
    /// Walk through the engine using built-in sample accounts
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Account export (JSON array) served by the report endpoint
    #[arg(long)]
    pub(crate) accounts: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Sweep(args) => run_sweep(args).await,
        Command::Demo(args) => run_demo(args),
    }
}
