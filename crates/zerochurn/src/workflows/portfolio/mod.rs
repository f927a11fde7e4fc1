//! Caller layer around the engine: account lookup, report caching, playbook sweeps, and the
//! HTTP surface.

pub mod cache;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use cache::{CacheLookup, Clock, SystemClock, TtlCache};
pub use repository::{
    AccountId, AccountRecord, AccountSource, AlertError, AlertPublisher, HealthAlert, RepositoryError,
    SuccessTask, TaskRepository,
};
pub use router::{portfolio_router, PipelineRequest, ReportQuery, ScoreRequest};
pub use service::{
    assess_account, evaluate_playbooks, AccountReport, PlaybookEvaluation, PortfolioService,
    PortfolioServiceError, SweepSummary,
};
