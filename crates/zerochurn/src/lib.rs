//! Account scoring, misalignment, and playbook trigger engine for customer success teams.
//!
//! The engine under [`workflows::scoring`] and [`workflows::playbooks`] is pure and synchronous.
//! Everything that touches collaborators (account sources, task stores, alert channels, caches)
//! lives in [`workflows::portfolio`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
