pub mod pipeline;
pub mod playbooks;
pub mod portfolio;
pub mod scoring;
