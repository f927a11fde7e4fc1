mod common;
mod engine;
mod snapshot;
