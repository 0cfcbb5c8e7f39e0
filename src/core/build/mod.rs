//! Build command execution
//!
//! The [`BuildExecutor`] runs the configured static build as a child process and
//! turns whatever happens into a [`BuildOutcome`](crate::domain::BuildOutcome).
//! It never panics and never returns `Err`: spawn errors, timeouts and
//! oversized output are all failure outcomes.

pub mod executor;

pub use executor::BuildExecutor;
