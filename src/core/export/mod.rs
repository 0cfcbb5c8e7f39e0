//! Export orchestration
//!
//! This module provides the export logic for Sitepack:
//! - [`ExportStrategy`] with its two implementations, [`LocalBuilder`]
//!   (origin role) and [`RemoteForwarder`] (edge role)
//! - [`ExportOrchestrator`], which drives one request through a strategy and
//!   maps failures to [`ExportFailure`]
//! - [`ExportReport`] for completed local exports

pub mod local;
pub mod orchestrator;
pub mod remote;
pub mod report;
pub mod strategy;

pub use local::LocalBuilder;
pub use orchestrator::{
    ExportFailure, ExportOrchestrator, ExportResponse, ExportState, EXPORT_FAILED,
    EXPORT_IN_PROGRESS, OUTPUT_DIR_NOT_FOUND,
};
pub use remote::RemoteForwarder;
pub use report::ExportReport;
pub use strategy::{ExportArtifact, ExportStrategy};
