//! External system integrations for Sitepack.
//!
//! - [`forward`] - HTTP forwarding to a downstream builder service
//!
//! Adapters isolate third-party clients from the rest of the crate: errors
//! leave this module as domain error types, never as `reqwest` errors.

pub mod forward;
