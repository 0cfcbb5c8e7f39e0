//! Build output verification
//!
//! Confirms that the build left a non-empty output directory before anything
//! tries to archive it.

pub mod verify;

pub use verify::{OutputVerifier, VerifiedOutput};
