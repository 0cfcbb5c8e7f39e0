//! CLI command implementations
//!
//! Exit codes shared by all commands:
//!
//! | Code | Meaning                        |
//! |------|--------------------------------|
//! | 0    | Success                        |
//! | 2    | Configuration error            |
//! | 3    | Build or verification failure  |
//! | 5    | Fatal error                    |

pub mod export;
pub mod init;
pub mod serve;
pub mod validate;

/// Successful run
pub const EXIT_OK: i32 = 0;
/// Configuration could not be loaded or is invalid
pub const EXIT_CONFIG: i32 = 2;
/// Build failed or produced no usable output
pub const EXIT_BUILD: i32 = 3;
/// Anything else
pub const EXIT_FATAL: i32 = 5;
