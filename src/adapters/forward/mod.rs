//! Downstream forwarding for the edge role
//!
//! An edge instance never builds. It sends the export request to a builder
//! service and relays the archive back. The builder address depends on where
//! the instance runs:
//!
//! | `DOCKER_ENV` | `CLIENT_API_URL` | Base URL                   |
//! |--------------|------------------|----------------------------|
//! | `true`       | any              | `forward.container_url`    |
//! | unset        | set              | `CLIENT_API_URL`           |
//! | unset        | unset            | `forward.default_url`      |

pub mod client;
pub mod target;

pub use client::{Forwarder, RelayedArchive};
pub use target::{resolve_target, ForwardTarget};
