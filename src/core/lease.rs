//! Single-flight export lease
//!
//! At most one local build+archive sequence runs at a time in the process.
//! The lease is a single-permit semaphore; the guard is an owned permit so it
//! can move into the task that runs the build and is released when that task
//! ends, however it ends.

use crate::config::{LeaseConfig, LeasePolicyKind};
use crate::domain::{Result, SitepackError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// How a caller waits for the lease
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeasePolicy {
    /// Wait until the lease is free
    Wait,
    /// Fail immediately when the lease is held
    Reject,
    /// Wait up to the given duration, then fail
    BoundedWait(Duration),
}

impl LeasePolicy {
    pub fn from_config(config: &LeaseConfig) -> Self {
        match config.policy {
            LeasePolicyKind::Wait => LeasePolicy::Wait,
            LeasePolicyKind::Reject => LeasePolicy::Reject,
            LeasePolicyKind::Bounded => {
                LeasePolicy::BoundedWait(Duration::from_secs(config.wait_timeout_secs))
            }
        }
    }
}

/// Proof of holding the export lease; dropping it releases the lease
#[derive(Debug)]
pub struct LeaseGuard {
    _permit: OwnedSemaphorePermit,
}

/// Process-wide single-flight guard for local exports
#[derive(Debug, Clone)]
pub struct ExportLease {
    semaphore: Arc<Semaphore>,
    policy: LeasePolicy,
}

impl ExportLease {
    pub fn new(policy: LeasePolicy) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            policy,
        }
    }

    pub fn policy(&self) -> LeasePolicy {
        self.policy
    }

    /// Whether an export currently holds the lease
    pub fn is_held(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    /// Acquire the lease according to the configured policy
    ///
    /// # Errors
    ///
    /// Returns [`SitepackError::LeaseBusy`] when the policy gives up.
    pub async fn acquire(&self) -> Result<LeaseGuard> {
        let permit = match self.policy {
            LeasePolicy::Wait => self.semaphore.clone().acquire_owned().await.map_err(|_| {
                SitepackError::Io("export lease semaphore closed".to_string())
            })?,
            LeasePolicy::Reject => match self.semaphore.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => return Err(SitepackError::LeaseBusy),
                Err(TryAcquireError::Closed) => {
                    return Err(SitepackError::Io(
                        "export lease semaphore closed".to_string(),
                    ))
                }
            },
            LeasePolicy::BoundedWait(limit) => {
                match tokio::time::timeout(limit, self.semaphore.clone().acquire_owned()).await {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => {
                        return Err(SitepackError::Io(
                            "export lease semaphore closed".to_string(),
                        ))
                    }
                    Err(_) => {
                        tracing::warn!(
                            wait_secs = limit.as_secs(),
                            "Gave up waiting for export lease"
                        );
                        return Err(SitepackError::LeaseBusy);
                    }
                }
            }
        };

        Ok(LeaseGuard { _permit: permit })
    }
}

impl Default for ExportLease {
    fn default() -> Self {
        Self::new(LeasePolicy::Wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_release_on_drop() {
        let lease = ExportLease::new(LeasePolicy::Reject);
        let guard = lease.acquire().await.unwrap();
        assert!(lease.is_held());
        drop(guard);
        assert!(!lease.is_held());
        assert!(lease.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_reject_when_held() {
        let lease = ExportLease::new(LeasePolicy::Reject);
        let _guard = lease.acquire().await.unwrap();
        assert!(matches!(
            lease.acquire().await,
            Err(SitepackError::LeaseBusy)
        ));
    }

    #[tokio::test]
    async fn test_bounded_wait_times_out() {
        let lease = ExportLease::new(LeasePolicy::BoundedWait(Duration::from_millis(50)));
        let _guard = lease.acquire().await.unwrap();
        assert!(matches!(
            lease.acquire().await,
            Err(SitepackError::LeaseBusy)
        ));
    }

    #[tokio::test]
    async fn test_wait_resumes_after_release() {
        let lease = ExportLease::new(LeasePolicy::Wait);
        let guard = lease.acquire().await.unwrap();

        let waiter = {
            let lease = lease.clone();
            tokio::spawn(async move { lease.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert!(waiter.await.unwrap().is_ok());
    }

    #[test]
    fn test_policy_from_config() {
        let config = LeaseConfig {
            policy: LeasePolicyKind::Bounded,
            wait_timeout_secs: 30,
        };
        assert_eq!(
            LeasePolicy::from_config(&config),
            LeasePolicy::BoundedWait(Duration::from_secs(30))
        );
        assert_eq!(
            LeasePolicy::from_config(&LeaseConfig::default()),
            LeasePolicy::Wait
        );
    }
}
