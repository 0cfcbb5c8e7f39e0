//! Downstream address resolution

use crate::config::{DeploymentContext, ForwardConfig};
use crate::domain::ForwardError;
use std::fmt;
use url::Url;

/// Fully resolved downstream export endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    url: Url,
}

impl ForwardTarget {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for ForwardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Pick the downstream base URL for `context` and append the export path
///
/// Precedence: the container URL when containerized, then the explicit
/// override, then the configured default.
///
/// # Examples
///
/// ```
/// use sitepack::adapters::forward::resolve_target;
/// use sitepack::config::{DeploymentContext, ForwardConfig};
///
/// let config = ForwardConfig::default();
/// let target = resolve_target(&config, &DeploymentContext::new(true, None)).unwrap();
/// assert_eq!(target.as_str(), "http://client:3000/api/static-export");
/// ```
pub fn resolve_target(
    config: &ForwardConfig,
    context: &DeploymentContext,
) -> Result<ForwardTarget, ForwardError> {
    let base = if context.containerized {
        config.container_url.as_str()
    } else if let Some(ref url) = context.downstream_override {
        url.as_str()
    } else {
        config.default_url.as_str()
    };

    let mut url =
        Url::parse(base).map_err(|e| ForwardError::InvalidTarget(format!("{base}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ForwardError::InvalidTarget(format!(
            "{base}: unsupported scheme {}",
            url.scheme()
        )));
    }

    let path = format!("{}{}", url.path().trim_end_matches('/'), config.path);
    url.set_path(&path);

    Ok(ForwardTarget { url })
}
