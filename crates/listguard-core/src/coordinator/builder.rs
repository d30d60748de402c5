//! Builder for configuring ListCoordinator initialization.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::CoordinatorConfig;
use crate::coordinator::ListCoordinator;
use crate::error::Result;
use crate::executor::{ListDiscovery, NoDiscovery, OperationExecutor};
use crate::registry::ListRegistry;

/// Builder for configuring ListCoordinator initialization.
///
/// # Example
///
/// ```rust,ignore
/// use listguard::ListCoordinator;
///
/// let coordinator = ListCoordinator::builder(executor)
///     .discovery(discovery)
///     .spools(["/var/spool/mlmmj"])
///     .build()
///     .await?;
/// ```
pub struct ListCoordinatorBuilder {
    executor: Arc<dyn OperationExecutor>,
    discovery: Option<Arc<dyn ListDiscovery>>,
    spools: Vec<String>,
    operation_timeout: Option<Duration>,
    scan_on_build: bool,
}

impl ListCoordinatorBuilder {
    /// Create a new builder with default configuration.
    pub fn new(executor: Arc<dyn OperationExecutor>) -> Self {
        let config = CoordinatorConfig::default();
        Self {
            executor,
            discovery: None,
            spools: config.spools.clone(),
            operation_timeout: config.operation_timeout(),
            scan_on_build: true,
        }
    }

    /// Take spools and timeout from a loaded configuration.
    pub fn with_config(mut self, config: &CoordinatorConfig) -> Self {
        self.spools = config.spools.clone();
        self.operation_timeout = config.operation_timeout();
        self
    }

    /// Spools scanned for lists on build and on every reload.
    pub fn spools<I, S>(mut self, spools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spools = spools.into_iter().map(Into::into).collect();
        self
    }

    /// Source used to enumerate lists in a spool.
    ///
    /// Default: none, so lists are only known through `make_list` or `watch`.
    pub fn discovery(mut self, discovery: Arc<dyn ListDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Upper bound on each executor call. `None` disables the timeout.
    ///
    /// Default: 10 seconds
    pub fn operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Scan the spools while building.
    ///
    /// Disable to get a coordinator even when a spool cannot be scanned, then
    /// call `reload()` and inspect its result.
    ///
    /// Default: `true`
    pub fn scan_on_build(mut self, enable: bool) -> Self {
        self.scan_on_build = enable;
        self
    }

    /// Build the coordinator, failing if any spool cannot be scanned.
    pub async fn build(self) -> Result<ListCoordinator> {
        let coordinator = ListCoordinator {
            registry: ListRegistry::new(),
            executor: self.executor,
            discovery: self.discovery.unwrap_or_else(|| Arc::new(NoDiscovery)),
            spools: self.spools,
            operation_timeout: self.operation_timeout,
        };

        if self.scan_on_build {
            let watched = coordinator.reload().await?;
            info!(
                "List coordinator ready with {} lists from {} spools",
                watched,
                coordinator.spools.len()
            );
        }

        Ok(coordinator)
    }
}
