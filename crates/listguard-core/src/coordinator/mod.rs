//! List coordinator.
//!
//! Every operation follows the same path: validate the request, take the
//! list's guard from the registry (write for changes, read for queries),
//! refuse unwatched lists, then hand the call to the executor. The guard is
//! dropped on every exit path, including cancellation and timeout.

mod builder;

pub use builder::ListCoordinatorBuilder;

use crate::cancel::CancellationToken;
use crate::error::{ListError, Result};
use crate::executor::{ExecutorResult, ListDiscovery, OperationExecutor};
use crate::models::{
    ControllerLists, MakeListRequest, MemberLists, MemberMode, MembershipChange, Partial,
    SubRequest, UnsubRequest,
};
use crate::naming::{list_dir, ListRef};
use crate::registry::{GuardMode, ListGuard, ListRegistry, RegistryStats};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Serializes operations per list and delegates them to an executor.
///
/// Owns the registry of watched lists. Operations on different lists run
/// fully concurrently; on the same list, changes are exclusive and queries
/// share the list.
pub struct ListCoordinator {
    registry: ListRegistry,
    executor: Arc<dyn OperationExecutor>,
    discovery: Arc<dyn ListDiscovery>,
    spools: Vec<String>,
    operation_timeout: Option<Duration>,
}

impl ListCoordinator {
    /// Create a builder for a coordinator backed by `executor`.
    pub fn builder(executor: Arc<dyn OperationExecutor>) -> ListCoordinatorBuilder {
        ListCoordinatorBuilder::new(executor)
    }

    /// Create a list and start watching it.
    ///
    /// No guard is taken: the list does not exist yet. The list is only
    /// registered once the executor reports success, and registering a list
    /// that is already watched is harmless.
    pub async fn make_list(
        &self,
        request: &MakeListRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let list = request.list();
        let output = self
            .delegate("make_list", &list, cancel, self.executor.make_list(request, cancel))
            .await?;

        let key = list.key();
        if self.registry.add(&key).await {
            info!("Created list {}", key);
        } else {
            debug!("Created list {} was already watched", key);
        }
        Ok(output)
    }

    /// Subscribe an address to a watched list.
    pub async fn subscribe(
        &self,
        request: SubRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.change_membership(MembershipChange::Subscribe(request), cancel)
            .await
    }

    /// Unsubscribe an address from a watched list.
    pub async fn unsubscribe(
        &self,
        request: UnsubRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.change_membership(MembershipChange::Unsubscribe(request), cancel)
            .await
    }

    /// Apply a membership change under the list's write guard.
    ///
    /// Invalid modes are rejected before the registry is consulted.
    pub async fn change_membership(
        &self,
        change: MembershipChange,
        cancel: &CancellationToken,
    ) -> Result<String> {
        change.validate()?;
        let list = change.list();
        let operation = if change.is_unsubscribe() {
            "unsubscribe"
        } else {
            "subscribe"
        };

        let _guard = self.guard(&list, GuardMode::Write).await?;
        self.delegate(
            operation,
            &list,
            cancel,
            self.executor.change_membership(&change, cancel),
        )
        .await
    }

    /// List the addresses of one class under the list's read guard.
    ///
    /// `mode` of `None` lists without a class filter.
    pub async fn list(
        &self,
        spool: &str,
        name: &str,
        mode: Option<MemberMode>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let list = ListRef::new(spool, name);
        let _guard = self.guard(&list, GuardMode::Read).await?;
        self.query(&list, mode, cancel).await
    }

    /// Count the addresses of one class under the list's read guard.
    ///
    /// `mode` of `None` counts without a class filter.
    pub async fn count(
        &self,
        spool: &str,
        name: &str,
        mode: Option<MemberMode>,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let list = ListRef::new(spool, name);
        let _guard = self.guard(&list, GuardMode::Read).await?;
        self.delegate("count", &list, cancel, self.executor.count(&list, mode, cancel))
            .await
    }

    /// Fetch subscribers, digest and nomail members concurrently.
    ///
    /// All three queries run under a single read guard that is held until
    /// every query has finished. An unwatched list is an error; otherwise the
    /// result carries whatever the queries returned plus the first failure
    /// in subscriber, digest, nomail order.
    pub async fn list_all_members(
        &self,
        spool: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Partial<MemberLists>> {
        let list = ListRef::new(spool, name);
        let _guard = self.guard(&list, GuardMode::Read).await?;

        let (subscribers, digest, nomail) = tokio::join!(
            self.query(&list, Some(MemberMode::Subscriber), cancel),
            self.query(&list, Some(MemberMode::Digest), cancel),
            self.query(&list, Some(MemberMode::Nomail), cancel),
        );

        let mut error = None;
        let data = MemberLists {
            subscribers: keep_first_error(subscribers, &mut error),
            digest: keep_first_error(digest, &mut error),
            nomail: keep_first_error(nomail, &mut error),
        };
        Ok(Partial { data, error })
    }

    /// Fetch owners and moderators concurrently under one read guard.
    ///
    /// Error precedence is owners, then moderators.
    pub async fn list_all_controllers(
        &self,
        spool: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Partial<ControllerLists>> {
        let list = ListRef::new(spool, name);
        let _guard = self.guard(&list, GuardMode::Read).await?;

        let (owners, moderators) = tokio::join!(
            self.query(&list, Some(MemberMode::Owner), cancel),
            self.query(&list, Some(MemberMode::Moderator), cancel),
        );

        let mut error = None;
        let data = ControllerLists {
            owners: keep_first_error(owners, &mut error),
            moderators: keep_first_error(moderators, &mut error),
        };
        Ok(Partial { data, error })
    }

    /// Rescan the configured spools, replacing every watched list.
    ///
    /// On error the registry holds whatever the healthy spools reported.
    pub async fn reload(&self) -> Result<usize> {
        self.registry
            .reinitialize(&self.spools, self.discovery.as_ref())
            .await
    }

    /// Start watching an existing list without creating it.
    pub async fn watch(&self, spool: &str, name: &str) -> bool {
        self.registry.add(&list_dir(spool, name)).await
    }

    /// Stop watching a list. Operations already holding its guard finish normally.
    pub async fn unwatch(&self, spool: &str, name: &str) -> bool {
        self.registry.remove(&list_dir(spool, name)).await
    }

    pub async fn is_watched(&self, spool: &str, name: &str) -> bool {
        self.registry.contains(&list_dir(spool, name)).await
    }

    /// Sorted keys of every watched list.
    pub async fn watched_lists(&self) -> Vec<String> {
        self.registry.names().await
    }

    pub async fn registry_stats(&self) -> RegistryStats {
        self.registry.stats().await
    }

    pub fn registry(&self) -> &ListRegistry {
        &self.registry
    }

    pub fn spools(&self) -> &[String] {
        &self.spools
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    async fn guard(&self, list: &ListRef, mode: GuardMode) -> Result<ListGuard> {
        let key = list.key();
        match self.registry.acquire(&key, mode).await {
            Some(guard) => Ok(guard),
            None => {
                warn!("Refusing operation on unwatched list {}", key);
                Err(ListError::UnwatchedList { list: key })
            }
        }
    }

    async fn query(
        &self,
        list: &ListRef,
        mode: Option<MemberMode>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        self.delegate("list", list, cancel, self.executor.list(list, mode, cancel))
            .await
    }

    /// Run an executor call, bounded by the caller's token and the timeout.
    async fn delegate<T, F>(
        &self,
        operation: &'static str,
        list: &ListRef,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T>
    where
        F: Future<Output = ExecutorResult<T>>,
    {
        if let Err(err) = cancel.check() {
            debug!("{} on list {} skipped: already cancelled", operation, list);
            return Err(err.into());
        }

        let cancellable = async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ListError::Cancelled),
                result = call => result.map_err(ListError::from),
            }
        };

        let result = match self.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, cancellable)
                .await
                .unwrap_or_else(|_| Err(ListError::Timeout(limit))),
            None => cancellable.await,
        };

        if let Err(err) = &result {
            warn!("{} on list {} failed: {}", operation, list, err);
        }
        result
    }
}

/// Split a category result into its data, recording the error if it is the first.
fn keep_first_error<T>(result: Result<T>, first: &mut Option<ListError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            first.get_or_insert(err);
            None
        }
    }
}
