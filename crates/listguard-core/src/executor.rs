//! Collaborators that perform the actual list operations.
//!
//! The coordinator does not know how a list is created, how members are
//! changed or how spools are enumerated. Implementations of these traits do
//! that work; the coordinator only decides when they may run.

use crate::cancel::CancellationToken;
use crate::error::ExecutorError;
use crate::models::{MakeListRequest, MemberMode, MembershipChange};
use crate::naming::ListRef;
use async_trait::async_trait;

/// Result type returned by collaborators.
pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;

/// Performs operations against a single list.
///
/// Implementations must honour the cancellation token: once it fires they
/// should abandon in-flight work and return promptly. The coordinator also
/// stops awaiting the call when the token fires, so a slow implementation
/// can delay cleanup but never a caller.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Create a list. Returns the executor's output text.
    async fn make_list(
        &self,
        request: &MakeListRequest,
        cancel: &CancellationToken,
    ) -> ExecutorResult<String>;

    /// Subscribe or unsubscribe an address. Returns the executor's output text.
    async fn change_membership(
        &self,
        change: &MembershipChange,
        cancel: &CancellationToken,
    ) -> ExecutorResult<String>;

    /// List the addresses in one membership class.
    ///
    /// `None` asks for the executor's unfiltered listing of the list.
    async fn list(
        &self,
        list: &ListRef,
        mode: Option<MemberMode>,
        cancel: &CancellationToken,
    ) -> ExecutorResult<Vec<String>>;

    /// Count the addresses in one membership class, or all of them for `None`.
    async fn count(
        &self,
        list: &ListRef,
        mode: Option<MemberMode>,
        cancel: &CancellationToken,
    ) -> ExecutorResult<u64>;
}

/// Enumerates the lists that live in a spool.
#[async_trait]
pub trait ListDiscovery: Send + Sync {
    /// Names of the lists in `spool`, not yet joined with the spool path.
    async fn list_names(&self, spool: &str) -> ExecutorResult<Vec<String>>;
}

/// Discovery that never finds anything.
///
/// Used when a coordinator is built without a discovery source; lists then
/// only become known through `make_list` or `watch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiscovery;

#[async_trait]
impl ListDiscovery for NoDiscovery {
    async fn list_names(&self, _spool: &str) -> ExecutorResult<Vec<String>> {
        Ok(Vec::new())
    }
}
