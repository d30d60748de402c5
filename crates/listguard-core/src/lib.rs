//! listguard - per-list locking for mailing list management.
//!
//! Lists are discovered from one or more spool directories at startup and
//! can be added or removed at runtime. Each watched list has its own
//! read/write lock, so operations on different lists never wait on each
//! other while changes to the same list are serialized.
//!
//! The actual work (creating lists, changing members, reading member
//! classes) is done by an [`OperationExecutor`] supplied by the caller. The
//! [`ListCoordinator`] takes the right guard, refuses unwatched lists and
//! only then delegates.
//!
//! # Example
//!
//! ```rust,ignore
//! use listguard::{CancellationToken, ListCoordinator, SubRequest};
//!
//! #[tokio::main]
//! async fn main() -> listguard::Result<()> {
//!     let coordinator = ListCoordinator::builder(executor)
//!         .discovery(discovery)
//!         .spools(["/var/spool/mlmmj"])
//!         .build()
//!         .await?;
//!
//!     let cancel = CancellationToken::new();
//!     coordinator
//!         .subscribe(SubRequest::new("a@example.com", "announce"), &cancel)
//!         .await?;
//!
//!     let members = coordinator
//!         .list_all_members("/var/spool/mlmmj", "announce", &cancel)
//!         .await?;
//!     println!("{:?}", members.data.subscribers);
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod models;
pub mod naming;
pub mod registry;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use config::{CoordinatorConfig, ListConfig};
pub use coordinator::{ListCoordinator, ListCoordinatorBuilder};
pub use error::{ExecutorError, ListError, Result};
pub use executor::{ExecutorResult, ListDiscovery, NoDiscovery, OperationExecutor};
pub use models::{
    ControllerLists, MakeListRequest, MemberLists, MemberMode, MembershipChange, Partial,
    SubRequest, UnsubRequest,
};
pub use naming::{list_dir, ListRef};
pub use registry::{GuardMode, ListGuard, ListRegistry, RegistryStats};
