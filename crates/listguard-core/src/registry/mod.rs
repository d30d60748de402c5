//! Registry of watched lists and their locks.
//!
//! A list is "watched" while it has an entry here. Operations against a list
//! that is not watched are refused before any work is delegated.

pub mod list_registry;

pub use list_registry::{GuardMode, ListGuard, ListRegistry, RegistryStats};
