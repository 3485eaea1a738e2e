//! Storage contract and the in-memory backend.
//!
//! The trait defines the abstract interface to the storage collaborator;
//! `memory` provides the reference implementation.

mod memory;
mod traits;

pub use memory::InMemoryEntityStore;
pub use traits::{EntityStore, StorageError};
