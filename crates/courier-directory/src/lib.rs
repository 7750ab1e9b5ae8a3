//! # Courier Directory
//!
//! Peer directory for the Courier layer.
//!
//! This crate provides:
//! - [`Directory`]: the in-memory, concurrency-safe map from business
//!   address to network identifier shared by every other component.
//! - [`SignedRecord`]: the cryptographically self-consistent lookup record
//!   a node publishes to the distributed table under the reserved
//!   [`RECORD_NAMESPACE`].
//! - [`Validator`] / [`AddressRecordValidator`]: the pure validation and
//!   conflict-resolution pair injected into the table at construction time.
//! - [`RecordStore`]: the put/get/bootstrap seam to the externally provided
//!   multi-party table, with a validating [`MemoryRecordStore`] for tests
//!   and single-process deployments.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod directory;
pub mod error;
pub mod record;
pub mod store;

pub use directory::Directory;
pub use error::{RecordError, StoreError};
pub use record::{
    AddressRecordValidator, RECORD_NAMESPACE, RecordData, SignedRecord, Validator, record_key,
};
pub use store::{MemoryRecordStore, RecordStore};
