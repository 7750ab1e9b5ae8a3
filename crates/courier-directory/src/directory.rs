//! Concurrent map from business address to network identifier.
//!
//! The directory is the only structure mutated from many concurrent tasks
//! (handshake handlers, resolution on the send path), so all mutation goes
//! through its atomic primitives and callers never need external locking.
//! Entries are never deleted; a stale entry is tolerated and overwritten by
//! a later exchange or resolution.

use courier_identity::NetworkId;
use courier_wire::BusinessAddress;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-memory cache mapping business address to network identifier.
///
/// Invariant: at most one identifier per address at any time.
#[derive(Debug, Default)]
pub struct Directory {
    entries: DashMap<BusinessAddress, NetworkId>,
}

impl Directory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the identifier for an address.
    #[must_use]
    pub fn load(&self, address: &BusinessAddress) -> Option<NetworkId> {
        self.entries.get(address).map(|entry| *entry.value())
    }

    /// Store a binding unconditionally (last writer wins).
    ///
    /// Used by the resolution path so a restarted peer's fresh record
    /// replaces the stale identifier.
    pub fn store(&self, address: BusinessAddress, id: NetworkId) {
        self.entries.insert(address, id);
    }

    /// Store a binding only if the address is absent.
    ///
    /// Returns the identifier now in the directory and whether an entry was
    /// already present. This is the serialization point that keeps two
    /// racing handshakes for the same peer from both looking new, so "peer
    /// discovered" fires at most once per address.
    pub fn load_or_store(&self, address: BusinessAddress, id: NetworkId) -> (NetworkId, bool) {
        match self.entries.entry(address) {
            Entry::Occupied(occupied) => (*occupied.get(), true),
            Entry::Vacant(vacant) => {
                vacant.insert(id);
                (id, false)
            }
        }
    }

    /// Number of known bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
