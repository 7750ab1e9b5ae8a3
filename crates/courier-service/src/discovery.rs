//! Discovery strategy seams.
//!
//! Two mutually exclusive strategies, chosen at construction: *Local*
//! rides a broadcast discovery facility (mDNS-style, externally provided)
//! that reports found peers at arbitrary times; *Global* combines the
//! distributed record store with explicit boot-peer connections and the
//! bootstrap quorum wait.

use crate::HostError;
use courier_directory::RecordStore;
use courier_identity::NetworkId;
use std::sync::Arc;

/// Callback invoked by the broadcast facility for every peer it finds.
///
/// May fire at any time once the facility is started, so the service only
/// starts it after all channel handlers are installed.
pub type PeerFoundHandler = Arc<dyn Fn(NetworkId) + Send + Sync>;

/// Local broadcast discovery facility (external collaborator).
pub trait LocalDiscovery: Send + Sync {
    /// Start broadcasting and listening, delivering found peers to
    /// `on_peer_found`.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] if the facility cannot start.
    fn start(&self, on_peer_found: PeerFoundHandler) -> Result<(), HostError>;

    /// Stop the facility. Idempotent.
    fn close(&self);
}

/// How the service locates peers it has never spoken to.
pub enum DiscoveryStrategy {
    /// Broadcast discovery on the local network segment.
    Local(Box<dyn LocalDiscovery>),
    /// Distributed record store plus boot-peer bootstrap.
    Global(Arc<dyn RecordStore>),
}

impl std::fmt::Debug for DiscoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(_) => f.write_str("DiscoveryStrategy::Local"),
            Self::Global(_) => f.write_str("DiscoveryStrategy::Global"),
        }
    }
}
