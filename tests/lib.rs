//! Shared harness for Courier integration tests.
//!
//! Provides an in-process transport: a [`MemoryNetwork`] registry of
//! [`MemoryHost`]s whose channels are `tokio::io::duplex` pipes and whose
//! dial addresses are `/memory/<hex-identifier>`. The harness honors the
//! same contracts the service expects from a real host (handler dispatch,
//! connection events, idempotent close) and adds failure injection for the
//! retry tests.

use async_trait::async_trait;
use courier_identity::{Identity, NetworkId};
use courier_service::{
    ChannelHandler, ChannelStream, ConnectionEvent, Host, HostError, LocalDiscovery,
    PeerFoundHandler, ProtocolTag,
};
use dashmap::DashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast;

/// Address scheme used by the in-memory transport.
pub const MEMORY_SCHEME: &str = "/memory/";

/// Install the test tracing subscriber, honoring `RUST_LOG`. Safe to call
/// from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic 32-byte identity seed for test node `tag`.
#[must_use]
pub fn seed(tag: u8) -> Vec<u8> {
    vec![tag; 32]
}

/// The network identifier a node started from [`seed`]`(tag)` will carry.
#[must_use]
pub fn id_for_seed(tag: u8) -> NetworkId {
    Identity::from_seed(&seed(tag))
        .expect("seed is 32 bytes")
        .network_id()
}

/// The `/memory/` dial address of the node started from [`seed`]`(tag)`.
#[must_use]
pub fn address_for_seed(tag: u8) -> String {
    format!("{MEMORY_SCHEME}{}", id_for_seed(tag))
}

/// Registry connecting [`MemoryHost`]s in one process.
#[derive(Default)]
pub struct MemoryNetwork {
    hosts: DashMap<NetworkId, Arc<MemoryHost>>,
}

impl MemoryNetwork {
    /// Create an empty network.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a host for `identity` and return it.
    pub fn register(self: &Arc<Self>, identity: &Identity) -> Arc<MemoryHost> {
        let host = Arc::new(MemoryHost {
            id: identity.network_id(),
            network: Arc::downgrade(self),
            handlers: DashMap::new(),
            connections: DashMap::new(),
            events: broadcast::channel(64).0,
            closed: AtomicBool::new(false),
            fail_next_opens: AtomicUsize::new(0),
        });
        self.hosts.insert(host.id, host.clone());
        host
    }

    /// Look up a registered host by identifier.
    #[must_use]
    pub fn host(&self, id: &NetworkId) -> Option<Arc<MemoryHost>> {
        self.hosts.get(id).map(|entry| entry.value().clone())
    }
}

/// In-process [`Host`] backed by duplex pipes.
pub struct MemoryHost {
    id: NetworkId,
    network: Weak<MemoryNetwork>,
    handlers: DashMap<ProtocolTag, ChannelHandler>,
    connections: DashMap<NetworkId, ()>,
    events: broadcast::Sender<ConnectionEvent>,
    closed: AtomicBool,
    fail_next_opens: AtomicUsize,
}

impl MemoryHost {
    /// Fail the next `count` outbound channel opens with `Unreachable`.
    pub fn fail_next_opens(&self, count: usize) {
        self.fail_next_opens.store(count, Ordering::SeqCst);
    }

    fn peer_host(&self, peer: NetworkId) -> Result<Arc<MemoryHost>, HostError> {
        let network = self.network.upgrade().ok_or(HostError::Closed)?;
        network.host(&peer).ok_or(HostError::Unreachable(peer))
    }

    fn note_connected(&self, peer: NetworkId) {
        if self.connections.insert(peer, ()).is_none() {
            let _ = self.events.send(ConnectionEvent::Connected(peer));
        }
    }

    fn connect_pair(&self, remote: &MemoryHost) {
        self.note_connected(remote.id);
        remote.note_connected(self.id);
    }
}

#[async_trait]
impl Host for MemoryHost {
    async fn open_channel(
        &self,
        peer: NetworkId,
        protocol: ProtocolTag,
    ) -> Result<ChannelStream, HostError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HostError::Closed);
        }
        if self
            .fail_next_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(HostError::Unreachable(peer));
        }

        let remote = self.peer_host(peer)?;
        let handler = remote
            .handlers
            .get(protocol)
            .map(|entry| entry.value().clone())
            .ok_or(HostError::Unreachable(peer))?;

        let (local, far) = tokio::io::duplex(64 * 1024);
        self.connect_pair(&remote);
        handler(Box::new(far) as ChannelStream);
        Ok(Box::new(local) as ChannelStream)
    }

    fn set_handler(&self, protocol: ProtocolTag, handler: ChannelHandler) {
        self.handlers.insert(protocol, handler);
    }

    fn remove_handler(&self, protocol: ProtocolTag) {
        self.handlers.remove(protocol);
    }

    fn listen_addresses(&self) -> Vec<String> {
        vec![format!("{MEMORY_SCHEME}{}", self.id)]
    }

    async fn dial(&self, address: &str) -> Result<NetworkId, HostError> {
        let hex_id = address
            .strip_prefix(MEMORY_SCHEME)
            .ok_or_else(|| HostError::InvalidAddress(address.to_owned()))?;
        let peer = NetworkId::from_str(hex_id)
            .map_err(|_| HostError::InvalidAddress(address.to_owned()))?;

        let remote = self
            .peer_host(peer)
            .map_err(|_| HostError::DialFailed {
                address: address.to_owned(),
                reason: "no such host".to_owned(),
            })?;
        self.connect_pair(&remote);
        Ok(peer)
    }

    fn connected_peers(&self) -> usize {
        self.connections.len()
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    async fn close(&self) -> Result<(), HostError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(network) = self.network.upgrade() {
            network.hosts.remove(&self.id);
        }
        for entry in self.connections.iter() {
            let _ = self.events.send(ConnectionEvent::Disconnected(*entry.key()));
        }
        self.connections.clear();
        self.handlers.clear();
        Ok(())
    }
}

/// Hand-cranked broadcast discovery facility.
///
/// Tests call [`MemoryLocalDiscovery::announce`] to simulate the facility
/// finding a peer on the local segment. Clones share state, so a test keeps
/// one clone and boxes the other into the discovery strategy.
#[derive(Clone, Default)]
pub struct MemoryLocalDiscovery {
    inner: Arc<DiscoveryInner>,
}

#[derive(Default)]
struct DiscoveryInner {
    on_peer_found: Mutex<Option<PeerFoundHandler>>,
    closed: AtomicBool,
}

impl MemoryLocalDiscovery {
    /// Create an idle facility.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `peer` as found, as a broadcast listener would.
    pub fn announce(&self, peer: NetworkId) {
        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }
        let guard = self.inner.on_peer_found.lock().expect("handler lock");
        if let Some(handler) = guard.as_ref() {
            handler(peer);
        }
    }

    /// Whether [`LocalDiscovery::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl LocalDiscovery for MemoryLocalDiscovery {
    fn start(&self, on_peer_found: PeerFoundHandler) -> Result<(), HostError> {
        *self.inner.on_peer_found.lock().expect("handler lock") = Some(on_peer_found);
        Ok(())
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}
