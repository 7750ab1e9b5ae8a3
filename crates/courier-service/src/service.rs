//! The Courier message service.
//!
//! Orchestrates startup, runs the peer exchange handshake on every
//! connection, and delivers opaque envelopes with bounded retry. All
//! best-effort background work (handshakes, connection notifications) logs
//! and swallows its failures; everything on the caller-invoked send path
//! returns its error.

use crate::config::ServiceConfig;
use crate::discovery::{DiscoveryStrategy, LocalDiscovery};
use crate::error::{HostError, ServiceError};
use crate::host::{ChannelStream, ConnectionEvent, Host, ProtocolTag};
use courier_directory::{Directory, RecordStore, SignedRecord, StoreError, record_key};
use courier_identity::{Identity, NetworkId};
use courier_wire::{BusinessAddress, Envelope, PeerExchangeMessage, read_frame, write_frame};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval, sleep};
use tracing::{debug, info, warn};

/// Protocol tag for application message channels.
pub const MESSAGE_PROTOCOL: ProtocolTag = "/courier/msg/1.0.0";

/// Protocol tag for peer exchange handshake channels.
pub const PEER_EXCHANGE_PROTOCOL: ProtocolTag = "/courier/peerinfo/1.0.0";

/// Startup phase of the service.
///
/// The machine is linear with no loops back; `Ready` is terminal for the
/// happy path, and any failure before it aborts startup. The first two
/// phases exist only inside [`MessageService::start`], before the service
/// value is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServicePhase {
    /// Nothing built yet
    Uninitialized,
    /// Transport keypair loaded from the configured seed
    IdentityLoaded,
    /// Transport host constructed and listening
    TransportOpen,
    /// Channel handlers installed (inbound race closed)
    HandlersInstalled,
    /// Discovery strategy running
    DiscoveryRunning,
    /// Boot-peer quorum formed (Global strategy with boot peers only)
    QuorumReached,
    /// Fully started
    Ready,
}

/// A newly discovered peer binding, emitted at most once per address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    /// The peer's business address
    pub address: BusinessAddress,
    /// The identifier it is currently reachable at
    pub network_id: NetworkId,
}

/// Consumer ends of the service's outbound queues.
///
/// Both queues are bounded; a slow consumer backpressures the network
/// handlers instead of growing memory.
#[derive(Debug)]
pub struct ServiceMailboxes {
    /// Inbound application envelopes
    pub messages: mpsc::Receiver<Envelope>,
    /// Newly discovered peers
    pub peers: mpsc::Receiver<PeerRecord>,
}

/// Peer discovery and reliable delivery service for one node.
pub struct MessageService {
    identity: Identity,
    config: ServiceConfig,
    host: Arc<dyn Host>,
    directory: Directory,
    store: Option<Arc<dyn RecordStore>>,
    local: Option<Box<dyn LocalDiscovery>>,
    inbound: mpsc::Sender<Envelope>,
    discovered: mpsc::Sender<PeerRecord>,
    phase: Mutex<ServicePhase>,
    closed: AtomicBool,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl MessageService {
    /// Build and start a service: load the identity, open the transport,
    /// install handlers, start discovery, and, for the Global strategy,
    /// connect boot peers, wait for quorum, and publish this node's
    /// record.
    ///
    /// `host_factory` constructs the external transport host; it runs
    /// after the identity is loaded and before any handler exists, so the
    /// host must not accept inbound channels until `set_handler` is
    /// called for their protocol.
    ///
    /// # Errors
    ///
    /// Every failure here is fatal: bad key material, listener failure,
    /// local-discovery startup failure, quorum timeout, or record
    /// publication failure all abort startup. Failures after the host is
    /// constructed close it again before the error is returned.
    pub async fn start<F>(
        config: ServiceConfig,
        strategy: DiscoveryStrategy,
        host_factory: F,
    ) -> Result<(Arc<Self>, ServiceMailboxes), ServiceError>
    where
        F: FnOnce(&Identity) -> Result<Arc<dyn Host>, HostError>,
    {
        let identity = Identity::from_seed(&config.transport_seed)?;
        debug!(id = %identity.network_id().short(), "transport identity loaded");

        let host = host_factory(&identity)?;
        info!(
            id = %identity.network_id().short(),
            addresses = ?host.listen_addresses(),
            "transport host listening"
        );

        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_buffer);
        let (discovered_tx, discovered_rx) = mpsc::channel(config.inbound_buffer);
        let (store, local) = match strategy {
            DiscoveryStrategy::Local(local) => (None, Some(local)),
            DiscoveryStrategy::Global(store) => (Some(store), None),
        };

        let service = Arc::new(Self {
            identity,
            config,
            host,
            directory: Directory::new(),
            store,
            local,
            inbound: inbound_tx,
            discovered: discovered_tx,
            phase: Mutex::new(ServicePhase::TransportOpen),
            closed: AtomicBool::new(false),
            event_task: Mutex::new(None),
        });

        service.install_handlers();
        service.advance(ServicePhase::HandlersInstalled);

        let started = if service.local.is_some() {
            service.start_local_discovery()
        } else {
            service.start_global_discovery().await
        };
        if let Err(error) = started {
            // A failed startup must not leave a live listener or a running
            // event task behind for callers that survive the error.
            if let Err(teardown) = service.close().await {
                warn!(%teardown, "teardown after failed startup also failed");
            }
            return Err(error);
        }

        service.advance(ServicePhase::Ready);
        info!(id = %service.id().short(), "message service ready");
        Ok((
            service,
            ServiceMailboxes {
                messages: inbound_rx,
                peers: discovered_rx,
            },
        ))
    }

    /// This node's network identifier.
    #[must_use]
    pub fn id(&self) -> NetworkId {
        self.identity.network_id()
    }

    /// Addresses the transport host is listening on.
    #[must_use]
    pub fn listen_addresses(&self) -> Vec<String> {
        self.host.listen_addresses()
    }

    /// Current startup phase.
    #[must_use]
    pub fn phase(&self) -> ServicePhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    /// The shared address directory (read access for callers and tests).
    #[must_use]
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Deliver `payload` to the node owning `to`.
    ///
    /// Resolves the destination through the directory with a record-store
    /// fallback, then attempts up to `connect_attempts` channel opens with
    /// a fixed sleep between failed attempts. Blocks the calling task for
    /// up to `connect_attempts × retry_backoff` in the worst case; callers
    /// needing a non-blocking send invoke this from their own task.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Unresolved`] when the destination is unknown to
    /// both the directory and the record store;
    /// [`ServiceError::Undeliverable`] when the retry budget is exhausted;
    /// [`ServiceError::Closed`] after [`MessageService::close`].
    pub async fn send(&self, to: &BusinessAddress, payload: Vec<u8>) -> Result<(), ServiceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ServiceError::Closed);
        }

        let peer = self.resolve(to).await?;
        let record = Envelope::new(to.clone(), payload).to_bytes()?;

        let attempts = self.config.connect_attempts;
        for attempt in 1..=attempts {
            match self.host.open_channel(peer, MESSAGE_PROTOCOL).await {
                Ok(mut channel) => match write_frame(&mut channel, &record).await {
                    Ok(()) => {
                        let _ = channel.shutdown().await;
                        return Ok(());
                    }
                    Err(error) => {
                        info!(attempt, to = %to, %error, "message write failed");
                    }
                },
                Err(error) => {
                    info!(attempt, to = %to, %error, "could not open message channel");
                }
            }
            if attempt < attempts {
                sleep(self.config.retry_backoff).await;
            }
        }
        Err(ServiceError::Undeliverable {
            to: to.clone(),
            attempts,
        })
    }

    /// Close the service: stop discovery, remove handlers, close the host.
    /// Idempotent; in-flight send retries run out their own budget.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Host`] if transport teardown fails.
    pub async fn close(&self) -> Result<(), ServiceError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(local) = &self.local {
            local.close();
        }
        if let Some(task) = self.event_task.lock().expect("task lock poisoned").take() {
            task.abort();
        }
        self.host.remove_handler(MESSAGE_PROTOCOL);
        self.host.remove_handler(PEER_EXCHANGE_PROTOCOL);
        self.host.close().await?;
        info!(id = %self.id().short(), "message service closed");
        Ok(())
    }

    fn advance(&self, phase: ServicePhase) {
        debug!(?phase, "service phase");
        *self.phase.lock().expect("phase lock poisoned") = phase;
    }

    /// Install both channel handlers. Must complete before discovery
    /// starts: an inbound channel may arrive the moment a peer can see us.
    fn install_handlers(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.host.set_handler(
            PEER_EXCHANGE_PROTOCOL,
            Arc::new(move |channel| {
                let Some(service) = weak.upgrade() else { return };
                tokio::spawn(async move { service.receive_peer_info(channel).await });
            }),
        );

        let weak = Arc::downgrade(self);
        self.host.set_handler(
            MESSAGE_PROTOCOL,
            Arc::new(move |channel| {
                let Some(service) = weak.upgrade() else { return };
                tokio::spawn(async move { service.receive_message(channel).await });
            }),
        );
    }

    fn start_local_discovery(self: &Arc<Self>) -> Result<(), ServiceError> {
        let Some(local) = &self.local else {
            return Ok(());
        };
        let weak = Arc::downgrade(self);
        local.start(Arc::new(move |peer| {
            let Some(service) = weak.upgrade() else { return };
            debug!(peer = %peer.short(), "broadcast discovery found peer");
            tokio::spawn(async move { service.send_peer_info(peer, false).await });
        }))?;
        self.advance(ServicePhase::DiscoveryRunning);
        Ok(())
    }

    async fn start_global_discovery(self: &Arc<Self>) -> Result<(), ServiceError> {
        let Some(store) = self.store.clone() else {
            return Ok(());
        };
        self.spawn_event_task();
        self.advance(ServicePhase::DiscoveryRunning);

        let boot_peers = self.config.boot_peers.clone();
        if !boot_peers.is_empty() {
            self.connect_boot_peers(&boot_peers).await;
            info!(expected = boot_peers.len(), "waiting for boot peer connections");
            self.wait_for_quorum(boot_peers.len()).await?;
            self.advance(ServicePhase::QuorumReached);
        }

        self.publish_own_record().await?;
        store.bootstrap().await?;
        Ok(())
    }

    /// Forward connection-lifecycle events into handshake sends. Each
    /// handshake runs on its own task so a slow peer cannot stall event
    /// dispatch.
    fn spawn_event_task(self: &Arc<Self>) {
        let mut events = self.host.subscribe();
        let weak = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectionEvent::Connected(peer)) => {
                        debug!(peer = %peer.short(), "notification: connected to peer");
                        let Some(service) = weak.upgrade() else { break };
                        tokio::spawn(
                            async move { service.send_peer_info(peer, false).await },
                        );
                    }
                    Ok(ConnectionEvent::Disconnected(peer)) => {
                        debug!(peer = %peer.short(), "notification: disconnected from peer");
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "connection event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        *self.event_task.lock().expect("task lock poisoned") = Some(task);
    }

    /// Dial every configured boot peer, logging and continuing on
    /// individual failures, and greet each reachable one with a
    /// response-expecting handshake.
    async fn connect_boot_peers(&self, boot_peers: &[String]) {
        for address in boot_peers {
            match self.host.dial(address).await {
                Ok(peer) => {
                    debug!(address, peer = %peer.short(), "connected to boot peer");
                    self.send_peer_info(peer, true).await;
                }
                Err(error) => {
                    warn!(address, %error, "boot peer dial failed");
                }
            }
        }
    }

    /// Poll the live-connection count until it reaches `expected` or the
    /// configured timeout elapses. Logs progress each tick so an operator
    /// can observe slow convergence.
    async fn wait_for_quorum(&self, expected: usize) -> Result<(), ServiceError> {
        let started = Instant::now();
        let mut ticker = interval(self.config.quorum_poll_interval);
        loop {
            ticker.tick().await;
            let connected = self.host.connected_peers();
            debug!(connected, expected, "boot peer quorum progress");
            if connected >= expected {
                info!(connected, "boot peer connection threshold met");
                return Ok(());
            }
            if let Some(timeout) = self.config.quorum_timeout {
                if started.elapsed() >= timeout {
                    return Err(ServiceError::QuorumTimeout {
                        connected,
                        expected,
                    });
                }
            }
        }
    }

    /// Publish this node's signed (address → identifier) record to the
    /// distributed table.
    async fn publish_own_record(&self) -> Result<(), ServiceError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let record =
            SignedRecord::seal_now(&self.identity, self.config.business_address.clone())?;
        let key = record_key(&self.config.business_address);
        store.put(&key, record.to_bytes()?).await?;
        info!(key, id = %self.id().short(), "published own directory record");
        Ok(())
    }

    /// Resolve a business address to a network identifier: directory
    /// first, record store on a miss, caching the result back so the next
    /// send skips the distributed lookup.
    async fn resolve(&self, to: &BusinessAddress) -> Result<NetworkId, ServiceError> {
        if let Some(peer) = self.directory.load(to) {
            return Ok(peer);
        }

        let key = record_key(to);
        let Some(store) = &self.store else {
            return Err(ServiceError::Unresolved {
                to: to.clone(),
                source: StoreError::NotFound { key },
            });
        };

        info!(%to, "address not in directory, querying record store");
        let unresolved = |source: StoreError| ServiceError::Unresolved {
            to: to.clone(),
            source,
        };
        let bytes = store.get(&key).await.map_err(unresolved)?;
        let record =
            SignedRecord::from_bytes(&bytes).map_err(|e| unresolved(StoreError::InvalidRecord(e)))?;
        record
            .verify()
            .map_err(|e| unresolved(StoreError::InvalidRecord(e)))?;

        let peer = record.network_id();
        self.directory.store(to.clone(), peer);
        info!(%to, peer = %peer.short(), "resolved address via record store");
        Ok(peer)
    }

    /// Send our (address, identifier) binding to `peer`. Best-effort:
    /// failure is logged and swallowed; the handshake retries implicitly
    /// on the next connection event.
    async fn send_peer_info(&self, peer: NetworkId, expect_response: bool) {
        if let Err(error) = self.try_send_peer_info(peer, expect_response).await {
            debug!(peer = %peer.short(), %error, "peer exchange send failed");
        }
    }

    async fn try_send_peer_info(
        &self,
        peer: NetworkId,
        expect_response: bool,
    ) -> Result<(), ServiceError> {
        let mut channel = self.host.open_channel(peer, PEER_EXCHANGE_PROTOCOL).await?;
        let message = PeerExchangeMessage {
            network_id: self.id(),
            address: self.config.business_address.clone(),
            expect_response,
        };
        write_frame(&mut channel, &message.to_bytes()?).await?;
        let _ = channel.shutdown().await;
        Ok(())
    }

    /// Inbound handshake handler: frame one record, bind it into the
    /// directory, emit "peer discovered" if the address is new, and answer
    /// response-expecting handshakes in kind, terminating after at most
    /// one round trip.
    async fn receive_peer_info(&self, mut channel: ChannelStream) {
        let record = match read_frame(&mut channel).await {
            Ok(Some(record)) => record,
            // The remote had nothing more to say.
            Ok(None) => return,
            Err(error) => {
                debug!(%error, "peer exchange read failed");
                return;
            }
        };
        let message = match PeerExchangeMessage::from_bytes(&record) {
            Ok(message) => message,
            Err(error) => {
                debug!(%error, "malformed peer exchange record");
                return;
            }
        };

        let (_, was_present) = self
            .directory
            .load_or_store(message.address.clone(), message.network_id);
        if !was_present {
            debug!(
                address = %message.address,
                peer = %message.network_id.short(),
                "stored new peer binding"
            );
            let discovered = PeerRecord {
                address: message.address,
                network_id: message.network_id,
            };
            if self.discovered.send(discovered).await.is_err() {
                debug!("peer-discovered mailbox dropped");
            }
        }

        if message.expect_response {
            self.send_peer_info(message.network_id, false).await;
        }
    }

    /// Inbound message handler: frame one record, decode it, and push it
    /// onto the bounded inbound queue. A full queue blocks this handler
    /// task: backpressure, not memory growth. One bad peer cannot crash
    /// the service: malformed input drops only its own channel.
    async fn receive_message(&self, mut channel: ChannelStream) {
        let record = match read_frame(&mut channel).await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(error) => {
                debug!(%error, "message read failed");
                return;
            }
        };
        match Envelope::from_bytes(&record) {
            Ok(envelope) => {
                if self.inbound.send(envelope).await.is_err() {
                    debug!("inbound mailbox dropped");
                }
            }
            Err(error) => {
                debug!(%error, "malformed message record");
            }
        }
    }
}

impl std::fmt::Debug for MessageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageService")
            .field("id", &self.id())
            .field("address", &self.config.business_address)
            .field("phase", &self.phase())
            .finish()
    }
}
