//! Service configuration.

use courier_wire::BusinessAddress;
use std::time::Duration;

/// Size of the inbound message and peer-discovered queues.
pub const DEFAULT_INBOUND_BUFFER: usize = 1_000;

/// How many channel opens a send attempts before giving up.
pub const DEFAULT_CONNECT_ATTEMPTS: usize = 10;

/// Fixed sleep between failed connect attempts.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// How often the bootstrap wait polls the live-connection count.
pub const DEFAULT_QUORUM_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default bound on the bootstrap quorum wait.
pub const DEFAULT_QUORUM_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a [`MessageService`](crate::MessageService).
///
/// Retry uses a fixed backoff and a bounded attempt count deliberately:
/// callers get a bounded worst-case send latency of
/// `connect_attempts × retry_backoff`.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// This node's long-term protocol identity.
    pub business_address: BusinessAddress,
    /// 32-byte seed for the transport signing key.
    pub transport_seed: Vec<u8>,
    /// Multiaddresses of boot peers (Global strategy only).
    pub boot_peers: Vec<String>,
    /// Capacity of the inbound message and peer-discovered queues.
    pub inbound_buffer: usize,
    /// Channel opens attempted per send before reporting delivery failure.
    pub connect_attempts: usize,
    /// Fixed sleep between failed connect attempts.
    pub retry_backoff: Duration,
    /// Polling interval of the bootstrap quorum wait.
    pub quorum_poll_interval: Duration,
    /// Bound on the quorum wait; `None` waits forever.
    pub quorum_timeout: Option<Duration>,
}

impl ServiceConfig {
    /// Create a configuration with default tuning.
    #[must_use]
    pub fn new(business_address: BusinessAddress, transport_seed: Vec<u8>) -> Self {
        Self {
            business_address,
            transport_seed,
            boot_peers: Vec::new(),
            inbound_buffer: DEFAULT_INBOUND_BUFFER,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            quorum_poll_interval: DEFAULT_QUORUM_POLL_INTERVAL,
            quorum_timeout: Some(DEFAULT_QUORUM_TIMEOUT),
        }
    }

    /// Add a boot peer multiaddress.
    pub fn add_boot_peer(&mut self, address: impl Into<String>) {
        self.boot_peers.push(address.into());
    }
}
