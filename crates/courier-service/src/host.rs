//! Seam to the external transport host.
//!
//! The host owns connection establishment, stream multiplexing and NAT
//! traversal; Courier consumes it through this trait. Channels are
//! dedicated byte streams tagged with a protocol identifier: one record
//! per channel, framed by the wire layer.

use crate::HostError;
use async_trait::async_trait;
use courier_identity::NetworkId;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;

/// Protocol tag selecting which handler services a channel.
pub type ProtocolTag = &'static str;

/// A dedicated bidirectional byte stream to one peer.
pub trait Channel: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> Channel for T {}

/// Boxed channel as handed across the host seam.
pub type ChannelStream = Box<dyn Channel>;

/// Callback invoked for every inbound channel on a protocol tag.
///
/// Handlers must not block the host's dispatch: they spawn their own task
/// and return immediately.
pub type ChannelHandler = Arc<dyn Fn(ChannelStream) + Send + Sync>;

/// Connection-lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection to the peer was established (any cause)
    Connected(NetworkId),
    /// The last connection to the peer went away
    Disconnected(NetworkId),
}

/// The transport host consumed by the message service.
///
/// Implementations multiplex any number of concurrent channels; handler
/// installation must take effect before the returned future of any
/// subsequent accept can observe a channel, so the service can close the
/// race between listener startup and handler registration.
#[async_trait]
pub trait Host: Send + Sync {
    /// Open a dedicated outbound channel to `peer` for `protocol`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unreachable`] when no route to the peer
    /// exists, or [`HostError::Closed`] after the host is closed.
    async fn open_channel(
        &self,
        peer: NetworkId,
        protocol: ProtocolTag,
    ) -> Result<ChannelStream, HostError>;

    /// Install the handler invoked for inbound `protocol` channels.
    fn set_handler(&self, protocol: ProtocolTag, handler: ChannelHandler);

    /// Remove the handler for `protocol`; later inbound channels are
    /// refused.
    fn remove_handler(&self, protocol: ProtocolTag);

    /// Addresses this host is listening on, in multiaddress form.
    fn listen_addresses(&self) -> Vec<String>;

    /// Dial a peer by multiaddress, establishing a connection and
    /// returning its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidAddress`] for unparseable addresses and
    /// [`HostError::DialFailed`] when the peer cannot be reached.
    async fn dial(&self, address: &str) -> Result<NetworkId, HostError>;

    /// Number of peers with at least one live connection.
    fn connected_peers(&self) -> usize;

    /// Subscribe to connection-lifecycle events.
    ///
    /// Dispatch must never be stalled by a slow subscriber; the broadcast
    /// channel drops the oldest events for laggards instead.
    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent>;

    /// Close the listener and all connections. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Io`] if teardown fails.
    async fn close(&self) -> Result<(), HostError>;
}
