//! Capabilities the engine consumes from its host
//!
//! The engine does not create a network interface itself. At bootstrap the
//! host supplies a factory that builds something satisfying [`Device`],
//! and the engine's packet workers drive it through that contract alone.
//! Likewise the engine never touches a global logger; it writes its output
//! line by line into the [`LogSink`] injected at bootstrap.

use async_trait::async_trait;
use ipnet::Ipv4Net;

use crate::addr::VpnIp;
use crate::error::Result;

/// Sink for the engine's log output.
///
/// One call per line, bytes passed verbatim. Implementations decide
/// severity, tagging and encoding; the engine assumes nothing about the
/// destination.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &[u8]);
}

/// Byte-stream surface of a device queue.
///
/// This is also the shape of the additional queues returned by
/// [`Device::new_multi_queue_reader`] on devices that support them.
#[async_trait]
pub trait PacketStream: Send + Sync {
    /// Read one packet into `buf`, waiting until one is available.
    ///
    /// Once the device is torn down this must return
    /// [`Error::Closed`](crate::Error::Closed); the engine's fault handler
    /// treats any other read failure as unrecoverable and aborts.
    async fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Write one packet, waiting until the device accepts it
    async fn write(&self, buf: &[u8]) -> Result<usize>;

    /// Tear the stream down, releasing both directions
    async fn close(&self) -> Result<()>;
}

/// Capability contract the engine requires from its network device
pub trait Device: PacketStream {
    /// Interface name reported in logs and peer exchanges
    fn name(&self) -> &str;

    /// Address prefix assigned to the interface
    fn cidr(&self) -> Ipv4Net;

    /// Resolve the configured route for an overlay address.
    ///
    /// Returns [`VpnIp::UNSPECIFIED`] when no route contains the address;
    /// callers treat the zero value as "no route", not as an error.
    fn route_for(&self, ip: VpnIp) -> VpnIp;

    /// Bring the interface up
    fn activate(&self) -> Result<()>;

    /// Open an additional read queue on devices with multi-queue support
    fn new_multi_queue_reader(&self) -> Result<Box<dyn PacketStream>>;
}
