//! Device adapter presented to the overlay engine
//!
//! [`BridgeDevice`] satisfies the engine's [`Device`] contract without
//! owning any kernel resource: reads and writes go through one end of the
//! in-process duplex pair, the CIDR is whatever the engine negotiated at
//! bootstrap, and route lookups run against an in-memory prefix tree.

use std::io;
use std::sync::RwLock;

use async_trait::async_trait;
use ipnet::Ipv4Net;
use nimbus_overlay::{Device, Error, PacketStream, Result, RouteTree, VpnIp};

use crate::pipe::PipeEnd;
use crate::BRIDGE_DEVICE_NAME;

/// Virtual device backed by one end of the duplex pair
pub struct BridgeDevice {
    cidr: Ipv4Net,
    routes: RwLock<RouteTree<VpnIp>>,
    end: PipeEnd,
}

impl BridgeDevice {
    /// Create a device for `cidr` reading and writing through `end`.
    ///
    /// The route table starts empty; until routes are installed every
    /// lookup resolves to [`VpnIp::UNSPECIFIED`].
    pub fn new(cidr: Ipv4Net, end: PipeEnd) -> Self {
        Self {
            cidr,
            routes: RwLock::new(RouteTree::new()),
            end,
        }
    }

    /// Install a static route.
    ///
    /// The bridge itself never inserts routes; this exists for hosts that
    /// want to steer overlay addresses through a gateway.
    pub fn insert_route(&self, net: Ipv4Net, via: VpnIp) {
        self.routes.write().unwrap().insert(net, via);
    }
}

#[async_trait]
impl PacketStream for BridgeDevice {
    async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        match self.end.read(buf).await {
            Ok(n) => Ok(n),
            // the engine's fault handler aborts on a raw broken-pipe
            // failure; report the closure it understands instead
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Err(Error::Closed),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, buf: &[u8]) -> Result<usize> {
        Ok(self.end.write(buf).await?)
    }

    async fn close(&self) -> Result<()> {
        let read_half = self.end.close_read();
        let write_half = self.end.close_write();
        read_half.and(write_half)?;
        Ok(())
    }
}

impl Device for BridgeDevice {
    fn name(&self) -> &str {
        BRIDGE_DEVICE_NAME
    }

    fn cidr(&self) -> Ipv4Net {
        self.cidr
    }

    fn route_for(&self, ip: VpnIp) -> VpnIp {
        self.routes
            .read()
            .unwrap()
            .most_specific(ip)
            .copied()
            .unwrap_or(VpnIp::UNSPECIFIED)
    }

    fn activate(&self) -> Result<()> {
        // nothing to bring up
        Ok(())
    }

    fn new_multi_queue_reader(&self) -> Result<Box<dyn PacketStream>> {
        Err(Error::NotSupported(
            "multiqueue readers are not available on the in-process bridge".into(),
        ))
    }
}

impl std::fmt::Debug for BridgeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeDevice")
            .field("name", &BRIDGE_DEVICE_NAME)
            .field("cidr", &self.cidr)
            .field("routes", &self.routes.read().unwrap().len())
            .finish()
    }
}
