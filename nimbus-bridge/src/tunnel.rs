//! Consumer-facing adapter and overlay lifecycle controller
//!
//! [`OverlayTunnel`] is the public face of the bridge: a duplex byte
//! stream plus the address prefix the overlay engine negotiated. It owns
//! the engine's lifecycle handle and the consumer end of the duplex pair;
//! the device end lives inside the [`BridgeDevice`] built by the factory
//! callback during bootstrap.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use ipnet::{IpNet, Ipv4Net};
use nimbus_overlay as overlay;
use nimbus_overlay::{Config, Control, Device, LogSink};

use crate::device::BridgeDevice;
use crate::error::{Error, Result};
use crate::pipe::{duplex, PipeEnd};

/// Tag prepended to every forwarded engine log line
const LOG_TAG: &str = "overlay";

/// Identifier handed to the engine at bootstrap
const PROGRAM_NAME: &str = "nimbus-bridge";

/// Capability set a tunnel consumer framework requires from the bridge
#[async_trait]
pub trait TunnelStream: Send + Sync {
    /// The address prefix negotiated for the virtual device
    fn prefix(&self) -> IpNet;

    /// Read one packet coming out of the overlay engine
    async fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write one packet into the overlay engine
    async fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Stop the engine and tear down the duplex pair
    async fn close(&self) -> io::Result<()>;
}

/// Forwards engine log lines into the host logger at info level.
///
/// Lines are passed through verbatim, prefixed with a fixed tag; no
/// fields are extracted. Scoped to one engine instance rather than
/// installed globally, so bridges can coexist.
struct InfoLogSink;

impl LogSink for InfoLogSink {
    fn write_line(&self, line: &[u8]) {
        log::info!("{} {}", LOG_TAG, String::from_utf8_lossy(line).trim_end());
    }
}

/// The bridge's consumer-facing endpoint
pub struct OverlayTunnel {
    prefix: IpNet,
    control: Control,
    end: PipeEnd,
}

impl OverlayTunnel {
    /// Build the bridge from the engine's configuration text and start
    /// the engine.
    ///
    /// The device factory handed to the engine parses the negotiated
    /// CIDR, creates the cross-wired duplex pair and the [`BridgeDevice`]
    /// with an empty route table, and keeps the consumer end for this
    /// adapter. Any failure along the way (config parse, CIDR parse,
    /// bootstrap) aborts construction; the engine is only started once
    /// the wiring is complete.
    pub fn new(config_text: &str) -> Result<Self> {
        let sink: Arc<dyn LogSink> = Arc::new(InfoLogSink);

        let config = Config::from_toml(config_text).map_err(Error::Config)?;

        let mut prefix = None;
        let mut consumer_end = None;
        let control = overlay::setup(&config, false, PROGRAM_NAME, sink, |_, cidr| {
            let net: Ipv4Net = cidr
                .parse()
                .map_err(|e| overlay::Error::InvalidPrefix(format!("{}: {}", cidr, e)))?;

            let (tunnel_end, device_end) = duplex();
            prefix = Some(IpNet::V4(net));
            consumer_end = Some(tunnel_end);

            let device: Arc<dyn Device> = Arc::new(BridgeDevice::new(net, device_end));
            Ok(device)
        })
        .map_err(Error::Setup)?;

        let prefix = prefix.ok_or(Error::DeviceNotBuilt)?;
        let end = consumer_end.ok_or(Error::DeviceNotBuilt)?;

        control.start();

        Ok(Self {
            prefix,
            control,
            end,
        })
    }
}

#[async_trait]
impl TunnelStream for OverlayTunnel {
    fn prefix(&self) -> IpNet {
        self.prefix
    }

    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.end.read(buf).await
    }

    async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.end.write(buf).await
    }

    async fn close(&self) -> io::Result<()> {
        // stop the engine before pipe teardown so it does not keep
        // driving a half-closed conduit
        self.control.stop().await;

        let read_half = self.end.close_read();
        let write_half = self.end.close_write();
        read_half.and(write_half)
    }
}

impl std::fmt::Debug for OverlayTunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayTunnel")
            .field("prefix", &self.prefix)
            .field("control", &self.control)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_overlay::{Error as OverlayError, PacketStream};

    const CONFIG: &str = r#"
[tun]
cidr = "10.42.0.0/24"
"#;

    #[tokio::test]
    async fn bridges_consumer_and_device_end_to_end() {
        let tunnel = OverlayTunnel::new(CONFIG).unwrap();
        assert_eq!(tunnel.prefix(), "10.42.0.0/24".parse::<IpNet>().unwrap());
        assert!(tunnel.control.is_running());

        let device = tunnel.control.device();
        let packet = [
            0x45u8, 0x00, 0x00, 0x1c, 0x00, 0x01, 0x00, 0x00, 0x40, 0x11, 0x00, 0x00,
        ];

        // consumer -> engine
        let mut buf = [0u8; 64];
        let (written, read) = tokio::join!(tunnel.write(&packet), device.read(&mut buf));
        assert_eq!(written.unwrap(), packet.len());
        assert_eq!(&buf[..read.unwrap()], &packet);

        // engine -> consumer
        let (written, read) = tokio::join!(device.write(&packet), tunnel.read(&mut buf));
        assert_eq!(written.unwrap(), packet.len());
        assert_eq!(&buf[..read.unwrap()], &packet);

        // closing the consumer side stops the engine and the device must
        // observe the generic closure, not a raw broken pipe
        tunnel.close().await.unwrap();
        assert!(!tunnel.control.is_running());
        let err = device.read(&mut buf).await.unwrap_err();
        assert!(matches!(err, OverlayError::Closed));
    }

    #[tokio::test]
    async fn double_close_does_not_panic() {
        let tunnel = OverlayTunnel::new(CONFIG).unwrap();
        tunnel.close().await.unwrap();
        tunnel.close().await.unwrap();
    }

    #[test]
    fn malformed_config_fails_construction() {
        let err = OverlayTunnel::new("[tun\ncidr =").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_cidr_fails_bootstrap() {
        let err = OverlayTunnel::new("[tun]\ncidr = \"not-a-prefix\"\n").unwrap_err();
        match err {
            Error::Setup(OverlayError::InvalidPrefix(_)) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn v6_cidr_is_rejected() {
        // the engine's address plane is 32-bit
        let err = OverlayTunnel::new("[tun]\ncidr = \"fd00::/64\"\n").unwrap_err();
        assert!(matches!(err, Error::Setup(OverlayError::InvalidPrefix(_))));
    }
}
