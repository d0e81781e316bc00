//! In-process virtual device bridging the overlay engine to a tunnel consumer
//!
//! The overlay engine expects to own a kernel network interface; tunnel
//! consumer frameworks expect a duplex byte stream plus a routable
//! prefix. This crate satisfies both without any operating-system
//! interface existing: packets move through a pair of in-memory conduits
//! instead.
//!
//! ```text
//!  consumer framework                      overlay engine
//!        │  write                                │
//!        ▼                                       ▼
//!  ┌──────────────┐   cross-wired pipes   ┌──────────────┐
//!  │ OverlayTunnel│ ────────────────────▶ │ BridgeDevice │
//!  │  (TunnelStream)◀──────────────────── │   (Device)   │
//!  └──────────────┘                       └──────────────┘
//!        │ owns                                  ▲ built by
//!        ▼                                       │ device factory
//!     Control  ──────────── setup() ─────────────┘
//! ```
//!
//! [`OverlayTunnel::new`] parses the engine's configuration, bootstraps
//! the engine with a factory that builds the [`BridgeDevice`] and the
//! conduit pair, starts the engine, and hands back the consumer-facing
//! adapter. Closing the adapter stops the engine and tears down all four
//! conduit halves.

pub mod device;
pub mod error;
pub mod pipe;
pub mod tunnel;

pub use device::BridgeDevice;
pub use error::{Error, Result};
pub use pipe::{duplex, pipe, PipeEnd, PipeReader, PipeWriter};
pub use tunnel::{OverlayTunnel, TunnelStream};

/// Fixed interface name the device adapter reports to the engine
pub const BRIDGE_DEVICE_NAME: &str = "nimbus-bridge";
