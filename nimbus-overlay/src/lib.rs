//! Boundary surface of the nimbus overlay packet engine
//!
//! This crate carries the part of the overlay engine that hosts interact
//! with: the device capability contract, the bootstrap entry point, the
//! lifecycle handle, the engine's native (TOML) configuration, its 32-bit
//! internal address plane, and the prefix route table. The packet and
//! crypto internals of the engine live behind this surface and are not
//! part of this crate.
//!
//! # Embedding the engine
//!
//! ```ignore
//! use std::sync::Arc;
//! use nimbus_overlay as overlay;
//!
//! let config = overlay::Config::from_toml(config_text)?;
//! let control = overlay::setup(&config, false, "my-host", sink, |_, cidr| {
//!     // build and return the device the engine will drive
//! })?;
//! control.start();
//! ```
//!
//! The engine never logs through a global logger. Every line it emits goes
//! to the [`LogSink`] supplied at bootstrap, so multiple engine instances
//! can coexist with differently-scoped logging.

pub mod addr;
pub mod config;
pub mod control;
pub mod device;
pub mod engine;
pub mod error;
pub mod routing;

pub use addr::VpnIp;
pub use config::{Config, TunSection};
pub use control::Control;
pub use device::{Device, LogSink, PacketStream};
pub use engine::setup;
pub use error::{Error, Result};
pub use routing::RouteTree;

/// Default MTU for the overlay interface
pub const DEFAULT_MTU: u16 = 1400;
