//! Bootstrap entry point for embedding the engine

use std::sync::Arc;

use crate::config::Config;
use crate::control::Control;
use crate::device::{Device, LogSink};
use crate::error::Result;

/// Bootstrap an engine instance.
///
/// `program` identifies the embedding host in log output. `build_device`
/// is invoked exactly once with the validated configuration and the
/// negotiated CIDR text; it must parse the CIDR, construct the device and
/// hand it back. Any factory error aborts the bootstrap and no engine
/// state is left behind.
///
/// The returned [`Control`] has not been started; the caller starts it
/// once all host-side wiring is in place.
pub fn setup<F>(
    config: &Config,
    debug: bool,
    program: &str,
    sink: Arc<dyn LogSink>,
    build_device: F,
) -> Result<Control>
where
    F: FnOnce(&Config, &str) -> Result<Arc<dyn Device>>,
{
    config.validate()?;

    let cidr = config.tun.cidr.trim();
    if debug {
        sink.write_line(format!("{}: configuring interface for {}", program, cidr).as_bytes());
    }

    let device = build_device(config, cidr)?;
    sink.write_line(
        format!(
            "{}: device {} ready ({}, mtu {})",
            program,
            device.name(),
            device.cidr(),
            config.tun.mtu
        )
        .as_bytes(),
    );

    Ok(Control::new(program, device, sink))
}
