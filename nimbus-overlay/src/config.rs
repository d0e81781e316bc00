//! Native configuration of the overlay engine
//!
//! The engine is configured with a TOML text blob. Hosts that embed the
//! engine hand the text to [`Config::from_toml`] and pass the result to
//! [`crate::setup`].
//!
//! # Example Configuration
//!
//! ```toml
//! [tun]
//! # Address prefix assigned to the overlay interface (required)
//! cidr = "10.42.0.0/24"
//!
//! # MTU for the overlay interface (default: 1400)
//! mtu = 1400
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Overlay interface settings
    #[serde(default)]
    pub tun: TunSection,
}

/// Settings for the overlay interface the engine drives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunSection {
    /// Address prefix assigned to the interface, in CIDR notation.
    ///
    /// Kept as text here: the device factory is responsible for parsing
    /// it, and a malformed prefix fails bootstrap rather than config load.
    #[serde(default)]
    pub cidr: String,

    /// MTU for the interface
    #[serde(default = "default_mtu")]
    pub mtu: u16,
}

impl Default for TunSection {
    fn default() -> Self {
        Self {
            cidr: String::new(),
            mtu: default_mtu(),
        }
    }
}

fn default_mtu() -> u16 {
    crate::DEFAULT_MTU
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.tun.cidr.trim().is_empty() {
            return Err(Error::Config("tun.cidr is required".into()));
        }

        if self.tun.mtu < 576 {
            return Err(Error::Config(format!(
                "MTU {} is too small (minimum 576)",
                self.tun.mtu
            )));
        }

        Ok(())
    }

    /// Generate a sample configuration
    pub fn sample() -> String {
        r#"# Nimbus overlay engine configuration

[tun]
# Address prefix assigned to the overlay interface (required)
cidr = "10.42.0.0/24"

# MTU for the overlay interface (default: 1400)
mtu = 1400
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = Config::from_toml("[tun]\ncidr = \"10.42.0.0/24\"\n").unwrap();
        assert_eq!(config.tun.cidr, "10.42.0.0/24");
        assert_eq!(config.tun.mtu, crate::DEFAULT_MTU);
    }

    #[test]
    fn sample_config_is_valid() {
        let config = Config::from_toml(&Config::sample()).unwrap();
        assert_eq!(config.tun.cidr, "10.42.0.0/24");
    }

    #[test]
    fn missing_cidr_fails_validation() {
        let err = Config::from_toml("[tun]\nmtu = 1400\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_toml_fails_parse() {
        let err = Config::from_toml("[tun\ncidr =").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn tiny_mtu_is_rejected() {
        let err = Config::from_toml("[tun]\ncidr = \"10.0.0.0/24\"\nmtu = 100\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
