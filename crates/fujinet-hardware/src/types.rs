//! Common types shared across channel implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport behind a byte channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Mock,
    Tcp,
    Serial,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelKind::Mock => write!(f, "mock"),
            ChannelKind::Tcp => write!(f, "tcp"),
            ChannelKind::Serial => write!(f, "serial"),
        }
    }
}

/// Channel information.
///
/// Describes a byte channel for logs and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel name (e.g., "Mock Channel", "/dev/ttyUSB0").
    pub name: String,

    pub kind: ChannelKind,

    /// Peer or device address, when there is one.
    pub address: Option<String>,

    /// Line speed for serial transports.
    pub baud_rate: Option<u32>,
}

impl ChannelInfo {
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            address: None,
            baud_rate: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }
}

impl fmt::Display for ChannelInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)?;
        if let Some(address) = &self.address {
            write!(f, " at {address}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_info_builder() {
        let info = ChannelInfo::new("/dev/ttyUSB0", ChannelKind::Serial).with_baud_rate(19200);
        assert_eq!(info.baud_rate, Some(19200));
        assert_eq!(info.address, None);
        assert_eq!(info.to_string(), "/dev/ttyUSB0 (serial)");
    }

    #[test]
    fn test_channel_info_serialization() {
        let info = ChannelInfo::new("host", ChannelKind::Tcp).with_address("127.0.0.1:6502");
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"kind\":\"tcp\""));

        let back: ChannelInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
