//! Enum wrappers for transport dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn ByteChannel>`
//! is not available. The transport is picked at runtime from configuration,
//! so these enums provide concrete dispatch instead.
//!
//! # Examples
//!
//! ```
//! use fujinet_hardware::devices::AnyChannel;
//! use fujinet_hardware::mock::MockChannel;
//!
//! let (channel, _handle) = MockChannel::new();
//! let any_channel = AnyChannel::Mock(channel);
//! ```

use std::time::Duration;

use fujinet_core::BusSettings;

use crate::mock::{MockChannel, MockPlatform};
#[cfg(feature = "hardware-serial")]
use crate::serial::{SerialChannel, SerialPlatform};
use crate::tcp::{TcpChannel, TcpPlatform};
use crate::traits::{ByteChannel, Platform};
use crate::{ChannelInfo, Result};

/// Enum wrapper for byte channel dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyChannel {
    /// In-memory channel for development and testing.
    Mock(MockChannel),

    Tcp(TcpChannel),

    #[cfg(feature = "hardware-serial")]
    Serial(SerialChannel),
}

impl ByteChannel for AnyChannel {
    async fn open(&mut self) -> Result<()> {
        match self {
            Self::Mock(channel) => channel.open().await,
            Self::Tcp(channel) => channel.open().await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(channel) => channel.open().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Mock(channel) => channel.close().await,
            Self::Tcp(channel) => channel.close().await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(channel) => channel.close().await,
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Self::Mock(channel) => channel.read(buf).await,
            Self::Tcp(channel) => channel.read(buf).await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(channel) => channel.read(buf).await,
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Mock(channel) => channel.write(data).await,
            Self::Tcp(channel) => channel.write(data).await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(channel) => channel.write(data).await,
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Self::Mock(channel) => channel.is_open(),
            Self::Tcp(channel) => channel.is_open(),
            #[cfg(feature = "hardware-serial")]
            Self::Serial(channel) => channel.is_open(),
        }
    }

    async fn get_info(&self) -> Result<ChannelInfo> {
        match self {
            Self::Mock(channel) => channel.get_info().await,
            Self::Tcp(channel) => channel.get_info().await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(channel) => channel.get_info().await,
        }
    }
}

/// Enum wrapper for platform dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyPlatform {
    Mock(MockPlatform),

    Tcp(TcpPlatform),

    #[cfg(feature = "hardware-serial")]
    Serial(SerialPlatform),
}

impl AnyPlatform {
    /// Pick the transport described by the bus settings.
    ///
    /// A configured serial port selects the serial platform; otherwise the
    /// TCP platform listens on `bus.listen`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` when a serial port is configured but the
    /// `hardware-serial` feature is disabled.
    pub fn from_settings(settings: &BusSettings) -> Result<Self> {
        let timeout = Duration::from_millis(settings.read_timeout_ms);

        match &settings.serial_port {
            #[cfg(feature = "hardware-serial")]
            Some(path) => Ok(Self::Serial(SerialPlatform::new(
                path.clone(),
                settings.baud_rate,
                timeout,
            ))),
            #[cfg(not(feature = "hardware-serial"))]
            Some(path) => Err(crate::HardwareError::configuration(format!(
                "serial port {path} configured but serial support is not compiled in"
            ))),
            None => Ok(Self::Tcp(
                TcpPlatform::new(settings.listen.clone()).with_timeout(timeout),
            )),
        }
    }
}

impl Platform for AnyPlatform {
    type Channel = AnyChannel;

    async fn initialize(&mut self) -> Result<AnyChannel> {
        match self {
            Self::Mock(platform) => platform.initialize().await.map(AnyChannel::Mock),
            Self::Tcp(platform) => platform.initialize().await.map(AnyChannel::Tcp),
            #[cfg(feature = "hardware-serial")]
            Self::Serial(platform) => platform.initialize().await.map(AnyChannel::Serial),
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        match self {
            Self::Mock(platform) => platform.shutdown().await,
            Self::Tcp(platform) => platform.shutdown().await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(platform) => platform.shutdown().await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Mock(platform) => platform.name(),
            Self::Tcp(platform) => platform.name(),
            #[cfg(feature = "hardware-serial")]
            Self::Serial(platform) => platform.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HardwareError;
    use crate::types::ChannelKind;

    #[tokio::test]
    async fn test_any_channel_mock() {
        let (channel, handle) = MockChannel::new();
        let mut any_channel = AnyChannel::Mock(channel);
        any_channel.open().await.unwrap();

        handle.send(b"abc".to_vec()).await.unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(any_channel.read(&mut buf).await.unwrap(), 3);

        let info = any_channel.get_info().await.unwrap();
        assert_eq!(info.kind, ChannelKind::Mock);
    }

    #[tokio::test]
    async fn test_any_platform_mock() {
        let (platform, _handle) = MockPlatform::new();
        let mut any_platform = AnyPlatform::Mock(platform);
        assert_eq!(any_platform.name(), "mock");

        let channel = any_platform.initialize().await.unwrap();
        assert!(channel.is_open());
    }

    #[test]
    fn test_from_settings_defaults_to_tcp() {
        let platform = AnyPlatform::from_settings(&BusSettings::default()).unwrap();
        assert_eq!(platform.name(), "tcp");
    }

    #[cfg(not(feature = "hardware-serial"))]
    #[test]
    fn test_from_settings_serial_without_feature() {
        let settings = BusSettings {
            serial_port: Some("/dev/ttyUSB0".into()),
            ..BusSettings::default()
        };
        assert!(matches!(
            AnyPlatform::from_settings(&settings),
            Err(HardwareError::ConfigurationError { .. })
        ));
    }
}
