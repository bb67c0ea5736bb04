//! Host bus transports for the FujiNet network device.
//!
//! The host computer reaches the device over a byte-oriented bus: a real SIO
//! serial line, or a TCP socket when an emulator plays the host. This crate
//! hides that choice behind two traits:
//!
//! - [`ByteChannel`]: open, close, read and write raw bytes
//! - [`Platform`]: set up a bus and hand out a channel to the host
//!
//! # Transports
//!
//! | Transport | Channel | Platform | Feature |
//! |---|---|---|---|
//! | In-memory | [`mock::MockChannel`] | [`mock::MockPlatform`] | always |
//! | TCP | [`tcp::TcpChannel`] | [`tcp::TcpPlatform`] | always |
//! | Serial | `serial::SerialChannel` | `serial::SerialPlatform` | `hardware-serial` |
//!
//! Runtime selection goes through [`devices::AnyChannel`] and
//! [`devices::AnyPlatform`].
//!
//! # Example
//!
//! ```no_run
//! use fujinet_core::BusSettings;
//! use fujinet_hardware::devices::AnyPlatform;
//! use fujinet_hardware::traits::{ByteChannel, Platform};
//!
//! # async fn example() -> fujinet_hardware::Result<()> {
//! let mut platform = AnyPlatform::from_settings(&BusSettings::default())?;
//! let mut channel = platform.initialize().await?;
//!
//! let mut buf = [0u8; 64];
//! let n = channel.read(&mut buf).await?;
//! println!("host sent {n} bytes");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with [`HardwareError`].
//! A read timeout is reported as [`HardwareError::Timeout`] and is not fatal.
//!
//! [`ByteChannel`]: traits::ByteChannel
//! [`Platform`]: traits::Platform

pub mod devices;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod tcp;
pub mod traits;
pub mod types;

pub use devices::{AnyChannel, AnyPlatform};
pub use error::{HardwareError, Result};
pub use traits::{ByteChannel, Platform};
pub use types::{ChannelInfo, ChannelKind};
