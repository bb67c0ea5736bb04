//! FujiNet network device.
//!
//! This crate ties the workspace together:
//!
//! - [`UnitRegistry`] owns the eight [`Unit`]s
//! - [`NetworkDevice`] is the per-unit state machine driving an
//!   [`HttpClient`](fujinet_network::HttpClient)
//! - [`transfer`] copies response bodies into host buffers
//! - [`translate`] maps collaborator outcomes to [`ErrorCode`]s
//! - [`NetworkHal`] is the blocking facade with wire-form returns
//! - [`BusBridge`] serves SIO frames from a byte channel
//!
//! [`ErrorCode`]: fujinet_core::ErrorCode

pub mod bridge;
pub mod device;
pub mod error;
pub mod hal;
pub mod registry;
pub mod transfer;
pub mod translate;
pub mod unit;

pub use bridge::{BridgeStats, BusBridge};
pub use device::NetworkDevice;
pub use error::{DeviceError, Result};
pub use hal::NetworkHal;
pub use registry::{SharedUnit, UnitRegistry};
pub use unit::{Connection, HeaderBuffer, Unit, UnitState, UnitStatus};
