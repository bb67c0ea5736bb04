//! Mock transport implementations for testing and development.
//!
//! These stand in for the host bus so the bridge can be exercised without a
//! socket or a serial port.

pub mod channel;
pub mod platform;

pub use channel::{MockChannel, MockChannelHandle};
pub use platform::MockPlatform;
