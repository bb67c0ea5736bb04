//! Mock platform that hands out a single in-memory channel.

use tracing::debug;

use crate::{
    HardwareError, Result,
    mock::channel::{MockChannel, MockChannelHandle},
    traits::{ByteChannel, Platform},
};

/// Platform backed by a [`MockChannel`].
///
/// ```
/// use fujinet_hardware::mock::MockPlatform;
/// use fujinet_hardware::traits::{ByteChannel, Platform};
///
/// #[tokio::main]
/// async fn main() -> fujinet_hardware::Result<()> {
///     let (mut platform, _handle) = MockPlatform::new();
///     let channel = platform.initialize().await?;
///     assert!(channel.is_open());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockPlatform {
    channel: Option<MockChannel>,
    initialized: bool,
}

impl MockPlatform {
    pub fn new() -> (Self, MockChannelHandle) {
        let (channel, handle) = MockChannel::new();
        (
            Self {
                channel: Some(channel),
                initialized: false,
            },
            handle,
        )
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Platform for MockPlatform {
    type Channel = MockChannel;

    async fn initialize(&mut self) -> Result<MockChannel> {
        let mut channel = self.channel.take().ok_or_else(|| {
            HardwareError::initialization_failed("mock platform channel already taken")
        })?;
        channel.open().await?;
        self.initialized = true;
        debug!("Mock platform initialized");
        Ok(channel)
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.initialized = false;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
