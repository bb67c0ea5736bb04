//! Byte channel and platform trait definitions.
//!
//! These traits are the contract between the bus bridge and whatever carries
//! bytes to and from the host computer. A [`ByteChannel`] moves raw bytes; a
//! [`Platform`] brings a channel up and tears it down.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::ChannelInfo;

/// Bidirectional byte stream to the host computer.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. You cannot use `Box<dyn ByteChannel>`.
///
/// For most use cases, use generic type parameters:
///
/// ```no_run
/// use fujinet_hardware::traits::ByteChannel;
/// use fujinet_hardware::error::Result;
///
/// async fn drain<C: ByteChannel>(channel: &mut C) -> Result<usize> {
///     let mut buf = [0u8; 256];
///     let mut total = 0;
///     loop {
///         let n = channel.read(&mut buf).await?;
///         if n == 0 {
///             return Ok(total);
///         }
///         total += n;
///     }
/// }
/// ```
///
/// When the transport is chosen at runtime, use
/// [`AnyChannel`](crate::devices::AnyChannel).
///
/// # Examples
///
/// ```
/// use fujinet_hardware::mock::MockChannel;
/// use fujinet_hardware::traits::ByteChannel;
///
/// #[tokio::main]
/// async fn main() -> fujinet_hardware::Result<()> {
///     let (mut channel, mut handle) = MockChannel::new();
///     channel.open().await?;
///
///     handle.send(b"ping".to_vec()).await?;
///     let mut buf = [0u8; 4];
///     assert_eq!(channel.read(&mut buf).await?, 4);
///
///     channel.write(b"pong").await?;
///     assert_eq!(handle.recv().await.unwrap(), b"pong");
///     Ok(())
/// }
/// ```
pub trait ByteChannel: Send {
    /// Open the channel. Opening an open channel is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be reached.
    async fn open(&mut self) -> Result<()>;

    /// Close the channel. Closing a closed channel is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Read available bytes into `buf`.
    ///
    /// Returns the number of bytes read; `0` means the peer closed the
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if nothing arrived within the transport's read
    /// timeout, `NotOpen` if the channel is closed, or an I/O error.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `data`.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` if the channel is closed, `Disconnected` if the
    /// peer went away, or an I/O error.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Describe the channel.
    async fn get_info(&self) -> Result<ChannelInfo>;
}

/// Source of byte channels for one kind of host bus.
///
/// `initialize` performs whatever setup the bus needs (binding a socket,
/// opening a port) and yields a channel to the host. `shutdown` releases the
/// platform's own resources; channels already handed out are closed by their
/// owners.
///
/// ```no_run
/// use fujinet_hardware::tcp::TcpPlatform;
/// use fujinet_hardware::traits::{ByteChannel, Platform};
///
/// # async fn example() -> fujinet_hardware::Result<()> {
/// let mut platform = TcpPlatform::new("127.0.0.1:6502");
/// let mut channel = platform.initialize().await?;
/// channel.write(b"hello").await?;
/// platform.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub trait Platform: Send {
    type Channel: ByteChannel;

    /// Set up the bus and return an open channel to the host.
    async fn initialize(&mut self) -> Result<Self::Channel>;

    /// Release platform resources.
    async fn shutdown(&mut self) -> Result<()>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
