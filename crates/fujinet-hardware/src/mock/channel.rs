//! Mock byte channel for testing and development.
//!
//! This module provides an in-memory channel that plays the role of the host
//! bus. Tests drive the host side through a [`MockChannelHandle`].

use bytes::{Buf, BytesMut};
use tokio::sync::mpsc;
use tracing::trace;

use crate::{
    HardwareError, Result,
    traits::ByteChannel,
    types::{ChannelInfo, ChannelKind},
};

const CHANNEL_CAPACITY: usize = 32;

/// In-memory byte channel.
///
/// Bytes sent through the handle arrive on [`ByteChannel::read`]; bytes
/// written to the channel arrive on [`MockChannelHandle::recv`]. Dropping or
/// disconnecting the handle makes `read` report end of stream.
///
/// # Examples
///
/// ```
/// use fujinet_hardware::mock::MockChannel;
/// use fujinet_hardware::traits::ByteChannel;
///
/// #[tokio::main]
/// async fn main() -> fujinet_hardware::Result<()> {
///     let (mut channel, handle) = MockChannel::new();
///     channel.open().await?;
///
///     handle.send(vec![0x71, b'S']).await?;
///     handle.disconnect();
///
///     let mut buf = [0u8; 8];
///     assert_eq!(channel.read(&mut buf).await?, 2);
///     assert_eq!(channel.read(&mut buf).await?, 0);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockChannel {
    /// Bytes sent by the host side
    inbound_rx: mpsc::Receiver<Vec<u8>>,

    /// Bytes written by the device side
    outbound_tx: mpsc::Sender<Vec<u8>>,

    /// Inbound bytes not yet consumed by `read`
    pending: BytesMut,

    name: String,

    open: bool,
}

impl MockChannel {
    /// Create a mock channel with the default name.
    ///
    /// Returns the channel and the handle that controls its host side.
    pub fn new() -> (Self, MockChannelHandle) {
        Self::with_name("Mock Channel")
    }

    pub fn with_name(name: impl Into<String>) -> (Self, MockChannelHandle) {
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let channel = Self {
            inbound_rx,
            outbound_tx,
            pending: BytesMut::new(),
            name: name.into(),
            open: false,
        };

        let handle = MockChannelHandle {
            inbound_tx,
            outbound_rx,
        };

        (channel, handle)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(HardwareError::not_open(self.name.clone()))
        }
    }
}

impl ByteChannel for MockChannel {
    async fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;

        if self.pending.is_empty() {
            match self.inbound_rx.recv().await {
                Some(bytes) => self.pending.extend_from_slice(&bytes),
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        trace!(bytes = n, "Mock channel read");
        Ok(n)
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.outbound_tx
            .send(data.to_vec())
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn get_info(&self) -> Result<ChannelInfo> {
        Ok(ChannelInfo::new(self.name.clone(), ChannelKind::Mock))
    }
}

/// Host side of a [`MockChannel`].
#[derive(Debug)]
pub struct MockChannelHandle {
    inbound_tx: mpsc::Sender<Vec<u8>>,
    outbound_rx: mpsc::Receiver<Vec<u8>>,
}

impl MockChannelHandle {
    /// Send bytes to the device side.
    ///
    /// # Errors
    ///
    /// Returns `Disconnected` if the channel has been dropped.
    pub async fn send(&self, bytes: Vec<u8>) -> Result<()> {
        self.inbound_tx
            .send(bytes)
            .await
            .map_err(|_| HardwareError::disconnected("mock channel dropped"))
    }

    /// Receive the next write made by the device side.
    ///
    /// Returns `None` once the channel is dropped and all writes are drained.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.outbound_rx.recv().await
    }

    /// Take a write if one is already queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.outbound_rx.try_recv().ok()
    }

    /// Hang up the host side.
    ///
    /// Keeps receiving device writes through the returned receiver so tests
    /// can still inspect replies sent before the hang-up.
    pub fn disconnect(self) -> mpsc::Receiver<Vec<u8>> {
        self.outbound_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_requires_open() {
        let (mut channel, _handle) = MockChannel::new();
        let mut buf = [0u8; 4];
        assert!(matches!(
            channel.read(&mut buf).await,
            Err(HardwareError::NotOpen { .. })
        ));
        assert!(channel.write(b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_partial_reads_keep_remainder() {
        let (mut channel, handle) = MockChannel::new();
        channel.open().await.unwrap();
        handle.send(b"abcdef".to_vec()).await.unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(channel.read(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"abcd");

        assert_eq!(channel.read(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
    }

    #[tokio::test]
    async fn test_disconnect_reports_end_of_stream() {
        let (mut channel, handle) = MockChannel::new();
        channel.open().await.unwrap();

        let mut replies = handle.disconnect();
        let mut buf = [0u8; 4];
        assert_eq!(channel.read(&mut buf).await.unwrap(), 0);

        channel.write(b"late").await.unwrap();
        assert_eq!(replies.recv().await.unwrap(), b"late");
    }

    #[tokio::test]
    async fn test_write_after_handle_dropped() {
        let (mut channel, handle) = MockChannel::new();
        channel.open().await.unwrap();
        drop(handle);

        assert!(matches!(
            channel.write(b"x").await,
            Err(HardwareError::Disconnected { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_and_info() {
        let (mut channel, _handle) = MockChannel::with_name("Bus A");
        channel.open().await.unwrap();
        assert!(channel.is_open());
        channel.close().await.unwrap();
        assert!(!channel.is_open());

        let info = channel.get_info().await.unwrap();
        assert_eq!(info.name, "Bus A");
        assert_eq!(info.kind, ChannelKind::Mock);
    }
}
