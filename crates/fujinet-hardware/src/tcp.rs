//! TCP transport for the host bus.
//!
//! Emulators and bus adapters that speak SIO over a socket connect here. The
//! platform listens on an address and accepts a single host connection; the
//! channel can also dial out when the host side is the listener.
//!
//! # Architecture
//!
//! ```text
//! Host emulator ───(TCP)───> TcpPlatform::initialize ──> TcpChannel
//!                                                           │
//!                                                           └─> BusBridge
//! ```
//!
//! # Timeout Handling
//!
//! Connects and reads are bounded by the configured timeout. A read that
//! times out returns [`HardwareError::Timeout`], which callers treat as "no
//! data yet" rather than a failure.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::{
    HardwareError, Result,
    traits::{ByteChannel, Platform},
    types::{ChannelInfo, ChannelKind},
};

/// Default read and connect timeout.
pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_millis(1000);

fn configure(stream: &TcpStream) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY: {} - latency may be impacted", e);
    }
}

fn timeout_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Byte channel over a TCP stream.
#[derive(Debug)]
pub struct TcpChannel {
    /// Remote address to dial on `open`, or the accepted peer
    address: String,

    stream: Option<TcpStream>,

    timeout: Duration,
}

impl TcpChannel {
    /// Channel that connects to `address` when opened.
    pub fn connect_to(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            stream: None,
            timeout: DEFAULT_TCP_TIMEOUT,
        }
    }

    /// Wrap a stream that is already connected.
    pub fn from_stream(stream: TcpStream, peer: SocketAddr) -> Self {
        configure(&stream);
        Self {
            address: peer.to_string(),
            stream: Some(stream),
            timeout: DEFAULT_TCP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        let address = &self.address;
        self.stream
            .as_mut()
            .ok_or_else(|| HardwareError::not_open(format!("tcp://{address}")))
    }
}

impl ByteChannel for TcpChannel {
    async fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        info!("Connecting to host at {}", self.address);
        let stream = match tokio::time::timeout(self.timeout, TcpStream::connect(&self.address))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!("Connection failed: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                warn!("Connection timeout after {}ms", self.timeout.as_millis());
                return Err(HardwareError::timeout(timeout_ms(self.timeout)));
            }
        };

        configure(&stream);
        self.stream = Some(stream);
        debug!("TCP channel open");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Error during TCP shutdown: {}", e);
            }
            info!("Closed TCP channel to {}", self.address);
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?;
        match tokio::time::timeout(timeout, stream.read(buf)).await {
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(HardwareError::timeout(timeout_ms(timeout))),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let address = self.address.clone();
        let stream = self.stream_mut()?;
        stream.write_all(data).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
                HardwareError::disconnected(format!("tcp://{address}"))
            }
            _ => e.into(),
        })?;
        stream.flush().await?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn get_info(&self) -> Result<ChannelInfo> {
        Ok(ChannelInfo::new("TCP Channel", ChannelKind::Tcp).with_address(self.address.clone()))
    }
}

/// Platform that accepts one host connection on a listening socket.
#[derive(Debug)]
pub struct TcpPlatform {
    listen: String,
    listener: Option<TcpListener>,
    timeout: Duration,
}

impl TcpPlatform {
    pub fn new(listen: impl Into<String>) -> Self {
        Self {
            listen: listen.into(),
            listener: None,
            timeout: DEFAULT_TCP_TIMEOUT,
        }
    }

    /// Read timeout applied to accepted channels.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bind the listening socket without waiting for a host.
    ///
    /// Useful when the caller needs the bound address (for example after
    /// binding port 0).
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the address cannot be bound.
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_none() {
            let listener = TcpListener::bind(&self.listen).await.map_err(|e| {
                HardwareError::initialization_failed(format!("bind {}: {}", self.listen, e))
            })?;
            info!("Listening for host on {}", listener.local_addr()?);
            self.listener = Some(listener);
        }

        match &self.listener {
            Some(listener) => Ok(listener.local_addr()?),
            None => Err(HardwareError::initialization_failed("listener not bound")),
        }
    }
}

impl Platform for TcpPlatform {
    type Channel = TcpChannel;

    async fn initialize(&mut self) -> Result<TcpChannel> {
        self.bind().await?;
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| HardwareError::initialization_failed("listener not bound"))?;

        let (stream, peer) = listener.accept().await?;
        info!("Host connected from {}", peer);
        Ok(TcpChannel::from_stream(stream, peer).with_timeout(self.timeout))
    }

    async fn shutdown(&mut self) -> Result<()> {
        if self.listener.take().is_some() {
            info!("Stopped listening on {}", self.listen);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tcp"
    }
}
