//! Serial port transport for a physical SIO bus.
//!
//! Requires the `hardware-serial` feature. The `serialport` crate is
//! blocking, so every port operation runs on Tokio's blocking pool.

use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::{
    HardwareError, Result,
    traits::{ByteChannel, Platform},
    types::{ChannelInfo, ChannelKind},
};

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

fn lock_port(port: &SharedPort) -> Result<std::sync::MutexGuard<'_, Box<dyn SerialPort>>> {
    port.lock()
        .map_err(|_| HardwareError::communication("serial port lock poisoned"))
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HardwareError::communication(format!("serial task failed: {e}")))?
}

/// Byte channel over a serial device such as `/dev/ttyUSB0`.
pub struct SerialChannel {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<SharedPort>,
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("timeout", &self.timeout)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialChannel {
    pub fn new(path: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout,
            port: None,
        }
    }

    fn port(&self) -> Result<SharedPort> {
        self.port
            .clone()
            .ok_or_else(|| HardwareError::not_open(self.path.clone()))
    }
}

impl ByteChannel for SerialChannel {
    async fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }

        let path = self.path.clone();
        let baud_rate = self.baud_rate;
        let timeout = self.timeout;
        let port = blocking(move || {
            serialport::new(&path, baud_rate)
                .timeout(timeout)
                .open()
                .map_err(|e| HardwareError::initialization_failed(format!("{path}: {e}")))
        })
        .await?;

        info!(path = %self.path, baud_rate, "Opened serial port");
        self.port = Some(Arc::new(Mutex::new(port)));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!(path = %self.path, "Closed serial port");
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let port = self.port()?;
        let duration_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let len = buf.len();

        let data = blocking(move || {
            let mut scratch = vec![0u8; len];
            let mut port = lock_port(&port)?;
            match port.read(&mut scratch) {
                Ok(n) => {
                    scratch.truncate(n);
                    Ok(scratch)
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    Err(HardwareError::timeout(duration_ms))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await?;

        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port()?;
        let data = data.to_vec();
        blocking(move || {
            let mut port = lock_port(&port)?;
            port.write_all(&data)?;
            port.flush()?;
            Ok(())
        })
        .await
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    async fn get_info(&self) -> Result<ChannelInfo> {
        Ok(ChannelInfo::new(self.path.clone(), ChannelKind::Serial).with_baud_rate(self.baud_rate))
    }
}

/// Platform that opens one serial port.
#[derive(Debug)]
pub struct SerialPlatform {
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialPlatform {
    pub fn new(path: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout,
        }
    }
}

impl Platform for SerialPlatform {
    type Channel = SerialChannel;

    async fn initialize(&mut self) -> Result<SerialChannel> {
        let mut channel = SerialChannel::new(self.path.clone(), self.baud_rate, self.timeout);
        channel.open().await?;
        Ok(channel)
    }

    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "serial"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_port_fails_to_open() {
        let mut channel = SerialChannel::new(
            "/dev/fujinet-does-not-exist",
            19200,
            Duration::from_millis(10),
        );
        assert!(matches!(
            channel.open().await,
            Err(HardwareError::InitializationFailed { .. })
        ));
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_closed_channel_rejects_io() {
        let mut channel = SerialChannel::new("/dev/null", 19200, Duration::from_millis(10));
        let mut buf = [0u8; 4];
        assert!(matches!(
            channel.read(&mut buf).await,
            Err(HardwareError::NotOpen { .. })
        ));

        let info = channel.get_info().await.unwrap();
        assert_eq!(info.baud_rate, Some(19200));
    }
}
