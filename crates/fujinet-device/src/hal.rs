//! Blocking, byte-returning facade over [`NetworkDevice`].
//!
//! Every call runs the async operation to completion on a private
//! current-thread runtime and re-encodes the outcome in wire form: a `u8`
//! status code, or an `i16` byte count where failures are negated codes.

use fujinet_core::{DeviceSettings, ErrorCode, HalConfig, TransactionFlag};
use fujinet_network::{AnyHttpClient, HttpClient, ReqwestHttpClient};
use tokio::runtime::{Builder, Runtime};
use tracing::info;

use crate::{device::NetworkDevice, error::Result, unit::UnitStatus};

fn code(result: std::result::Result<(), ErrorCode>) -> u8 {
    ErrorCode::from_result(result).as_byte()
}

/// Synchronous network HAL.
///
/// Must not be called from inside another Tokio runtime.
///
/// # Examples
///
/// ```
/// use fujinet_core::DeviceSettings;
/// use fujinet_device::NetworkHal;
/// use fujinet_network::{HttpResponse, MockHttpClient};
///
/// let client = MockHttpClient::new();
/// client.push_response(HttpResponse::new(200, "READY"));
/// let hal = NetworkHal::with_client(client, DeviceSettings::default()).unwrap();
///
/// assert_eq!(hal.init(), 0);
/// assert_eq!(hal.open("N1:http://x/", 4, 0), 0);
/// let mut buffer = [0u8; 16];
/// assert_eq!(hal.get("N1:http://x/", &mut buffer, 16), 5);
/// assert_eq!(hal.get("N9:http://x/", &mut buffer, 16), -5);
/// assert_eq!(hal.close("N1:http://x/"), 0);
/// ```
pub struct NetworkHal<C: HttpClient = AnyHttpClient> {
    runtime: Runtime,
    device: NetworkDevice<C>,
}

impl NetworkHal<AnyHttpClient> {
    /// Build the HAL with the `reqwest` client described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the runtime or
    /// HTTP client cannot be created.
    pub fn from_config(config: &HalConfig) -> Result<Self> {
        config.validate()?;
        let client = ReqwestHttpClient::from_settings(&config.http)?;
        Self::with_client(AnyHttpClient::from(client), config.device.clone())
    }
}

impl<C: HttpClient> NetworkHal<C> {
    /// # Errors
    ///
    /// Returns `Runtime` if the Tokio runtime cannot be built.
    pub fn with_client(client: C, settings: DeviceSettings) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime,
            device: NetworkDevice::with_settings(client, settings),
        })
    }

    pub fn device(&self) -> &NetworkDevice<C> {
        &self.device
    }

    pub fn init(&self) -> u8 {
        info!(client = self.device.client().name(), "Network HAL initialised");
        ErrorCode::Ok.as_byte()
    }

    pub fn open(&self, spec: &str, mode: u8, flag: u8) -> u8 {
        code(
            self.runtime
                .block_on(self.device.open(spec, mode, TransactionFlag(flag))),
        )
    }

    /// Byte count on success, negated error code on failure.
    pub fn get(&self, spec: &str, buffer: &mut [u8], capacity: u16) -> i16 {
        let result = self
            .runtime
            .block_on(self.device.get(spec, buffer, usize::from(capacity)));
        ErrorCode::encode_count(result)
    }

    pub fn post(&self, spec: &str, data: &str) -> u8 {
        code(self.runtime.block_on(self.device.post(spec, data)))
    }

    pub fn post_bin(&self, spec: &str, data: &[u8], length: u16) -> u8 {
        code(
            self.runtime
                .block_on(self.device.post_bin(spec, data, usize::from(length))),
        )
    }

    pub fn delete(&self, spec: &str, flag: u8) -> u8 {
        code(
            self.runtime
                .block_on(self.device.delete(spec, TransactionFlag(flag))),
        )
    }

    pub fn set_channel_mode(&self, spec: &str, mode: u8) -> u8 {
        code(self.runtime.block_on(self.device.set_channel_mode(spec, mode)))
    }

    pub fn start_add_headers(&self, spec: &str) -> u8 {
        code(self.runtime.block_on(self.device.start_headers(spec)))
    }

    pub fn add_header(&self, spec: &str, line: &str) -> u8 {
        code(self.runtime.block_on(self.device.add_header(spec, line)))
    }

    pub fn end_add_headers(&self, spec: &str) -> u8 {
        code(self.runtime.block_on(self.device.end_headers(spec)))
    }

    pub fn close(&self, spec: &str) -> u8 {
        self.runtime.block_on(self.device.close(spec)).as_byte()
    }

    /// Write the four-byte status block into `out`.
    pub fn status(&self, spec: &str, out: &mut [u8; 4]) -> u8 {
        let result = self.runtime.block_on(self.device.status(spec));
        code(result.map(|status| *out = status.to_bytes()))
    }

    /// Structured status, for callers that are not the host.
    ///
    /// # Errors
    /// As for [`NetworkDevice::status`].
    pub fn unit_status(&self, spec: &str) -> std::result::Result<UnitStatus, ErrorCode> {
        self.runtime.block_on(self.device.status(spec))
    }
}
