//! The network device state machine.
//!
//! [`NetworkDevice`] owns the unit registry and the HTTP collaborator. Every
//! operation follows the same path:
//!
//! 1. parse the device specifier (failures never touch a unit)
//! 2. look up the unit and take it; a unit held by another operation rejects
//!    the call with `BAD_COMMAND`
//! 3. check the unit's state; anything but OPEN and CLOSE on an idle unit is
//!    `OFFLINE`
//! 4. perform the operation and store its outcome as the unit's `last_error`
//!
//! Each operation uses the URL of the specifier it was given.
//!
//! # Examples
//!
//! ```
//! use fujinet_core::{ErrorCode, TransactionFlag};
//! use fujinet_device::NetworkDevice;
//! use fujinet_network::{HttpResponse, MockHttpClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let client = MockHttpClient::new();
//! client.push_response(HttpResponse::new(200, "HELLO"));
//! let device = NetworkDevice::new(client);
//!
//! device.open("N1:http://x/", 4, TransactionFlag::NONE).await.unwrap();
//! let mut buffer = [0u8; 64];
//! assert_eq!(device.get("N1:http://x/", &mut buffer, 64).await, Ok(5));
//! assert_eq!(&buffer[..5], b"HELLO");
//! assert_eq!(device.close("N1:http://x/").await, ErrorCode::Ok);
//! # }
//! ```

use bytes::Bytes;
use fujinet_core::{
    ChannelMode, DeviceSettings, ErrorCode, HeaderLine, OpenMode, TransactionFlag,
};
use fujinet_network::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use fujinet_protocol::DeviceSpecifier;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::{
    registry::UnitRegistry,
    transfer::{effective_capacity, fill},
    translate,
    unit::{Connection, Unit, UnitState, UnitStatus},
};

/// Network device serving units N1 to N8.
#[derive(Debug)]
pub struct NetworkDevice<C: HttpClient> {
    client: C,
    registry: UnitRegistry,
    settings: DeviceSettings,
}

impl<C: HttpClient> NetworkDevice<C> {
    pub fn new(client: C) -> Self {
        Self::with_settings(client, DeviceSettings::default())
    }

    pub fn with_settings(client: C, settings: DeviceSettings) -> Self {
        Self {
            client,
            registry: UnitRegistry::new(),
            settings,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    fn parse(spec: &str) -> Result<DeviceSpecifier, ErrorCode> {
        DeviceSpecifier::parse(spec).map_err(|e| {
            warn!(specifier = spec, error = %e, "Rejected device specifier");
            e.code()
        })
    }

    fn acquire(&self, spec: &str) -> Result<(DeviceSpecifier, OwnedMutexGuard<Unit>), ErrorCode> {
        let specifier = Self::parse(spec)?;
        let unit = self
            .registry
            .unit(specifier.unit())
            .try_lock_owned()
            .map_err(|_| {
                warn!(unit = %specifier.unit(), "Unit busy, command rejected");
                ErrorCode::BadCommand
            })?;
        Ok((specifier, unit))
    }

    /// Open a unit.
    ///
    /// `mode` is the CIO aux1 byte (4, 8 or 9). The URL is probed before the
    /// unit is marked connected; a failed probe leaves the unit idle.
    ///
    /// # Errors
    ///
    /// - `BadCommand`: malformed specifier, bad mode, or unit not idle
    /// - `NoDevice`: unit digit outside 1-8
    /// - `Offline`, `IoError`, `Unknown`: the probe failed
    pub async fn open(&self, spec: &str, mode: u8, flag: TransactionFlag) -> Result<(), ErrorCode> {
        let (specifier, mut unit) = self.acquire(spec)?;
        let result = self.open_unit(&specifier, &mut unit, mode, flag).await;
        unit.record(result)
    }

    async fn open_unit(
        &self,
        specifier: &DeviceSpecifier,
        unit: &mut Unit,
        mode: u8,
        flag: TransactionFlag,
    ) -> Result<(), ErrorCode> {
        if unit.state() != UnitState::Idle {
            warn!(unit = %unit.number(), state = %unit.state(), "OPEN on a unit that is not idle");
            return Err(ErrorCode::BadCommand);
        }

        let mode = OpenMode::from_u8(mode).map_err(|e| {
            warn!(unit = %unit.number(), error = %e, "Rejected OPEN");
            e.code()
        })?;

        self.client.probe(specifier.url()).await.map_err(|e| {
            let code = translate::client_error(&e);
            warn!(unit = %unit.number(), url = specifier.url(), error = %e, %code, "Connectivity probe failed");
            code
        })?;

        unit.connect(Connection::new(specifier.url(), mode, flag))?;
        info!(unit = %unit.number(), url = specifier.url(), %mode, "Unit opened");
        Ok(())
    }

    /// Fetch the specifier's URL into `buffer`.
    ///
    /// At most `capacity` bytes are used, further limited by the buffer length
    /// and the configured transfer ceiling. Returns the body length.
    ///
    /// When the body is received but does not fit, STATUS reports the full
    /// body length in `bytes_available` even though nothing was delivered.
    ///
    /// # Errors
    ///
    /// - `Offline`: unit idle (unless auto-open is configured) or host refused
    /// - `IoError`: transport failure, HTTP error status, or body too large;
    ///   an oversized body leaves `buffer` untouched. A body over the transfer
    ///   ceiling is abandoned while downloading.
    pub async fn get(&self, spec: &str, buffer: &mut [u8], capacity: usize) -> Result<usize, ErrorCode> {
        let (specifier, mut unit) = self.acquire(spec)?;
        let result = self.get_unit(&specifier, &mut unit, buffer, capacity).await;
        unit.record(result)
    }

    async fn get_unit(
        &self,
        specifier: &DeviceSpecifier,
        unit: &mut Unit,
        buffer: &mut [u8],
        capacity: usize,
    ) -> Result<usize, ErrorCode> {
        if unit.state() == UnitState::Idle && self.settings.auto_open_on_get {
            debug!(unit = %unit.number(), "Opening unit implicitly for GET");
            self.open_unit(specifier, unit, OpenMode::Get.to_u8(), TransactionFlag::NONE)
                .await?;
        }

        let request = prepare(unit, HttpMethod::Get, specifier.url(), None)?;
        let response = self.transfer(unit, request).await?;

        let body = response.body;
        unit.set_bytes_available(body.len());
        let capacity = effective_capacity(capacity, buffer.len(), self.settings.max_transfer);
        let result = fill(&body, &mut buffer[..capacity]);
        if result.is_err() {
            warn!(unit = %unit.number(), bytes = body.len(), capacity, "Response larger than host buffer");
        }
        unit.connection_mut()?.response = body;
        result
    }

    /// POST a text body.
    ///
    /// # Errors
    ///
    /// `Offline` on an idle unit, otherwise as for [`get`](Self::get).
    pub async fn post(&self, spec: &str, data: &str) -> Result<(), ErrorCode> {
        let (specifier, mut unit) = self.acquire(spec)?;
        let body = Bytes::copy_from_slice(data.as_bytes());
        let result = self.send(&specifier, &mut unit, HttpMethod::Post, Some(body)).await;
        unit.record(result)
    }

    /// POST the first `length` bytes of `data`.
    ///
    /// # Errors
    ///
    /// `BadCommand` if `length` exceeds `data`, otherwise as for
    /// [`post`](Self::post).
    pub async fn post_bin(&self, spec: &str, data: &[u8], length: usize) -> Result<(), ErrorCode> {
        let (specifier, mut unit) = self.acquire(spec)?;
        let result = self.post_bin_unit(&specifier, &mut unit, data, length).await;
        unit.record(result)
    }

    async fn post_bin_unit(
        &self,
        specifier: &DeviceSpecifier,
        unit: &mut Unit,
        data: &[u8],
        length: usize,
    ) -> Result<(), ErrorCode> {
        unit.connection_mut()?;
        if length > data.len() {
            warn!(unit = %unit.number(), length, available = data.len(), "POST length exceeds data");
            return Err(ErrorCode::BadCommand);
        }
        let body = Bytes::copy_from_slice(&data[..length]);
        self.send(specifier, unit, HttpMethod::Post, Some(body)).await
    }

    /// Issue a DELETE for the specifier's URL.
    pub async fn delete(&self, spec: &str, flag: TransactionFlag) -> Result<(), ErrorCode> {
        let (specifier, mut unit) = self.acquire(spec)?;
        let result = self.delete_unit(&specifier, &mut unit, flag).await;
        unit.record(result)
    }

    async fn delete_unit(
        &self,
        specifier: &DeviceSpecifier,
        unit: &mut Unit,
        flag: TransactionFlag,
    ) -> Result<(), ErrorCode> {
        unit.connection_mut()?.flag = flag;
        self.send(specifier, unit, HttpMethod::Delete, None).await
    }

    async fn send(
        &self,
        specifier: &DeviceSpecifier,
        unit: &mut Unit,
        method: HttpMethod,
        body: Option<Bytes>,
    ) -> Result<(), ErrorCode> {
        let request = prepare(unit, method, specifier.url(), body)?;
        let response = self.transfer(unit, request).await?;
        unit.set_bytes_available(response.body.len());
        unit.connection_mut()?.response = response.body;
        Ok(())
    }

    async fn transfer(&self, unit: &mut Unit, request: HttpRequest) -> Result<HttpResponse, ErrorCode> {
        unit.transition_to(UnitState::Busy)?;
        let method = request.method;
        let request = request.with_max_body(self.settings.max_transfer);

        match self.client.execute(request).await {
            Err(e) => {
                let code = translate::client_error(&e);
                warn!(unit = %unit.number(), %method, error = %e, %code, "Transfer failed");
                if translate::drops_connection(code) {
                    unit.reset();
                } else {
                    unit.transition_to(UnitState::Connected)?;
                }
                Err(code)
            }
            Ok(response) => {
                unit.transition_to(UnitState::Connected)?;
                unit.set_http_status(response.status);
                debug!(unit = %unit.number(), %method, status = response.status, bytes = response.body.len(), "Transfer complete");
                translate::http_status(response.status).inspect_err(|code| {
                    warn!(unit = %unit.number(), status = response.status, %code, "HTTP error status");
                })?;
                Ok(response)
            }
        }
    }

    /// Select text, binary or JSON transfers.
    ///
    /// # Errors
    /// `Offline` on an idle unit, `BadCommand` for a mode byte above 2.
    pub async fn set_channel_mode(&self, spec: &str, mode: u8) -> Result<(), ErrorCode> {
        let (_, mut unit) = self.acquire(spec)?;
        let result = set_channel_mode(&mut unit, mode);
        unit.record(result)
    }

    /// Begin collecting request headers.
    pub async fn start_headers(&self, spec: &str) -> Result<(), ErrorCode> {
        let (_, mut unit) = self.acquire(spec)?;
        let result = unit.connection_mut().map(|c| c.headers.start());
        unit.record(result)
    }

    /// Add one `Name: value` line.
    ///
    /// # Errors
    /// `BadCommand` outside a start/end bracket or for a malformed line.
    pub async fn add_header(&self, spec: &str, line: &str) -> Result<(), ErrorCode> {
        let (_, mut unit) = self.acquire(spec)?;
        let result = add_header(&mut unit, line);
        unit.record(result)
    }

    /// Stage the collected headers for the next transfer.
    pub async fn end_headers(&self, spec: &str) -> Result<(), ErrorCode> {
        let (_, mut unit) = self.acquire(spec)?;
        let result = unit.connection_mut().and_then(|c| c.headers.end());
        unit.record(result)
    }

    /// Close a unit. Always returns `Ok`.
    ///
    /// A malformed specifier is logged and ignored. Waits for an operation in
    /// flight on the unit to finish.
    pub async fn close(&self, spec: &str) -> ErrorCode {
        let specifier = match DeviceSpecifier::parse(spec) {
            Ok(specifier) => specifier,
            Err(e) => {
                warn!(specifier = spec, error = %e, "CLOSE with malformed specifier ignored");
                return ErrorCode::Ok;
            }
        };

        if let Some(shared) = self.registry.existing(specifier.unit()) {
            let mut unit = shared.lock().await;
            if unit.state() != UnitState::Idle {
                info!(unit = %unit.number(), "Unit closed");
            }
            unit.reset();
            unit.set_last_error(ErrorCode::Ok);
        }
        ErrorCode::Ok
    }

    /// Snapshot a unit. Never changes its `last_error`.
    ///
    /// # Errors
    /// `BadCommand` or `NoDevice` for a malformed specifier.
    pub async fn status(&self, spec: &str) -> Result<UnitStatus, ErrorCode> {
        let specifier = Self::parse(spec)?;
        let shared = self.registry.unit(specifier.unit());
        let status = match shared.try_lock() {
            Ok(unit) => unit.status(),
            Err(_) => UnitStatus::busy(specifier.unit()),
        };
        Ok(status)
    }
}

/// Build the request for a transfer, consuming any staged headers.
///
/// Channel-mode defaults for `Accept` and, when there is a body,
/// `Content-Type` are added unless the host staged its own.
fn prepare(
    unit: &mut Unit,
    method: HttpMethod,
    url: &str,
    body: Option<Bytes>,
) -> Result<HttpRequest, ErrorCode> {
    let connection = unit.connection_mut()?;
    let mode = connection.channel_mode;
    let staged = connection.headers.take();
    let staged_has = |name: &str| staged.iter().any(|h| h.name.eq_ignore_ascii_case(name));
    let has_accept = staged_has("Accept");
    let has_content_type = staged_has("Content-Type");

    let mut request = HttpRequest::new(method, url);
    if !has_accept {
        request = request.with_header("Accept", mode.accept());
    }
    if let Some(body) = body {
        if !has_content_type {
            request = request.with_header("Content-Type", mode.content_type());
        }
        request = request.with_body(body);
    }
    for line in staged {
        request = request.with_header(line.name, line.value);
    }
    Ok(request)
}

fn set_channel_mode(unit: &mut Unit, mode: u8) -> Result<(), ErrorCode> {
    let number = unit.number();
    let connection = unit.connection_mut()?;
    let mode = ChannelMode::from_u8(mode).map_err(|e| {
        warn!(unit = %number, error = %e, "Rejected channel mode");
        e.code()
    })?;
    debug!(unit = %number, %mode, "Channel mode set");
    connection.channel_mode = mode;
    Ok(())
}

fn add_header(unit: &mut Unit, line: &str) -> Result<(), ErrorCode> {
    let number = unit.number();
    let connection = unit.connection_mut()?;
    let header = HeaderLine::parse(line).map_err(|e| {
        warn!(unit = %number, error = %e, "Rejected header line");
        e.code()
    })?;
    connection.headers.add(header).inspect_err(|_| {
        warn!(unit = %number, "Header added outside a start/end bracket");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fujinet_core::UnitNumber;
    use fujinet_network::{ClientError, MockHttpClient};
    use rstest::rstest;

    const SPEC: &str = "N1:http://x/";

    fn device() -> (NetworkDevice<MockHttpClient>, MockHttpClient) {
        let client = MockHttpClient::new();
        (NetworkDevice::new(client.clone()), client)
    }

    async fn opened() -> (NetworkDevice<MockHttpClient>, MockHttpClient) {
        let (device, client) = device();
        device.open(SPEC, 4, TransactionFlag::NONE).await.unwrap();
        (device, client)
    }

    async fn status(device: &NetworkDevice<MockHttpClient>) -> UnitStatus {
        device.status(SPEC).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_connects_unit() {
        let (device, client) = device();
        assert_eq!(device.open(SPEC, 4, TransactionFlag::NONE).await, Ok(()));

        let status = status(&device).await;
        assert_eq!(status.state, UnitState::Connected);
        assert!(status.connected);
        assert!(status.opened_at.is_some());
        assert_eq!(client.requests()[0].method, HttpMethod::Head);
    }

    #[rstest]
    #[case("X1:http://x/", ErrorCode::BadCommand)]
    #[case("N1:ftp://x/", ErrorCode::BadCommand)]
    #[case("N1", ErrorCode::BadCommand)]
    #[case("N9:http://x/", ErrorCode::NoDevice)]
    #[case("N0:http://x/", ErrorCode::NoDevice)]
    #[tokio::test]
    async fn test_open_rejects_bad_specifier(#[case] spec: &str, #[case] expected: ErrorCode) {
        let (device, client) = device();
        assert_eq!(device.open(spec, 4, TransactionFlag::NONE).await, Err(expected));
        assert_eq!(device.registry().created(), 0);
        assert!(client.requests().is_empty());
    }

    #[rstest]
    #[case("N9:http://x/", ErrorCode::NoDevice)]
    #[case("N0:http://x/", ErrorCode::NoDevice)]
    #[case("X1:http://x/", ErrorCode::BadCommand)]
    #[tokio::test]
    async fn test_get_rejects_bad_specifier(#[case] spec: &str, #[case] expected: ErrorCode) {
        let (device, client) = device();
        let mut buffer = [0xAAu8; 16];
        assert_eq!(device.get(spec, &mut buffer, 16).await, Err(expected));
        assert_eq!(device.registry().created(), 0);
        assert!(client.requests().is_empty());
        assert_eq!(buffer, [0xAA; 16]);
    }

    #[tokio::test]
    async fn test_open_bad_mode() {
        let (device, _) = device();
        assert_eq!(device.open(SPEC, 7, TransactionFlag::NONE).await, Err(ErrorCode::BadCommand));
        let status = status(&device).await;
        assert_eq!(status.state, UnitState::Idle);
        assert_eq!(status.last_error, ErrorCode::BadCommand);
    }

    #[rstest]
    #[case(ClientError::ConnectionRefused("x".into()), ErrorCode::Offline)]
    #[case(ClientError::Timeout("x".into()), ErrorCode::IoError)]
    #[case(ClientError::InvalidUrl("x".into()), ErrorCode::IoError)]
    #[tokio::test]
    async fn test_open_probe_failure(#[case] error: ClientError, #[case] expected: ErrorCode) {
        let (device, client) = device();
        client.fail_probe(error);
        assert_eq!(device.open(SPEC, 4, TransactionFlag::NONE).await, Err(expected));
        assert_eq!(status(&device).await.state, UnitState::Idle);
    }

    #[tokio::test]
    async fn test_open_twice_is_bad_command() {
        let (device, _) = opened().await;
        assert_eq!(device.open(SPEC, 4, TransactionFlag::NONE).await, Err(ErrorCode::BadCommand));
        assert_eq!(status(&device).await.state, UnitState::Connected);
    }

    #[tokio::test]
    async fn test_idle_operations_are_offline() {
        let (device, client) = device();
        let mut buffer = [0u8; 16];

        assert_eq!(device.get(SPEC, &mut buffer, 16).await, Err(ErrorCode::Offline));
        assert_eq!(device.post(SPEC, "x").await, Err(ErrorCode::Offline));
        assert_eq!(device.post_bin(SPEC, b"x", 1).await, Err(ErrorCode::Offline));
        assert_eq!(device.delete(SPEC, TransactionFlag::NONE).await, Err(ErrorCode::Offline));
        assert_eq!(device.set_channel_mode(SPEC, 1).await, Err(ErrorCode::Offline));
        assert_eq!(device.start_headers(SPEC).await, Err(ErrorCode::Offline));
        assert_eq!(device.add_header(SPEC, "A: b").await, Err(ErrorCode::Offline));
        assert_eq!(device.end_headers(SPEC).await, Err(ErrorCode::Offline));

        assert!(client.requests().is_empty());
        assert_eq!(status(&device).await.last_error, ErrorCode::Offline);
    }

    #[tokio::test]
    async fn test_get_fills_buffer() {
        let (device, client) = opened().await;
        client.push_response(HttpResponse::new(200, vec![0x41; 97]));

        let mut buffer = [0u8; 4096];
        assert_eq!(device.get(SPEC, &mut buffer, 4096).await, Ok(97));
        assert!(buffer[..97].iter().all(|&b| b == 0x41));

        let status = status(&device).await;
        assert_eq!(status.bytes_available, 97);
        assert_eq!(status.http_status, Some(200));
        assert_eq!(status.last_error, ErrorCode::Ok);
    }

    #[tokio::test]
    async fn test_get_overflow_leaves_buffer_untouched() {
        let (device, client) = opened().await;
        client.push_response(HttpResponse::new(200, vec![0x41; 5000]));

        let mut buffer = [0u8; 4096];
        let result = device.get(SPEC, &mut buffer, 4096).await;
        assert_eq!(ErrorCode::encode_count(result), -1);
        assert!(buffer.iter().all(|&b| b == 0));

        let status = status(&device).await;
        assert_eq!(status.last_error, ErrorCode::IoError);
        assert_eq!(status.state, UnitState::Connected);
        assert_eq!(status.bytes_available, 5000);
    }

    #[tokio::test]
    async fn test_transfer_ceiling_limits_download() {
        let client = MockHttpClient::new();
        let settings = DeviceSettings {
            max_transfer: 16,
            ..DeviceSettings::default()
        };
        let device = NetworkDevice::with_settings(client.clone(), settings);
        device.open(SPEC, 4, TransactionFlag::NONE).await.unwrap();
        client.push_response(HttpResponse::new(200, vec![0x41; 100]));

        let mut buffer = [0u8; 256];
        assert_eq!(device.get(SPEC, &mut buffer, 256).await, Err(ErrorCode::IoError));
        assert_eq!(client.last_request().unwrap().max_body, Some(16));
        assert!(buffer.iter().all(|&b| b == 0));

        let status = status(&device).await;
        assert_eq!(status.state, UnitState::Connected);
        assert_eq!(status.last_error, ErrorCode::IoError);
    }

    #[tokio::test]
    async fn test_get_capacity_smaller_than_buffer() {
        let (device, client) = opened().await;
        client.push_response(HttpResponse::new(200, "0123456789"));

        let mut buffer = [0u8; 64];
        assert_eq!(device.get(SPEC, &mut buffer, 8).await, Err(ErrorCode::IoError));
    }

    #[tokio::test]
    async fn test_get_error_status() {
        let (device, client) = opened().await;
        client.push_response(HttpResponse::new(404, "gone"));

        let mut buffer = [0u8; 64];
        assert_eq!(device.get(SPEC, &mut buffer, 64).await, Err(ErrorCode::IoError));
        let status = status(&device).await;
        assert_eq!(status.http_status, Some(404));
        assert_eq!(status.state, UnitState::Connected);
    }

    #[tokio::test]
    async fn test_refused_transfer_drops_connection() {
        let (device, client) = opened().await;
        client.push_error(ClientError::ConnectionRefused("down".into()));

        let mut buffer = [0u8; 64];
        assert_eq!(device.get(SPEC, &mut buffer, 64).await, Err(ErrorCode::Offline));
        assert_eq!(status(&device).await.state, UnitState::Idle);
    }

    #[tokio::test]
    async fn test_timeout_keeps_connection() {
        let (device, client) = opened().await;
        client.push_error(ClientError::Timeout("slow".into()));

        assert_eq!(device.post(SPEC, "x").await, Err(ErrorCode::IoError));
        assert_eq!(status(&device).await.state, UnitState::Connected);
    }

    #[tokio::test]
    async fn test_last_error_is_replaced() {
        let (device, client) = opened().await;
        client
            .push_response(HttpResponse::new(500, ""))
            .push_response(HttpResponse::ok());

        assert_eq!(device.post(SPEC, "a").await, Err(ErrorCode::IoError));
        assert_eq!(status(&device).await.last_error, ErrorCode::IoError);
        assert_eq!(device.post(SPEC, "b").await, Ok(()));
        assert_eq!(status(&device).await.last_error, ErrorCode::Ok);
    }

    #[tokio::test]
    async fn test_auto_open_on_get() {
        let client = MockHttpClient::new();
        client.push_response(HttpResponse::new(200, "hi"));
        let settings = DeviceSettings {
            auto_open_on_get: true,
            ..DeviceSettings::default()
        };
        let device = NetworkDevice::with_settings(client.clone(), settings);

        let mut buffer = [0u8; 8];
        assert_eq!(device.get(SPEC, &mut buffer, 8).await, Ok(2));
        let methods: Vec<_> = client.requests().iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![HttpMethod::Head, HttpMethod::Get]);
    }

    #[tokio::test]
    async fn test_post_bin_length() {
        let (device, client) = opened().await;
        assert_eq!(device.post_bin(SPEC, b"abcdef", 4).await, Ok(()));
        assert_eq!(client.last_request().unwrap().body.unwrap(), &b"abcd"[..]);

        assert_eq!(device.post_bin(SPEC, b"ab", 3).await, Err(ErrorCode::BadCommand));
        assert_eq!(status(&device).await.last_error, ErrorCode::BadCommand);
    }

    #[tokio::test]
    async fn test_delete_uses_specifier_url() {
        let (device, client) = opened().await;
        assert_eq!(
            device.delete("N1:http://x/items/3", TransactionFlag(1)).await,
            Ok(())
        );
        let request = client.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.url, "http://x/items/3");
    }

    #[tokio::test]
    async fn test_headers_sent_once() {
        let (device, client) = opened().await;
        device.start_headers(SPEC).await.unwrap();
        device.add_header(SPEC, "X-Api-Key: abc").await.unwrap();
        device.add_header(SPEC, "Accept: text/csv").await.unwrap();
        device.end_headers(SPEC).await.unwrap();

        let mut buffer = [0u8; 8];
        device.get(SPEC, &mut buffer, 8).await.unwrap();
        let first = client.last_request().unwrap();
        assert_eq!(first.header("X-Api-Key"), Some("abc"));
        assert_eq!(first.header("Accept"), Some("text/csv"));

        device.get(SPEC, &mut buffer, 8).await.unwrap();
        let second = client.last_request().unwrap();
        assert_eq!(second.header("X-Api-Key"), None);
        assert_eq!(second.header("Accept"), Some(ChannelMode::Text.accept()));
    }

    #[tokio::test]
    async fn test_header_errors() {
        let (device, _) = opened().await;
        assert_eq!(device.add_header(SPEC, "A: b").await, Err(ErrorCode::BadCommand));
        assert_eq!(device.end_headers(SPEC).await, Err(ErrorCode::BadCommand));

        device.start_headers(SPEC).await.unwrap();
        assert_eq!(device.add_header(SPEC, "no colon").await, Err(ErrorCode::BadCommand));
    }

    #[tokio::test]
    async fn test_channel_mode_sets_content_type() {
        let (device, client) = opened().await;
        assert_eq!(device.set_channel_mode(SPEC, 3).await, Err(ErrorCode::BadCommand));
        device.set_channel_mode(SPEC, 2).await.unwrap();
        device.post(SPEC, "{}").await.unwrap();

        let request = client.last_request().unwrap();
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("Accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (device, _) = opened().await;
        assert_eq!(device.close(SPEC).await, ErrorCode::Ok);
        assert_eq!(device.close(SPEC).await, ErrorCode::Ok);
        assert_eq!(status(&device).await.state, UnitState::Idle);

        assert_eq!(device.close("garbage").await, ErrorCode::Ok);
        assert_eq!(device.close("N5:http://x/").await, ErrorCode::Ok);
        assert!(!device.registry().is_created(UnitNumber::new(5).unwrap()));

        device.open(SPEC, 4, TransactionFlag::NONE).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_does_not_alter_last_error() {
        let (device, _) = device();
        let mut buffer = [0u8; 4];
        device.get(SPEC, &mut buffer, 4).await.unwrap_err();

        assert_eq!(status(&device).await.last_error, ErrorCode::Offline);
        assert_eq!(status(&device).await.last_error, ErrorCode::Offline);
        assert_eq!(status(&device).await.to_bytes(), [0, 0, 0, 3]);
    }

    #[tokio::test]
    async fn test_busy_unit_rejects_commands() {
        let (device, _) = opened().await;
        let shared = device.registry().unit(UnitNumber::new(1).unwrap());
        let _held = shared.lock().await;

        let mut buffer = [0u8; 4];
        assert_eq!(device.get(SPEC, &mut buffer, 4).await, Err(ErrorCode::BadCommand));
        assert_eq!(status(&device).await.state, UnitState::Busy);

        // Other units are unaffected.
        assert_eq!(device.open("N2:http://y/", 4, TransactionFlag::NONE).await, Ok(()));
    }
}
