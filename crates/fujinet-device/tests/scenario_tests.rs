// End-to-end device scenarios against a wiremock HTTP server.

use fujinet_core::{DeviceSettings, ErrorCode, HttpSettings, TransactionFlag, UnitNumber};
use fujinet_device::{NetworkDevice, NetworkHal, UnitState};
use fujinet_network::{AnyHttpClient, ReqwestHttpClient};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn reqwest_client() -> ReqwestHttpClient {
    let settings = HttpSettings {
        timeout_ms: 2_000,
        ..HttpSettings::default()
    };
    ReqwestHttpClient::from_settings(&settings).unwrap()
}

async fn setup() -> (MockServer, NetworkDevice<ReqwestHttpClient>) {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    (server, NetworkDevice::new(reqwest_client()))
}

fn spec(server: &MockServer, unit: u8, route: &str) -> String {
    format!("N{unit}:{}{route}", server.uri())
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_open_then_get_small_body() {
    let (server, device) = setup().await;
    let body = "A".repeat(97);
    Mock::given(method("GET"))
        .and(path("/file.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let spec = spec(&server, 1, "/file.txt");
    assert_eq!(device.open(&spec, 4, TransactionFlag::NONE).await, Ok(()));

    let mut buffer = [0u8; 4096];
    assert_eq!(device.get(&spec, &mut buffer, 4096).await, Ok(97));
    assert_eq!(&buffer[..97], body.as_bytes());

    let status = device.status(&spec).await.unwrap();
    assert_eq!(status.state, UnitState::Connected);
    assert_eq!(status.bytes_available, 97);
}

#[tokio::test]
async fn test_large_body_does_not_fit() {
    let (server, device) = setup().await;
    Mock::given(method("GET"))
        .and(path("/big.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x55; 5000]))
        .mount(&server)
        .await;

    let spec = spec(&server, 2, "/big.bin");
    device.open(&spec, 4, TransactionFlag::NONE).await.unwrap();

    let mut buffer = [0u8; 4096];
    let result = device.get(&spec, &mut buffer, 4096).await;
    assert_eq!(ErrorCode::encode_count(result), -1);
    assert!(buffer.iter().all(|&b| b == 0));
}

#[tokio::test]
async fn test_http_error_is_io_error() {
    let (server, device) = setup().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let spec = spec(&server, 1, "/missing");
    device.open(&spec, 4, TransactionFlag::NONE).await.unwrap();

    let mut buffer = [0u8; 64];
    assert_eq!(device.get(&spec, &mut buffer, 64).await, Err(ErrorCode::IoError));
    let status = device.status(&spec).await.unwrap();
    assert_eq!(status.http_status, Some(404));
    assert_eq!(status.last_error, ErrorCode::IoError);
}

#[tokio::test]
async fn test_post_with_headers_and_json_mode() {
    let (server, device) = setup().await;
    Mock::given(method("POST"))
        .and(path("/scores"))
        .and(header("Content-Type", "application/json"))
        .and(header("X-Game", "pacman"))
        .and(body_string(r#"{"score":1200}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let spec = spec(&server, 3, "/scores");
    device.open(&spec, 8, TransactionFlag::NONE).await.unwrap();
    device.set_channel_mode(&spec, 2).await.unwrap();
    device.start_headers(&spec).await.unwrap();
    device.add_header(&spec, "X-Game: pacman").await.unwrap();
    device.end_headers(&spec).await.unwrap();

    assert_eq!(device.post(&spec, r#"{"score":1200}"#).await, Ok(()));
}

#[tokio::test]
async fn test_post_bin_and_delete() {
    let (server, device) = setup().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("Content-Type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let spec = spec(&server, 4, "/upload");
    device.open(&spec, 8, TransactionFlag::NONE).await.unwrap();
    device.set_channel_mode(&spec, 1).await.unwrap();
    assert_eq!(device.post_bin(&spec, &[0, 1, 2, 3, 4], 5).await, Ok(()));
    assert_eq!(device.delete(&spec, TransactionFlag::NONE).await, Ok(()));
}

#[tokio::test]
async fn test_malformed_specifiers() {
    let (server, device) = setup().await;

    let bad_class = format!("X1:{}/", server.uri());
    assert_eq!(
        device.open(&bad_class, 4, TransactionFlag::NONE).await,
        Err(ErrorCode::BadCommand)
    );

    let mut buffer = [0u8; 16];
    let no_device = format!("N9:{}/", server.uri());
    assert_eq!(device.get(&no_device, &mut buffer, 16).await, Err(ErrorCode::NoDevice));
    assert_eq!(device.registry().created(), 0);
}

#[tokio::test]
async fn test_refused_open_is_offline() {
    let device = NetworkDevice::new(reqwest_client());
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let spec = format!("N1:http://{addr}/");
    assert_eq!(
        device.open(&spec, 4, TransactionFlag::NONE).await,
        Err(ErrorCode::Offline)
    );
    let status = device.status(&spec).await.unwrap();
    assert_eq!(status.state, UnitState::Idle);
    assert!(device.registry().existing(UnitNumber::new(1).unwrap()).is_some());
}

#[tokio::test]
async fn test_auto_open_compatibility_path() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("auto"))
        .mount(&server)
        .await;

    let settings = DeviceSettings {
        auto_open_on_get: true,
        ..DeviceSettings::default()
    };
    let device = NetworkDevice::with_settings(reqwest_client(), settings);

    let spec = spec(&server, 1, "/");
    let mut buffer = [0u8; 16];
    assert_eq!(device.get(&spec, &mut buffer, 16).await, Ok(4));
    assert_eq!(device.get(&spec, &mut buffer, 16).await, Ok(4));
}

// ── Blocking facade ─────────────────────────────────────────────────

#[test]
fn test_hal_against_live_server() {
    // The server needs its own runtime; the HAL blocks on a private one.
    let server_runtime = tokio::runtime::Runtime::new().unwrap();
    let server = server_runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/motd"))
            .respond_with(ResponseTemplate::new(200).set_body_string("WELCOME"))
            .mount(&server)
            .await;
        server
    });

    let hal = NetworkHal::with_client(
        AnyHttpClient::from(reqwest_client()),
        DeviceSettings::default(),
    )
    .unwrap();
    let spec = spec(&server, 1, "/motd");

    assert_eq!(hal.init(), 0);
    assert_eq!(hal.open(&spec, 4, 0), 0);
    let mut buffer = [0u8; 32];
    assert_eq!(hal.get(&spec, &mut buffer, 32), 7);
    assert_eq!(&buffer[..7], b"WELCOME");

    let mut block = [0u8; 4];
    assert_eq!(hal.status(&spec, &mut block), 0);
    assert_eq!(block, [7, 0, 1, 0]);
    assert_eq!(hal.close(&spec), 0);

    drop(hal);
    drop(server);
    drop(server_runtime);
}
