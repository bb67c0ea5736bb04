use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use fujinet_core::{ChannelMode, ErrorCode, HalConfig, OpenMode};
use fujinet_device::{BusBridge, NetworkDevice, NetworkHal};
use fujinet_hardware::AnyPlatform;
use fujinet_network::{AnyHttpClient, ReqwestHttpClient};
use tracing::{debug, info};

use crate::cli::{Command, RequestArgs};

pub fn run(command: Command, mut config: HalConfig) -> Result<()> {
    match command {
        Command::Get {
            specifier,
            capacity,
            request,
        } => {
            let hal = NetworkHal::from_config(&config)?;
            let body = session(&hal, &specifier, OpenMode::Get, &request, |hal| {
                get(hal, &specifier, capacity)
            })?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&body)?;
            stdout.flush()?;
            Ok(())
        }
        Command::Post {
            specifier,
            data,
            request,
        } => {
            let hal = NetworkHal::from_config(&config)?;
            session(&hal, &specifier, OpenMode::Put, &request, |hal| {
                check("post", hal.post(&specifier, &data))
            })
        }
        Command::PostBin {
            specifier,
            file,
            request,
        } => {
            let data = read_input(&file)?;
            let length = u16::try_from(data.len())
                .with_context(|| format!("{} bytes is too large to send", data.len()))?;
            let hal = NetworkHal::from_config(&config)?;
            session(&hal, &specifier, OpenMode::Put, &request, |hal| {
                check("post-bin", hal.post_bin(&specifier, &data, length))
            })
        }
        Command::Delete {
            specifier,
            flag,
            request,
        } => {
            let hal = NetworkHal::from_config(&config)?;
            session(&hal, &specifier, OpenMode::Put, &request, |hal| {
                check("delete", hal.delete(&specifier, flag))
            })
        }
        Command::Status { specifier } => {
            let hal = NetworkHal::from_config(&config)?;
            let opened = hal.open(&specifier, OpenMode::Get.to_u8(), 0);
            let status = hal
                .unit_status(&specifier)
                .map_err(|code| anyhow::anyhow!("status failed: {code}"))?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            hal.close(&specifier);
            check("open", opened)
        }
        Command::Serve {
            listen,
            serial,
            baud,
        } => {
            if let Some(listen) = listen {
                config.bus.listen = listen;
            }
            if serial.is_some() {
                config.bus.serial_port = serial;
            }
            if let Some(baud) = baud {
                config.bus.baud_rate = baud;
            }
            config.validate()?;
            serve(config)
        }
    }
}

/// Open the unit, apply the request options, run `transfer` and close.
///
/// The unit is closed whether or not the transfer succeeds.
fn session<T>(
    hal: &NetworkHal,
    specifier: &str,
    mode: OpenMode,
    request: &RequestArgs,
    transfer: impl FnOnce(&NetworkHal) -> Result<T>,
) -> Result<T> {
    check("open", hal.open(specifier, mode.to_u8(), 0))?;
    let result = prepare(hal, specifier, request).and_then(|()| transfer(hal));
    hal.close(specifier);
    result
}

fn prepare(hal: &NetworkHal, specifier: &str, request: &RequestArgs) -> Result<()> {
    let mode = ChannelMode::from(request.mode);
    check("set channel mode", hal.set_channel_mode(specifier, mode.to_u8()))?;

    if request.headers.is_empty() {
        return Ok(());
    }
    check("start headers", hal.start_add_headers(specifier))?;
    for line in &request.headers {
        check("add header", hal.add_header(specifier, line))
            .with_context(|| format!("header {line:?}"))?;
    }
    check("end headers", hal.end_add_headers(specifier))
}

fn get(hal: &NetworkHal, specifier: &str, capacity: u16) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; usize::from(capacity)];
    let count = hal.get(specifier, &mut buffer, capacity);
    if count < 0 {
        let status = u8::try_from(-count).unwrap_or(u8::MAX);
        return check("get", status).map(|()| Vec::new());
    }
    buffer.truncate(usize::try_from(count).unwrap_or_default());
    debug!(bytes = buffer.len(), "Received body");
    Ok(buffer)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        return Ok(data);
    }
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Turn a wire status byte into a result.
fn check(operation: &str, status: u8) -> Result<()> {
    match ErrorCode::try_from(status) {
        Ok(ErrorCode::Ok) => Ok(()),
        Ok(code) => bail!("{operation} failed: {code}"),
        Err(_) => bail!("{operation} failed: status {status:#04x}"),
    }
}

fn serve(config: HalConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let client = ReqwestHttpClient::from_settings(&config.http)?;
        let device = NetworkDevice::with_settings(AnyHttpClient::from(client), config.device);
        let mut platform = AnyPlatform::from_settings(&config.bus)?;
        let mut bridge = BusBridge::new(device);

        loop {
            tokio::select! {
                result = bridge.serve(&mut platform) => {
                    let stats = result?;
                    info!(frames = stats.frames, naks = stats.naks, errors = stats.errors, "Host session ended");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping bus server");
                    break;
                }
            }
        }
        Ok(())
    })
}
