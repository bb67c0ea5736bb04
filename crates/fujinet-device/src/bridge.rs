//! Service loop between the host bus and the network device.
//!
//! The bridge reads bytes from a [`ByteChannel`], frames them with
//! [`SioCodec`], turns each frame into a [`HostCommand`] through a
//! [`HostTranslator`], runs it on the [`NetworkDevice`] and writes the response
//! frame back.
//!
//! ```text
//! ByteChannel ──bytes──> SioCodec ──CommandFrame──> HostTranslator
//!      ^                                                  │
//!      │                                             HostCommand
//!      │                                                  v
//!      └────bytes──── SioCodec <──ResponseFrame──── NetworkDevice
//! ```
//!
//! Bad frames never stop the loop. A frame that cannot be framed or fails
//! validation is answered with a NAK; an unknown command gets an error frame
//! with `BAD_COMMAND`. GET never asks for more than one response frame can
//! carry, and a reply that still cannot be framed becomes a NAK. A read timeout on the channel means no data yet. The
//! loop ends when the host closes the channel.

use bytes::{Bytes, BytesMut};
use fujinet_core::ErrorCode;
use fujinet_hardware::traits::{ByteChannel, Platform};
use fujinet_network::HttpClient;
use fujinet_protocol::{
    CommandFrame, HostCommand, HostTranslator, ResponseFrame, SioCodec, SioHostTranslator,
    TranslatorError,
};
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, info, trace, warn};

use crate::{device::NetworkDevice, error::Result};

/// Bytes requested from the channel per read.
const READ_CHUNK: usize = 512;

/// Counters for one bridge session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Frames decoded.
    pub frames: u64,
    /// NAKs sent.
    pub naks: u64,
    /// Error frames sent.
    pub errors: u64,
}

pub struct BusBridge<C: HttpClient, T: HostTranslator = SioHostTranslator> {
    device: NetworkDevice<C>,
    translator: T,
    codec: SioCodec,
}

impl<C: HttpClient> BusBridge<C, SioHostTranslator> {
    pub fn new(device: NetworkDevice<C>) -> Self {
        Self::with_translator(device, SioHostTranslator::new())
    }
}

impl<C: HttpClient, T: HostTranslator> BusBridge<C, T> {
    pub fn with_translator(device: NetworkDevice<C>, translator: T) -> Self {
        Self {
            device,
            translator,
            codec: SioCodec::new(),
        }
    }

    /// Replace the frame codec, for example to lower the payload limit.
    #[must_use]
    pub fn with_codec(mut self, codec: SioCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn device(&self) -> &NetworkDevice<C> {
        &self.device
    }

    /// Accept a host channel from `platform` and run until it closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform fails to initialise or the channel
    /// fails with anything other than a read timeout.
    pub async fn serve<P: Platform>(&mut self, platform: &mut P) -> Result<BridgeStats> {
        info!(platform = platform.name(), translator = self.translator.name(), "Starting bus bridge");
        let mut channel = platform.initialize().await?;
        let result = self.run(&mut channel).await;
        channel.close().await?;
        platform.shutdown().await?;
        if let Ok(stats) = &result {
            info!(frames = stats.frames, naks = stats.naks, errors = stats.errors, "Bus bridge stopped");
        }
        result
    }

    /// Service frames on an open channel until the host closes it.
    ///
    /// # Errors
    ///
    /// Returns channel failures other than read timeouts.
    pub async fn run<Ch: ByteChannel>(&mut self, channel: &mut Ch) -> Result<BridgeStats> {
        let mut stats = BridgeStats::default();
        let mut pending = BytesMut::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = match channel.read(&mut chunk).await {
                Ok(0) => {
                    debug!("Host closed the bus channel");
                    break;
                }
                Ok(n) => n,
                Err(e) if e.is_timeout() => continue,
                Err(e) => return Err(e.into()),
            };
            trace!(bytes = n, "Bus read");
            pending.extend_from_slice(&chunk[..n]);

            loop {
                let response = match self.codec.decode(&mut pending) {
                    Ok(Some(frame)) => {
                        stats.frames += 1;
                        self.handle_frame(&frame).await
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Undecodable frame, discarding buffered bytes");
                        pending.clear();
                        ResponseFrame::nak()
                    }
                };

                let mut nak = response.is_nak();
                let failed = !response.status.is_ok();
                let mut out = BytesMut::with_capacity(response.size());
                if let Err(e) = self.codec.encode(response, &mut out) {
                    warn!(error = %e, "Response could not be framed, sending NAK");
                    out.clear();
                    self.codec.encode(ResponseFrame::nak(), &mut out)?;
                    nak = true;
                }

                if nak {
                    stats.naks += 1;
                } else if failed {
                    stats.errors += 1;
                }
                channel.write(&out).await?;
            }
        }

        Ok(stats)
    }

    /// Answer one command frame.
    pub async fn handle_frame(&self, frame: &CommandFrame) -> ResponseFrame {
        match self.translator.translate_command(frame) {
            Ok(request) => {
                debug!(unit = %request.unit, command = %request.command.code(), "Dispatching host command");
                let (status, payload) = self.dispatch(request.command).await;
                self.translator.translate_response(status, payload)
            }
            Err(TranslatorError::NotSupported { command }) => {
                warn!(command, "Unsupported host command");
                self.translator
                    .translate_response(ErrorCode::BadCommand, Bytes::new())
            }
            Err(e) => {
                warn!(error = %e, "Invalid command frame");
                ResponseFrame::nak()
            }
        }
    }

    /// Run a command on the device and return its status and reply payload.
    ///
    /// GET capacity is capped at the codec's payload limit.
    pub async fn dispatch(&self, command: HostCommand) -> (ErrorCode, Bytes) {
        let device = &self.device;
        match command {
            HostCommand::Open {
                specifier,
                mode,
                flag,
            } => done(device.open(&specifier, mode, flag).await),
            HostCommand::Get {
                specifier,
                capacity,
            } => {
                let capacity = usize::from(capacity).min(self.codec.max_payload());
                let mut buffer = vec![0u8; capacity];
                match device.get(&specifier, &mut buffer, capacity).await {
                    Ok(n) => {
                        buffer.truncate(n);
                        (ErrorCode::Ok, Bytes::from(buffer))
                    }
                    Err(code) => (code, Bytes::new()),
                }
            }
            HostCommand::Post { specifier, data } => done(device.post(&specifier, &data).await),
            HostCommand::PostBin { specifier, data } => {
                done(device.post_bin(&specifier, &data, data.len()).await)
            }
            HostCommand::Delete { specifier, flag } => done(device.delete(&specifier, flag).await),
            HostCommand::SetChannelMode { specifier, mode } => {
                done(device.set_channel_mode(&specifier, mode).await)
            }
            HostCommand::StartHeaders { specifier } => done(device.start_headers(&specifier).await),
            HostCommand::AddHeader { specifier, line } => {
                done(device.add_header(&specifier, &line).await)
            }
            HostCommand::EndHeaders { specifier } => done(device.end_headers(&specifier).await),
            HostCommand::Close { specifier } => (device.close(&specifier).await, Bytes::new()),
            HostCommand::Status { specifier } => match device.status(&specifier).await {
                Ok(status) => (ErrorCode::Ok, Bytes::copy_from_slice(&status.to_bytes())),
                Err(code) => (code, Bytes::new()),
            },
        }
    }
}

fn done(result: std::result::Result<(), ErrorCode>) -> (ErrorCode, Bytes) {
    (ErrorCode::from_result(result), Bytes::new())
}
