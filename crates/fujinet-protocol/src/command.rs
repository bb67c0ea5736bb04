//! Structured host commands.
//!
//! [`HostCommand`] is what a command frame means once the translator has
//! checked it. The specifier is carried as the raw string the host sent; the
//! device parses it so that specifier failures surface as device status codes
//! rather than framing errors.
//!
//! For the commands that carry data (`W`, `P` and `H`/add) the frame payload is
//! the specifier, a NUL byte, then the data:
//!
//! ```text
//! N1:http://example.com/api\0{"key":"value"}
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use fujinet_core::{
    TransactionFlag, UnitNumber,
    constants::{
        CMD_CLOSE, CMD_DELETE, CMD_HEADERS, CMD_OPEN, CMD_POST, CMD_READ, CMD_SET_CHANNEL_MODE,
        CMD_STATUS, CMD_WRITE, HEADERS_ADD, HEADERS_END, HEADERS_START, device_byte_for_unit,
    },
};
use std::fmt;

use crate::frame::CommandFrame;

/// Command byte of a host frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Open,
    Read,
    Write,
    Post,
    Delete,
    Headers,
    Close,
    Status,
    SetChannelMode,
}

impl CommandCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_OPEN => Some(CommandCode::Open),
            CMD_READ => Some(CommandCode::Read),
            CMD_WRITE => Some(CommandCode::Write),
            CMD_POST => Some(CommandCode::Post),
            CMD_DELETE => Some(CommandCode::Delete),
            CMD_HEADERS => Some(CommandCode::Headers),
            CMD_CLOSE => Some(CommandCode::Close),
            CMD_STATUS => Some(CommandCode::Status),
            CMD_SET_CHANNEL_MODE => Some(CommandCode::SetChannelMode),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            CommandCode::Open => CMD_OPEN,
            CommandCode::Read => CMD_READ,
            CommandCode::Write => CMD_WRITE,
            CommandCode::Post => CMD_POST,
            CommandCode::Delete => CMD_DELETE,
            CommandCode::Headers => CMD_HEADERS,
            CommandCode::Close => CMD_CLOSE,
            CommandCode::Status => CMD_STATUS,
            CommandCode::SetChannelMode => CMD_SET_CHANNEL_MODE,
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CommandCode::Open => "OPEN",
            CommandCode::Read => "READ",
            CommandCode::Write => "WRITE",
            CommandCode::Post => "POST",
            CommandCode::Delete => "DELETE",
            CommandCode::Headers => "HEADERS",
            CommandCode::Close => "CLOSE",
            CommandCode::Status => "STATUS",
            CommandCode::SetChannelMode => "SET_CHANNEL_MODE",
        };
        write!(f, "{name}")
    }
}

/// A decoded host command.
///
/// Mode bytes are kept raw; the device decides whether they are valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Open {
        specifier: String,
        mode: u8,
        flag: TransactionFlag,
    },
    Get {
        specifier: String,
        capacity: u16,
    },
    Post {
        specifier: String,
        data: String,
    },
    PostBin {
        specifier: String,
        data: Bytes,
    },
    Delete {
        specifier: String,
        flag: TransactionFlag,
    },
    SetChannelMode {
        specifier: String,
        mode: u8,
    },
    StartHeaders {
        specifier: String,
    },
    AddHeader {
        specifier: String,
        line: String,
    },
    EndHeaders {
        specifier: String,
    },
    Close {
        specifier: String,
    },
    Status {
        specifier: String,
    },
}

impl HostCommand {
    pub fn code(&self) -> CommandCode {
        match self {
            HostCommand::Open { .. } => CommandCode::Open,
            HostCommand::Get { .. } => CommandCode::Read,
            HostCommand::Post { .. } => CommandCode::Post,
            HostCommand::PostBin { .. } => CommandCode::Write,
            HostCommand::Delete { .. } => CommandCode::Delete,
            HostCommand::SetChannelMode { .. } => CommandCode::SetChannelMode,
            HostCommand::StartHeaders { .. }
            | HostCommand::AddHeader { .. }
            | HostCommand::EndHeaders { .. } => CommandCode::Headers,
            HostCommand::Close { .. } => CommandCode::Close,
            HostCommand::Status { .. } => CommandCode::Status,
        }
    }

    pub fn specifier(&self) -> &str {
        match self {
            HostCommand::Open { specifier, .. }
            | HostCommand::Get { specifier, .. }
            | HostCommand::Post { specifier, .. }
            | HostCommand::PostBin { specifier, .. }
            | HostCommand::Delete { specifier, .. }
            | HostCommand::SetChannelMode { specifier, .. }
            | HostCommand::StartHeaders { specifier }
            | HostCommand::AddHeader { specifier, .. }
            | HostCommand::EndHeaders { specifier }
            | HostCommand::Close { specifier }
            | HostCommand::Status { specifier } => specifier,
        }
    }

    /// aux1 and aux2 bytes for this command.
    fn aux(&self) -> (u8, u8) {
        match self {
            HostCommand::Open { mode, flag, .. } => (*mode, flag.as_u8()),
            HostCommand::Get { capacity, .. } => {
                let [lo, hi] = capacity.to_le_bytes();
                (lo, hi)
            }
            HostCommand::Delete { flag, .. } => (0, flag.as_u8()),
            HostCommand::SetChannelMode { mode, .. } => (*mode, 0),
            HostCommand::StartHeaders { .. } => (HEADERS_START, 0),
            HostCommand::AddHeader { .. } => (HEADERS_ADD, 0),
            HostCommand::EndHeaders { .. } => (HEADERS_END, 0),
            _ => (0, 0),
        }
    }

    fn payload(&self) -> Bytes {
        let data: Option<&[u8]> = match self {
            HostCommand::Post { data, .. } => Some(data.as_bytes()),
            HostCommand::PostBin { data, .. } => Some(&data[..]),
            HostCommand::AddHeader { line, .. } => Some(line.as_bytes()),
            _ => None,
        };

        let specifier = self.specifier().as_bytes();
        match data {
            Some(data) => {
                let mut buf = BytesMut::with_capacity(specifier.len() + 1 + data.len());
                buf.put_slice(specifier);
                buf.put_u8(0);
                buf.put_slice(data);
                buf.freeze()
            }
            None => Bytes::copy_from_slice(specifier),
        }
    }

    /// Encode as a command frame addressed to `unit`.
    pub fn to_frame(&self, unit: UnitNumber) -> CommandFrame {
        let (aux1, aux2) = self.aux();
        CommandFrame::new(
            device_byte_for_unit(unit.as_u8()),
            self.code().as_byte(),
            aux1,
            aux2,
            self.payload(),
        )
    }
}

/// A translated command together with the unit its frame addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRequest {
    pub unit: UnitNumber,
    pub command: HostCommand,
}
