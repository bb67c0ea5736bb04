//! Core constants for the FujiNet network device.
//!
//! These values define the unit address space, the byte values of the host
//! command set, and the default limits applied to transfers and the bus.
//!
//! # Unit Addressing
//!
//! Eight network units are addressable. On the host bus they appear as device
//! bytes `0x71..=0x78`; in device specifiers they appear as `N1`..`N8`.
//!
//! ```
//! use fujinet_core::constants::*;
//!
//! assert_eq!(unit_from_device_byte(0x71), Some(1));
//! assert_eq!(unit_from_device_byte(0x78), Some(8));
//! assert_eq!(unit_from_device_byte(0x79), None);
//! assert_eq!(device_byte_for_unit(3), 0x73);
//! ```

// ============================================================================
// Unit Addressing
// ============================================================================

/// Lowest addressable unit number.
pub const MIN_UNIT: u8 = 1;

/// Highest addressable unit number.
pub const MAX_UNIT: u8 = 8;

/// Number of unit slots held by the registry.
pub const UNIT_COUNT: usize = MAX_UNIT as usize;

/// Bus device byte of unit N1. Units N1..N8 occupy `0x71..=0x78`.
pub const NETWORK_DEVICE_BASE: u8 = 0x70;

/// Map a bus device byte to its unit number.
#[must_use]
pub fn unit_from_device_byte(device: u8) -> Option<u8> {
    let unit = device.checked_sub(NETWORK_DEVICE_BASE)?;
    (MIN_UNIT..=MAX_UNIT).contains(&unit).then_some(unit)
}

/// Bus device byte for a unit number.
#[must_use]
pub fn device_byte_for_unit(unit: u8) -> u8 {
    NETWORK_DEVICE_BASE + unit
}

// ============================================================================
// Device Specifier
// ============================================================================

/// Device class marker in a specifier (`N1:...`). Matched case-insensitively.
pub const DEVICE_CLASS_MARKER: char = 'N';

/// Separator between the unit digit and the URL.
pub const SPECIFIER_SEPARATOR: char = ':';

/// Minimum specifier length: marker, digit and separator.
pub const MIN_SPECIFIER_LENGTH: usize = 3;

/// Maximum specifier length accepted from the host (one SIO data block).
pub const MAX_SPECIFIER_LENGTH: usize = 256;

// ============================================================================
// Host Command Bytes
// ============================================================================

/// Open a unit: aux1 = open mode, aux2 = transaction flag.
pub const CMD_OPEN: u8 = b'O';

/// HTTP GET into a host buffer: aux1/aux2 = buffer capacity (little-endian).
pub const CMD_READ: u8 = b'R';

/// HTTP POST of binary data.
pub const CMD_WRITE: u8 = b'W';

/// HTTP POST of text data.
pub const CMD_POST: u8 = b'P';

/// HTTP DELETE: aux2 = transaction flag.
pub const CMD_DELETE: u8 = b'D';

/// Header collection: aux1 selects start, add or end.
pub const CMD_HEADERS: u8 = b'H';

/// Close a unit.
pub const CMD_CLOSE: u8 = b'C';

/// Query unit status.
pub const CMD_STATUS: u8 = b'S';

/// Set channel mode: aux1 = mode byte.
pub const CMD_SET_CHANNEL_MODE: u8 = 0xFC;

/// Header sub-command: begin collecting.
pub const HEADERS_START: u8 = 0;

/// Header sub-command: add one header line.
pub const HEADERS_ADD: u8 = 1;

/// Header sub-command: stop collecting.
pub const HEADERS_END: u8 = 2;

// ============================================================================
// Response Markers
// ============================================================================

/// Response marker for a completed command.
pub const RESPONSE_COMPLETE: u8 = b'C';

/// Response marker for a command that ended in an error code.
pub const RESPONSE_ERROR: u8 = b'E';

/// Single-byte reply to a frame that could not be decoded.
pub const RESPONSE_NAK: u8 = b'N';

// ============================================================================
// Limits and Timeouts
// ============================================================================

/// Largest transfer representable as a signed 16-bit byte count.
pub const MAX_TRANSFER_SIZE: usize = i16::MAX as usize;

/// Size of the command frame header: device, command, aux1, aux2, length.
pub const COMMAND_HEADER_LENGTH: usize = 6;

/// Size of the response frame header: marker, status, length.
pub const RESPONSE_HEADER_LENGTH: usize = 4;

/// Largest frame payload accepted by the codec.
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize;

/// Default HTTP request timeout in milliseconds.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// Default HTTP connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default bus listen address for the TCP platform.
pub const DEFAULT_BUS_LISTEN: &str = "127.0.0.1:6502";

/// Default serial baud rate (standard SIO speed).
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// Default bus read timeout in milliseconds.
pub const DEFAULT_BUS_READ_TIMEOUT_MS: u64 = 1_000;
