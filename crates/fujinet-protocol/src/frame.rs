use bytes::{BufMut, Bytes, BytesMut};
use fujinet_core::{
    ErrorCode, UnitNumber,
    constants::{
        COMMAND_HEADER_LENGTH, RESPONSE_COMPLETE, RESPONSE_ERROR, RESPONSE_HEADER_LENGTH,
        RESPONSE_NAK, unit_from_device_byte,
    },
};
use std::fmt;

/// SIO add-with-carry checksum.
///
/// Each byte is added to an 8-bit accumulator and any carry out of bit 7 is
/// folded back into bit 0.
///
/// ```
/// use fujinet_protocol::frame::sio_checksum;
///
/// assert_eq!(sio_checksum(&[]), 0);
/// assert_eq!(sio_checksum(&[0x01, 0x02]), 0x03);
/// assert_eq!(sio_checksum(&[0xFF, 0x02]), 0x02);
/// ```
#[must_use]
pub fn sio_checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u16, |acc, &byte| {
        let sum = acc + u16::from(byte);
        (sum >> 8) + (sum & 0xFF)
    });
    // The accumulator never exceeds 0xFF after folding
    sum as u8
}

/// Command frame sent by the host.
///
/// # Wire Format
/// ```text
/// [device][command][aux1][aux2][len_lo][len_hi][payload...][checksum]
/// ```
///
/// The checksum covers every byte before it. A frame decoded from the wire
/// keeps the checksum it arrived with so the translator can verify it.
///
/// ```
/// use fujinet_protocol::frame::CommandFrame;
///
/// let frame = CommandFrame::new(0x71, b'C', 0, 0, &b"N1:http://x/"[..]);
/// assert!(frame.is_checksum_valid());
/// assert_eq!(frame.unit().unwrap().as_u8(), 1);
///
/// let bytes = frame.to_bytes();
/// assert_eq!(bytes.len(), 6 + 12 + 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub device: u8,
    pub command: u8,
    pub aux1: u8,
    pub aux2: u8,
    pub payload: Bytes,
    pub checksum: u8,
}

impl CommandFrame {
    /// Build a frame and compute its checksum.
    pub fn new(device: u8, command: u8, aux1: u8, aux2: u8, payload: impl Into<Bytes>) -> Self {
        let mut frame = CommandFrame {
            device,
            command,
            aux1,
            aux2,
            payload: payload.into(),
            checksum: 0,
        };
        frame.checksum = frame.expected_checksum();
        frame
    }

    /// Rebuild a frame from its wire parts without recomputing the checksum.
    pub fn from_parts(header: [u8; 4], payload: Bytes, checksum: u8) -> Self {
        let [device, command, aux1, aux2] = header;
        CommandFrame {
            device,
            command,
            aux1,
            aux2,
            payload,
            checksum,
        }
    }

    /// Unit addressed by the device byte, if it is a network device.
    pub fn unit(&self) -> Option<UnitNumber> {
        unit_from_device_byte(self.device).and_then(|unit| UnitNumber::new(unit).ok())
    }

    /// aux1 and aux2 as a little-endian word.
    pub fn aux(&self) -> u16 {
        u16::from_le_bytes([self.aux1, self.aux2])
    }

    fn header(&self) -> [u8; COMMAND_HEADER_LENGTH] {
        // Callers keep payloads within u16 range; the codec enforces it on encode
        let [len_lo, len_hi] = (self.payload.len() as u16).to_le_bytes();
        [
            self.device,
            self.command,
            self.aux1,
            self.aux2,
            len_lo,
            len_hi,
        ]
    }

    /// Checksum computed over the header and payload.
    pub fn expected_checksum(&self) -> u8 {
        let header = sio_checksum(&self.header());
        sio_checksum(&[header, sio_checksum(&self.payload)])
    }

    pub fn is_checksum_valid(&self) -> bool {
        self.checksum == self.expected_checksum()
    }

    /// Size of the frame on the wire.
    pub fn size(&self) -> usize {
        COMMAND_HEADER_LENGTH + self.payload.len() + 1
    }

    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.reserve(self.size());
        dst.put_slice(&self.header());
        dst.put_slice(&self.payload);
        dst.put_u8(self.checksum);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CommandFrame(device={:#04x}, command={:#04x}, aux={:#06x}, {} bytes)",
            self.device,
            self.command,
            self.aux(),
            self.payload.len()
        )
    }
}

/// First byte of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMarker {
    /// Command completed with `OK`.
    Complete,
    /// Command completed with an error status.
    Error,
    /// Frame could not be decoded; sent as a single byte.
    Nak,
}

impl ResponseMarker {
    pub fn as_byte(self) -> u8 {
        match self {
            ResponseMarker::Complete => RESPONSE_COMPLETE,
            ResponseMarker::Error => RESPONSE_ERROR,
            ResponseMarker::Nak => RESPONSE_NAK,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            RESPONSE_COMPLETE => Some(ResponseMarker::Complete),
            RESPONSE_ERROR => Some(ResponseMarker::Error),
            RESPONSE_NAK => Some(ResponseMarker::Nak),
            _ => None,
        }
    }
}

/// Response frame sent back to the host.
///
/// # Wire Format
/// ```text
/// [marker][status][len_lo][len_hi][payload...][checksum]
/// ```
///
/// A NAK is the single byte `N` with no header, payload or checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub marker: ResponseMarker,
    pub status: ErrorCode,
    pub payload: Bytes,
}

impl ResponseFrame {
    /// Response for an operation outcome. The marker follows the status.
    pub fn from_code(status: ErrorCode, payload: impl Into<Bytes>) -> Self {
        let marker = if status.is_ok() {
            ResponseMarker::Complete
        } else {
            ResponseMarker::Error
        };
        ResponseFrame {
            marker,
            status,
            payload: payload.into(),
        }
    }

    pub fn complete(payload: impl Into<Bytes>) -> Self {
        Self::from_code(ErrorCode::Ok, payload)
    }

    pub fn error(status: ErrorCode) -> Self {
        Self::from_code(status, Bytes::new())
    }

    pub fn nak() -> Self {
        ResponseFrame {
            marker: ResponseMarker::Nak,
            status: ErrorCode::Unknown,
            payload: Bytes::new(),
        }
    }

    pub fn is_nak(&self) -> bool {
        self.marker == ResponseMarker::Nak
    }

    /// Size of the frame on the wire.
    pub fn size(&self) -> usize {
        match self.marker {
            ResponseMarker::Nak => 1,
            _ => RESPONSE_HEADER_LENGTH + self.payload.len() + 1,
        }
    }

    fn header(&self) -> [u8; RESPONSE_HEADER_LENGTH] {
        let [len_lo, len_hi] = (self.payload.len() as u16).to_le_bytes();
        [self.marker.as_byte(), self.status.as_byte(), len_lo, len_hi]
    }

    pub fn expected_checksum(&self) -> u8 {
        let header = sio_checksum(&self.header());
        sio_checksum(&[header, sio_checksum(&self.payload)])
    }

    pub fn encode_into(&self, dst: &mut BytesMut) {
        if self.is_nak() {
            dst.put_u8(RESPONSE_NAK);
            return;
        }
        dst.reserve(self.size());
        dst.put_slice(&self.header());
        dst.put_slice(&self.payload);
        dst.put_u8(self.expected_checksum());
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

impl fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.marker {
            ResponseMarker::Nak => write!(f, "ResponseFrame(NAK)"),
            _ => write!(
                f,
                "ResponseFrame({}, {} bytes)",
                self.status,
                self.payload.len()
            ),
        }
    }
}
