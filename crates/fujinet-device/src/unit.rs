//! Per-unit state.
//!
//! A [`Unit`] is one of the eight network endpoints the host can address. It
//! moves through three states:
//!
//! - `Idle`: no connection (initial state)
//! - `Connected`: opened, ready for transfers
//! - `Busy`: a transfer is in flight
//!
//! # Valid Transitions
//!
//! - Idle → Connected (open)
//! - Connected → Busy → Connected (transfer)
//! - any → Idle (close, or a transfer that finds the host offline)
//!
//! # Examples
//!
//! ```
//! use fujinet_core::{ErrorCode, UnitNumber};
//! use fujinet_device::{Unit, UnitState};
//!
//! let mut unit = Unit::new(UnitNumber::new(1).unwrap());
//! assert_eq!(unit.state(), UnitState::Idle);
//! assert!(unit.transition_to(UnitState::Busy).is_err());
//! ```

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use fujinet_core::{ChannelMode, ErrorCode, HeaderLine, OpenMode, TransactionFlag, UnitNumber};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    #[default]
    Idle,
    Connected,
    Busy,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitState::Idle => "Idle",
            UnitState::Connected => "Connected",
            UnitState::Busy => "Busy",
        };
        write!(f, "{name}")
    }
}

impl UnitState {
    /// Check if the lifecycle allows moving from this state to `target`.
    ///
    /// ```
    /// use fujinet_device::UnitState;
    ///
    /// assert!(UnitState::Idle.can_transition_to(&UnitState::Connected));
    /// assert!(UnitState::Busy.can_transition_to(&UnitState::Idle));
    /// assert!(!UnitState::Idle.can_transition_to(&UnitState::Busy));
    /// ```
    pub fn can_transition_to(&self, target: &UnitState) -> bool {
        matches!(
            (self, target),
            (UnitState::Idle, UnitState::Connected)
                | (UnitState::Connected, UnitState::Busy)
                | (UnitState::Busy, UnitState::Connected)
                | (_, UnitState::Idle)
        )
    }
}

/// Request headers staged by the host.
///
/// Lines are collected between `start` and `end`. Once the bracket is closed
/// they are sent with the next transfer only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBuffer {
    collecting: bool,
    pending: Vec<HeaderLine>,
    ready: Vec<HeaderLine>,
}

impl HeaderBuffer {
    /// Open a bracket, discarding any lines from an unfinished one.
    pub fn start(&mut self) {
        self.collecting = true;
        self.pending.clear();
    }

    /// Add a line to the open bracket.
    ///
    /// # Errors
    /// Returns `BadCommand` when no bracket is open.
    pub fn add(&mut self, line: HeaderLine) -> Result<(), ErrorCode> {
        if !self.collecting {
            return Err(ErrorCode::BadCommand);
        }
        self.pending.push(line);
        Ok(())
    }

    /// Close the bracket and stage its lines for the next transfer.
    ///
    /// # Errors
    /// Returns `BadCommand` when no bracket is open.
    pub fn end(&mut self) -> Result<(), ErrorCode> {
        if !self.collecting {
            return Err(ErrorCode::BadCommand);
        }
        self.collecting = false;
        self.ready.append(&mut self.pending);
        Ok(())
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Staged lines, not yet sent.
    pub fn staged(&self) -> &[HeaderLine] {
        &self.ready
    }

    /// Remove and return the staged lines.
    pub fn take(&mut self) -> Vec<HeaderLine> {
        std::mem::take(&mut self.ready)
    }
}

/// State of an opened unit.
#[derive(Debug, Clone)]
pub struct Connection {
    /// URL given to OPEN.
    pub url: String,
    pub mode: OpenMode,
    pub flag: TransactionFlag,
    pub channel_mode: ChannelMode,
    pub headers: HeaderBuffer,
    /// Body of the most recent response.
    pub response: Bytes,
    pub opened_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(url: impl Into<String>, mode: OpenMode, flag: TransactionFlag) -> Self {
        Self {
            url: url.into(),
            mode,
            flag,
            channel_mode: ChannelMode::default(),
            headers: HeaderBuffer::default(),
            response: Bytes::new(),
            opened_at: Utc::now(),
        }
    }
}

/// One addressable network endpoint.
#[derive(Debug)]
pub struct Unit {
    number: UnitNumber,
    state: UnitState,
    last_error: ErrorCode,
    bytes_available: usize,
    http_status: Option<u16>,
    connection: Option<Connection>,
}

impl Unit {
    pub fn new(number: UnitNumber) -> Self {
        Self {
            number,
            state: UnitState::Idle,
            last_error: ErrorCode::Ok,
            bytes_available: 0,
            http_status: None,
            connection: None,
        }
    }

    pub fn number(&self) -> UnitNumber {
        self.number
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    pub fn set_last_error(&mut self, code: ErrorCode) {
        self.last_error = code;
    }

    pub fn bytes_available(&self) -> usize {
        self.bytes_available
    }

    pub fn set_bytes_available(&mut self, bytes: usize) {
        self.bytes_available = bytes;
    }

    /// Status code of the last HTTP response received.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn set_http_status(&mut self, status: u16) {
        self.http_status = Some(status);
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// The open connection.
    ///
    /// # Errors
    /// Returns `Offline` when the unit has none.
    pub fn connection_mut(&mut self) -> Result<&mut Connection, ErrorCode> {
        self.connection.as_mut().ok_or(ErrorCode::Offline)
    }

    /// Move to `target`, enforcing the lifecycle.
    ///
    /// # Errors
    /// Returns `BadCommand` for a transition the lifecycle does not allow.
    pub fn transition_to(&mut self, target: UnitState) -> Result<(), ErrorCode> {
        if !self.state.can_transition_to(&target) {
            return Err(ErrorCode::BadCommand);
        }
        if self.state != target {
            debug!(unit = %self.number, from = %self.state, to = %target, "Unit state transition");
        }
        self.state = target;
        Ok(())
    }

    /// Install a connection and move to `Connected`.
    ///
    /// # Errors
    /// Returns `BadCommand` unless the unit is idle.
    pub fn connect(&mut self, connection: Connection) -> Result<(), ErrorCode> {
        self.transition_to(UnitState::Connected)?;
        self.connection = Some(connection);
        self.bytes_available = 0;
        self.http_status = None;
        Ok(())
    }

    /// Drop any connection and return to `Idle`.
    ///
    /// `last_error` is left for the caller to set.
    pub fn reset(&mut self) {
        if self.connection.take().is_some() {
            debug!(unit = %self.number, "Connection released");
        }
        self.state = UnitState::Idle;
        self.bytes_available = 0;
    }

    /// Store the outcome of an operation as the unit's current error code.
    pub fn record<T>(&mut self, result: Result<T, ErrorCode>) -> Result<T, ErrorCode> {
        self.last_error = match &result {
            Ok(_) => ErrorCode::Ok,
            Err(code) => *code,
        };
        result
    }

    /// Snapshot for STATUS.
    pub fn status(&self) -> UnitStatus {
        UnitStatus {
            unit: self.number,
            state: self.state,
            last_error: self.last_error,
            bytes_available: self.bytes_available,
            http_status: self.http_status,
            connected: self.connection.is_some(),
            opened_at: self.connection.as_ref().map(|c| c.opened_at),
        }
    }
}

/// Point-in-time view of a unit, as reported by STATUS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub unit: UnitNumber,
    pub state: UnitState,
    pub last_error: ErrorCode,
    pub bytes_available: usize,
    pub http_status: Option<u16>,
    pub connected: bool,
    /// When the current connection was opened.
    pub opened_at: Option<DateTime<Utc>>,
}

impl UnitStatus {
    /// Snapshot for a unit whose state is held by an operation in flight.
    pub fn busy(unit: UnitNumber) -> Self {
        Self {
            unit,
            state: UnitState::Busy,
            last_error: ErrorCode::Ok,
            bytes_available: 0,
            http_status: None,
            connected: true,
            opened_at: None,
        }
    }

    /// Four-byte wire form: `[bytes_lo, bytes_hi, connected, error]`.
    ///
    /// Byte counts above `u16::MAX` saturate.
    pub fn to_bytes(&self) -> [u8; 4] {
        let bytes = u16::try_from(self.bytes_available).unwrap_or(u16::MAX);
        let [lo, hi] = bytes.to_le_bytes();
        [lo, hi, u8::from(self.connected), self.last_error.as_byte()]
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} error={} bytes={}",
            self.unit, self.state, self.last_error, self.bytes_available
        )?;
        if let Some(status) = self.http_status {
            write!(f, " http={status}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn unit() -> Unit {
        Unit::new(UnitNumber::new(1).unwrap())
    }

    fn header(line: &str) -> HeaderLine {
        HeaderLine::parse(line).unwrap()
    }

    #[rstest]
    #[case(UnitState::Idle, UnitState::Connected, true)]
    #[case(UnitState::Connected, UnitState::Busy, true)]
    #[case(UnitState::Busy, UnitState::Connected, true)]
    #[case(UnitState::Busy, UnitState::Idle, true)]
    #[case(UnitState::Idle, UnitState::Idle, true)]
    #[case(UnitState::Idle, UnitState::Busy, false)]
    #[case(UnitState::Connected, UnitState::Connected, false)]
    fn test_transitions(#[case] from: UnitState, #[case] to: UnitState, #[case] valid: bool) {
        assert_eq!(from.can_transition_to(&to), valid);
    }

    #[test]
    fn test_connect_and_reset() {
        let mut unit = unit();
        unit.connect(Connection::new("http://x/", OpenMode::Get, TransactionFlag::NONE))
            .unwrap();
        assert_eq!(unit.state(), UnitState::Connected);
        assert!(unit.connection().is_some());

        assert_eq!(
            unit.connect(Connection::new("http://y/", OpenMode::Get, TransactionFlag::NONE)),
            Err(ErrorCode::BadCommand)
        );
        assert_eq!(unit.connection().unwrap().url, "http://x/");

        let opened_at = unit.connection().unwrap().opened_at;
        assert_eq!(unit.status().opened_at, Some(opened_at));

        unit.set_bytes_available(12);
        unit.reset();
        assert_eq!(unit.status().opened_at, None);
        assert_eq!(unit.state(), UnitState::Idle);
        assert!(unit.connection().is_none());
        assert_eq!(unit.bytes_available(), 0);
    }

    #[test]
    fn test_record_replaces_last_error() {
        let mut unit = unit();
        assert_eq!(unit.record::<()>(Err(ErrorCode::Offline)), Err(ErrorCode::Offline));
        assert_eq!(unit.last_error(), ErrorCode::Offline);
        assert_eq!(unit.record(Ok(5)), Ok(5));
        assert_eq!(unit.last_error(), ErrorCode::Ok);
    }

    #[test]
    fn test_header_bracket() {
        let mut headers = HeaderBuffer::default();
        assert_eq!(headers.add(header("A: 1")), Err(ErrorCode::BadCommand));
        assert_eq!(headers.end(), Err(ErrorCode::BadCommand));

        assert!(!headers.is_collecting());
        headers.start();
        assert!(headers.is_collecting());
        headers.add(header("A: 1")).unwrap();
        assert!(headers.staged().is_empty());
        headers.end().unwrap();
        assert!(!headers.is_collecting());
        assert_eq!(headers.staged().len(), 1);

        assert_eq!(headers.take(), vec![header("A: 1")]);
        assert!(headers.take().is_empty());
    }

    #[test]
    fn test_restart_discards_unfinished_bracket() {
        let mut headers = HeaderBuffer::default();
        headers.start();
        headers.add(header("A: 1")).unwrap();
        headers.start();
        headers.add(header("B: 2")).unwrap();
        headers.end().unwrap();
        assert_eq!(headers.staged(), &[header("B: 2")]);
    }

    #[rstest]
    #[case(0, false, ErrorCode::Ok, [0, 0, 0, 0])]
    #[case(97, true, ErrorCode::Ok, [97, 0, 1, 0])]
    #[case(0x1234, true, ErrorCode::IoError, [0x34, 0x12, 1, 1])]
    #[case(100_000, true, ErrorCode::Ok, [0xFF, 0xFF, 1, 0])]
    fn test_status_bytes(
        #[case] bytes_available: usize,
        #[case] connected: bool,
        #[case] last_error: ErrorCode,
        #[case] expected: [u8; 4],
    ) {
        let status = UnitStatus {
            unit: UnitNumber::new(1).unwrap(),
            state: UnitState::Connected,
            last_error,
            bytes_available,
            http_status: None,
            connected,
            opened_at: None,
        };
        assert_eq!(status.to_bytes(), expected);
    }
}
