//! Wire protocol constants and the 9-byte frame shared by commands and replies.
//!
//! Every exchange with the robot is a single fixed-size HID report:
//!
//! ```text
//! [0] reserved (report id, always 0)
//! [1] command code (ASCII)
//! [2..8] payload, zero-filled
//! [8] command id
//! ```
//!
//! Replies use the same 9-byte shape. Sensor bytes are read from the
//! beginning of the reply and the command id sits at index 8.

use std::fmt;
use std::time::Duration;

use crate::error::{FinchError, Result};

// ── Device identity ──

/// USB vendor id of the Finch robot.
pub const VENDOR_ID: u16 = 0x2354;

/// USB product id of the Finch robot.
pub const PRODUCT_ID: u16 = 0x1111;

// ── Frame layout ──

/// Length of every report, in both directions.
pub const FRAME_LEN: usize = 9;

/// Maximum number of payload bytes a command can carry.
pub const PAYLOAD_MAX: usize = 6;

const CODE_INDEX: usize = 1;
const PAYLOAD_START: usize = 2;
const ID_INDEX: usize = 8;

// ── Command codes ──

/// Stop motors and switch off the LED.
pub const CMD_HALT: u8 = b'X';
/// Set the beak LED: `[r, g, b]`.
pub const CMD_LED: u8 = b'O';
/// Drive wheels: `[dir_left, mag_left, dir_right, mag_right]`.
pub const CMD_WHEELS: u8 = b'M';
/// Sound the buzzer: `[ms_hi, ms_lo, hz_hi, hz_lo]`.
pub const CMD_BUZZER: u8 = b'B';
/// Read the temperature sensor.
pub const CMD_TEMPERATURE: u8 = b'T';
/// Read both light sensors.
pub const CMD_LIGHT: u8 = b'L';
/// Read both obstacle sensors.
pub const CMD_OBSTACLE: u8 = b'I';
/// Read the accelerometer.
pub const CMD_ACCELERATION: u8 = b'A';
/// No-op ping; the reply carries the device's command counter.
pub const CMD_PING: u8 = b'z';
/// Return to idle mode.
pub const CMD_RESET: u8 = b'R';

// ── Timing defaults ──

/// Idle time after which the keep-alive task pings the robot.
pub const PING_THRESHOLD: Duration = Duration::from_secs(2);

/// Keep-alive wake-up interval.
pub const KEEPALIVE_TICK: Duration = Duration::from_millis(100);

/// Timeout of a single HID read attempt.
pub const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Overall deadline for a matching reply to arrive.
pub const REPLY_DEADLINE: Duration = Duration::from_secs(1);

/// One fixed-size report, as written to or read from the robot.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Build an outbound command frame.
    ///
    /// Fails with `InvalidArgument` if the payload is longer than
    /// [`PAYLOAD_MAX`].
    pub fn command(code: u8, payload: &[u8], command_id: u8) -> Result<Self> {
        if payload.len() > PAYLOAD_MAX {
            return Err(FinchError::InvalidArgument(format!(
                "payload for '{}' is {} bytes, max {PAYLOAD_MAX}",
                code as char,
                payload.len()
            )));
        }
        let mut bytes = [0u8; FRAME_LEN];
        bytes[CODE_INDEX] = code;
        bytes[PAYLOAD_START..PAYLOAD_START + payload.len()].copy_from_slice(payload);
        bytes[ID_INDEX] = command_id;
        Ok(Frame(bytes))
    }

    /// Wrap raw report bytes.
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Frame(bytes)
    }

    /// Command code byte (index 1).
    pub fn code(&self) -> u8 {
        self.0[CODE_INDEX]
    }

    /// Payload bytes (indices 2..8).
    pub fn payload(&self) -> &[u8] {
        &self.0[PAYLOAD_START..ID_INDEX]
    }

    /// Command id byte (index 8).
    pub fn command_id(&self) -> u8 {
        self.0[ID_INDEX]
    }

    /// Byte at `index` of the raw report. Reply decoders read sensor data this way.
    pub fn byte(&self, index: usize) -> u8 {
        self.0[index]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b:02X}")?;
        }
        write!(f, "]")
    }
}

/// Whether a command code is a pure query (its reply is read back).
pub fn is_query(code: u8) -> bool {
    matches!(
        code,
        CMD_TEMPERATURE | CMD_LIGHT | CMD_OBSTACLE | CMD_ACCELERATION | CMD_PING
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_frame_layout() {
        let frame = Frame::command(CMD_LED, &[1, 2, 3], 7).unwrap();
        assert_eq!(frame.as_bytes(), &[0, b'O', 1, 2, 3, 0, 0, 0, 7]);
    }

    #[test]
    fn empty_payload_is_zero_filled() {
        let frame = Frame::command(CMD_PING, &[], 0xFF).unwrap();
        assert_eq!(frame.as_bytes(), &[0, b'z', 0, 0, 0, 0, 0, 0, 0xFF]);
    }

    #[test]
    fn full_payload_fits() {
        let frame = Frame::command(CMD_WHEELS, &[1, 2, 3, 4, 5, 6], 9).unwrap();
        assert_eq!(frame.payload(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.command_id(), 9);
    }

    #[test]
    fn oversized_payload_rejected() {
        let err = Frame::command(CMD_LED, &[0; 7], 0).unwrap_err();
        assert!(matches!(err, FinchError::InvalidArgument(_)));
    }

    #[test]
    fn accessors_read_fixed_offsets() {
        let frame = Frame::from_bytes([10, b'T', 2, 3, 4, 5, 6, 7, 42]);
        assert_eq!(frame.byte(0), 10);
        assert_eq!(frame.code(), b'T');
        assert_eq!(frame.command_id(), 42);
    }

    #[test]
    fn debug_is_hex() {
        let frame = Frame::from_bytes([0, 0x7A, 0, 0, 0, 0, 0, 0, 0x0F]);
        assert_eq!(format!("{frame:?}"), "Frame[00 7A 00 00 00 00 00 00 0F]");
    }

    #[test]
    fn query_classification() {
        for code in [CMD_TEMPERATURE, CMD_LIGHT, CMD_OBSTACLE, CMD_ACCELERATION, CMD_PING] {
            assert!(is_query(code), "{} should be a query", code as char);
        }
        for code in [CMD_HALT, CMD_LED, CMD_WHEELS, CMD_BUZZER, CMD_RESET] {
            assert!(!is_query(code), "{} should not be a query", code as char);
        }
    }
}
