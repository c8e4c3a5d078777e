//! Command encoders and reply decoders.

use serde::Serialize;

use super::color::Rgb;
use crate::error::{FinchError, Result};
use crate::protocol::{
    CMD_ACCELERATION, CMD_BUZZER, CMD_HALT, CMD_LED, CMD_LIGHT, CMD_OBSTACLE, CMD_PING, CMD_RESET,
    CMD_TEMPERATURE, CMD_WHEELS, Frame,
};

/// A command code and its payload, ready for [`crate::FinchConnection::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub code: u8,
    pub payload: Vec<u8>,
}

impl Command {
    fn new(code: u8, payload: &[u8]) -> Self {
        Command {
            code,
            payload: payload.to_vec(),
        }
    }
}

/// Longest buzz the 16-bit millisecond field can carry.
pub const BUZZ_MAX_SECS: f64 = 65.535;

// ── Encoders ──

pub fn halt() -> Command {
    Command::new(CMD_HALT, &[0])
}

pub fn reset() -> Command {
    Command::new(CMD_RESET, &[0])
}

pub fn led(color: Rgb) -> Command {
    Command::new(CMD_LED, &color.channels())
}

/// Wheel speeds in `[-1.0, 1.0]`; negative drives backwards.
pub fn wheels(left: f64, right: f64) -> Result<Command> {
    let (dir_left, mag_left) = wheel("left", left)?;
    let (dir_right, mag_right) = wheel("right", right)?;
    Ok(Command::new(
        CMD_WHEELS,
        &[dir_left, mag_left, dir_right, mag_right],
    ))
}

/// Direction byte (1 = backwards) and magnitude `round(|v| * 255)`, half
/// away from zero, clamped to 255.
fn wheel(side: &str, speed: f64) -> Result<(u8, u8)> {
    if !speed.is_finite() {
        return Err(FinchError::InvalidArgument(format!(
            "{side} wheel speed {speed} is not a number"
        )));
    }
    let direction = u8::from(speed < 0.0);
    let magnitude = (speed.abs() * 255.0).round().min(255.0) as u8;
    Ok((direction, magnitude))
}

/// Buzz for `seconds` (rounded to the millisecond) at `frequency_hz`.
/// Both are sent big-endian.
pub fn buzzer(seconds: f64, frequency_hz: u16) -> Result<Command> {
    if !seconds.is_finite() || !(0.0..=BUZZ_MAX_SECS).contains(&seconds) {
        return Err(FinchError::InvalidArgument(format!(
            "buzz duration {seconds}s outside 0..={BUZZ_MAX_SECS}s"
        )));
    }
    let millis = (seconds * 1000.0).round() as u16;
    let [ms_hi, ms_lo] = millis.to_be_bytes();
    let [hz_hi, hz_lo] = frequency_hz.to_be_bytes();
    Ok(Command::new(CMD_BUZZER, &[ms_hi, ms_lo, hz_hi, hz_lo]))
}

/// Query codes with their reply decoders.
pub const QUERY_TEMPERATURE: u8 = CMD_TEMPERATURE;
pub const QUERY_LIGHT: u8 = CMD_LIGHT;
pub const QUERY_OBSTACLE: u8 = CMD_OBSTACLE;
pub const QUERY_ACCELERATION: u8 = CMD_ACCELERATION;
pub const QUERY_COMMAND_ID: u8 = CMD_PING;

// ── Decoders ──

/// Degrees Celsius.
pub fn decode_temperature(reply: &Frame) -> f64 {
    (f64::from(reply.byte(0)) - 127.0) / 2.4 + 25.0
}

/// Left and right light levels in `[0, 1]`.
pub fn decode_light(reply: &Frame) -> (f64, f64) {
    (
        f64::from(reply.byte(0)) / 255.0,
        f64::from(reply.byte(1)) / 255.0,
    )
}

/// Left and right obstacle flags.
pub fn decode_obstacle(reply: &Frame) -> (bool, bool) {
    (reply.byte(0) != 0, reply.byte(1) != 0)
}

/// The robot's command counter, carried in the first data byte of the
/// ping reply.
pub fn decode_command_id(reply: &Frame) -> u8 {
    reply.byte(0)
}

/// Accelerometer reading in g, with tap and shake flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub tap: bool,
    pub shake: bool,
}

const TAP_BIT: u8 = 0x20;
const SHAKE_BIT: u8 = 0x80;

pub fn decode_acceleration(reply: &Frame) -> Acceleration {
    let status = reply.byte(4);
    Acceleration {
        x: axis(reply.byte(1)),
        y: axis(reply.byte(2)),
        z: axis(reply.byte(3)),
        tap: status & TAP_BIT != 0,
        shake: status & SHAKE_BIT != 0,
    }
}

/// 6-bit two's complement, 32 counts per 1.6 g. Raw 32 yields -1.6 g.
fn axis(raw: u8) -> f64 {
    let raw = i16::from(raw);
    let signed = if raw > 31 { raw - 64 } else { raw };
    f64::from(signed) * 1.6 / 32.0
}
