//! Beak LED colors.
//!
//! The robot takes one byte per channel. Colors come in as channel triples,
//! as dynamically-sized channel lists (scripting front ends), or as
//! `#RRGGBB` strings.

use std::fmt;
use std::str::FromStr;

use crate::error::FinchError;

/// An RGB triple, one byte per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Build from an untyped channel list. Exactly three values, each 0..=255.
    pub fn from_channels(channels: &[i64]) -> crate::error::Result<Self> {
        let [r, g, b] = channels else {
            return Err(FinchError::InvalidArgument(format!(
                "LED needs 3 channels, got {}",
                channels.len()
            )));
        };
        let channel = |name: &str, v: i64| {
            u8::try_from(v).map_err(|_| {
                FinchError::InvalidArgument(format!("LED {name} channel {v} outside 0..=255"))
            })
        };
        Ok(Rgb::new(channel("red", *r)?, channel("green", *g)?, channel("blue", *b)?))
    }

    /// Wire payload for the LED command.
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Format as `#RRGGBB`.
    pub fn format_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb::new(r, g, b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb::new(r, g, b)
    }
}

/// Parses `#RRGGBB` (either case, surrounding whitespace ignored).
impl FromStr for Rgb {
    type Err = FinchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || FinchError::InvalidArgument(format!("invalid color: {s} (use #RRGGBB)"));
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_hex())
    }
}
