//! Per-robot API.
//!
//! A [`Finch`] owns one connection, opened on construction and closed once,
//! either explicitly through [`Finch::close`] or when the value is dropped.

use std::sync::Arc;
use std::time::Duration;

use crate::codec::commands::{
    self, QUERY_ACCELERATION, QUERY_LIGHT, QUERY_OBSTACLE, QUERY_TEMPERATURE,
};
use crate::codec::{Acceleration, Command, Rgb};
use crate::config::Config;
use crate::connection::{ConnectionConfig, FinchConnection};
use crate::error::Result;
use crate::registry::ConnectionRegistry;
use crate::transport::native::HidApiTransport;
use crate::transport::{DevicePath, HidTransport};

/// One Finch robot.
#[derive(Debug)]
pub struct Finch {
    connection: FinchConnection,
    closed: bool,
}

impl Finch {
    /// Open the first free robot on USB, using the saved configuration.
    pub fn open() -> Result<Self> {
        let config = Config::load().try_connection_config()?;
        Self::open_with(HidApiTransport::shared()?, ConnectionRegistry::global(), config)
    }

    /// Open the first free robot on `transport`, claiming it in `registry`.
    pub fn open_with(
        transport: Arc<dyn HidTransport>,
        registry: Arc<ConnectionRegistry>,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let connection = FinchConnection::new(transport, registry, config);
        connection.open()?;
        Ok(Self::from_connection(connection))
    }

    /// Wrap a connection that is already open.
    pub fn from_connection(connection: FinchConnection) -> Self {
        Finch {
            connection,
            closed: false,
        }
    }

    /// Reset the robot to idle and release it. Later calls do nothing.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.connection.close();
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed && self.connection.is_open()
    }

    pub fn path(&self) -> Option<DevicePath> {
        self.connection.path()
    }

    pub fn connection(&self) -> &FinchConnection {
        &self.connection
    }

    fn run(&self, command: Command) -> Result<()> {
        self.connection.send(command.code, &command.payload)
    }

    /// Stop both wheels and switch the LED off.
    pub fn halt(&self) -> Result<()> {
        self.run(commands::halt())
    }

    pub fn set_led(&self, color: impl Into<Rgb>) -> Result<()> {
        self.run(commands::led(color.into()))
    }

    /// Set the LED from a `#RRGGBB` string.
    pub fn set_led_hex(&self, hex: &str) -> Result<()> {
        self.set_led(hex.parse::<Rgb>()?)
    }

    /// Wheel speeds in `[-1.0, 1.0]`, negative is backwards. The robot
    /// keeps driving until told otherwise.
    pub fn set_wheels(&self, left: f64, right: f64) -> Result<()> {
        self.run(commands::wheels(left, right)?)
    }

    /// Sound the buzzer. Returns immediately; the robot times the tone.
    pub fn buzz(&self, duration: Duration, frequency_hz: u16) -> Result<()> {
        self.buzz_secs(duration.as_secs_f64(), frequency_hz)
    }

    pub fn buzz_secs(&self, seconds: f64, frequency_hz: u16) -> Result<()> {
        self.run(commands::buzzer(seconds, frequency_hz)?)
    }

    /// Temperature in °C.
    pub fn temperature(&self) -> Result<f64> {
        let reply = self.connection.request(QUERY_TEMPERATURE)?;
        Ok(commands::decode_temperature(&reply))
    }

    /// Left and right light levels, 0.0 (dark) to 1.0.
    pub fn light(&self) -> Result<(f64, f64)> {
        let reply = self.connection.request(QUERY_LIGHT)?;
        Ok(commands::decode_light(&reply))
    }

    /// Left and right obstacle sensors.
    pub fn obstacle(&self) -> Result<(bool, bool)> {
        let reply = self.connection.request(QUERY_OBSTACLE)?;
        Ok(commands::decode_obstacle(&reply))
    }

    pub fn acceleration(&self) -> Result<Acceleration> {
        let reply = self.connection.request(QUERY_ACCELERATION)?;
        Ok(commands::decode_acceleration(&reply))
    }
}

impl Drop for Finch {
    fn drop(&mut self) {
        self.close();
    }
}
