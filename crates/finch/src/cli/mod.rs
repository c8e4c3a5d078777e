//! CLI subcommands: discovery, actuators, sensor readout.

mod buzz;
mod config_cmd;
mod devices;
mod halt;
mod led;
mod status;
mod watch;
mod wheels;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use finch_lib::codec::{Acceleration, Rgb};
pub(super) use finch_lib::config::Config;
pub(super) use finch_lib::error::Result;
pub(super) use finch_lib::transport::DevicePath;
use finch_lib::transport::native::HidApiTransport;
use finch_lib::{ConnectionRegistry, Finch, FinchError};

const PADDING: usize = 2;

/// Alignment width for key-value output: the longest key plus padding.
pub(super) fn kv_width(keys: &[&str]) -> usize {
    keys.iter().map(|k| k.len()).max().map_or(0, |m| m + PADDING)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {}", format_kv(key, value, w.saturating_sub(2)));
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let s = serde_json::to_string_pretty(value)
        .map_err(|e| FinchError::Config(format!("JSON serialization failed: {e}")))?;
    println!("{s}");
    Ok(())
}

/// Load config from `custom_path` or the default location, logging parse warnings.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    let (config, warnings) = match custom_path {
        Some(p) => Config::load_from(p),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("{w}");
    }
    config
}

/// Open the first free robot with the active configuration.
pub(super) fn open_finch(custom_path: Option<&Path>) -> Result<Finch> {
    let Some(path) = custom_path else {
        return Finch::open();
    };
    let config = load_config(Some(path)).try_connection_config()?;
    Finch::open_with(HidApiTransport::shared()?, ConnectionRegistry::global(), config)
}

/// Parse a `--duration`-style seconds value.
pub(super) fn seconds(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| FinchError::InvalidArgument(format!("duration {secs}s is not a valid time")))
}

/// Keep the process (and its connection) alive for `limit`, or until Ctrl+C
/// when `limit` is `None`. Returns `false` if interrupted.
pub(super) fn hold(limit: Option<Duration>) -> bool {
    const POLL: Duration = Duration::from_millis(50);
    let until = limit.map(|d| Instant::now() + d);
    while RUNNING.load(Ordering::SeqCst) {
        match until {
            Some(until) => {
                let now = Instant::now();
                if now >= until {
                    return true;
                }
                std::thread::sleep(POLL.min(until - now));
            }
            None => std::thread::sleep(POLL),
        }
    }
    false
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct DevicesOutput {
    pub count: usize,
    pub devices: Vec<DevicePath>,
}

#[derive(Serialize)]
pub(super) struct SensorsJson {
    pub temperature_c: f64,
    pub light: [f64; 2],
    pub obstacle: [bool; 2],
    pub acceleration: Acceleration,
}

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub path: Option<DevicePath>,
    pub command_id: u8,
    pub sensors: SensorsJson,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub errors: Vec<String>,
}

/// Read every sensor once.
pub(super) fn read_sensors(finch: &Finch) -> Result<SensorsJson> {
    let (left_light, right_light) = finch.light()?;
    let (left_obstacle, right_obstacle) = finch.obstacle()?;
    Ok(SensorsJson {
        temperature_c: finch.temperature()?,
        light: [left_light, right_light],
        obstacle: [left_obstacle, right_obstacle],
        acceleration: finch.acceleration()?,
    })
}

#[derive(Subcommand)]
pub enum Command {
    /// List attached Finch robots
    Devices,

    /// Connect and print every sensor once
    Status,

    /// Set the beak LED: `#RRGGBB` or three channel values
    ///
    /// The robot returns to idle when released, so the color is held until
    /// Ctrl+C or `--duration` elapses.
    Led {
        /// Either one `#RRGGBB` string or `R G B` (0-255 each)
        #[arg(required = true, num_args = 1..=3, value_name = "COLOR")]
        color: Vec<String>,
        /// Release after this many seconds
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Drive the wheels (-1.0 to 1.0, negative is backwards)
    Wheels {
        #[arg(allow_negative_numbers = true)]
        left: f64,
        #[arg(allow_negative_numbers = true)]
        right: f64,
        /// Stop after this many seconds (default: until Ctrl+C)
        #[arg(long, allow_negative_numbers = true)]
        duration: Option<f64>,
    },

    /// Sound the buzzer
    Buzz {
        /// Duration in seconds (max 65.535)
        seconds: f64,
        /// Frequency in Hz
        #[arg(default_value_t = 440)]
        frequency: u16,
    },

    /// Stop the wheels and switch the LED off
    Halt,

    /// Print sensor readings until Ctrl+C
    Watch {
        /// Milliseconds between readings
        #[arg(long, default_value_t = 500)]
        interval: u64,
    },

    /// Show current configuration and file path
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        Command::Devices => devices::cmd_devices(json),
        Command::Status => status::cmd_status(json, config_path),
        Command::Led { color, duration } => {
            if json {
                warn_json_unsupported("led");
            }
            led::cmd_led(&color, duration, config_path)
        }
        Command::Wheels {
            left,
            right,
            duration,
        } => {
            if json {
                warn_json_unsupported("wheels");
            }
            wheels::cmd_wheels(left, right, duration, config_path)
        }
        Command::Buzz { seconds, frequency } => {
            if json {
                warn_json_unsupported("buzz");
            }
            buzz::cmd_buzz(seconds, frequency, config_path)
        }
        Command::Halt => {
            if json {
                warn_json_unsupported("halt");
            }
            halt::cmd_halt(config_path)
        }
        Command::Watch { interval } => watch::cmd_watch(interval, json, config_path),
        Command::Config => config_cmd::cmd_config(json, config_path),
    }
}
