//! `watch` subcommand: print sensor readings until Ctrl+C.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{RUNNING, Result, SensorsJson, hold, open_finch, read_sensors};

fn format_line(s: &SensorsJson) -> String {
    let a = &s.acceleration;
    format!(
        "temp {:5.1}°C  light {:.2}/{:.2}  obstacle {}/{}  accel {:+.2} {:+.2} {:+.2}{}{}",
        s.temperature_c,
        s.light[0],
        s.light[1],
        u8::from(s.obstacle[0]),
        u8::from(s.obstacle[1]),
        a.x,
        a.y,
        a.z,
        if a.tap { "  tap" } else { "" },
        if a.shake { "  shake" } else { "" },
    )
}

pub(super) fn cmd_watch(interval_ms: u64, json: bool, config_path: Option<&Path>) -> Result<()> {
    let interval = Duration::from_millis(interval_ms.max(1));
    let mut finch = open_finch(config_path)?;
    if let Some(path) = finch.path() {
        eprintln!("[device] {path} (Ctrl+C to stop)");
    }

    let mut result = Ok(());
    while RUNNING.load(Ordering::SeqCst) {
        let sensors = match read_sensors(&finch) {
            Ok(s) => s,
            Err(e) => {
                result = Err(e);
                break;
            }
        };
        if json {
            // One object per line.
            match serde_json::to_string(&sensors) {
                Ok(line) => println!("{line}"),
                Err(e) => log::warn!("JSON serialization failed: {e}"),
            }
        } else {
            println!("{}", format_line(&sensors));
        }
        hold(Some(interval));
    }
    finch.close();
    result
}
