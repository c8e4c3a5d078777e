//! `status` subcommand: connect and print every sensor once.

use std::path::Path;

use super::{Result, StatusOutput, kv, kv_indent, kv_width, open_finch, print_json, read_sensors};

pub(super) fn cmd_status(json: bool, config_path: Option<&Path>) -> Result<()> {
    let mut finch = open_finch(config_path)?;
    let sensors = read_sensors(&finch)?;
    let output = StatusOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: finch.path(),
        command_id: finch.connection().command_id(),
        sensors,
    };
    finch.close();

    if json {
        return print_json(&output);
    }

    let w = kv_width(&[
        "Version:",
        "Path:",
        "Command id:",
        "Temperature:",
        "Light:",
        "Obstacle:",
        "Acceleration:",
        "Tap/shake:",
    ]);
    kv("Version:", &output.version, w);
    match &output.path {
        Some(path) => kv("Path:", path, w),
        None => kv("Path:", "(closed)", w),
    }
    kv("Command id:", output.command_id, w);
    println!();

    let s = &output.sensors;
    println!("Sensors:");
    kv_indent("Temperature:", format_args!("{:.1} °C", s.temperature_c), w);
    kv_indent(
        "Light:",
        format_args!("left {:.2}, right {:.2}", s.light[0], s.light[1]),
        w,
    );
    kv_indent(
        "Obstacle:",
        format_args!("left {}, right {}", s.obstacle[0], s.obstacle[1]),
        w,
    );
    let a = &s.acceleration;
    kv_indent(
        "Acceleration:",
        format_args!("x {:+.2} g, y {:+.2} g, z {:+.2} g", a.x, a.y, a.z),
        w,
    );
    kv_indent("Tap/shake:", format_args!("{}/{}", a.tap, a.shake), w);
    Ok(())
}
