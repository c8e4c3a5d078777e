//! `wheels` subcommand: drive until a deadline or Ctrl+C, then halt.

use std::path::Path;

use super::{Result, hold, open_finch, seconds};

pub(super) fn cmd_wheels(
    left: f64,
    right: f64,
    duration: Option<f64>,
    config_path: Option<&Path>,
) -> Result<()> {
    let limit = duration.map(seconds).transpose()?;

    let mut finch = open_finch(config_path)?;
    finch.set_wheels(left, right)?;
    match limit {
        Some(d) => println!(
            "Driving left {left:+.2}, right {right:+.2} for {:.1}s (Ctrl+C to stop early)",
            d.as_secs_f64()
        ),
        None => println!("Driving left {left:+.2}, right {right:+.2} (Ctrl+C to stop)"),
    }
    if !hold(limit) {
        log::debug!("interrupted");
    }
    finch.halt()?;
    finch.close();
    Ok(())
}
