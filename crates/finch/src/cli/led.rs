//! `led` subcommand: set the beak LED.

use std::path::Path;

use finch_lib::FinchError;

use super::{Result, Rgb, hold, open_finch, seconds};

/// `#RRGGBB` or three decimal channels.
fn parse_color_args(args: &[String]) -> Result<Rgb> {
    match args {
        [hex] => hex.parse(),
        channels => {
            let values = channels
                .iter()
                .map(|c| {
                    c.trim().parse::<i64>().map_err(|_| {
                        FinchError::InvalidArgument(format!("LED channel {c:?} is not a number"))
                    })
                })
                .collect::<Result<Vec<i64>>>()?;
            Rgb::from_channels(&values)
        }
    }
}

pub(super) fn cmd_led(
    args: &[String],
    duration: Option<f64>,
    config_path: Option<&Path>,
) -> Result<()> {
    // Parse before touching the robot.
    let color = parse_color_args(args)?;
    let limit = duration.map(seconds).transpose()?;

    let mut finch = open_finch(config_path)?;
    finch.set_led(color)?;
    match limit {
        Some(d) => println!("LED set to {color} for {:.1}s", d.as_secs_f64()),
        None => println!("LED set to {color} (Ctrl+C to release)"),
    }
    hold(limit);
    finch.close();
    Ok(())
}
