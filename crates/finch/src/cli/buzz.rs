//! `buzz` subcommand.

use std::path::Path;

use super::{Result, hold, open_finch, seconds};

pub(super) fn cmd_buzz(secs: f64, frequency: u16, config_path: Option<&Path>) -> Result<()> {
    let tone = seconds(secs)?;
    let mut finch = open_finch(config_path)?;
    finch.buzz_secs(secs, frequency)?;
    println!("Buzzing {frequency} Hz for {secs}s");
    // Releasing the robot resets it, which would cut the tone short.
    hold(Some(tone));
    finch.close();
    Ok(())
}
