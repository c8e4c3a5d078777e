//! `halt` subcommand: stop the wheels and switch the LED off.

use std::path::Path;

use super::{Result, open_finch};

pub(super) fn cmd_halt(config_path: Option<&Path>) -> Result<()> {
    let mut finch = open_finch(config_path)?;
    finch.halt()?;
    println!("Halted.");
    finch.close();
    Ok(())
}
