//! `devices` subcommand: list attached Finch robots.

use finch_lib::protocol::{PRODUCT_ID, VENDOR_ID};
use finch_lib::transport::list_paths;
use finch_lib::transport::native::HidApiTransport;

use super::{DevicesOutput, Result, print_json};

pub(super) fn cmd_devices(json: bool) -> Result<()> {
    let transport = HidApiTransport::shared()?;
    let devices = list_paths(transport.as_ref(), VENDOR_ID, PRODUCT_ID)?;

    if json {
        return print_json(&DevicesOutput {
            count: devices.len(),
            devices,
        });
    }

    if devices.is_empty() {
        println!("No Finch robots found.");
        return Ok(());
    }

    println!(
        "Found {} Finch robot{}:",
        devices.len(),
        if devices.len() == 1 { "" } else { "s" }
    );
    println!();

    for (i, path) in devices.iter().enumerate() {
        println!("  [{}] {path}", i + 1);
    }

    Ok(())
}
