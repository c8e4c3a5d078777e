//! `config` subcommand: show current configuration and file path.

use std::path::Path;

use super::{Config, ConfigOutput, Result, kv, kv_indent, kv_width, load_config, print_json};

pub(super) fn cmd_config(json: bool, custom_path: Option<&Path>) -> Result<()> {
    let config = load_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let errors: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        return print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            errors,
        });
    }

    let w = kv_width(&[
        "Config file:",
        "ping_threshold_ms:",
        "keepalive_tick_ms:",
        "read_timeout_ms:",
        "reply_deadline_ms:",
        "write_attempts:",
        "write_backoff_ms:",
        "write_backoff_max_ms:",
        "close_on_keepalive_failure:",
    ]);

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("ping_threshold_ms:", config.ping_threshold_ms, w);
    kv_indent("keepalive_tick_ms:", config.keepalive_tick_ms, w);
    kv_indent("read_timeout_ms:", config.read_timeout_ms, w);
    kv_indent("reply_deadline_ms:", config.reply_deadline_ms, w);
    kv_indent("write_attempts:", config.write_attempts, w);
    kv_indent("write_backoff_ms:", config.write_backoff_ms, w);
    kv_indent("write_backoff_max_ms:", config.write_backoff_max_ms, w);
    kv_indent(
        "close_on_keepalive_failure:",
        config.close_on_keepalive_failure,
        w,
    );

    if !errors.is_empty() {
        println!();
        println!("Problems:");
        for e in &errors {
            println!("  {e}");
        }
    }
    Ok(())
}
