//! Init-config command handler

use std::path::Path;

use crate::config::Config;

pub fn cmd_init_config(path: &Path) -> anyhow::Result<()> {
    if Config::create_default_if_missing(path)? {
        println!("Wrote default config to {}", path.display());
        println!("Edit [security] and [server] before exposing the service.");
    } else {
        println!("Config already exists at {}, leaving it untouched", path.display());
    }
    Ok(())
}
