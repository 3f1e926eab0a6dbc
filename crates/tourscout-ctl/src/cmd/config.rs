//! Config file bootstrap and display.

use anyhow::{Context, Result};

use tourscout_core::config::TourscoutConfig;

/// Write the default config if none exists, then show the effective values.
pub fn cmd_config(config: &TourscoutConfig) -> Result<()> {
    let path = TourscoutConfig::write_default_if_missing()
        .context("failed to write default config")?;
    let rendered = toml::to_string_pretty(config).context("failed to render config")?;

    println!("═══════════════════════════════════════");
    println!("  Tourscout Configuration");
    println!("═══════════════════════════════════════");
    println!("  File : {}", path.display());
    println!();
    for line in rendered.lines() {
        println!("  {}", line);
    }

    Ok(())
}
