//! Check command implementation.
//!
//! Validates a config file: batch-level schema plus every transform
//! expression, so typos are caught before they cost a data point.

use crate::config::load_config;
use std::path::Path;

use super::file_label;

/// Validates a config file and reports the result. Returns an error (and a
/// non-zero exit) when the config would abort a collection run.
pub fn command_check(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 rrdsense - Config Check");
    println!("==========================");

    let file = file_label(config_path);
    let cfg = load_config(config_path)?;

    match cfg.validate_strict(&file) {
        Ok(()) => {
            println!(
                "   ✅ {}: {} sensors, rrd_path {}",
                file,
                cfg.sensors.len(),
                cfg.rrd_path.as_deref().unwrap_or("-")
            );
            if cfg.rrd.is_none() {
                println!("   ⚠️  no rrd section; init will fail for this config");
            }
            if !cfg.enabled {
                println!("   ⚠️  config is disabled and will be skipped");
            }
            Ok(())
        }
        Err(e) => {
            println!("   ❌ {}", e);
            Err(e.into())
        }
    }
}
