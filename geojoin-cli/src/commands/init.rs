//! Init command - write a default configuration file.

use std::path::PathBuf;

use geojoin::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Arguments for the init command.
pub struct InitArgs {
    pub config: Option<PathBuf>,
    pub force: bool,
}

/// Run the init command.
pub fn run(args: InitArgs) -> Result<(), CliError> {
    let path = args.config.unwrap_or_else(config_file_path);
    if path.exists() && !args.force {
        return Err(CliError::ConfigExists(path));
    }

    ConfigFile::default().save_to(&path)?;

    println!("Wrote default configuration to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Point the [sources] section at your GeoJSON files");
    println!("  2. Run 'geojoin run --output zones.geojson'");
    Ok(())
}
