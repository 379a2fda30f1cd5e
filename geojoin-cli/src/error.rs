//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use geojoin::config::ConfigFileError;
use geojoin::engine::PipelineError;
use geojoin::readiness::ReadinessError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// A required source has no file configured
    SourceNotConfigured { name: String, config_path: PathBuf },
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// The pipeline run failed
    Pipeline(PipelineError),
    /// Config file already exists and --force was not given
    ConfigExists(PathBuf),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::SourceNotConfigured { name, config_path } => {
                eprintln!();
                eprintln!("Add the source to the [sources] section of the config file:");
                eprintln!("  {}", config_path.display());
                eprintln!();
                eprintln!("  [sources]");
                eprintln!("  {} = /path/to/{}.geojson", name, name);
            }
            CliError::Pipeline(PipelineError::Readiness(ReadinessError::MissingSource {
                ..
            })) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. The source file does not exist or is not a GeoJSON FeatureCollection");
                eprintln!("  2. A definition expression in [expressions] does not parse");
                eprintln!("  3. Loading took longer than pipeline.readiness_timeout_secs");
                eprintln!("Run with --debug and check the log file for the load error.");
            }
            CliError::ConfigExists(_) => {
                eprintln!();
                eprintln!("Use --force to overwrite it with defaults.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::SourceNotConfigured { name, .. } => {
                write!(f, "No file configured for source '{}'", name)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Pipeline(e) if e.is_cancelled() => write!(f, "Run cancelled"),
            CliError::Pipeline(e) => write!(f, "Run failed: {}", e),
            CliError::ConfigExists(path) => {
                write!(f, "Config file already exists: {}", path.display())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_cancelled_pipeline_message() {
        let err = CliError::from(PipelineError::Cancelled);
        assert_eq!(err.to_string(), "Run cancelled");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_missing_source_message() {
        let err = CliError::SourceNotConfigured {
            name: "flood-hazard".to_string(),
            config_path: PathBuf::from("/tmp/config.ini"),
        };
        assert_eq!(err.to_string(), "No file configured for source 'flood-hazard'");
    }
}
