//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::publish::Rgba;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Which sources are joined and how the join runs
    pub pipeline: PipelineSettings,
    /// Identity key used for deduplication
    pub identity: IdentitySettings,
    /// Published layer presentation
    pub publish: PublishSettings,
    /// Source name → GeoJSON file
    pub sources: BTreeMap<String, PathBuf>,
    /// Source name → definition expression
    pub expressions: BTreeMap<String, String>,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Join configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Source whose features drive the join
    pub probe: String,
    /// Source queried for each probe feature
    pub target: String,
    /// Concurrent queries per batch (clamped to 1..=100)
    pub batch_size: usize,
    /// Seconds to wait for sources; 0 waits indefinitely
    pub readiness_timeout_secs: u64,
}

/// Deduplication identity.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentitySettings {
    /// Attribute holding the identity value
    pub field: String,
    /// Qualify keys with the target source name
    pub namespaced: bool,
}

/// Published layer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishSettings {
    pub layer_id: String,
    pub title: String,
    /// Popup title template, `{FIELD}` placeholders
    pub popup_title: String,
    /// Popup content template, `{FIELD}` placeholders
    pub popup_content: String,
    pub fill_color: Rgba,
    pub outline_color: Rgba,
    pub outline_width: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
