//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use std::collections::BTreeMap;

use super::settings::*;
use crate::join::DEFAULT_BATCH_SIZE;
use crate::publish::{
    DEFAULT_FILL, DEFAULT_LAYER_ID, DEFAULT_LAYER_TITLE, DEFAULT_OUTLINE, DEFAULT_OUTLINE_WIDTH,
    DEFAULT_POPUP_CONTENT, DEFAULT_POPUP_TITLE,
};

// =============================================================================
// Pipeline defaults
// =============================================================================

/// Default probe source.
pub const DEFAULT_PROBE_SOURCE: &str = "coastal-buffer";

/// Default target source.
pub const DEFAULT_TARGET_SOURCE: &str = "flood-hazard";

/// Default readiness timeout in seconds.
pub const DEFAULT_READINESS_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Identity defaults
// =============================================================================

/// Default identity attribute.
pub const DEFAULT_IDENTITY_FIELD: &str = "OBJECTID";

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log file name inside `<config dir>/logs`.
pub const DEFAULT_LOG_FILE_NAME: &str = "geojoin.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            pipeline: PipelineSettings {
                probe: DEFAULT_PROBE_SOURCE.to_string(),
                target: DEFAULT_TARGET_SOURCE.to_string(),
                batch_size: DEFAULT_BATCH_SIZE,
                readiness_timeout_secs: DEFAULT_READINESS_TIMEOUT_SECS,
            },
            identity: IdentitySettings {
                field: DEFAULT_IDENTITY_FIELD.to_string(),
                namespaced: false,
            },
            publish: PublishSettings {
                layer_id: DEFAULT_LAYER_ID.to_string(),
                title: DEFAULT_LAYER_TITLE.to_string(),
                popup_title: DEFAULT_POPUP_TITLE.to_string(),
                popup_content: DEFAULT_POPUP_CONTENT.to_string(),
                fill_color: DEFAULT_FILL,
                outline_color: DEFAULT_OUTLINE,
                outline_width: DEFAULT_OUTLINE_WIDTH,
            },
            sources: BTreeMap::new(),
            expressions: BTreeMap::new(),
            logging: LoggingSettings {
                file: config_dir.join("logs").join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}
