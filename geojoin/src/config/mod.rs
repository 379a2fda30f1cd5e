//! Configuration for GeoJoin runs.
//!
//! The INI file at `~/.geojoin/config.ini` is parsed onto defaults into a
//! [`ConfigFile`]. The file is laid out like the struct: one settings type per
//! `[section]`, plus the free-form `[sources]` and `[expressions]` maps keyed by
//! source name.
//!
//! # Example
//!
//! ```
//! use geojoin::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let pipeline = config.pipeline_config();
//!
//! assert_eq!(pipeline.batch_size, 10);
//! assert_eq!(pipeline.probe.as_str(), "coastal-buffer");
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, IdentitySettings, LoggingSettings, PipelineSettings, PublishSettings,
};

pub use defaults::{
    DEFAULT_IDENTITY_FIELD, DEFAULT_LOG_FILE_NAME, DEFAULT_PROBE_SOURCE,
    DEFAULT_READINESS_TIMEOUT_SECS, DEFAULT_TARGET_SOURCE,
};

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::PipelineConfig;
use crate::publish::{DisplayStyle, LayerId, PopupTemplate, Publisher};
use crate::registry::GeoJsonFileLoader;
use crate::source::SourceName;

impl ConfigFile {
    /// Readiness timeout; `None` when configured as 0.
    pub fn readiness_timeout(&self) -> Option<Duration> {
        match self.pipeline.readiness_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Pipeline parameters from `[pipeline]` and `[identity]`.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(
            SourceName::new(&self.pipeline.probe),
            SourceName::new(&self.pipeline.target),
        );
        config.batch_size = self.pipeline.batch_size;
        config.readiness_timeout = self.readiness_timeout();
        config.identity_field = self.identity.field.clone();
        config.namespaced = self.identity.namespaced;
        config
    }

    /// Publisher from `[publish]`.
    pub fn publisher(&self) -> Publisher {
        let publish = &self.publish;
        Publisher::new(LayerId::new(&publish.layer_id), publish.title.clone())
            .with_style(DisplayStyle {
                fill: publish.fill_color,
                outline: publish.outline_color,
                outline_width: publish.outline_width,
            })
            .with_popup(PopupTemplate::new(
                publish.popup_title.clone(),
                publish.popup_content.clone(),
            ))
    }

    /// File configured for `name` in `[sources]`.
    pub fn source_path(&self, name: &str) -> Option<&PathBuf> {
        self.sources.get(name)
    }

    /// Loader for `name`, with its definition expression if one is set.
    pub fn loader_for(&self, name: &str) -> Option<GeoJsonFileLoader> {
        let loader = GeoJsonFileLoader::new(self.source_path(name)?);
        Some(match self.expressions.get(name) {
            Some(expression) => loader.with_expression(expression.clone()),
            None => loader,
        })
    }
}
