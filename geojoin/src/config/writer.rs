//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::fmt::Write;
use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let mut sources = String::new();
    if config.sources.is_empty() {
        sources.push_str("; coastal-buffer = ~/data/coastal-buffer.geojson\n");
        sources.push_str("; flood-hazard = ~/data/flood-hazard.geojson\n");
    }
    for (name, path) in &config.sources {
        let _ = writeln!(sources, "{} = {}", name, path_to_string(path));
    }

    let mut expressions = String::new();
    if config.expressions.is_empty() {
        expressions.push_str("; flood-hazard = FLD_ZONE IN ('AE', 'VE')\n");
    }
    for (name, expression) in &config.expressions {
        let _ = writeln!(expressions, "{} = {}", name, expression);
    }

    format!(
        r#"[pipeline]
; Source whose features drive the join (each feature is one query)
probe = {}
; Source queried for features intersecting each probe feature
target = {}
; Number of concurrent queries per batch (default: 10, clamped to 1-100)
; Batches run one after another
batch_size = {}
; Seconds to wait for all sources to load (default: 30)
; 0 waits indefinitely
readiness_timeout_secs = {}

[identity]
; Attribute identifying a target feature; repeats are published once
field = {}
; Qualify identity values with the target source name (default: false)
namespaced = {}

[publish]
; Layer identifier and title
layer_id = {}
title = {}
; Popup templates; {{FIELD}} is replaced by the feature's attribute value
popup_title = {}
popup_content = {}
; Colors as r,g,b,a with channels 0-255 and alpha 0-1
fill_color = {}
outline_color = {}
outline_width = {}

[sources]
; Source name = GeoJSON FeatureCollection file
{}
[expressions]
; Source name = definition expression filtering every query of that source
; Supports =, <>, IN (...), IS [NOT] NULL joined by AND
{}
[logging]
; Log file path (truncated at the start of every run)
file = {}
"#,
        config.pipeline.probe,
        config.pipeline.target,
        config.pipeline.batch_size,
        config.pipeline.readiness_timeout_secs,
        config.identity.field,
        config.identity.namespaced,
        config.publish.layer_id,
        config.publish.title,
        config.publish.popup_title,
        config.publish.popup_content,
        config.publish.fill_color,
        config.publish.outline_color,
        config.publish.outline_width,
        sources,
        expressions,
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::ConfigFile;
    use super::*;
    use crate::publish::Rgba;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.pipeline.probe = "dunes".to_string();
        config.pipeline.batch_size = 4;
        config.pipeline.readiness_timeout_secs = 0;
        config.identity.namespaced = true;
        config.publish.popup_title = "Zone {FLD_ZONE}".to_string();
        config.publish.fill_color = Rgba::new(10, 20, 30, 0.75);
        config.publish.outline_width = 1.5;
        config
            .sources
            .insert("dunes".to_string(), PathBuf::from("/data/dunes.geojson"));
        config
            .expressions
            .insert("flood-hazard".to_string(), "FLD_ZONE = 'VE'".to_string());

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        ConfigFile::default().save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_commented_examples_when_empty() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("; coastal-buffer = "));
        assert!(text.contains("; flood-hazard = FLD_ZONE IN"));
    }
}
