//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::join::clamp_batch_size;
use crate::publish::Rgba;
use crate::source::DefinitionExpression;

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn non_empty(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(invalid(section, key, value, "must not be empty"));
    }
    Ok(v.to_string())
}

fn parse_color(section: &str, key: &str, value: &str) -> Result<Rgba, ConfigFileError> {
    value
        .parse()
        .map_err(|_| invalid(section, key, value, "expected 'r,g,b,a' with 0-255 channels and alpha 0-1"))
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [pipeline] section
    if let Some(section) = ini.section(Some("pipeline")) {
        if let Some(v) = section.get("probe") {
            config.pipeline.probe = non_empty("pipeline", "probe", v)?;
        }
        if let Some(v) = section.get("target") {
            config.pipeline.target = non_empty("pipeline", "target", v)?;
        }
        if let Some(v) = section.get("batch_size") {
            let parsed: usize = v
                .trim()
                .parse()
                .map_err(|_| invalid("pipeline", "batch_size", v, "must be a positive integer"))?;
            // Bounded to protect the query service
            config.pipeline.batch_size = clamp_batch_size(parsed);
        }
        if let Some(v) = section.get("readiness_timeout_secs") {
            config.pipeline.readiness_timeout_secs = v.trim().parse().map_err(|_| {
                invalid(
                    "pipeline",
                    "readiness_timeout_secs",
                    v,
                    "must be a non-negative integer (seconds, 0 disables)",
                )
            })?;
        }
    }

    // [identity] section
    if let Some(section) = ini.section(Some("identity")) {
        if let Some(v) = section.get("field") {
            config.identity.field = non_empty("identity", "field", v)?;
        }
        if let Some(v) = section.get("namespaced") {
            config.identity.namespaced = parse_bool(v);
        }
    }

    // [publish] section
    if let Some(section) = ini.section(Some("publish")) {
        if let Some(v) = section.get("layer_id") {
            config.publish.layer_id = non_empty("publish", "layer_id", v)?;
        }
        if let Some(v) = section.get("title") {
            config.publish.title = v.trim().to_string();
        }
        if let Some(v) = section.get("popup_title") {
            config.publish.popup_title = v.trim().to_string();
        }
        if let Some(v) = section.get("popup_content") {
            config.publish.popup_content = v.trim().to_string();
        }
        if let Some(v) = section.get("fill_color") {
            config.publish.fill_color = parse_color("publish", "fill_color", v)?;
        }
        if let Some(v) = section.get("outline_color") {
            config.publish.outline_color = parse_color("publish", "outline_color", v)?;
        }
        if let Some(v) = section.get("outline_width") {
            let width: f64 = v
                .trim()
                .parse()
                .map_err(|_| invalid("publish", "outline_width", v, "must be a number"))?;
            if !width.is_finite() || width < 0.0 {
                return Err(invalid("publish", "outline_width", v, "must be zero or positive"));
            }
            config.publish.outline_width = width;
        }
    }

    // [sources] section: every key is a source name
    if let Some(section) = ini.section(Some("sources")) {
        for (name, v) in section.iter() {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("sources", name, v, "must be a path to a GeoJSON file"));
            }
            config.sources.insert(name.to_string(), expand_tilde(v));
        }
    }

    // [expressions] section: validated here so a typo fails at startup
    if let Some(section) = ini.section(Some("expressions")) {
        for (name, v) in section.iter() {
            let v = v.trim();
            DefinitionExpression::parse(v)
                .map_err(|e| invalid("expressions", name, v, e.to_string()))?;
            if !v.is_empty() {
                config.expressions.insert(name.to_string(), v.to_string());
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
