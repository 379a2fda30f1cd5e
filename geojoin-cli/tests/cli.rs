//! End-to-end tests for the `geojoin` binary.
//!
//! Each test points HOME at a temp directory so nothing touches the real
//! user configuration.
//!
//! Run with: `cargo test -p geojoin-cli --test cli`

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn geojoin(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_geojoin"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run geojoin binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_init_writes_default_config() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("custom").join("config.ini");

    let output = geojoin(home.path(), &["init", "--config", config.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let written = fs::read_to_string(&config).unwrap();
    assert!(written.contains("[pipeline]"));
    assert!(written.contains("probe = coastal-buffer"));
    assert!(stdout(&output).contains("Wrote default configuration"));
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let home = tempfile::tempdir().unwrap();
    let config = write(home.path(), "config.ini", "[pipeline]\nprobe = dunes\n");
    let config_arg = config.to_str().unwrap();

    let refused = geojoin(home.path(), &["init", "--config", config_arg]);
    assert!(!refused.status.success());
    assert!(stderr(&refused).contains("--force"));
    assert!(fs::read_to_string(&config).unwrap().contains("dunes"));

    let forced = geojoin(home.path(), &["init", "--config", config_arg, "--force"]);
    assert!(forced.status.success(), "stderr: {}", stderr(&forced));
    assert!(fs::read_to_string(&config)
        .unwrap()
        .contains("probe = coastal-buffer"));
}

#[test]
fn test_config_path_uses_home() {
    let home = tempfile::tempdir().unwrap();

    let output = geojoin(home.path(), &["config", "path"]);

    assert!(output.status.success());
    let printed = PathBuf::from(stdout(&output).trim());
    assert_eq!(printed, home.path().join(".geojoin").join("config.ini"));
}

#[test]
fn test_run_joins_geojson_sources_into_output_file() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path();
    let buffer = write(
        dir,
        "buffer.geojson",
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"NAME": "north"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}},
            {"type": "Feature", "properties": {"NAME": "south"},
             "geometry": {"type": "Polygon", "coordinates": [[[1,1],[3,1],[3,3],[1,3],[1,1]]]}}
        ]}"#,
    );
    let zones = write(
        dir,
        "zones.geojson",
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"OBJECTID": 7, "FLD_ZONE": "VE", "ESRI_SYMBOLOGY": "1% Annual Chance"},
             "geometry": {"type": "Polygon", "coordinates": [[[1.2,1.2],[1.6,1.2],[1.6,1.6],[1.2,1.6],[1.2,1.2]]]}},
            {"type": "Feature", "properties": {"OBJECTID": 8, "FLD_ZONE": "X"},
             "geometry": {"type": "Polygon", "coordinates": [[[1.2,1.2],[1.6,1.2],[1.6,1.6],[1.2,1.6],[1.2,1.2]]]}}
        ]}"#,
    );
    let log = dir.join("logs").join("run.log");
    let config = write(
        dir,
        "config.ini",
        &format!(
            "[sources]\ncoastal-buffer = {}\nflood-hazard = {}\n\n\
             [expressions]\nflood-hazard = FLD_ZONE IN ('AE', 'VE')\n\n\
             [logging]\nfile = {}\n",
            buffer.display(),
            zones.display(),
            log.display()
        ),
    );
    let output_path = dir.join("out").join("zones.geojson");

    let output = geojoin(
        dir,
        &[
            "run",
            "--config",
            config.to_str().unwrap(),
            "--batch-size",
            "1",
            "--output",
            output_path.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(log.exists());

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(written["id"], "coastal-flood-zones");
    let features = written["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["OBJECTID"], 7);
    assert_eq!(features[0]["properties"]["display"]["popup"]["title"], "VE");
    assert_eq!(
        features[0]["properties"]["display"]["popup"]["content"],
        "Esri Symbology: 1% Annual Chance"
    );
}

#[test]
fn test_run_reports_unconfigured_source() {
    let home = tempfile::tempdir().unwrap();
    let log = home.path().join("run.log");
    let config = write(
        home.path(),
        "config.ini",
        &format!("[logging]\nfile = {}\n", log.display()),
    );

    let output = geojoin(
        home.path(),
        &["run", "--config", config.to_str().unwrap()],
    );

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("No file configured for source 'coastal-buffer'"));
    assert!(err.contains("[sources]"));
}

#[test]
fn test_run_with_missing_file_names_missing_source() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path();
    let buffer = write(
        dir,
        "buffer.geojson",
        r#"{"type": "FeatureCollection", "features": []}"#,
    );
    let config = write(
        dir,
        "config.ini",
        &format!(
            "[pipeline]\nreadiness_timeout_secs = 5\n\n\
             [sources]\ncoastal-buffer = {}\nflood-hazard = {}\n\n\
             [logging]\nfile = {}\n",
            buffer.display(),
            dir.join("does-not-exist.geojson").display(),
            dir.join("run.log").display()
        ),
    );

    let output = geojoin(dir, &["run", "--config", config.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("flood-hazard"));
}
