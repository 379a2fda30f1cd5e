//! Run command - load the configured sources, join them and publish the layer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use geojoin::config::ConfigFile;
use geojoin::engine::{PipelineError, PipelineReport, SpatialJoinPipeline};
use geojoin::join::clamp_batch_size;
use geojoin::publish::{GeoJsonFileSink, MemoryMapSink};
use geojoin::registry::{GeoJsonFileLoader, SourceRegistry};
use geojoin::source::{InMemoryDataset, SourceName};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub probe: Option<String>,
    pub target: Option<String>,
    pub batch_size: Option<usize>,
    pub timeout: Option<u64>,
    pub output: Option<PathBuf>,
    pub debug: bool,
}

/// Command-line values override the config file.
fn apply_overrides(config: &mut ConfigFile, args: &RunArgs) {
    if let Some(probe) = &args.probe {
        config.pipeline.probe = probe.clone();
    }
    if let Some(target) = &args.target {
        config.pipeline.target = target.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.pipeline.batch_size = clamp_batch_size(batch_size);
    }
    if let Some(timeout) = args.timeout {
        config.pipeline.readiness_timeout_secs = timeout;
    }
}

/// Loaders for every source the run waits for.
fn resolve_loaders(
    config: &ConfigFile,
    required: &[SourceName],
    config_path: &Path,
) -> Result<Vec<(SourceName, GeoJsonFileLoader)>, CliError> {
    let mut loaders: Vec<(SourceName, GeoJsonFileLoader)> = Vec::new();
    for name in required {
        if loaders.iter().any(|(existing, _)| existing == name) {
            continue;
        }
        let loader =
            config
                .loader_for(name.as_str())
                .ok_or_else(|| CliError::SourceNotConfigured {
                    name: name.to_string(),
                    config_path: config_path.to_path_buf(),
                })?;
        loaders.push((name.clone(), loader));
    }
    Ok(loaders)
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("run");
    apply_overrides(runner.config_mut(), &args);

    let config = runner.config();
    let pipeline_config = config.pipeline_config();
    let loaders = resolve_loaders(
        config,
        &pipeline_config.required_sources(),
        runner.config_path(),
    )?;
    let pipeline = SpatialJoinPipeline::new(pipeline_config, config.publisher());

    println!(
        "Joining '{}' against '{}' (batch size {})...",
        pipeline.config().probe,
        pipeline.config().target,
        pipeline.config().batch_size
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let report = runtime.block_on(execute(&pipeline, loaders, args.output.as_deref()))?;

    println!();
    println!("{}", report);
    if let Some(output) = &args.output {
        println!("Output:         {}", output.display());
    }
    println!("Log:            {}", runner.log_path().display());
    Ok(())
}

async fn execute(
    pipeline: &SpatialJoinPipeline,
    loaders: Vec<(SourceName, GeoJsonFileLoader)>,
    output: Option<&Path>,
) -> Result<PipelineReport, PipelineError> {
    let registry: Arc<SourceRegistry<InMemoryDataset>> = Arc::new(SourceRegistry::new());
    let subscription = registry.subscribe();
    for (name, loader) in loaders {
        registry.spawn_load(name, loader);
    }
    // Once every load task finishes the registry is dropped and the event
    // stream closes, so a failed load surfaces without waiting for the timeout.
    drop(registry);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling run");
                cancel.cancel();
            }
        })
    };

    let result = match output {
        Some(path) => {
            info!(path = %path.display(), "Publishing to GeoJSON file");
            pipeline
                .run(subscription, &GeoJsonFileSink::new(path), &cancel)
                .await
        }
        None => pipeline.run(subscription, &MemoryMapSink::new(), &cancel).await,
    };

    interrupt.abort();
    result
}
