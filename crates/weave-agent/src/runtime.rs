//! Pipeline assembly and execution.
//!
//! One worker task per source stream feeds a shared dispatcher through its
//! bounded intake. The parser chain and enricher are built once and shared
//! read-only; reassembly state lives inside each worker, so streams can
//! never contaminate each other.
//!
//! Shutdown: when the watch signal fires, every worker flushes its open
//! record and exits; once all intake handles are gone the dispatcher drains
//! each sink's queue — letting in-flight retries complete or exhaust —
//! before `run` returns.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use weave_dispatch::{DeadLetterWriter, DispatchStats, Dispatcher, FileSink, Sink, StatsSnapshot};
use weave_pipeline::{LineReader, StreamId, StreamWorker};

use crate::config::{AgentConfig, SourceSpec};
use crate::error::{AgentError, Result};

/// Runs the configured pipeline until every source ends or `shutdown`
/// signals `true`.
///
/// Returns the final delivery counters.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a source or sink cannot
/// be opened, or the pipeline fails at the transport level.
pub async fn run(config: AgentConfig, shutdown: watch::Receiver<bool>) -> Result<StatsSnapshot> {
    config.validate()?;

    // Open every source first: a bad path fails the process before any
    // sink file is touched or task spawned.
    let mut inputs = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        inputs.push((source.id.clone(), open_source(source).await?));
    }

    let chain = Arc::new(config.pipeline.build_chain()?);
    let enricher = Arc::new(config.pipeline.build_enricher());
    let stats = Arc::new(DispatchStats::new());

    let dead_letter = Arc::new(DeadLetterWriter::open(&config.dispatch.dead_letter_path).await?);
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::with_capacity(config.sinks.len());
    for spec in &config.sinks {
        sinks.push(Arc::new(FileSink::open(&spec.name, &spec.path).await?));
    }

    let (dispatcher, intake) = Dispatcher::new(
        sinks,
        config.dispatch.to_dispatcher_config(),
        dead_letter,
        Arc::clone(&stats),
    )?;
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    info!(
        sources = config.sources.len(),
        sinks = config.sinks.len(),
        parsers = chain.len(),
        "pipeline starting"
    );

    let mut workers = Vec::with_capacity(inputs.len());
    for (id, input) in inputs {
        let stream = StreamId::from(id.clone());
        let reassembler = config.pipeline.build_reassembler(stream.clone())?;
        let idle_flush = config.pipeline.reassembly.idle_flush();
        let chain = Arc::clone(&chain);
        let enricher = Arc::clone(&enricher);
        let output = intake.clone();
        let shutdown = shutdown.clone();

        let handle = match input {
            SourceInput::File(file) => {
                let reader = LineReader::with_max_line_length(
                    stream,
                    file,
                    config.pipeline.max_line_length,
                );
                let worker = StreamWorker::new(reader, reassembler, chain, enricher, output)
                    .with_idle_flush(idle_flush);
                tokio::spawn(worker.run(shutdown))
            }
            SourceInput::Stdin(stdin) => {
                let reader = LineReader::with_max_line_length(
                    stream,
                    stdin,
                    config.pipeline.max_line_length,
                );
                let worker = StreamWorker::new(reader, reassembler, chain, enricher, output)
                    .with_idle_flush(idle_flush);
                tokio::spawn(worker.run(shutdown))
            }
        };
        workers.push((id, handle));
    }
    // Workers hold their own clones; dropping ours lets the dispatcher see
    // intake closure once the last worker exits.
    drop(intake);

    let mut failed_streams = 0usize;
    for (id, handle) in workers {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failed_streams += 1;
                error!(stream = %id, error = %e, "stream worker failed");
            }
            Err(e) => {
                failed_streams += 1;
                error!(stream = %id, error = %e, "stream worker panicked");
            }
        }
    }

    if let Err(e) = dispatcher_handle.await {
        error!(error = %e, "dispatcher task failed");
    }

    let snapshot = stats.snapshot();
    info!(
        delivered = snapshot.delivered,
        retries = snapshot.retries,
        dead_lettered = snapshot.dead_lettered,
        failed_streams,
        "pipeline stopped"
    );
    Ok(snapshot)
}

enum SourceInput {
    File(tokio::fs::File),
    Stdin(tokio::io::Stdin),
}

async fn open_source(source: &SourceSpec) -> Result<SourceInput> {
    match &source.path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                AgentError::Config(format!(
                    "failed to open source '{}' at '{}': {}",
                    source.id,
                    path.display(),
                    e
                ))
            })?;
            Ok(SourceInput::File(file))
        }
        None => Ok(SourceInput::Stdin(tokio::io::stdin())),
    }
}
