//! Event replay command

use super::Bridge;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use kafka_metrics_core::{BridgeConfig, InstrumentationEvent};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Tally of one replay run.
#[derive(Debug, Default, Serialize)]
struct ReplaySummary {
    /// Well-formed events read
    events: u64,
    translated: u64,
    /// Well-formed events with no registered handler
    ignored: u64,
    failed: u64,
    malformed: u64,
    /// Translated events per event name
    by_event: BTreeMap<String, u64>,
}

#[derive(Serialize)]
struct ReplayReport<'a> {
    summary: &'a ReplaySummary,
    exposition: String,
}

async fn open(input: &str) -> Result<Box<dyn AsyncBufRead + Unpin>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = File::open(input)
        .await
        .with_context(|| format!("Failed to open {}", input))?;
    Ok(Box::new(BufReader::new(file)))
}

pub async fn run(config: &BridgeConfig, input: &str, strict: bool, format: OutputFormat) -> Result<()> {
    let bridge = Bridge::build(config)?;
    let mut lines = open(input).await?.lines();
    let mut summary = ReplaySummary::default();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: InstrumentationEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) if strict => bail!("line {}: malformed event: {}", line_no, e),
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed event");
                summary.malformed += 1;
                continue;
            }
        };
        summary.events += 1;

        match bridge.translator.translate(&event) {
            Ok(Some(kind)) => {
                summary.translated += 1;
                *summary.by_event.entry(kind.name().to_string()).or_default() += 1;
            }
            Ok(None) => {
                debug!(line = line_no, event = %event.name, "No handler for event");
                summary.ignored += 1;
            }
            Err(e) if strict => {
                return Err(e).with_context(|| {
                    format!("line {}: failed to translate `{}`", line_no, event.name)
                });
            }
            Err(e) => {
                warn!(
                    line = line_no,
                    event = %event.name,
                    defect = e.is_mapping_defect(),
                    error = %e,
                    "Event translation failed"
                );
                summary.failed += 1;
            }
        }
    }

    let exposition = bridge.registry.render()?;

    match format {
        OutputFormat::Json | OutputFormat::Yaml => output::structured(
            &ReplayReport {
                summary: &summary,
                exposition,
            },
            format,
        )?,
        OutputFormat::Text => {
            print!("{}", exposition);
            output::key_value(
                "Replayed",
                &format!(
                    "{} events ({} translated, {} ignored, {} failed)",
                    summary.events, summary.translated, summary.ignored, summary.failed
                ),
            );
            if summary.malformed > 0 {
                output::warning(&format!("{} malformed lines skipped", summary.malformed));
            }
        }
    }

    Ok(())
}
