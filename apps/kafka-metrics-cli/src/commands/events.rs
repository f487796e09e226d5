//! Recognized event listing

use crate::output::{self, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use kafka_metrics_instrument::EventKind;
use serde::Serialize;

#[derive(Serialize)]
struct EventInfo {
    name: &'static str,
    subsystem: &'static str,
}

pub fn run(format: OutputFormat) -> Result<()> {
    let events: Vec<EventInfo> = EventKind::ALL
        .iter()
        .map(|kind| EventInfo {
            name: kind.name(),
            subsystem: kind.subsystem(),
        })
        .collect();

    match format {
        OutputFormat::Json | OutputFormat::Yaml => output::structured(&events, format)?,
        OutputFormat::Text => {
            let mut current = "";
            for event in &events {
                if event.subsystem != current {
                    if !current.is_empty() {
                        println!();
                    }
                    output::section(event.subsystem);
                    current = event.subsystem;
                }
                println!("  {}", event.name.cyan());
            }
        }
    }

    Ok(())
}
