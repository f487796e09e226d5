//! Metric definition listing

use super::Bridge;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use kafka_metrics_core::BridgeConfig;

pub fn run(config: &BridgeConfig, format: OutputFormat) -> Result<()> {
    let bridge = Bridge::build(config)?;
    let definitions = bridge.registry.definitions();

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let definitions: Vec<_> = definitions.iter().map(|def| def.as_ref()).collect();
            output::structured(&definitions, format)?
        }
        OutputFormat::Text => {
            for def in &definitions {
                println!(
                    "{:<10} {}_{} [{}]",
                    def.kind.to_string().green(),
                    config.namespace,
                    def.name.bold(),
                    def.label_names.join(", ")
                );
                println!("           {}", def.docstring.dimmed());
            }
        }
    }

    Ok(())
}
