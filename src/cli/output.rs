//! Dry-run output formatting
//!
//! Renders the located fetch step, together with the full compiled pipeline,
//! as JSON, YAML or plain text.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;

use crate::pipeline::{CompiledPipeline, CompiledStep};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

#[derive(Serialize)]
struct Plan<'a> {
    fetch_step: &'a CompiledStep,
    pipeline: &'a CompiledPipeline,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_plan(&self, fetch_step: &CompiledStep, pipeline: &CompiledPipeline) -> Result<String> {
        let plan = Plan {
            fetch_step,
            pipeline,
        };
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&plan).context("Failed to serialize plan to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&plan).context("Failed to serialize plan to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(fetch_step, pipeline)),
        }
    }

    fn format_human(&self, fetch_step: &CompiledStep, pipeline: &CompiledPipeline) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Found source fetching step: {}.", fetch_step.kind);
        if let Some(name) = &fetch_step.name {
            let _ = writeln!(out, "Step: {}", name);
        }
        let _ = writeln!(out, "Compiled steps: {}", pipeline.len());
        let _ = writeln!(out, "Command:");
        for line in fetch_step.command.lines() {
            let _ = writeln!(out, "  {}", line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StepKind;

    fn plan() -> (CompiledStep, CompiledPipeline) {
        let step = CompiledStep {
            kind: StepKind::GitCheckout,
            uses: Some("git-checkout".to_string()),
            name: Some("git-checkout".to_string()),
            command: "git clone https://example/repo .\ncd .".to_string(),
        };
        let pipeline = CompiledPipeline::from(vec![
            step.clone(),
            CompiledStep {
                kind: StepKind::Other,
                uses: None,
                name: None,
                command: "make".to_string(),
            },
        ]);
        (step, pipeline)
    }

    #[test]
    fn test_human_format() {
        let (step, pipeline) = plan();
        let out = OutputFormatter::new(OutputFormat::Human)
            .format_plan(&step, &pipeline)
            .unwrap();
        assert!(out.starts_with("Found source fetching step: git-checkout."));
        assert!(out.contains("Compiled steps: 2"));
        assert!(out.contains("  git clone https://example/repo ."));
    }

    #[test]
    fn test_json_format() {
        let (step, pipeline) = plan();
        let out = OutputFormatter::new(OutputFormat::Json)
            .format_plan(&step, &pipeline)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["fetch_step"]["kind"], "git-checkout");
        assert_eq!(value["pipeline"].as_array().unwrap().len(), 2);
        assert_eq!(value["pipeline"][1]["kind"], "other");
        assert!(value["pipeline"][1].get("uses").is_none());
    }

    #[test]
    fn test_yaml_format() {
        let (step, pipeline) = plan();
        let out = OutputFormatter::new(OutputFormat::Yaml)
            .format_plan(&step, &pipeline)
            .unwrap();
        assert!(out.contains("fetch_step:"));
        assert!(out.contains("kind: git-checkout"));
    }
}
