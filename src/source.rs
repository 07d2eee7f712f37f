//! End-to-end source location: manifest in, fetch step out.

use crate::config::FetchConfig;
use crate::error::Result;
use crate::locator::fetch_step_index;
use crate::manifest::{parse_configuration, Configuration};
use crate::pipeline::{CompiledPipeline, CompiledStep, DirectoryTemplateSource, PipelineCompiler};
use crate::substitution::SubstitutionMap;
use std::path::Path;
use tracing::info;

/// Builds the substitution map for `config` and compiles the manifest pipeline.
pub fn compile_manifest(manifest: &Configuration, config: &FetchConfig) -> Result<CompiledPipeline> {
    let arch = config.arch()?;
    let libc = config.libc()?;
    let overrides = (!config.overrides.is_empty()).then_some(&config.overrides);

    let substitutions = SubstitutionMap::new(manifest, arch, libc, overrides)?;
    let templates = DirectoryTemplateSource::new(config.pipeline_dirs.clone());
    PipelineCompiler::new(&templates).compile(&substitutions, &manifest.pipeline)
}

/// Compiled pipeline plus the index of its source fetching step.
#[derive(Debug, Clone)]
pub struct SourcePlan {
    pipeline: CompiledPipeline,
    fetch_index: usize,
}

impl SourcePlan {
    pub fn pipeline(&self) -> &CompiledPipeline {
        &self.pipeline
    }

    pub fn fetch_step(&self) -> &CompiledStep {
        &self.pipeline.steps()[self.fetch_index]
    }
}

/// Parses, compiles and locates without touching the file system beyond reads.
pub fn plan_source(manifest_path: &Path, config: &FetchConfig) -> Result<SourcePlan> {
    let manifest = parse_configuration(manifest_path)?;
    let pipeline = compile_manifest(&manifest, config)?;
    let fetch_index = fetch_step_index(&pipeline)?;
    info!(
        package = %manifest.package.name,
        kind = %pipeline.steps()[fetch_index].kind,
        "Located source fetching step"
    );
    Ok(SourcePlan {
        pipeline,
        fetch_index,
    })
}
