//! fetch-melange-source - extract upstream sources from melange manifests
//!
//! A melange manifest describes a package build as a pipeline of steps. Each
//! step is either inline shell (`runs`) or a reusable template (`uses`) whose
//! parameters are filled with `${{...}}` substitutions. This crate compiles
//! that pipeline into concrete shell commands, finds the step that acquires
//! the upstream source (`git-checkout` or `fetch`) and runs it in a chosen
//! directory.
//!
//! # Example
//!
//! ```no_run
//! use fetch_melange_source::{
//!     find_fetch_step, parse_configuration, Arch, CommandExecutor, DirectoryTemplateSource,
//!     LibcFlavor, PipelineCompiler, SubstitutionMap,
//! };
//! use std::path::Path;
//!
//! # fn main() -> Result<(), fetch_melange_source::FetchError> {
//! let manifest = parse_configuration(Path::new("hello.yaml"))?;
//! let substitutions = SubstitutionMap::new(&manifest, Arch::X86_64, LibcFlavor::Gnu, None)?;
//! let templates = DirectoryTemplateSource::new(vec![]);
//! let pipeline = PipelineCompiler::new(&templates).compile(&substitutions, &manifest.pipeline)?;
//!
//! let step = find_fetch_step(&pipeline)?;
//! CommandExecutor::new().execute(Path::new("/tmp/hello-src"), step)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`manifest`]: manifest model and parsing
//! - [`substitution`]: substitution map and placeholder replacement
//! - [`pipeline`]: template resolution and compilation
//! - [`locator`]: first-match fetch step lookup
//! - [`executor`]: running the fetch command

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod fs;
pub mod locator;
pub mod manifest;
pub mod pipeline;
pub mod source;
pub mod substitution;
pub mod util;

pub use config::{ConfigError, FetchConfig};
pub use error::FetchError;
pub use executor::CommandExecutor;
pub use locator::{fetch_step_index, find_fetch_step};
pub use manifest::{parse_configuration, Configuration, Package, PipelineStep, VarTransform};
pub use pipeline::{
    CompiledPipeline, CompiledStep, DirectoryTemplateSource, PipelineCompiler, PipelineTemplate,
    StepKind, TemplateSource,
};
pub use source::{compile_manifest, plan_source, SourcePlan};
pub use substitution::{Arch, LibcFlavor, SubstitutionMap};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
