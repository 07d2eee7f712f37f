//! Pipeline template resolution and compilation

pub mod compiler;
pub mod template;

pub use compiler::{CompiledPipeline, CompiledStep, PipelineCompiler, StepKind};
pub use template::{DirectoryTemplateSource, PipelineTemplate, TemplateInput, TemplateSource};
