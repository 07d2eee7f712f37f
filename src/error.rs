use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors produced while turning a manifest into an executed fetch step.
///
/// Every variant is terminal for the invocation; nothing here is retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline '{name}' not found (searched: {})", format_searched(.searched))]
    TemplateNotFound { name: String, searched: Vec<PathBuf> },

    #[error("Invalid pipeline template '{name}': {message}")]
    InvalidTemplate { name: String, message: String },

    #[error("Pipeline template cycle detected: {}", .chain.join(" -> "))]
    TemplateCycle { chain: Vec<String> },

    #[error("Required input '{input}' for pipeline '{pipeline}' is missing")]
    MissingInput { input: String, pipeline: String },

    #[error("Unresolved variable '{variable}' in step '{step}'")]
    UnresolvedVariable { variable: String, step: String },

    #[error("No source fetching step (git-checkout or fetch) found in pipeline")]
    NoFetchStepFound,

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Fetch command exited with {status}")]
    Execution { command: String, status: ExitStatus },
}

fn format_searched(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return "built-in pipelines only".to_string();
    }
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, FetchError>;
