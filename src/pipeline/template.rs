//! Named, reusable pipeline templates
//!
//! A `uses: <name>` step is resolved by looking for `<dir>/<name>.yaml` in each
//! configured pipeline directory, in order. Names that no directory provides
//! fall back to the templates embedded in the binary.

use crate::error::{FetchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::manifest::{scalar_to_string, PipelineStep};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("git-checkout", include_str!("builtin/git-checkout.yaml")),
    ("fetch", include_str!("builtin/fetch.yaml")),
    ("patch", include_str!("builtin/patch.yaml")),
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateInput {
    pub description: Option<String>,
    #[serde(deserialize_with = "optional_scalar")]
    pub default: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineTemplate {
    pub name: Option<String>,
    pub inputs: BTreeMap<String, TemplateInput>,
    pub pipeline: Vec<PipelineStep>,
}

impl PipelineTemplate {
    pub fn from_yaml(name: &str, text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| FetchError::InvalidTemplate {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Merges step-level `with` values over the declared input defaults.
    ///
    /// Values are returned raw; the caller substitutes them.
    pub fn merge_inputs(
        &self,
        template_name: &str,
        with: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        let mut merged = BTreeMap::new();

        for (input, spec) in &self.inputs {
            match (with.get(input), &spec.default) {
                (Some(value), _) => {
                    merged.insert(input.clone(), value.clone());
                }
                (None, Some(default)) => {
                    merged.insert(input.clone(), default.clone());
                }
                (None, None) if spec.required => {
                    return Err(FetchError::MissingInput {
                        input: input.clone(),
                        pipeline: template_name.to_string(),
                    });
                }
                (None, None) => {
                    merged.insert(input.clone(), String::new());
                }
            }
        }

        for (key, value) in with {
            if !self.inputs.contains_key(key) {
                warn!(
                    pipeline = template_name,
                    input = %key,
                    "Input is not declared by the pipeline, passing it through"
                );
                merged.insert(key.clone(), value.clone());
            }
        }

        Ok(merged)
    }
}

fn optional_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    scalar_to_string(value)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("input default must be a scalar"))
}

/// Resolves a `uses` name to a template.
pub trait TemplateSource {
    fn resolve(&self, name: &str) -> Result<PipelineTemplate>;
}

/// Looks templates up in an ordered list of directories, then in the built-in set.
pub struct DirectoryTemplateSource {
    dirs: Vec<PathBuf>,
    file_system: Arc<dyn FileSystem>,
    builtins: bool,
}

impl DirectoryTemplateSource {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self::with_file_system(dirs, Arc::new(RealFileSystem::new()))
    }

    pub fn with_file_system(dirs: Vec<PathBuf>, file_system: Arc<dyn FileSystem>) -> Self {
        for dir in &dirs {
            if !file_system.is_dir(dir) {
                warn!("Pipeline directory {} does not exist", dir.display());
            }
        }
        Self {
            dirs,
            file_system,
            builtins: true,
        }
    }

    /// Disables the embedded fallback so only the configured directories are consulted.
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn load(&self, name: &str, path: &Path) -> Result<PipelineTemplate> {
        let text = self
            .file_system
            .read_to_string(path)
            .map_err(|source| FetchError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        PipelineTemplate::from_yaml(name, &text)
    }
}

impl TemplateSource for DirectoryTemplateSource {
    fn resolve(&self, name: &str) -> Result<PipelineTemplate> {
        let relative = PathBuf::from(format!("{}.yaml", name));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(FetchError::InvalidTemplate {
                name: name.to_string(),
                message: "pipeline names must be relative paths without '..'".to_string(),
            });
        }

        for dir in &self.dirs {
            let candidate = dir.join(&relative);
            if self.file_system.is_file(&candidate) {
                debug!(pipeline = name, "Resolved pipeline from {}", candidate.display());
                return self.load(name, &candidate);
            }
        }

        if self.builtins {
            if let Some((_, text)) = BUILTIN_TEMPLATES.iter().find(|(n, _)| *n == name) {
                debug!(pipeline = name, "Resolved built-in pipeline");
                return PipelineTemplate::from_yaml(name, text);
            }
        }

        Err(FetchError::TemplateNotFound {
            name: name.to_string(),
            searched: self.dirs.clone(),
        })
    }
}

/// Names of the templates embedded in the binary.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_TEMPLATES.iter().map(|(name, _)| *name)
}
