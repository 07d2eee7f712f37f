//! Melange manifest model
//!
//! Only the parts of a build manifest that source extraction needs are modelled:
//! package identity, user variables, variable transforms and the top-level
//! pipeline. Everything else in the document (environment, subpackages, test
//! blocks) is accepted and ignored.

use crate::error::{FetchError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub name: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    pub epoch: u64,
    pub description: Option<String>,
}

/// Derives a new `vars.<to>` entry by running a regex replacement over `from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarTransform {
    pub from: String,
    #[serde(rename = "match")]
    pub pattern: String,
    pub replace: String,
    pub to: String,
}

/// One entry of a pipeline, either inline shell (`runs`) or a named template (`uses`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineStep {
    pub name: Option<String>,
    pub uses: Option<String>,
    pub runs: Option<String>,
    #[serde(deserialize_with = "scalar_map")]
    pub with: BTreeMap<String, String>,
    pub pipeline: Vec<PipelineStep>,
}

impl PipelineStep {
    pub fn uses(name: &str) -> Self {
        Self {
            uses: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn runs(script: &str) -> Self {
        Self {
            runs: Some(script.to_string()),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.with.insert(key.to_string(), value.to_string());
        self
    }

    /// Label used in log lines and error messages.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.uses.clone())
            .unwrap_or_else(|| "<runs>".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Configuration {
    pub package: Package,
    #[serde(deserialize_with = "scalar_map")]
    pub vars: BTreeMap<String, String>,
    pub var_transforms: Vec<VarTransform>,
    pub pipeline: Vec<PipelineStep>,
}

impl Configuration {
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|source| FetchError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }
}

/// Reads and parses a manifest file.
pub fn parse_configuration(path: &Path) -> Result<Configuration> {
    let text = fs::read_to_string(path).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = Configuration::from_yaml(&text, path)?;
    debug!(
        package = %config.package.name,
        steps = config.pipeline.len(),
        "Parsed manifest {}",
        path.display()
    );
    Ok(config)
}

/// Accepts any YAML scalar as a map value, rendering numbers and booleans as text.
pub(crate) fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            scalar_to_string(value)
                .map(|v| (key.clone(), v))
                .ok_or_else(|| serde::de::Error::custom(format!("value of '{}' must be a scalar", key)))
        })
        .collect()
}

fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    scalar_to_string(value).ok_or_else(|| serde::de::Error::custom("expected a scalar value"))
}

pub(crate) fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}
