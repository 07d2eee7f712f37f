//! Pipeline compilation
//!
//! Expands `uses` steps through their templates and substitutes every
//! placeholder, producing a flat list of ready-to-run shell commands in
//! manifest order. Compilation is all-or-nothing: the first error aborts it.

use super::template::TemplateSource;
use crate::error::{FetchError, Result};
use crate::manifest::PipelineStep;
use crate::substitution::SubstitutionMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Maximum template nesting before compilation gives up.
pub const MAX_TEMPLATE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    GitCheckout,
    Fetch,
    Other,
}

impl StepKind {
    /// Classifies a `uses` name. Only exact matches count as acquisition steps.
    pub fn from_uses(name: &str) -> Self {
        match name {
            "git-checkout" => StepKind::GitCheckout,
            "fetch" => StepKind::Fetch,
            _ => StepKind::Other,
        }
    }

    pub fn is_source_acquisition(&self) -> bool {
        matches!(self, StepKind::GitCheckout | StepKind::Fetch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::GitCheckout => "git-checkout",
            StepKind::Fetch => "fetch",
            StepKind::Other => "other",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully substituted shell command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledStep {
    pub kind: StepKind,
    /// Template that produced this command, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompiledPipeline {
    steps: Vec<CompiledStep>,
}

impl CompiledPipeline {
    pub fn steps(&self) -> &[CompiledStep] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<Vec<CompiledStep>> for CompiledPipeline {
    fn from(steps: Vec<CompiledStep>) -> Self {
        Self { steps }
    }
}

pub struct PipelineCompiler<'a> {
    templates: &'a dyn TemplateSource,
}

impl<'a> PipelineCompiler<'a> {
    pub fn new(templates: &'a dyn TemplateSource) -> Self {
        Self { templates }
    }

    pub fn compile(
        &self,
        substitutions: &SubstitutionMap,
        steps: &[PipelineStep],
    ) -> Result<CompiledPipeline> {
        let mut compiled = Vec::new();
        for step in steps {
            self.compile_step(step, substitutions, None, None, &[], &mut compiled)?;
        }
        debug!(steps = compiled.len(), "Compiled pipeline");
        Ok(CompiledPipeline { steps: compiled })
    }

    /// `scope` belongs to the caller and is never modified; nested expansions
    /// get their own derived map. `owner` is the template whose pipeline this
    /// step came from, `chain` the templates currently being expanded.
    ///
    /// `kind` is fixed by the top-level manifest step and inherited by
    /// everything expanded beneath it; `None` means `step` is top-level.
    fn compile_step(
        &self,
        step: &PipelineStep,
        scope: &SubstitutionMap,
        owner: Option<&str>,
        kind: Option<StepKind>,
        chain: &[String],
        out: &mut Vec<CompiledStep>,
    ) -> Result<()> {
        let label = step.label();

        if let Some(uses) = &step.uses {
            let kind = kind.unwrap_or_else(|| StepKind::from_uses(uses));
            return self.expand_template(step, uses, &label, scope, kind, chain, out);
        }
        let kind = kind.unwrap_or(StepKind::Other);

        let local;
        let scope = if step.with.is_empty() {
            scope
        } else {
            local = scope.with_inputs(&substitute_values(scope, &step.with, &label)?);
            &local
        };

        if let Some(runs) = &step.runs {
            if runs.trim().is_empty() {
                debug!(step = %label, "Skipping empty runs block");
            } else {
                let command = scope.substitute(runs, &label)?;
                debug!(step = %label, kind = %kind, "Compiled step");
                out.push(CompiledStep {
                    kind,
                    uses: owner.map(str::to_string),
                    name: step.name.clone().or_else(|| owner.map(str::to_string)),
                    command,
                });
            }
        }

        for child in &step.pipeline {
            self.compile_step(child, scope, owner, Some(kind), chain, out)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_template(
        &self,
        step: &PipelineStep,
        uses: &str,
        label: &str,
        scope: &SubstitutionMap,
        kind: StepKind,
        chain: &[String],
        out: &mut Vec<CompiledStep>,
    ) -> Result<()> {
        if chain.iter().any(|name| name == uses) {
            let mut cycle = chain.to_vec();
            cycle.push(uses.to_string());
            return Err(FetchError::TemplateCycle { chain: cycle });
        }
        if chain.len() >= MAX_TEMPLATE_DEPTH {
            return Err(FetchError::InvalidTemplate {
                name: uses.to_string(),
                message: format!("nesting exceeds {} levels", MAX_TEMPLATE_DEPTH),
            });
        }
        if step.runs.is_some() || !step.pipeline.is_empty() {
            warn!(step = %label, "Step has both 'uses' and inline steps, ignoring the inline steps");
        }

        let template = self.templates.resolve(uses)?;
        let raw = template.merge_inputs(uses, &step.with)?;
        let inputs = substitute_values(scope, &raw, label)?;
        let child_scope = scope.with_inputs(&inputs);

        let mut child_chain = chain.to_vec();
        child_chain.push(uses.to_string());

        debug!(
            step = %label,
            pipeline = uses,
            inputs = inputs.len(),
            "Expanding pipeline template"
        );
        for child in &template.pipeline {
            self.compile_step(child, &child_scope, Some(uses), Some(kind), &child_chain, out)?;
        }
        Ok(())
    }
}

fn substitute_values(
    scope: &SubstitutionMap,
    values: &BTreeMap<String, String>,
    label: &str,
) -> Result<BTreeMap<String, String>> {
    values
        .iter()
        .map(|(key, raw)| Ok((key.clone(), scope.substitute(raw, label)?)))
        .collect()
}
