//! Locates the source acquisition step of a compiled pipeline.
//!
//! The first `git-checkout` or `fetch` step in manifest order is taken to be
//! the upstream source. Later acquisition steps (secondary sources, vendored
//! assets) are ignored.

use crate::error::{FetchError, Result};
use crate::pipeline::{CompiledPipeline, CompiledStep};
use tracing::debug;

pub fn find_fetch_step(pipeline: &CompiledPipeline) -> Result<&CompiledStep> {
    let index = fetch_step_index(pipeline)?;
    Ok(&pipeline.steps()[index])
}

/// Position of the first acquisition step in `pipeline`.
pub fn fetch_step_index(pipeline: &CompiledPipeline) -> Result<usize> {
    let index = pipeline
        .iter()
        .position(|step| step.kind.is_source_acquisition())
        .ok_or(FetchError::NoFetchStepFound)?;

    let ignored = pipeline
        .iter()
        .skip(index + 1)
        .filter(|s| s.kind.is_source_acquisition())
        .count();
    if ignored > 0 {
        debug!(ignored, "Ignoring additional source fetching steps");
    }

    debug!(index, kind = %pipeline.steps()[index].kind, "Found source fetching step");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StepKind;

    fn step(kind: StepKind, command: &str) -> CompiledStep {
        CompiledStep {
            kind,
            uses: None,
            name: None,
            command: command.to_string(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let pipeline = CompiledPipeline::from(vec![
            step(StepKind::Other, "patch"),
            step(StepKind::Fetch, "first"),
            step(StepKind::GitCheckout, "second"),
        ]);
        let found = find_fetch_step(&pipeline).unwrap();
        assert_eq!(found.kind, StepKind::Fetch);
        assert_eq!(found.command, "first");
    }

    #[test]
    fn test_index_skips_leading_steps() {
        let pipeline = CompiledPipeline::from(vec![
            step(StepKind::Other, "echo"),
            step(StepKind::Other, "patch"),
            step(StepKind::GitCheckout, "git clone"),
        ]);
        assert_eq!(fetch_step_index(&pipeline).unwrap(), 2);
    }

    #[test]
    fn test_git_checkout_found() {
        let pipeline = CompiledPipeline::from(vec![step(StepKind::GitCheckout, "git clone")]);
        assert_eq!(find_fetch_step(&pipeline).unwrap().command, "git clone");
    }

    #[test]
    fn test_no_fetch_step() {
        let pipeline = CompiledPipeline::from(vec![
            step(StepKind::Other, "./configure"),
            step(StepKind::Other, "make"),
        ]);
        assert!(matches!(
            find_fetch_step(&pipeline).unwrap_err(),
            FetchError::NoFetchStepFound
        ));
    }

    #[test]
    fn test_empty_pipeline() {
        assert!(matches!(
            find_fetch_step(&CompiledPipeline::default()).unwrap_err(),
            FetchError::NoFetchStepFound
        ));
    }
}
