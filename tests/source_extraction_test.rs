//! Library-level source extraction tests
//!
//! Exercises the parse -> substitute -> compile -> locate -> execute flow
//! against the fixture manifests, using both the built-in templates and a
//! local pipeline directory whose `fetch` template only records its input.

use fetch_melange_source::{
    compile_manifest, find_fetch_step, parse_configuration, plan_source, Arch, CommandExecutor,
    DirectoryTemplateSource, FetchConfig, FetchError, LibcFlavor, PipelineCompiler, StepKind,
    SubstitutionMap,
};
use serial_test::serial;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn config_with_dirs(dirs: Vec<PathBuf>) -> FetchConfig {
    FetchConfig {
        arch: "amd64".to_string(),
        libc: "gnu".to_string(),
        pipeline_dirs: dirs,
        overrides: BTreeMap::new(),
        log_level: "error".to_string(),
    }
}

#[test]
fn test_git_checkout_scenario() {
    let manifest = parse_configuration(&fixture("manifests/git-checkout.yaml")).unwrap();
    let pipeline = compile_manifest(&manifest, &config_with_dirs(vec![])).unwrap();

    let step = find_fetch_step(&pipeline).unwrap();
    assert_eq!(step.kind, StepKind::GitCheckout);
    assert!(step.command.contains("repo='https://example/repo'"));
    assert!(step.command.contains("tag='v1.0'"));
    assert!(step
        .command
        .contains("expected_commit='0123456789abcdef0123456789abcdef01234567'"));
    assert!(!step.command.contains("${{"));

    let build = &pipeline.steps()[1];
    assert_eq!(build.kind, StepKind::Other);
    assert!(build.command.contains("/home/build/melange-out/hello"));
}

#[test]
fn test_patch_then_fetch_returns_first_fetch() {
    let manifest = parse_configuration(&fixture("manifests/patch-then-fetch.yaml")).unwrap();
    let pipeline = compile_manifest(&manifest, &config_with_dirs(vec![])).unwrap();

    assert_eq!(pipeline.len(), 3);
    assert_eq!(pipeline.steps()[0].kind, StepKind::Other);

    let step = find_fetch_step(&pipeline).unwrap();
    assert_eq!(step.kind, StepKind::Fetch);
    assert!(step
        .command
        .contains("uri='https://zlib.net/zlib-1.3.1.tar.gz'"));
    assert!(pipeline.steps()[2]
        .command
        .contains("https://zlib.net/zlib131-docs.tar.gz"));
}

#[test]
fn test_missing_variable_fails_compilation() {
    let manifest = parse_configuration(&fixture("manifests/missing-var.yaml")).unwrap();
    match compile_manifest(&manifest, &config_with_dirs(vec![])).unwrap_err() {
        FetchError::UnresolvedVariable { variable, step } => {
            assert_eq!(variable, "vars.missing");
            assert_eq!(step, "git-checkout");
        }
        other => panic!("Expected UnresolvedVariable, got {:?}", other),
    }
}

#[test]
fn test_override_supplies_missing_variable() {
    let mut config = config_with_dirs(vec![]);
    config
        .add_override("vars.missing=https://example/override")
        .unwrap();

    let plan = plan_source(&fixture("manifests/missing-var.yaml"), &config).unwrap();
    assert!(plan
        .fetch_step()
        .command
        .contains("repo='https://example/override'"));
}

#[test]
fn test_manifest_without_fetch_step() {
    let err = plan_source(&fixture("manifests/no-fetch.yaml"), &config_with_dirs(vec![])).unwrap_err();
    assert!(matches!(err, FetchError::NoFetchStepFound));
}

#[test]
fn test_local_pipeline_dir_and_nested_templates() {
    let config = config_with_dirs(vec![fixture("pipelines")]);
    let plan = plan_source(&fixture("manifests/local-fetch.yaml"), &config).unwrap();

    let kinds: Vec<StepKind> = plan.pipeline().iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StepKind::Other,
            StepKind::Other,
            StepKind::Other,
            StepKind::Other,
            StepKind::Fetch,
        ]
    );
    assert_eq!(
        plan.pipeline().steps()[1].command,
        "echo preparing local-x86_64"
    );
    assert!(plan.pipeline().steps()[2]
        .command
        .contains("echo 'https://example/local-x86_64.tar.gz'"));

    let step = plan.fetch_step();
    assert_eq!(step.uses.as_deref(), Some("fetch"));
    assert!(step
        .command
        .contains("echo 'https://example/local-2.0.0-x86_64.tar.gz'"));
}

#[test]
fn test_wrapper_around_fetch_is_not_a_fetch_step() {
    let temp = TempDir::new().unwrap();
    let manifest = temp.path().join("wrapped.yaml");
    fs::write(
        &manifest,
        "package:\n  name: wrapped\n  version: 1.0.0\npipeline:\n  - uses: source/wrapper\n    with:\n      label: w\n",
    )
    .unwrap();

    let err = plan_source(&manifest, &config_with_dirs(vec![fixture("pipelines")])).unwrap_err();
    assert!(matches!(err, FetchError::NoFetchStepFound));
}

#[test]
fn test_top_level_fetch_delegating_to_helper() {
    let temp = TempDir::new().unwrap();
    let pipelines = temp.path().join("pipelines");
    fs::create_dir_all(&pipelines).unwrap();
    fs::write(
        pipelines.join("fetch.yaml"),
        "inputs:\n  uri:\n    required: true\npipeline:\n  - uses: download\n    with:\n      url: ${{inputs.uri}}\n",
    )
    .unwrap();
    fs::write(
        pipelines.join("download.yaml"),
        "inputs:\n  url:\n    required: true\npipeline:\n  - runs: curl -fLO ${{inputs.url}}\n",
    )
    .unwrap();
    let manifest = temp.path().join("delegating.yaml");
    fs::write(
        &manifest,
        "package:\n  name: d\n  version: 3.1\npipeline:\n  - runs: echo first\n  - uses: fetch\n    with:\n      uri: https://example/d-${{package.version}}.tgz\n",
    )
    .unwrap();

    let plan = plan_source(&manifest, &config_with_dirs(vec![pipelines])).unwrap();
    let step = plan.fetch_step();
    assert_eq!(step.kind, StepKind::Fetch);
    assert_eq!(step.uses.as_deref(), Some("download"));
    assert_eq!(step.command, "curl -fLO https://example/d-3.1.tgz");
}

#[test]
fn test_unknown_template_directory_only() {
    let manifest = parse_configuration(&fixture("manifests/local-fetch.yaml")).unwrap();
    let substitutions = SubstitutionMap::new(&manifest, Arch::Aarch64, LibcFlavor::Musl, None).unwrap();
    let templates = DirectoryTemplateSource::new(vec![]).without_builtins();

    match PipelineCompiler::new(&templates)
        .compile(&substitutions, &manifest.pipeline)
        .unwrap_err()
    {
        FetchError::TemplateNotFound { name, .. } => assert_eq!(name, "source/wrapper"),
        other => panic!("Expected TemplateNotFound, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_execute_located_step_into_destination() {
    let original = env::current_dir().unwrap();
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("src/local");

    let config = config_with_dirs(vec![fixture("pipelines")]);
    let plan = plan_source(&fixture("manifests/local-fetch.yaml"), &config).unwrap();
    let executor = CommandExecutor::new();
    let first = executor.execute(&dest, plan.fetch_step());
    let second = executor.execute(&dest, plan.fetch_step());
    env::set_current_dir(&original).unwrap();

    first.unwrap();
    second.unwrap();
    let fetched = fs::read_to_string(dest.join("fetched.txt")).unwrap();
    assert_eq!(fetched.trim(), "https://example/local-2.0.0-x86_64.tar.gz");
}
