use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Extract the upstream source referenced by a melange build manifest
#[derive(Parser, Debug)]
#[command(
    name = "fetch-melange-source",
    about = "Extract the upstream source referenced by a melange build manifest",
    version,
    long_about = "Compiles the manifest's pipeline, finds the first git-checkout or fetch \
                  step and runs it inside the destination directory.\n\n\
                  Examples:\n  \
                  fetch-melange-source hello.yaml /tmp/hello-src\n  \
                  fetch-melange-source --arch arm64 --libc musl hello.yaml out\n  \
                  fetch-melange-source --var vars.mirror=https://mirror.local hello.yaml out\n  \
                  fetch-melange-source --dry-run --format json hello.yaml out"
)]
pub struct CliArgs {
    #[arg(value_name = "MANIFEST", help = "Path to the melange YAML manifest")]
    pub manifest: PathBuf,

    #[arg(
        value_name = "DESTINATION",
        help = "Directory to fetch the source into (created if missing)"
    )]
    pub destination: PathBuf,

    #[arg(
        long,
        value_name = "ARCH",
        help = "Target architecture (default: amd64, or FETCH_MELANGE_ARCH)"
    )]
    pub arch: Option<String>,

    #[arg(
        long,
        value_name = "LIBC",
        help = "C library flavor: gnu or musl (default: gnu, or FETCH_MELANGE_LIBC)"
    )]
    pub libc: Option<String>,

    #[arg(
        long = "pipeline-dir",
        value_name = "DIR",
        help = "Directory to search for pipeline templates (repeatable, searched in order)"
    )]
    pub pipeline_dirs: Vec<PathBuf>,

    #[arg(
        long = "var",
        value_name = "KEY=VALUE",
        help = "Override a substitution variable, e.g. vars.mirror=https://... (repeatable)"
    )]
    pub vars: Vec<String>,

    #[arg(long, help = "Compile and locate the fetch step without running it")]
    pub dry_run: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format for --dry-run"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
