use crate::cli::commands::CliArgs;
use crate::cli::output::OutputFormatter;
use crate::config::FetchConfig;
use crate::executor::CommandExecutor;
use crate::source::plan_source;

use anyhow::{Context, Result};
use tracing::{debug, error};

/// Runs one invocation and returns the process exit code.
pub fn handle_fetch(args: &CliArgs, config: &FetchConfig) -> i32 {
    match run_fetch(args, config) {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Layers command line flags over the environment defaults.
pub fn build_config(args: &CliArgs) -> Result<FetchConfig> {
    let mut config = FetchConfig::default();

    if let Some(arch) = &args.arch {
        config.arch = arch.clone();
    }
    if let Some(libc) = &args.libc {
        config.libc = libc.clone();
    }
    if !args.pipeline_dirs.is_empty() {
        config.pipeline_dirs = args.pipeline_dirs.clone();
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.to_lowercase();
    } else if args.verbose {
        config.log_level = "debug".to_string();
    } else if args.quiet {
        config.log_level = "error".to_string();
    }
    for entry in &args.vars {
        config.add_override(entry)?;
    }

    config.validate()?;
    Ok(config)
}

fn run_fetch(args: &CliArgs, config: &FetchConfig) -> Result<()> {
    debug!(?config, "Resolved configuration");

    // Everything that can fail on manifest content happens before the destination is touched.
    let plan = plan_source(&args.manifest, config).with_context(|| {
        format!(
            "Failed to locate source fetching step in {}",
            args.manifest.display()
        )
    })?;
    let step = plan.fetch_step();

    if args.dry_run {
        let output = OutputFormatter::new(args.format.into()).format_plan(step, plan.pipeline())?;
        print!("{}", output);
        return Ok(());
    }

    if !args.quiet {
        println!(
            "Found source fetching step: {}.\nFetching source to {}",
            step.kind,
            args.destination.display()
        );
    }

    CommandExecutor::new()
        .execute(&args.destination, step)
        .with_context(|| format!("Failed to fetch source into {}", args.destination.display()))
}
