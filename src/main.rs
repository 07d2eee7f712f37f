use fetch_melange_source::cli::commands::CliArgs;
use fetch_melange_source::cli::handlers::{build_config, handle_fetch};
use fetch_melange_source::util::logging::{init_logging, LoggingConfig};
use fetch_melange_source::{FetchConfig, NAME, VERSION};

use clap::Parser;
use std::env;
use std::process;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };
    init_logging_from_config(&config);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    process::exit(handle_fetch(&args, &config));
}

fn init_logging_from_config(config: &FetchConfig) {
    let use_json = env::var("FETCH_MELANGE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        // validated by build_config
        level: config.level().unwrap_or(Level::ERROR),
        use_json,
        ..Default::default()
    });
}
