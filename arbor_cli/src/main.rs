//! Arbor: build, simulate and check the tree-walk kernel.

mod args;
mod config;
mod error;
mod runner;

use args::Action;
use config::RunConfig;
use error::{CliError, EXIT_SUCCESS};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let args = match args::parse_args(std::env::args_os().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            let e = CliError::from(e);
            eprintln!("arbor: {}", e);
            eprintln!("Try `arbor -h' for more information.");
            return e.exit_code();
        }
    };

    match args.action {
        Action::PrintHelp => {
            print!("{}", args::HELP);
            return ExitCode::from(EXIT_SUCCESS);
        }
        Action::PrintVersion => {
            println!("arbor {}", arbor_core::VERSION);
            return ExitCode::from(EXIT_SUCCESS);
        }
        Action::Run => {}
    }

    let config = RunConfig::from_args(&args);
    init_tracing(config.quiet);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match runner::run(&config, &mut out) {
        Ok(report) => {
            if !config.quiet {
                println!(
                    "height {} batch {} rounds {}: {} cycles ({:.2}x), {} bundles, {} words",
                    config.forest_height,
                    config.batch_size,
                    config.rounds,
                    report.cycles,
                    report.speedup(),
                    report.stats.bundles,
                    report.stats.scratch_used,
                );
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("arbor: {}", e);
            e.exit_code()
        }
    }
}

/// Install the fmt subscriber, filtered by `ARBOR_LOG`.
fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("ARBOR_LOG")
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
