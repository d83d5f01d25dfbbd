//! photosync: push a local photo tree into S3-compatible storage.
//!
//! Exit status: 0 when every file synced, 1 when any file or delete failed,
//! 2 for usage and configuration errors, 130 when interrupted.

mod cli;
mod error;
mod report;
mod run;

use crate::cli::Args;
use crate::error::Exit;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            println!("ERROR cannot start async runtime ({e})");
            return Exit::Failures.into();
        },
    };
    let outcome = runtime.block_on(run::run(args));
    // An interrupted delete prompt may still be blocked reading stdin.
    runtime.shutdown_background();
    match outcome {
        Ok(exit) => exit.into(),
        Err(err) => {
            println!("ERROR {err}");
            tracing::debug!(error = ?err, "run failed");
            err.exit().into()
        },
    }
}
