use std::process::ExitCode;

use clap::Parser;

use tiffedit::logger::{self, Level};
use tiffedit::cli;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    // Session log is overwritten each run; -v mirrors warnings to stderr
    let log_path = args.log_file.clone().unwrap_or_else(logger::default_log_path);
    logger::init_at(log_path, args.verbose.then_some(Level::Warn));

    cli::run(args)
}
