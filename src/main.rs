//! Binary entry point: set up logging, parse the command line and hand off to
//! the library's CLI layer, which opens the log and runs one command.
use clap::Parser;
use hamlog::cli::{self, Cli};

/// Parse arguments and run a single command. Returning a `Result` lets fatal
/// problems (an unwritable data directory, a failed import) reach the
/// terminal with their full context chain.
fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "hamlog=debug" } else { "hamlog=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    cli::run(args)
}
