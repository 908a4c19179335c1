mod config;
mod fixtures;
mod test_runner;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::test_runner::TestRunner;

#[derive(Parser, Debug)]
#[command(version, about = "Replay recorded blocks through the indexer and check expectations")]
struct Args {
    /// Name of the package to test
    #[arg(long, default_value = "ethereum-tokenstream-party")]
    package: String,

    /// Print each organization's activity feed after its test
    #[arg(long, default_value_t = false)]
    feed: bool,

    /// Disable colored diffs
    #[arg(long, default_value_t = false)]
    no_color: bool,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let test_runner = TestRunner::new(args.package, args.feed, !args.no_color);

    test_runner.run_tests()
}
