//! CLI entry point for point-pattern reconstruction

use clap::Parser;
use spatrecon::io::cli::{Cli, CommandRunner};

fn main() -> spatrecon::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();
    CommandRunner::new(cli).run()
}
