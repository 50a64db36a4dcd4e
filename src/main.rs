//! chimpsync CLI: sync Mailchimp campaigns; use --dry-run to see what would be fetched.

use anyhow::Result;
use chimpsync::engine::arg_parser::Cli;
use chimpsync::engine::handle_run;
use clap::Parser;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
