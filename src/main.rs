// src/main.rs
use anyhow::Result;
use clap::Parser;
use colorful::Colorful;

use melkit::cli::{run, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&args) {
        eprintln!("{} {:#}", "error:".red(), e);
        std::process::exit(1);
    }
    Ok(())
}
