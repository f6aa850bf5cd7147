// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagewerk — local-first page transformation engine
//
// Entry point. Initialises logging, loads configuration, and runs one command.

mod cli;
mod commands;
mod data_dir;
mod output;

use std::process::ExitCode;

use clap::Parser;
use pagewerk_core::EngineConfig;
use pagewerk_core::error::Result;
use pagewerk_core::human_errors::humanize_error;

use cli::Cli;
use commands::Context;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            tracing::error!(error = %err, "command failed");
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_or_default(data_dir::data_dir())?,
    };

    let ctx = Context {
        config,
        out_dir: cli.out,
    };
    for path in commands::run(cli.command, &ctx)? {
        println!("{}", path.display());
    }
    Ok(())
}
