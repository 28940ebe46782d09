//! jobsh: an interactive shell with Unix job control.
//!
//! Usage:
//!   jobsh                  # interactive prompt
//!   jobsh -p < commands    # read commands without printing a prompt

mod commands;
mod completion;
mod config;
mod error;
mod input;
mod job;
mod process;
mod reaper;
mod redirection;
mod report;
mod scheduler;
mod session;
mod signals;
mod terminal;
mod tokenize;

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{Config, Invocation, USAGE};
use crate::error::ShellError;
use crate::input::{Line, LineReader};
use crate::session::{Flow, Session};

fn main() -> ExitCode {
    // Respects RUST_LOG; silent apart from errors otherwise.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match Config::from_args(env::args().skip(1)) {
        Ok(Invocation::Help) => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        Ok(Invocation::Run(config)) => match run(&config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e:?}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {e:#}\n\n{USAGE}");
            ExitCode::FAILURE
        }
    }
}

/// The read loop. Every error from a single line is reported and the loop
/// carries on; only `exit` or end of input leave it.
fn run(config: &Config) -> Result<()> {
    if let Err(e) = signals::ignore_job_control() {
        eprintln!("Warning: could not ignore job control signals: {e}");
    }

    let mut session = Session::start(config);
    let mut reader = LineReader::new(config.prompt.clone()).context("Failed to open input")?;

    loop {
        if session.has_registered_jobs() {
            reaper::reap(session.jobs_mut());
        }

        let line = match reader.read_line() {
            Ok(Line::Text(line)) => line,
            Ok(Line::Eof) => break,
            Err(ShellError::LineTooLong) => {
                eprintln!("{}", ShellError::LineTooLong);
                continue;
            }
            Err(e) => {
                eprintln!("{e}");
                break;
            }
        };

        match session.handle_line(&line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => eprintln!("{e}"),
        }
    }

    session.teardown();
    Ok(())
}
