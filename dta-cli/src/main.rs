//! `dta-learn`: load a target automaton from its JSON persistence file,
//! learn a hypothesis for it from scratch, and report the result.

mod cli;
mod errors;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use cli::{Cli, Command};
use dta_constraints::oracle::DifferenceLogicOracle;
use dta_learner::{DtaTeacher, LearnerConfig};
use errors::CliError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Learn { path } => run_learn(&path),
    }
}

fn run_learn(path: &std::path::Path) -> Result<(), CliError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    let target = dta_format::import(&contents)?;

    let oracle = DifferenceLogicOracle;
    let mut teacher = DtaTeacher::new(&target, &oracle);
    let config = LearnerConfig::default();

    let started = Instant::now();
    let hypothesis = dta_learner::learn(target.alphabet(), target.clocks(), &mut teacher, &config)?;
    let elapsed = started.elapsed();

    let rendered = dta_format::export(&hypothesis)?;
    println!("{rendered}");

    eprintln!(
        "learned in {elapsed:?}: {} membership queries, {} equivalence queries",
        teacher.membership_queries(),
        teacher.equivalence_queries(),
    );

    Ok(())
}
