use std::io::Write;

use anyhow::{anyhow, Context, Result};

use crate::account::helper::HelperAccount;
use crate::account::Account;
use crate::api::cli::Cli;
use crate::config::config::Config;
use crate::credentials::Credentials;
use crate::interrupt::StopSignal;
use crate::runner::Runner;
use crate::types::WritePolicy;

mod account;
mod api;
mod archive;
mod config;
mod credentials;
mod interrupt;
mod normalizer;
mod permalink;
mod retry;
mod runner;
mod sync;
mod types;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli {};
    let program = cli.run();

    let mut config = Config::new_from_file(program.config)?;
    config.apply_overrides(
        program.output_file,
        program.delay_between_requests,
        program.mode,
        program.max_runs,
        program.delay_between_runs,
        program.dedupe_history,
    )?;

    let policy = resolve_write_policy(&config.get_write_mode())?;

    let credentials_file = config.get_credentials_file()?;
    let credentials = Credentials::from_file(&credentials_file)?;

    let account: Box<dyn Account> = Box::new(HelperAccount::new(
        config.get_helper_program(),
        credentials,
    ));

    let stop = StopSignal::install()?;

    let runner = Runner {
        account: account.as_ref(),
        stop: &stop,
        archive_file: config.get_archive_file()?,
        policy,
        dedupe_history: config.get_dedupe_history(),
        base_url: config.get_base_url(),
        request_delay: config.get_request_delay(),
    };

    let report = sync::synchronize(
        &runner,
        &stop,
        program.single_run,
        config.get_max_runs(),
        config.get_run_delay(),
    )?;

    println!();
    println!("Done: {}", report.stop);
    println!(
        "Total saved: {}, total removed: {}, runs: {}",
        report.total_saved, report.total_removed, report.runs
    );

    Ok(())
}

fn resolve_write_policy(mode: &str) -> Result<WritePolicy> {
    match mode {
        "a" => Ok(WritePolicy::Append),
        "p" => Ok(WritePolicy::Prepend),
        "ask" => ask_write_policy(),
        other => Err(anyhow!("Unknown write mode: {other}")),
    }
}

// The interactive choice is settled once, up front, so later runs of the
// loop never block on stdin.
fn ask_write_policy() -> Result<WritePolicy> {
    loop {
        print!("Prepend (p) or append (a) new bookmarks? [p/a] (default a): ");
        std::io::stdout().flush()?;

        let mut choice = String::new();
        std::io::stdin()
            .read_line(&mut choice)
            .context("Could not read the write mode answer")?;

        match choice.trim().to_lowercase().as_str() {
            "" | "a" => return Ok(WritePolicy::Append),
            "p" => return Ok(WritePolicy::Prepend),
            _ => println!("Invalid choice. Please enter 'p' for prepend or 'a' for append."),
        }
    }
}
