mod args;
mod config;
mod discovery;
mod flattener;
mod logging;
mod minizinc;
mod mzn_to_fzn;
mod output;
mod signal_handler;

use anyhow::Context;
use args::Args;
use clap::Parser;
use config::Config;
use flattener::Flattener;
use logging::Logger;
use std::io::Write;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let logger = Logger::stderr(args.verbosity);

    match run(args, &logger).await {
        Ok(code) => code,
        Err(e) => {
            logging::error!(logger, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, logger: &Logger) -> anyhow::Result<ExitCode> {
    let minizinc_exe = minizinc::Locator::new(args.minizinc_exe.clone()).resolve()?;
    let config = Config::from_args(&args, minizinc_exe)?;
    let token = CancellationToken::new();
    let flattener = Flattener::new(config, logger.clone(), token.clone());

    if args.dry_run {
        print_plan(&flattener)?;
        return Ok(ExitCode::SUCCESS);
    }

    signal_handler::spawn_signal_handler(token.clone(), logger.clone());
    let summary = flattener.run().await?;
    logging::info!(logger, "{summary}");

    if token.is_cancelled() {
        return Ok(ExitCode::from(EXIT_CANCELLED));
    }
    Ok(ExitCode::SUCCESS)
}

fn print_plan(flattener: &Flattener) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    for item in flattener.plan()? {
        let line = serde_json::to_string(&item)?;
        writeln!(stdout, "{line}").context("failed to write the plan to stdout")?;
    }
    Ok(())
}
