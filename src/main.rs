mod cli;
mod config;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use std::io;
use transfer::{Dispatcher, ExecutorPool, FAILURE_CODE, TransferDispatcher};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let Some(mut invocation) = cli.command.invocation() else {
        if let Command::Completions { shell } = cli.command {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "cloner", &mut io::stdout());
        }
        return Ok(());
    };

    let config = Config::load()?;
    if invocation.flags.local_library.is_none() {
        invocation.flags.local_library = config.library_path();
    }

    let pool = ExecutorPool::new(config.connector());
    let code = match TransferDispatcher::new(&pool).dispatch(&invocation) {
        Ok(response) => {
            ui::print_response(&response, cli.quiet);
            response.return_code()
        }
        Err(e) => {
            ui::error(&e.to_string());
            if e.is_usage() {
                ui::warn(&format!("See 'cloner {} --help'", invocation.operation));
            }
            FAILURE_CODE
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
