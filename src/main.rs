use anyhow::Context;
use clap::Parser;
use profsession::cli::{Cli, Command};
use profsession::error::exit_code;
use profsession::trace::TraceLayer;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

profsession::sampling_allocator!();

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(session_err) = e.downcast_ref::<profsession::Error>() {
                ExitCode::from(session_err.exit_code() as u8)
            } else {
                ExitCode::from(exit_code::GENERAL_ERROR as u8)
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(TraceLayer::new())
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    cli.validate()
        .map_err(profsession::Error::InvalidArgument)
        .context("Invalid arguments")?;

    init_tracing();

    match cli.command {
        Command::Kinds => profsession::commands::kinds::run(),
        Command::List { dir } => {
            profsession::commands::list::run(dir.as_deref())?;
        }
        Command::Demo {
            profile,
            duration,
            workers,
        } => {
            profsession::commands::demo::run(&profile, duration, workers)?;
        }
        Command::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "profsession", &mut std::io::stdout());
        }
    }

    Ok(())
}
