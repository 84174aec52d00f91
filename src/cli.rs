use crate::config::RawConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "profsession")]
#[command(about = "Run-scoped profiling sessions with one output file per instrument")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the instrument kinds and the files they write
    Kinds,

    /// List profile files in an output directory
    List {
        /// Directory to search (defaults to current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Profile a synthetic workload
    Demo {
        #[command(flatten)]
        profile: RawConfig,

        /// How long the workload runs (stops early on Ctrl-C)
        #[arg(long, short = 'd', default_value = "5s", value_parser = parse_duration)]
        duration: Duration,

        /// Worker threads in the workload
        #[arg(long, short = 'w', default_value = "4")]
        workers: usize,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    if let Ok(d) = humantime::parse_duration(s) {
        return Ok(d);
    }

    // Bare number as seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    Err(format!(
        "Invalid duration '{}'. Examples: 30s, 5m, 2h, 1h30m, 90",
        s
    ))
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Demo {
            workers, duration, ..
        } = &self.command
        {
            if *workers == 0 || *workers > 256 {
                return Err(format!(
                    "Worker count must be between 1 and 256, got {}",
                    workers
                ));
            }
            if duration.is_zero() {
                return Err("Duration must be greater than zero".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_demo_flags() {
        let cli = Cli::try_parse_from([
            "profsession",
            "demo",
            "--profile-modes",
            "mutex,block",
            "--duration",
            "250ms",
        ])
        .unwrap();
        cli.validate().unwrap();
        match cli.command {
            Command::Demo {
                profile,
                duration,
                workers,
            } => {
                assert_eq!(profile.modes, vec!["mutex", "block"]);
                assert_eq!(duration, Duration::from_millis(250));
                assert_eq!(workers, 4);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        let cli = Cli::try_parse_from(["profsession", "demo", "--workers", "0"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
