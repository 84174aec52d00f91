//! Profiling configuration: raw operator options and their resolution into a
//! validated [`SessionConfig`].

use crate::cpu;
use crate::error::{Error, Result};
use crate::kind::{AllocationView, InstrumentKind};
use clap::{ArgAction, Args};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_ALLOCATION_SAMPLE_RATE: usize = 4096;

/// Profiling options as supplied by the operator.
///
/// Flatten into a host CLI with `#[command(flatten)]`; every option also
/// reads from a `WDD_PROFILE_*` environment variable.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RawConfig {
    /// Instruments to enable, comma separated
    /// (cpu, mem, mutex, block, threadcreate, trace, goroutine)
    #[arg(long = "profile-modes", env = "WDD_PROFILE_MODES", value_delimiter = ',')]
    pub modes: Vec<String>,

    /// Directory for profile output (defaults to the current directory)
    #[arg(long = "profile-dir", env = "WDD_PROFILE_DIR_PATH", default_value = "")]
    pub dir_path: String,

    /// Suppress informational log lines from the profiler
    #[arg(long = "profile-quiet", env = "WDD_PROFILE_QUIET", default_value_t = true, action = ArgAction::Set)]
    pub quiet: bool,

    /// Do not stop the session automatically on Ctrl-C
    #[arg(
        long = "profile-no-shutdown-hook",
        env = "WDD_PROFILE_NO_SHUTDOWN_HOOK",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub no_shutdown_hook: bool,

    /// Average bytes between sampled allocations; 1 samples every allocation
    #[arg(
        long = "profile-mem-rate",
        env = "WDD_PROFILE_MEM_PROFILE_RATE",
        default_value_t = 4096,
        allow_negative_numbers = true
    )]
    pub mem_profile_rate: i64,

    /// Allocation view written at stop: heap or alloc
    #[arg(long = "profile-mem-type", env = "WDD_PROFILE_MEM_PROFILE_TYPE", default_value = "heap")]
    pub mem_profile_type: String,

    /// CPU sampling frequency in Hz
    #[arg(
        long = "profile-cpu-freq",
        env = "WDD_PROFILE_CPU_FREQ",
        default_value_t = 100,
        allow_negative_numbers = true
    )]
    pub cpu_frequency: i32,

    /// Exit the process after the interrupt-triggered stop
    #[arg(
        long = "profile-exit-on-interrupt",
        env = "WDD_PROFILE_EXIT_ON_INTERRUPT",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub exit_on_interrupt: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig {
            modes: Vec::new(),
            dir_path: String::new(),
            quiet: true,
            no_shutdown_hook: true,
            mem_profile_rate: DEFAULT_ALLOCATION_SAMPLE_RATE as i64,
            mem_profile_type: AllocationView::Heap.as_str().to_string(),
            cpu_frequency: cpu::DEFAULT_FREQUENCY,
            exit_on_interrupt: true,
        }
    }
}

/// Validated configuration for one profiling session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Requested instruments in operator order; later duplicates are ignored
    pub kinds: Vec<InstrumentKind>,
    /// Existing directory the output files are created in
    pub output_dir: PathBuf,
    pub quiet: bool,
    pub auto_shutdown_on_interrupt: bool,
    pub exit_on_interrupt: bool,
    pub allocation_sample_rate: usize,
    pub allocation_view: AllocationView,
    pub cpu_frequency: i32,
}

impl SessionConfig {
    /// Resolve raw options, applying defaults and creating the output directory.
    ///
    /// Out-of-range values fall back to defaults; only unknown instrument
    /// names and an unusable output directory are errors.
    pub fn resolve(raw: &RawConfig) -> Result<Self> {
        let kinds = raw
            .modes
            .iter()
            .map(|m| InstrumentKind::parse_list(m))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        let allocation_sample_rate = usize::try_from(raw.mem_profile_rate)
            .ok()
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_ALLOCATION_SAMPLE_RATE);

        let cpu_frequency = if raw.cpu_frequency > 0 {
            raw.cpu_frequency
        } else {
            cpu::DEFAULT_FREQUENCY
        };

        Ok(SessionConfig {
            kinds,
            output_dir: prepare_output_dir(&raw.dir_path)?,
            quiet: raw.quiet,
            auto_shutdown_on_interrupt: !raw.no_shutdown_hook,
            exit_on_interrupt: raw.exit_on_interrupt,
            allocation_sample_rate,
            allocation_view: AllocationView::resolve(&raw.mem_profile_type),
            cpu_frequency,
        })
    }

    /// Defaults for everything except the instruments and output directory
    pub fn for_kinds(kinds: &[InstrumentKind], output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir: PathBuf = output_dir.into();
        let raw = RawConfig {
            dir_path: output_dir.to_string_lossy().into_owned(),
            ..RawConfig::default()
        };
        let mut config = Self::resolve(&raw)?;
        config.kinds = kinds.to_vec();
        Ok(config)
    }
}

fn prepare_output_dir(dir_path: &str) -> Result<PathBuf> {
    let dir = if dir_path.trim().is_empty() {
        std::env::current_dir().map_err(|source| Error::OutputDirUnavailable {
            path: PathBuf::from("."),
            source,
        })?
    } else {
        PathBuf::from(dir_path)
    };

    fs::create_dir_all(&dir).map_err(|source| Error::OutputDirUnavailable {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
