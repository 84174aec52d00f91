//! Run-scoped profiling sessions.
//!
//! A host program builds a [`SessionConfig`] (usually from [`RawConfig`]
//! flattened into its own CLI), creates a [`Profiler`], starts it and stops it
//! before exiting. Each enabled instrument writes one file into the output
//! directory.
//!
//! ```rust,ignore
//! profsession::sampling_allocator!();
//!
//! let config = SessionConfig::for_kinds(&[InstrumentKind::HeapAllocation], "profiles")?;
//! let profiler = Profiler::new(config);
//! profiler.start()?;
//! run_workload();
//! profiler.stop().into_result()?;
//! ```

pub mod blocking;
pub mod cli;
pub mod commands;
pub mod config;
pub mod contention;
pub mod cpu;
pub mod error;
mod events;
pub mod heap;
pub mod kind;
pub mod registry;
pub mod session;
pub mod shutdown;
pub mod threads;
pub mod trace;

#[cfg(test)]
mod test_support;

pub use config::{RawConfig, SessionConfig};
pub use error::{Error, Result};
pub use events::{EventRecord, EventStats};
pub use kind::{AllocationView, InstrumentKind};
pub use session::{Profiler, SessionRegistry, SessionState, StopReport};
