//! Execution-time sampling.
//!
//! Backed by the `pprof` crate's signal based sampler when the `cpu` feature
//! is enabled. Without it the facility is unavailable: sessions still start,
//! and the output file is left empty.

#[cfg(feature = "cpu")]
mod sampler;

#[cfg(feature = "cpu")]
pub use sampler::CpuProfiler;

#[cfg(not(feature = "cpu"))]
mod stub;

#[cfg(not(feature = "cpu"))]
pub use stub::CpuProfiler;

/// Default sampling frequency in Hz
pub const DEFAULT_FREQUENCY: i32 = 100;

/// Check if CPU sampling is available at compile time
pub const fn cpu_compiled() -> bool {
    cfg!(feature = "cpu")
}
