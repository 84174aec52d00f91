use crate::error::{Error, Result};
use crate::kind::InstrumentKind;
use pprof::ProfilerGuard;
use pprof::protos::Message;
use std::io::{self, Write};

/// Running CPU profile. Sampling stops when the profiler is finished or dropped.
pub struct CpuProfiler {
    guard: ProfilerGuard<'static>,
}

impl CpuProfiler {
    /// Begin sampling call stacks `frequency` times per second.
    ///
    /// Fails if another CPU profile is already running in this process.
    pub fn start(frequency: i32) -> Result<Self> {
        let guard = ProfilerGuard::new(frequency).map_err(|e| Error::InstrumentStart {
            kind: InstrumentKind::ExecutionTime,
            reason: e.to_string(),
        })?;
        Ok(CpuProfiler { guard })
    }

    /// Build the report, write it as a pprof protobuf and stop sampling
    pub fn finish<W: Write>(self, out: &mut W) -> io::Result<()> {
        let report = self
            .guard
            .report()
            .build()
            .map_err(|e| io::Error::other(format!("failed to build CPU report: {e}")))?;
        let profile = report
            .pprof()
            .map_err(|e| io::Error::other(format!("failed to encode CPU profile: {e}")))?;

        let mut buf = Vec::new();
        profile
            .encode(&mut buf)
            .map_err(|e| io::Error::other(format!("failed to encode CPU profile: {e}")))?;
        out.write_all(&buf)?;
        out.flush()
    }
}
