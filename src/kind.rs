//! Instrument kinds and their canonical output files.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// One kind of runtime measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    ExecutionTime,
    HeapAllocation,
    LockContention,
    BlockingWait,
    ThreadCreation,
    ExecutionTrace,
    GoroutineSnapshot,
}

impl InstrumentKind {
    pub const ALL: [InstrumentKind; 7] = [
        InstrumentKind::ExecutionTime,
        InstrumentKind::HeapAllocation,
        InstrumentKind::LockContention,
        InstrumentKind::BlockingWait,
        InstrumentKind::ThreadCreation,
        InstrumentKind::ExecutionTrace,
        InstrumentKind::GoroutineSnapshot,
    ];

    /// File name the instrument writes to inside the output directory
    pub const fn output_file_name(self) -> &'static str {
        match self {
            InstrumentKind::ExecutionTime => "cpu.pprof",
            InstrumentKind::HeapAllocation => "mem.pprof",
            InstrumentKind::LockContention => "mutex.pprof",
            InstrumentKind::BlockingWait => "block.pprof",
            InstrumentKind::ThreadCreation => "threadcreate.pprof",
            InstrumentKind::ExecutionTrace => "trace.out",
            InstrumentKind::GoroutineSnapshot => "goroutine.pprof",
        }
    }

    /// Short mode name, as used in comma separated mode lists
    pub const fn mode_name(self) -> &'static str {
        match self {
            InstrumentKind::ExecutionTime => "cpu",
            InstrumentKind::HeapAllocation => "mem",
            InstrumentKind::LockContention => "mutex",
            InstrumentKind::BlockingWait => "block",
            InstrumentKind::ThreadCreation => "threadcreate",
            InstrumentKind::ExecutionTrace => "trace",
            InstrumentKind::GoroutineSnapshot => "goroutine",
        }
    }

    pub const fn descriptive_name(self) -> &'static str {
        match self {
            InstrumentKind::ExecutionTime => "execution-time",
            InstrumentKind::HeapAllocation => "heap-allocation",
            InstrumentKind::LockContention => "lock-contention",
            InstrumentKind::BlockingWait => "blocking-wait",
            InstrumentKind::ThreadCreation => "thread-creation",
            InstrumentKind::ExecutionTrace => "execution-trace",
            InstrumentKind::GoroutineSnapshot => "goroutine-snapshot",
        }
    }

    /// Parse a comma separated mode list, skipping empty entries
    pub fn parse_list(list: &str) -> Result<Vec<InstrumentKind>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptive_name())
    }
}

impl FromStr for InstrumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Accept "ExecutionTime", "execution-time", "execution_time" and "cpu" alike
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        let kind = match normalized.as_str() {
            "cpu" | "executiontime" => InstrumentKind::ExecutionTime,
            "mem" | "heap" | "heapallocation" => InstrumentKind::HeapAllocation,
            "mutex" | "lockcontention" => InstrumentKind::LockContention,
            "block" | "blockingwait" => InstrumentKind::BlockingWait,
            "threadcreate" | "threadcreation" => InstrumentKind::ThreadCreation,
            "trace" | "executiontrace" => InstrumentKind::ExecutionTrace,
            "goroutine" | "goroutinesnapshot" => InstrumentKind::GoroutineSnapshot,
            _ => return Err(Error::UnknownInstrumentKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// Which allocation view the heap instrument snapshots at stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationView {
    /// Memory still in use
    #[default]
    Heap,
    /// Everything allocated since the allocator was installed
    Alloc,
}

impl AllocationView {
    /// Anything other than exactly "alloc" is `Heap`
    pub fn resolve(s: &str) -> Self {
        match s {
            "alloc" => AllocationView::Alloc,
            _ => AllocationView::Heap,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AllocationView::Heap => "heap",
            AllocationView::Alloc => "alloc",
        }
    }
}

impl fmt::Display for AllocationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
