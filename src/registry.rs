//! Instrument registry: maps each [`InstrumentKind`] to its start/stop
//! behavior and output file.
//!
//! Every kind has its own instrument type, and each one owns whatever it has
//! to carry from `start` to `stop` (the heap instrument keeps the sample rate
//! it replaced, the CPU instrument keeps its running profiler).

use crate::config::SessionConfig;
use crate::cpu::{self, CpuProfiler};
use crate::error::{Error, Result};
use crate::kind::{AllocationView, InstrumentKind};
use crate::{blocking, contention, heap, threads, trace};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter};

/// Start/stop behavior of one instrument. `sink` is the instrument's open
/// output file; stop behaviors write their snapshot into it.
pub trait Instrument: Send {
    fn start(&mut self, sink: &mut File) -> Result<()>;
    fn stop(&mut self, sink: &mut File) -> Result<()>;
}

/// Per-session parameters the instruments are built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentSettings {
    pub allocation_sample_rate: usize,
    pub allocation_view: AllocationView,
    pub cpu_frequency: i32,
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        InstrumentSettings {
            allocation_sample_rate: crate::config::DEFAULT_ALLOCATION_SAMPLE_RATE,
            allocation_view: AllocationView::Heap,
            cpu_frequency: cpu::DEFAULT_FREQUENCY,
        }
    }
}

impl From<&SessionConfig> for InstrumentSettings {
    fn from(config: &SessionConfig) -> Self {
        InstrumentSettings {
            allocation_sample_rate: config.allocation_sample_rate,
            allocation_view: config.allocation_view,
            cpu_frequency: config.cpu_frequency,
        }
    }
}

pub struct InstrumentDefinition {
    kind: InstrumentKind,
    instrument: Box<dyn Instrument>,
}

impl InstrumentDefinition {
    pub fn for_kind(kind: InstrumentKind, settings: &InstrumentSettings) -> Self {
        let instrument: Box<dyn Instrument> = match kind {
            InstrumentKind::ExecutionTime => Box::new(ExecutionTime {
                frequency: settings.cpu_frequency,
                profiler: None,
            }),
            InstrumentKind::HeapAllocation => Box::new(HeapAllocation {
                rate: settings.allocation_sample_rate,
                view: settings.allocation_view,
                saved_rate: None,
            }),
            InstrumentKind::LockContention => Box::new(LockContention),
            InstrumentKind::BlockingWait => Box::new(BlockingWait),
            InstrumentKind::ThreadCreation => Box::new(ThreadCreation),
            InstrumentKind::ExecutionTrace => Box::new(ExecutionTrace),
            InstrumentKind::GoroutineSnapshot => Box::new(GoroutineSnapshot),
        };
        InstrumentDefinition { kind, instrument }
    }

    pub fn kind(&self) -> InstrumentKind {
        self.kind
    }

    pub fn output_file_name(&self) -> &'static str {
        self.kind.output_file_name()
    }

    pub fn start(&mut self, sink: &mut File) -> Result<()> {
        self.instrument.start(sink)
    }

    pub fn stop(&mut self, sink: &mut File) -> Result<()> {
        self.instrument.stop(sink)
    }
}

impl fmt::Debug for InstrumentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentDefinition")
            .field("kind", &self.kind)
            .field("output_file_name", &self.output_file_name())
            .finish()
    }
}

/// Definitions for `kinds` in caller order, keeping the first occurrence of each kind
pub fn definitions_for(
    kinds: &[InstrumentKind],
    settings: &InstrumentSettings,
) -> Vec<InstrumentDefinition> {
    let mut seen = Vec::with_capacity(kinds.len());
    kinds
        .iter()
        .filter(|kind| {
            if seen.contains(*kind) {
                false
            } else {
                seen.push(**kind);
                true
            }
        })
        .map(|kind| InstrumentDefinition::for_kind(*kind, settings))
        .collect()
}

/// Like [`definitions_for`], parsing kind names first
pub fn definitions_for_names<S: AsRef<str>>(
    names: &[S],
    settings: &InstrumentSettings,
) -> Result<Vec<InstrumentDefinition>> {
    let kinds = names
        .iter()
        .map(|name| name.as_ref().parse())
        .collect::<Result<Vec<InstrumentKind>>>()?;
    Ok(definitions_for(&kinds, settings))
}

fn write_failure(kind: InstrumentKind) -> impl FnOnce(io::Error) -> Error {
    move |source| Error::OutputWrite { kind, source }
}

struct ExecutionTime {
    frequency: i32,
    profiler: Option<CpuProfiler>,
}

impl Instrument for ExecutionTime {
    fn start(&mut self, _sink: &mut File) -> Result<()> {
        self.profiler = Some(CpuProfiler::start(self.frequency)?);
        Ok(())
    }

    fn stop(&mut self, sink: &mut File) -> Result<()> {
        match self.profiler.take() {
            Some(profiler) => profiler
                .finish(sink)
                .map_err(write_failure(InstrumentKind::ExecutionTime)),
            None => Ok(()),
        }
    }
}

struct HeapAllocation {
    rate: usize,
    view: AllocationView,
    saved_rate: Option<usize>,
}

impl Instrument for HeapAllocation {
    fn start(&mut self, _sink: &mut File) -> Result<()> {
        self.saved_rate = Some(heap::set_sample_rate(self.rate));
        Ok(())
    }

    fn stop(&mut self, sink: &mut File) -> Result<()> {
        let written = match heap::HeapProfile::capture() {
            Some(profile) => profile.write_to(self.view, &mut BufWriter::new(&mut *sink)),
            None => Ok(()),
        };
        if let Some(saved) = self.saved_rate.take() {
            heap::set_sample_rate(saved);
        }
        written.map_err(write_failure(InstrumentKind::HeapAllocation))
    }
}

struct LockContention;

impl Instrument for LockContention {
    fn start(&mut self, _sink: &mut File) -> Result<()> {
        contention::set_fraction(1);
        Ok(())
    }

    fn stop(&mut self, sink: &mut File) -> Result<()> {
        let written = contention::write_profile(&mut BufWriter::new(&mut *sink));
        contention::set_fraction(0);
        written.map_err(write_failure(InstrumentKind::LockContention))
    }
}

struct BlockingWait;

impl Instrument for BlockingWait {
    fn start(&mut self, _sink: &mut File) -> Result<()> {
        blocking::set_rate(1);
        Ok(())
    }

    fn stop(&mut self, sink: &mut File) -> Result<()> {
        let written = blocking::write_profile(&mut BufWriter::new(&mut *sink));
        blocking::set_rate(0);
        written.map_err(write_failure(InstrumentKind::BlockingWait))
    }
}

struct ThreadCreation;

impl Instrument for ThreadCreation {
    fn start(&mut self, _sink: &mut File) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self, sink: &mut File) -> Result<()> {
        match threads::list() {
            Some(list) => threads::write_threadcreate(&list, &mut BufWriter::new(&mut *sink))
                .map_err(write_failure(InstrumentKind::ThreadCreation)),
            None => Ok(()),
        }
    }
}

struct ExecutionTrace;

impl Instrument for ExecutionTrace {
    fn start(&mut self, sink: &mut File) -> Result<()> {
        trace::start(sink)
    }

    fn stop(&mut self, _sink: &mut File) -> Result<()> {
        trace::stop()
            .map(|_| ())
            .map_err(write_failure(InstrumentKind::ExecutionTrace))
    }
}

struct GoroutineSnapshot;

impl Instrument for GoroutineSnapshot {
    fn start(&mut self, _sink: &mut File) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self, sink: &mut File) -> Result<()> {
        match threads::list() {
            Some(list) => threads::write_goroutine(&list, &mut BufWriter::new(&mut *sink))
                .map_err(write_failure(InstrumentKind::GoroutineSnapshot)),
            None => Ok(()),
        }
    }
}
