//! Execution trace recording built on `tracing`.
//!
//! The host adds [`TraceLayer`] to its subscriber once. While a trace is
//! active every span creation, enter, exit, close and event is appended to
//! the trace sink as one line:
//!
//! ```text
//! <ns since start> <thread> <kind> <target> <name> <fields>
//! ```
//!
//! There is a single sink per process, so a second [`start`] fails until the
//! first trace is stopped.

mod layer;

pub use layer::TraceLayer;

use crate::error::{Error, Result};
use crate::kind::InstrumentKind;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Instant;

const HEADER: &str = "rust execution trace v1";

static ACTIVE: AtomicBool = AtomicBool::new(false);
static ATTACHED: AtomicBool = AtomicBool::new(false);
static SINK: Mutex<Option<TraceSink>> = Mutex::new(None);
static RECORDS: AtomicU64 = AtomicU64::new(0);

struct TraceSink {
    out: BufWriter<File>,
    started: Instant,
    error: Option<io::Error>,
}

/// Whether a trace is currently being recorded
pub fn is_active() -> bool {
    ACTIVE.load(Ordering::Acquire)
}

/// Whether a [`TraceLayer`] has been created in this process
pub fn layer_attached() -> bool {
    ATTACHED.load(Ordering::Relaxed)
}

/// Begin recording into `file`. Fails if a trace is already active.
pub fn start(file: &File) -> Result<()> {
    let mut slot = SINK.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(Error::InstrumentStart {
            kind: InstrumentKind::ExecutionTrace,
            reason: "execution trace already active".to_string(),
        });
    }

    let handle = file.try_clone().map_err(|e| Error::InstrumentStart {
        kind: InstrumentKind::ExecutionTrace,
        reason: format!("could not share trace output: {e}"),
    })?;
    let mut out = BufWriter::new(handle);
    writeln!(out, "{HEADER}").map_err(|e| Error::InstrumentStart {
        kind: InstrumentKind::ExecutionTrace,
        reason: format!("could not write trace header: {e}"),
    })?;

    *slot = Some(TraceSink {
        out,
        started: Instant::now(),
        error: None,
    });
    RECORDS.store(0, Ordering::Relaxed);
    ACTIVE.store(true, Ordering::Release);
    Ok(())
}

/// End recording, flush the sink and return the number of records written.
///
/// Returns `Ok(None)` when no trace was active.
pub fn stop() -> io::Result<Option<u64>> {
    let sink = {
        let mut slot = SINK.lock().unwrap_or_else(PoisonError::into_inner);
        ACTIVE.store(false, Ordering::Release);
        slot.take()
    };

    let Some(mut sink) = sink else {
        return Ok(None);
    };
    if let Some(e) = sink.error.take() {
        return Err(e);
    }
    sink.out.flush()?;
    Ok(Some(RECORDS.load(Ordering::Relaxed)))
}

pub(crate) fn write_record(kind: &str, target: &str, name: &str, fields: &str) {
    if !is_active() {
        return;
    }

    let mut slot = SINK.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(sink) = slot.as_mut() else {
        return;
    };
    if sink.error.is_some() {
        return;
    }

    let written = writeln!(
        sink.out,
        "{} {:?} {} {} {} {}",
        sink.started.elapsed().as_nanos(),
        thread::current().id(),
        kind,
        target,
        name,
        fields
    );
    match written {
        Ok(()) => {
            RECORDS.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => sink.error = Some(e),
    }
}

fn mark_attached() {
    ATTACHED.store(true, Ordering::Relaxed);
}
