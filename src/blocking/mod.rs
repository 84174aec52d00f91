//! Blocking-wait sampling.
//!
//! Code that blocks (channel receives, condvar waits, joins, I/O) wraps the
//! wait in [`observe`] or reports it with [`record_wait`]. The sample rate is
//! in nanoseconds: waits at least that long are always kept, shorter ones are
//! kept about once per `rate` nanoseconds of accumulated waiting. A rate of 0
//! disables recording.

use crate::events::{EventRecord, EventTable, crosses};
use std::io::{self, Write};
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static RATE: AtomicU64 = AtomicU64::new(0);
static SHORT_WAITS: AtomicU64 = AtomicU64::new(0);
static TABLE: EventTable = EventTable::new();

pub fn rate() -> u64 {
    RATE.load(Ordering::Relaxed)
}

/// Set the blocking sample rate, returning the previous one
pub fn set_rate(rate: u64) -> u64 {
    RATE.swap(rate, Ordering::SeqCst)
}

/// Run `f`, recording the time it took as a blocking wait at the caller
#[track_caller]
pub fn observe<R>(f: impl FnOnce() -> R) -> R {
    if rate() == 0 {
        return f();
    }
    let location = Location::caller();
    let started = Instant::now();
    let result = f();
    record_at(location, started.elapsed());
    result
}

/// Record a wait that was measured by the caller
#[track_caller]
pub fn record_wait(waited: Duration) {
    record_at(Location::caller(), waited);
}

fn record_at(location: &'static Location<'static>, waited: Duration) {
    let rate = rate();
    if rate == 0 {
        return;
    }
    let nanos = u64::try_from(waited.as_nanos()).unwrap_or(u64::MAX);
    if rate == 1 || nanos >= rate || crosses(&SHORT_WAITS, nanos, rate) {
        TABLE.record(location, waited);
    }
}

/// Recorded waits, largest total delay first
pub fn snapshot() -> Vec<EventRecord> {
    TABLE.snapshot()
}

pub fn write_profile<W: Write>(out: &mut W) -> io::Result<()> {
    TABLE.write_to("contention", None, out)
}
