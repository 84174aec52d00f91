//! Lock-contention sampling.
//!
//! Contended acquisitions of a [`ProfiledMutex`] are recorded with the time
//! spent waiting, keyed by the caller location. The sample fraction controls
//! how many of those events are kept: 0 disables recording, `n` keeps one
//! event in `n`.

mod mutex;

pub use mutex::ProfiledMutex;

use crate::events::{EventRecord, EventTable};
use std::io::{self, Write};
use std::panic::Location;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

static FRACTION: AtomicU32 = AtomicU32::new(0);
static TICKS: AtomicU64 = AtomicU64::new(0);
static TABLE: EventTable = EventTable::new();

pub fn fraction() -> u32 {
    FRACTION.load(Ordering::Relaxed)
}

/// Set the contention sample fraction, returning the previous one
pub fn set_fraction(fraction: u32) -> u32 {
    FRACTION.swap(fraction, Ordering::SeqCst)
}

pub(crate) fn record(location: &'static Location<'static>, waited: Duration) {
    let fraction = FRACTION.load(Ordering::Relaxed);
    if fraction == 0 {
        return;
    }
    if fraction > 1 && TICKS.fetch_add(1, Ordering::Relaxed) % u64::from(fraction) != 0 {
        return;
    }
    TABLE.record(location, waited);
}

/// Recorded contention, largest total delay first
pub fn snapshot() -> Vec<EventRecord> {
    TABLE.snapshot()
}

pub fn write_profile<W: Write>(out: &mut W) -> io::Result<()> {
    TABLE.write_to("mutex", Some(u64::from(fraction().max(1))), out)
}
