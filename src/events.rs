//! Delay-event tables shared by the lock-contention and blocking-wait instruments.
//!
//! Events are keyed by the caller location captured with `#[track_caller]`.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Delay timestamps are written in nanoseconds
const CYCLES_PER_SECOND: u64 = 1_000_000_000;

/// Advance `stream` by `amount` and report whether a multiple of `rate` was crossed
pub(crate) fn crosses(stream: &AtomicU64, amount: u64, rate: u64) -> bool {
    let before = stream.fetch_add(amount, Ordering::Relaxed);
    let after = before.wrapping_add(amount);
    before / rate != after / rate
}

/// Accumulated delay for one call site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventStats {
    pub count: u64,
    pub delay: Duration,
}

/// One row of a delay profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub location: &'static Location<'static>,
    pub stats: EventStats,
}

pub struct EventTable {
    entries: Mutex<BTreeMap<&'static Location<'static>, EventStats>>,
}

impl EventTable {
    pub const fn new() -> Self {
        EventTable {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn record(&self, location: &'static Location<'static>, delay: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let stats = entries.entry(location).or_default();
        stats.count += 1;
        stats.delay += delay;
    }

    /// Rows ordered by total delay, largest first
    pub fn snapshot(&self) -> Vec<EventRecord> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<EventRecord> = entries
            .iter()
            .map(|(location, stats)| EventRecord {
                location: *location,
                stats: *stats,
            })
            .collect();
        records.sort_by(|a, b| b.stats.delay.cmp(&a.stats.delay));
        records
    }

    /// Write the table in the legacy text contention format
    pub fn write_to<W: Write>(
        &self,
        header: &str,
        sampling_period: Option<u64>,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "--- {header}:")?;
        writeln!(out, "cycles/second={CYCLES_PER_SECOND}")?;
        if let Some(period) = sampling_period {
            writeln!(out, "sampling period={period}")?;
        }

        for record in self.snapshot() {
            writeln!(
                out,
                "{} {} @ {}:{}:{}",
                record.stats.delay.as_nanos(),
                record.stats.count,
                record.location.file(),
                record.location.line(),
                record.location.column()
            )?;
        }

        out.flush()
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::new()
    }
}
