use super::allocator::{CLASSES, SIZE_CLASSES, is_installed, sample_rate};
use crate::kind::AllocationView;
use std::io::{self, Write};
use std::sync::atomic::Ordering;

/// Sampled totals for one size class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassStats {
    pub class: usize,
    pub allocs: u64,
    pub alloc_bytes: u64,
    pub frees: u64,
    pub free_bytes: u64,
}

impl ClassStats {
    pub fn inuse_objects(&self) -> u64 {
        self.allocs.saturating_sub(self.frees)
    }

    pub fn inuse_bytes(&self) -> u64 {
        self.alloc_bytes.saturating_sub(self.free_bytes)
    }

    /// Inclusive byte range covered by this class
    pub fn bounds(&self) -> (u64, u64) {
        match self.class {
            0 => (0, 0),
            c if c >= SIZE_CLASSES - 1 => (1 << (SIZE_CLASSES - 2), u64::MAX),
            c => (1 << (c - 1), (1 << c) - 1),
        }
    }
}

/// Point-in-time copy of the sampling allocator's counters
#[derive(Debug, Clone, Default)]
pub struct HeapProfile {
    pub rate: usize,
    pub classes: Vec<ClassStats>,
}

impl HeapProfile {
    /// Snapshot the allocator counters, or `None` if no sampling allocator is installed
    pub fn capture() -> Option<Self> {
        if !is_installed() {
            return None;
        }

        let classes = CLASSES
            .iter()
            .enumerate()
            .map(|(class, c)| ClassStats {
                class,
                allocs: c.allocs.load(Ordering::Relaxed),
                alloc_bytes: c.alloc_bytes.load(Ordering::Relaxed),
                frees: c.frees.load(Ordering::Relaxed),
                free_bytes: c.free_bytes.load(Ordering::Relaxed),
            })
            .filter(|c| c.allocs > 0 || c.frees > 0)
            .collect();

        Some(HeapProfile {
            rate: sample_rate(),
            classes,
        })
    }

    pub fn inuse_objects(&self) -> u64 {
        self.classes.iter().map(ClassStats::inuse_objects).sum()
    }

    pub fn inuse_bytes(&self) -> u64 {
        self.classes.iter().map(ClassStats::inuse_bytes).sum()
    }

    pub fn alloc_objects(&self) -> u64 {
        self.classes.iter().map(|c| c.allocs).sum()
    }

    pub fn alloc_bytes(&self) -> u64 {
        self.classes.iter().map(|c| c.alloc_bytes).sum()
    }

    /// Write the profile in the legacy text heap format.
    ///
    /// The heap view lists only classes with memory still in use, largest
    /// first; the alloc view lists every class ordered by allocated bytes.
    pub fn write_to<W: Write>(&self, view: AllocationView, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "heap profile: {}: {} [{}: {}] @ {}/{}",
            self.inuse_objects(),
            self.inuse_bytes(),
            self.alloc_objects(),
            self.alloc_bytes(),
            view,
            self.rate
        )?;

        let mut rows: Vec<&ClassStats> = match view {
            AllocationView::Heap => self.classes.iter().filter(|c| c.inuse_bytes() > 0).collect(),
            AllocationView::Alloc => self.classes.iter().collect(),
        };
        match view {
            AllocationView::Heap => rows.sort_by(|a, b| b.inuse_bytes().cmp(&a.inuse_bytes())),
            AllocationView::Alloc => rows.sort_by(|a, b| b.alloc_bytes.cmp(&a.alloc_bytes)),
        }

        for row in rows {
            let (lo, hi) = row.bounds();
            writeln!(
                out,
                "{}: {} [{}: {}] @ size {}-{}",
                row.inuse_objects(),
                row.inuse_bytes(),
                row.allocs,
                row.alloc_bytes,
                lo,
                hi
            )?;
        }

        out.flush()
    }
}
