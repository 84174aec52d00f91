use crate::events::crosses;
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Sample rate in effect before any session changes it (bytes between samples)
pub const DEFAULT_SAMPLE_RATE: usize = 512 * 1024;

/// One class per power of two: class `c` holds sizes in `[2^(c-1), 2^c)`
pub(super) const SIZE_CLASSES: usize = 64;

static SAMPLE_RATE: AtomicUsize = AtomicUsize::new(DEFAULT_SAMPLE_RATE);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Running byte totals used to decide which events are sampled
static ALLOC_STREAM: AtomicU64 = AtomicU64::new(0);
static FREE_STREAM: AtomicU64 = AtomicU64::new(0);

pub(super) static CLASSES: [SizeClass; SIZE_CLASSES] =
    [const { SizeClass::new() }; SIZE_CLASSES];

/// Sampled counters for one size class
pub(super) struct SizeClass {
    pub allocs: AtomicU64,
    pub alloc_bytes: AtomicU64,
    pub frees: AtomicU64,
    pub free_bytes: AtomicU64,
}

impl SizeClass {
    const fn new() -> Self {
        SizeClass {
            allocs: AtomicU64::new(0),
            alloc_bytes: AtomicU64::new(0),
            frees: AtomicU64::new(0),
            free_bytes: AtomicU64::new(0),
        }
    }
}

/// Current allocation sample rate. 0 means allocations are not recorded.
pub fn sample_rate() -> usize {
    SAMPLE_RATE.load(Ordering::Relaxed)
}

/// Set the allocation sample rate, returning the previous one
pub fn set_sample_rate(rate: usize) -> usize {
    SAMPLE_RATE.swap(rate, Ordering::SeqCst)
}

/// Whether a [`SamplingAllocator`] has served at least one allocation
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

pub(super) fn size_class(size: usize) -> usize {
    let class = (usize::BITS - size.leading_zeros()) as usize;
    class.min(SIZE_CLASSES - 1)
}

#[inline]
fn record_alloc(size: usize) {
    if !INSTALLED.load(Ordering::Relaxed) {
        INSTALLED.store(true, Ordering::Relaxed);
    }

    let rate = SAMPLE_RATE.load(Ordering::Relaxed);
    if rate == 0 || !crosses(&ALLOC_STREAM, size as u64, rate as u64) {
        return;
    }

    let class = &CLASSES[size_class(size)];
    class.allocs.fetch_add(1, Ordering::Relaxed);
    class.alloc_bytes.fetch_add(size as u64, Ordering::Relaxed);
}

#[inline]
fn record_free(size: usize) {
    let rate = SAMPLE_RATE.load(Ordering::Relaxed);
    if rate == 0 || !crosses(&FREE_STREAM, size as u64, rate as u64) {
        return;
    }

    let class = &CLASSES[size_class(size)];
    class.frees.fetch_add(1, Ordering::Relaxed);
    class.free_bytes.fetch_add(size as u64, Ordering::Relaxed);
}

/// A global allocator that samples allocation activity into per size-class
/// counters before delegating to `A`.
///
/// Recording never allocates, so it is safe to run inside the allocator.
pub struct SamplingAllocator<A = System> {
    inner: A,
}

impl<A> SamplingAllocator<A> {
    pub const fn new(inner: A) -> Self {
        SamplingAllocator { inner }
    }
}

impl SamplingAllocator<System> {
    pub const fn system() -> Self {
        SamplingAllocator { inner: System }
    }
}

impl Default for SamplingAllocator<System> {
    fn default() -> Self {
        Self::system()
    }
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for SamplingAllocator<A> {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        record_free(layout.size());
        unsafe { self.inner.dealloc(ptr, layout) }
    }

    #[inline]
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    #[inline]
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record_free(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_class_bounds() {
        assert_eq!(size_class(0), 0);
        assert_eq!(size_class(1), 1);
        assert_eq!(size_class(2), 2);
        assert_eq!(size_class(3), 2);
        assert_eq!(size_class(4096), 13);
        assert_eq!(size_class(usize::MAX), SIZE_CLASSES - 1);
    }
}
