//! Heap profiling through a sampling global allocator.
//!
//! The host installs [`SamplingAllocator`] as its `#[global_allocator]`
//! (directly or with [`sampling_allocator!`](crate::sampling_allocator)).
//! Allocations are sampled by bytes: one sample is recorded every time the
//! running total of allocated bytes crosses a multiple of the sample rate.
//! Frees are sampled the same way over the freed-bytes stream, so per size
//! class the in-use figures stay unbiased estimates.
//!
//! Until the allocator has served an allocation the heap facility counts as
//! unavailable and snapshots produce no data.

mod allocator;
mod profile;

pub use allocator::{
    DEFAULT_SAMPLE_RATE, SamplingAllocator, is_installed, sample_rate, set_sample_rate,
};
pub use profile::{ClassStats, HeapProfile};

/// Install [`SamplingAllocator`] over the system allocator as the global allocator.
///
/// ```rust,ignore
/// profsession::sampling_allocator!();
/// ```
#[macro_export]
macro_rules! sampling_allocator {
    () => {
        #[global_allocator]
        static __PROFSESSION_ALLOC: $crate::heap::SamplingAllocator =
            $crate::heap::SamplingAllocator::system();
    };
}
