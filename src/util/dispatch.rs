//! Utilities for sizing compute dispatches

/// Number of thread groups needed to cover `domain_size` items with groups of `threads_per_group` threads.
pub fn num_thread_groups(domain_size: u32, threads_per_group: u32) -> u32 {
    assert_ne!(threads_per_group, 0, "Thread group size cannot be zero.");
    domain_size.div_ceil(threads_per_group)
}

/// Per-axis version of [`num_thread_groups`].
pub fn num_thread_groups_3d(domain_size: [u32; 3], threads_per_group: [u32; 3]) -> [u32; 3] {
    [
        num_thread_groups(domain_size[0], threads_per_group[0]),
        num_thread_groups(domain_size[1], threads_per_group[1]),
        num_thread_groups(domain_size[2], threads_per_group[2]),
    ]
}
