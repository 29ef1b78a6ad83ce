//! Timestamp query heaps.

use std::ops::Sub;
use std::time::Duration;

use anyhow::Result;

use crate::core::backend::ObjectId;
use crate::core::device::Device;

/// A heap of timestamp queries. Timestamps are written with `end_query` and copied into a readback buffer
/// with `resolve_query_data`.
#[derive(Debug)]
pub struct QueryHeap {
    id: ObjectId,
    count: u32,
}

impl QueryHeap {
    pub fn new(device: &Device, count: u32) -> Result<Self> {
        let id = device.create_query_heap(count)?;
        Ok(Self { id, count })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Number of queries in the heap.
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// A raw timestamp read back from the device, with the queue frequency needed to interpret it.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timestamp {
    ticks: u64,
    // Ticks per second of the queue that wrote this timestamp
    frequency: u64,
}

impl Timestamp {
    pub fn new(ticks: u64, frequency: u64) -> Self {
        assert_ne!(frequency, 0, "Timestamp frequency cannot be zero.");
        Self { ticks, frequency }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Time since the start of the device timer.
    pub fn duration_since_epoch(&self) -> Duration {
        Duration::from_secs_f64(self.ticks as f64 / self.frequency as f64)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    /// Elapsed time between two timestamps of the same queue. Saturates to zero when `rhs` is later.
    fn sub(self, rhs: Timestamp) -> Self::Output {
        let ticks = self.ticks.saturating_sub(rhs.ticks);
        Duration::from_secs_f64(ticks as f64 / self.frequency as f64)
    }
}
