//! GPU timing of named regions of command lists.
//!
//! Every profile name gets a slot with two timestamp queries: `2 * slot` is written when the region starts,
//! `2 * slot + 1` when it ends. Both are resolved into a readback buffer holding one block of queries per frame
//! in flight, so the results of one frame never overwrite those of a frame that was not read yet.
//!
//! [`GpuProfiler::end_frame`] reads the block of the current frame. It must only be called after the fence value
//! signaled for that frame completed, since the device may still be writing timestamps before that.
//!
//! # Example
//! ```ignore
//! profiler.start_frame(frame_index);
//! let slot = profiler.start_profile(&mut cmd, "tiled light culling");
//! cmd.dispatch(58, 48, 1);
//! profiler.end_profile(&mut cmd, slot);
//! cmd.end();
//! env.submit_and_wait(&[&cmd])?;
//! profiler.end_frame(&env.queue)?;
//! profiler.output_to_console();
//! ```

use std::mem::size_of;

use anyhow::Result;

use crate::command_buffer::CommandList;
use crate::command_buffer::queue::CommandQueue;
use crate::core::device::Device;
use crate::descriptor::heap::DescriptorHeaps;
use crate::resource::buffer::{Buffer, BufferDesc};
use crate::resource::query_heap::{QueryHeap, Timestamp};

/// Number of recent samples kept per profile.
pub const NUM_TIME_SAMPLES: usize = 64;

#[derive(Debug)]
struct ProfileData {
    name: String,
    samples: [f64; NUM_TIME_SAMPLES],
    next_sample: usize,
}

impl ProfileData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            samples: [0.0; NUM_TIME_SAMPLES],
            next_sample: 0,
        }
    }

    fn push_sample(&mut self, ms: f64) {
        self.samples[self.next_sample] = ms;
        self.next_sample = (self.next_sample + 1) % NUM_TIME_SAMPLES;
    }

    fn report(&self) -> ProfileReport {
        // Empty ring entries are zero and do not count towards the average.
        let recorded: Vec<f64> = self.samples.iter().copied().filter(|&sample| sample > 0.0).collect();
        let avg_ms = if recorded.is_empty() {
            0.0
        } else {
            recorded.iter().sum::<f64>() / recorded.len() as f64
        };
        let max_ms = recorded.iter().copied().fold(0.0, f64::max);
        ProfileReport {
            name: self.name.clone(),
            avg_ms,
            max_ms,
        }
    }
}

/// Timing summary of one profile over the recent samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    pub name: String,
    pub avg_ms: f64,
    pub max_ms: f64,
}

/// Timestamp query based GPU profiler.
#[derive(Debug)]
pub struct GpuProfiler {
    query_heap: QueryHeap,
    readback: Buffer,
    max_profiles: u32,
    render_latency: u32,
    frame_index: u32,
    profiles: Vec<ProfileData>,
}

impl GpuProfiler {
    /// Create a profiler for at most `max_profiles` distinct names and `render_latency` frames in flight.
    pub fn new(device: &Device, heaps: &mut DescriptorHeaps, max_profiles: u32, render_latency: u32) -> Result<Self> {
        assert!(max_profiles > 0, "Profiler needs room for at least one profile.");
        assert!(render_latency > 0, "Render latency must be at least one frame.");
        let max_queries = 2 * max_profiles;
        let query_heap = QueryHeap::new(device, max_queries)?;
        let size = (max_queries * render_latency) as u64 * size_of::<u64>() as u64;
        let readback = Buffer::new(device, heaps, BufferDesc::readback("GpuProfiler timestamps", size))?;
        Ok(Self {
            query_heap,
            readback,
            max_profiles,
            render_latency,
            frame_index: 0,
            profiles: Vec::new(),
        })
    }

    fn max_queries(&self) -> u32 {
        2 * self.max_profiles
    }

    /// Select the block of the readback buffer used by the following profiles.
    pub fn start_frame(&mut self, frame_index: u32) {
        assert!(
            frame_index < self.render_latency,
            "Frame index {} out of range for a render latency of {}.",
            frame_index,
            self.render_latency
        );
        self.frame_index = frame_index;
    }

    /// Write the start timestamp of profile `name` and return its slot. A name always maps to the same slot.
    /// # Panics
    /// Panics when more than `max_profiles` distinct names are used.
    pub fn start_profile(&mut self, cmd: &mut CommandList, name: &str) -> u32 {
        let slot = match self.profiles.iter().position(|profile| profile.name == name) {
            Some(slot) => slot,
            None => {
                assert!(
                    self.profiles.len() < self.max_profiles as usize,
                    "Profiler out of slots: cannot add `{}`, all {} profiles are in use.",
                    name,
                    self.max_profiles
                );
                self.profiles.push(ProfileData::new(name));
                self.profiles.len() - 1
            }
        };
        let slot = slot as u32;
        cmd.end_query(&self.query_heap, 2 * slot);
        slot
    }

    /// Write the end timestamp of profile `slot` and resolve both timestamps into the current frame's block.
    pub fn end_profile(&mut self, cmd: &mut CommandList, slot: u32) {
        assert!((slot as usize) < self.profiles.len(), "Profile slot {slot} was never started.");
        let start_query = 2 * slot;
        cmd.end_query(&self.query_heap, start_query + 1);
        let offset = (self.frame_index * self.max_queries() + start_query) as u64 * size_of::<u64>() as u64;
        cmd.resolve_query_data(&self.query_heap, start_query, 2, &self.readback, offset);
    }

    /// Read the current frame's timestamps and append one sample to every profile.
    pub fn end_frame(&mut self, queue: &CommandQueue) -> Result<()> {
        let frequency = queue.timestamp_frequency()?;
        let block_size = self.max_queries() as u64 * size_of::<u64>() as u64;
        let data = self.readback.read(self.frame_index as u64 * block_size, block_size)?;
        let timestamps: Vec<Timestamp> = data
            .chunks_exact(size_of::<u64>())
            .map(|bytes| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                Timestamp::new(u64::from_le_bytes(raw), frequency)
            })
            .collect();
        for (slot, profile) in self.profiles.iter_mut().enumerate() {
            let elapsed = timestamps[2 * slot + 1] - timestamps[2 * slot];
            profile.push_sample(elapsed.as_secs_f64() * 1000.0);
        }
        Ok(())
    }

    /// Number of distinct profile names seen so far.
    pub fn num_profiles(&self) -> usize {
        self.profiles.len()
    }

    /// Average and maximum time of every profile, in slot order.
    pub fn report(&self) -> Vec<ProfileReport> {
        self.profiles.iter().map(ProfileData::report).collect()
    }

    /// Log the [`GpuProfiler::report`].
    pub fn output_to_console(&self) {
        info!("================================= GPU Profiler =================================");
        for report in self.report() {
            info!("{}: avg: {:.3} ms, max: {:.3} ms", report.name, report.avg_ms, report.max_ms);
        }
        info!("================================================================================");
    }
}
