//! Descriptor tables: contiguous ranges of a shader visible heap filled in register order.
//!
//! The slot order of a table is a contract with the shader. The builder takes the ranges declared for the table
//! in the root signature, flattens them into one expected descriptor type per slot and refuses any descriptor
//! pushed out of order.
//!
//! # Example
//! ```ignore
//! let table = DescriptorTableBuilder::new(&mut heaps.shader_visible, "my pass", root_signature.table_ranges(1))
//!     .srv(depth.srv())
//!     .uav(output.uav())
//!     .build(&device)?;
//! ```

use anyhow::Result;

use crate::core::device::Device;
use crate::descriptor::heap::{DescriptorHandle, DescriptorHeap};
use crate::pipeline::root_signature::{DescriptorRange, RangeType};

/// A range of descriptors in a shader visible heap, ready to be bound as a root descriptor table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DescriptorTable {
    start: DescriptorHandle,
    len: u32,
}

impl DescriptorTable {
    /// Handle to the first slot, passed to `set_*_root_descriptor_table`.
    pub fn start(&self) -> DescriptorHandle {
        self.start
    }

    /// Handle to slot `index` of this table.
    pub fn slot(&self, index: u32) -> DescriptorHandle {
        assert!(index < self.len, "Descriptor table slot {index} out of range (table has {} slots).", self.len);
        self.start.offset(index)
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Fills a freshly allocated descriptor table slot by slot.
#[derive(Debug)]
pub struct DescriptorTableBuilder {
    owner: String,
    start: DescriptorHandle,
    layout: Vec<RangeType>,
    sources: Vec<DescriptorHandle>,
}

impl DescriptorTableBuilder {
    /// Allocate a range large enough for all descriptors in `ranges`.
    pub fn new(heap: &mut DescriptorHeap, owner: &str, ranges: &[DescriptorRange]) -> Self {
        assert!(heap.is_shader_visible(), "Descriptor tables for `{owner}` must live in a shader visible heap.");
        let layout: Vec<RangeType> = ranges
            .iter()
            .flat_map(|range| std::iter::repeat(range.ty).take(range.count as usize))
            .collect();
        let start = heap.allocate_range(owner, layout.len() as u32);
        Self {
            owner: owner.to_owned(),
            start,
            layout,
            sources: Vec::new(),
        }
    }

    fn push(mut self, ty: RangeType, source: DescriptorHandle) -> Self {
        let slot = self.sources.len();
        assert!(slot < self.layout.len(), "Descriptor table of `{}` only has {} slots.", self.owner, self.layout.len());
        assert_eq!(
            self.layout[slot], ty,
            "Descriptor table of `{}` expects {:?} in slot {}.",
            self.owner, self.layout[slot], slot
        );
        self.sources.push(source);
        self
    }

    /// Put a shader resource view in the next slot.
    pub fn srv(self, source: DescriptorHandle) -> Self {
        self.push(RangeType::Srv, source)
    }

    /// Put an unordered access view in the next slot.
    pub fn uav(self, source: DescriptorHandle) -> Self {
        self.push(RangeType::Uav, source)
    }

    /// Put a constant buffer view in the next slot.
    pub fn cbv(self, source: DescriptorHandle) -> Self {
        self.push(RangeType::Cbv, source)
    }

    /// Copy all descriptors into the table.
    /// # Panics
    /// Panics if not every slot was filled.
    pub fn build(self, device: &Device) -> Result<DescriptorTable> {
        assert_eq!(
            self.sources.len(),
            self.layout.len(),
            "Descriptor table of `{}` was not completely filled.",
            self.owner
        );
        for (slot, source) in self.sources.iter().enumerate() {
            device.copy_descriptor(self.start.offset(slot as u32), *source)?;
        }
        Ok(DescriptorTable {
            start: self.start,
            len: self.layout.len() as u32,
        })
    }
}
