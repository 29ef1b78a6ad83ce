//! Descriptor heaps and the bump allocator handing out ranges from them.
//!
//! Every pass allocates its descriptor table ranges once, at initialization. Ranges are never freed or moved,
//! so all ranges handed out by one heap during a session are disjoint. Running out of space is a programming
//! error and aborts.

use std::ops::Range;

use anyhow::Result;
use multimap::MultiMap;

use crate::core::backend::ObjectId;
use crate::core::device::Device;
use crate::core::settings::RenderSettings;

/// Kind of descriptors stored in a heap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DescriptorHeapType {
    CbvSrvUav,
    Sampler,
    Rtv,
    Dsv,
}

/// Creation parameters of a descriptor heap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DescriptorHeapDesc {
    pub ty: DescriptorHeapType,
    pub capacity: u32,
    /// Only shader visible heaps can be bound to a command list. Only shader invisible heaps can be
    /// the source of a descriptor copy.
    pub shader_visible: bool,
}

/// Location of a single descriptor inside a heap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorHandle {
    pub heap: ObjectId,
    pub index: u32,
}

impl DescriptorHandle {
    /// Handle `count` descriptors further into the same heap.
    pub fn offset(&self, count: u32) -> DescriptorHandle {
        DescriptorHandle {
            heap: self.heap,
            index: self.index + count,
        }
    }
}

/// A descriptor heap with a linear allocator.
#[derive(Debug)]
pub struct DescriptorHeap {
    id: ObjectId,
    desc: DescriptorHeapDesc,
    next: u32,
    ranges: MultiMap<String, Range<u32>>,
}

impl DescriptorHeap {
    /// Create a new, empty descriptor heap.
    pub fn new(device: &Device, desc: DescriptorHeapDesc) -> Result<Self> {
        let id = device.create_descriptor_heap(&desc)?;
        #[cfg(feature = "log-objects")]
        trace!("Created descriptor heap {:?} ({:?}, capacity {})", id, desc.ty, desc.capacity);
        Ok(Self {
            id,
            desc,
            next: 0,
            ranges: MultiMap::new(),
        })
    }

    /// Allocate a single descriptor on behalf of `owner`.
    pub fn allocate(&mut self, owner: &str) -> DescriptorHandle {
        self.allocate_range(owner, 1)
    }

    /// Allocate `count` consecutive descriptors on behalf of `owner`. The owner name is only kept for bookkeeping.
    /// # Panics
    /// Panics when the heap does not have `count` free descriptors left.
    pub fn allocate_range(&mut self, owner: &str, count: u32) -> DescriptorHandle {
        assert!(count > 0, "Cannot allocate an empty descriptor range for `{owner}`.");
        assert!(
            self.next + count <= self.desc.capacity,
            "Descriptor heap {:?} ({:?}) exhausted: `{}` requested {} descriptors, {} of {} in use.",
            self.id,
            self.desc.ty,
            owner,
            count,
            self.next,
            self.desc.capacity
        );
        let start = self.next;
        self.next += count;
        self.ranges.insert(owner.to_owned(), start..self.next);
        debug!("Allocated descriptors {}..{} of heap {:?} for `{}`", start, self.next, self.id, owner);
        DescriptorHandle {
            heap: self.id,
            index: start,
        }
    }

    /// All ranges allocated on behalf of `owner`, in allocation order.
    pub fn ranges_of(&self, owner: &str) -> &[Range<u32>] {
        self.ranges.get_vec(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every allocated range, grouped by owner.
    pub fn ranges(&self) -> impl Iterator<Item = (&String, &Vec<Range<u32>>)> {
        self.ranges.iter_all()
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn heap_type(&self) -> DescriptorHeapType {
        self.desc.ty
    }

    pub fn is_shader_visible(&self) -> bool {
        self.desc.shader_visible
    }

    pub fn capacity(&self) -> u32 {
        self.desc.capacity
    }

    /// Number of descriptors handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

/// The set of descriptor heaps owned by the application and lent to every pass.
#[derive(Debug)]
pub struct DescriptorHeaps {
    /// Shader visible CBV/SRV/UAV heap holding all descriptor tables.
    pub shader_visible: DescriptorHeap,
    /// Shader visible sampler heap.
    pub sampler: DescriptorHeap,
    /// Staging heap holding the views created alongside each resource.
    pub shader_invisible: DescriptorHeap,
    pub rtv: DescriptorHeap,
    pub dsv: DescriptorHeap,
}

impl DescriptorHeaps {
    /// Create all heaps with the capacities given in the settings.
    pub fn new(device: &Device, settings: &RenderSettings) -> Result<Self> {
        let heap = |ty, capacity, shader_visible| {
            DescriptorHeap::new(
                device,
                DescriptorHeapDesc {
                    ty,
                    capacity,
                    shader_visible,
                },
            )
        };
        Ok(Self {
            shader_visible: heap(DescriptorHeapType::CbvSrvUav, settings.shader_visible_heap_size, true)?,
            sampler: heap(DescriptorHeapType::Sampler, settings.sampler_heap_size, true)?,
            shader_invisible: heap(DescriptorHeapType::CbvSrvUav, settings.shader_invisible_heap_size, false)?,
            rtv: heap(DescriptorHeapType::Rtv, settings.rtv_heap_size, false)?,
            dsv: heap(DescriptorHeapType::Dsv, settings.dsv_heap_size, false)?,
        })
    }
}
