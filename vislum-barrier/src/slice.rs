use crate::{
    access::AccessFlags,
    types::{ImageAspectFlags, ImageSubresourceRange},
};

/// A resource slice that can be tracked by a
/// [`SubresourceSet`](crate::subresource::SubresourceSet).
pub trait BarrierSlice: Copy + Default {
    /// Whether insertion should try to merge a new slice into existing
    /// overflow entries before appending it.
    const MERGE_OVERFLOW: bool;

    /// Checks whether two slices overlap.
    fn overlaps(&self, other: &Self) -> bool;

    /// Checks whether two slices overlap and at least one of them writes.
    fn is_dirty(&self, other: &Self) -> bool;

    /// Checks whether merging the two slices loses no precision worth keeping.
    fn can_merge(&self, other: &Self) -> bool;

    /// Grows this slice so that it contains `other`, including its access flags.
    ///
    /// If `can_merge` is `false`, the result is a strict superset of both.
    fn merge(&mut self, other: &Self);

    fn access(&self) -> AccessFlags;
}

/// Half-open byte range of a buffer with its access flags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferSlice {
    lo_addr: u64,
    hi_addr: u64,
    access: AccessFlags,
}

impl BufferSlice {
    pub fn new(offset: u64, length: u64, access: AccessFlags) -> Self {
        Self {
            lo_addr: offset,
            hi_addr: offset + length,
            access,
        }
    }

    pub fn lo_addr(&self) -> u64 {
        self.lo_addr
    }

    pub fn hi_addr(&self) -> u64 {
        self.hi_addr
    }
}

impl BarrierSlice for BufferSlice {
    // Buffer slices rarely merge, so walking the list is not worth it.
    const MERGE_OVERFLOW: bool = false;

    fn overlaps(&self, other: &Self) -> bool {
        self.hi_addr > other.lo_addr && self.lo_addr < other.hi_addr
    }

    fn is_dirty(&self, other: &Self) -> bool {
        (self.access | other.access).contains(AccessFlags::WRITE) && self.overlaps(other)
    }

    /// Slices with the same access merge if they overlap or touch. Slices with
    /// different access only merge if they cover the same bytes.
    fn can_merge(&self, other: &Self) -> bool {
        if self.access == other.access {
            self.hi_addr >= other.lo_addr && self.lo_addr <= other.hi_addr
        } else {
            self.lo_addr == other.lo_addr && self.hi_addr == other.hi_addr
        }
    }

    fn merge(&mut self, other: &Self) {
        self.lo_addr = self.lo_addr.min(other.lo_addr);
        self.hi_addr = self.hi_addr.max(other.hi_addr);
        self.access |= other.access;
    }

    fn access(&self) -> AccessFlags {
        self.access
    }
}

/// Image subresources with their access flags.
///
/// Layer and level ranges are half-open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageSlice {
    aspects: ImageAspectFlags,
    min_layer: u32,
    max_layer: u32,
    min_level: u32,
    max_level: u32,
    access: AccessFlags,
}

impl ImageSlice {
    /// `vk::REMAINING_MIP_LEVELS` and `vk::REMAINING_ARRAY_LAYERS` extend the
    /// slice to the highest representable level or layer.
    pub fn new(range: &ImageSubresourceRange, access: AccessFlags) -> Self {
        Self {
            aspects: range.aspect_mask,
            min_layer: range.base_array_layer,
            max_layer: range.base_array_layer.saturating_add(range.layer_count),
            min_level: range.base_mip_level,
            max_level: range.base_mip_level.saturating_add(range.level_count),
            access,
        }
    }

    pub fn layers(&self) -> std::ops::Range<u32> {
        self.min_layer..self.max_layer
    }

    pub fn levels(&self) -> std::ops::Range<u32> {
        self.min_level..self.max_level
    }
}

impl BarrierSlice for ImageSlice {
    // Accesses to neighbouring subresources are common, so merging keeps
    // the list short.
    const MERGE_OVERFLOW: bool = true;

    fn overlaps(&self, other: &Self) -> bool {
        self.aspects.intersects(other.aspects)
            && self.min_layer < other.max_layer
            && self.max_layer > other.min_layer
            && self.min_level < other.max_level
            && self.max_level > other.min_level
    }

    fn is_dirty(&self, other: &Self) -> bool {
        (self.access | other.access).contains(AccessFlags::WRITE) && self.overlaps(other)
    }

    /// Only considers slices that are adjacent in one dimension and
    /// identical in the other.
    fn can_merge(&self, other: &Self) -> bool {
        let same_layers = self.min_layer == other.min_layer && self.max_layer == other.max_layer;
        let same_levels = self.min_level == other.min_level && self.max_level == other.max_level;

        if same_layers == same_levels {
            return same_layers;
        }

        if self.access != other.access {
            return false;
        }

        if same_layers {
            self.max_level >= other.min_level && self.min_level <= other.max_level
        } else {
            self.max_layer >= other.min_layer && self.min_layer <= other.max_layer
        }
    }

    fn merge(&mut self, other: &Self) {
        self.aspects |= other.aspects;
        self.min_layer = self.min_layer.min(other.min_layer);
        self.max_layer = self.max_layer.max(other.max_layer);
        self.min_level = self.min_level.min(other.min_level);
        self.max_level = self.max_level.max(other.max_level);
        self.access |= other.access;
    }

    fn access(&self) -> AccessFlags {
        self.access
    }
}
