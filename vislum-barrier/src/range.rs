use crate::types::ImageSubresourceRange;

/// Bits reserved for the layer index when linearising image subresources.
const LAYER_INDEX_BITS: u32 = 16;

/// Resource address range.
///
/// For buffers, the range is a pair of byte offsets. For images, the range
/// encodes linearised subresource indices, see [`AddressRange::for_image`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    /// Unique resource handle.
    pub resource: u64,
    /// First address included in the range.
    pub range_start: u32,
    /// Last address included in the range.
    pub range_end: u32,
}

impl AddressRange {
    pub fn new(resource: u64, range_start: u32, range_end: u32) -> Self {
        debug_assert!(range_start <= range_end);

        Self {
            resource,
            range_start,
            range_end,
        }
    }

    /// Range covering `length` bytes starting at `offset`.
    ///
    /// Offsets beyond 4 GiB saturate, which can only make ranges overlap
    /// more eagerly.
    pub fn for_buffer(resource: u64, offset: u64, length: u64) -> Self {
        debug_assert!(length > 0, "empty buffer range");

        let last = offset.saturating_add(length.max(1) - 1);

        Self::new(resource, saturate(offset), saturate(last))
    }

    /// Range covering the given image subresources.
    ///
    /// Subresource `(level, layer)` maps to `level << 16 | layer`, and the
    /// range is the bounding interval of all subresources in `subresources`.
    /// Counts of `vk::REMAINING_MIP_LEVELS` or `vk::REMAINING_ARRAY_LAYERS`
    /// extend the range to the end of the encodable space.
    pub fn for_image(resource: u64, subresources: &ImageSubresourceRange) -> Self {
        debug_assert!(subresources.level_count > 0 && subresources.layer_count > 0);

        let first_level = subresources.base_mip_level;
        let last_level = first_level.saturating_add(subresources.level_count.max(1) - 1);
        let first_layer = subresources.base_array_layer;
        let last_layer = first_layer.saturating_add(subresources.layer_count.max(1) - 1);

        Self::new(
            resource,
            subresource_index(first_level, first_layer),
            subresource_index(last_level, last_layer),
        )
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.range_start <= other.range_start
            && self.range_end >= other.range_end
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.range_end >= other.range_start
            && self.range_start <= other.range_end
    }

    /// Ordering used by the barrier tree.
    pub fn lt(&self, other: &Self) -> bool {
        self.resource < other.resource
            || (self.resource == other.resource && self.range_start < other.range_start)
    }

    /// Smallest range containing both ranges.
    pub(crate) fn union(&self, other: &Self) -> Self {
        debug_assert_eq!(self.resource, other.resource);

        Self {
            resource: self.resource,
            range_start: self.range_start.min(other.range_start),
            range_end: self.range_end.max(other.range_end),
        }
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn subresource_index(level: u32, layer: u32) -> u32 {
    level
        .saturating_mul(1 << LAYER_INDEX_BITS)
        .saturating_add(layer.min((1 << LAYER_INDEX_BITS) - 1))
}
