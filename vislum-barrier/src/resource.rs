use ash::vk;

use crate::{VkHandle, types::ImageAspectFlags};

/// A byte range of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferSliceHandle {
    pub handle: vk::Buffer,
    pub offset: u64,
    pub length: u64,
}

impl BufferSliceHandle {
    pub fn new(handle: vk::Buffer, offset: u64, length: u64) -> Self {
        Self {
            handle,
            offset,
            length,
        }
    }
}

impl VkHandle for BufferSliceHandle {
    type Handle = vk::Buffer;

    fn vk_handle(&self) -> Self::Handle {
        self.handle
    }
}

/// An image that barriers can be recorded for.
pub trait ImageResource: VkHandle<Handle = vk::Image> {
    /// All aspects of the image format. Layout transitions must cover all
    /// aspects of a subresource.
    fn aspect_mask(&self) -> ImageAspectFlags;
}

/// Key type of a [`SubresourceSet`](crate::subresource::SubresourceSet).
pub trait ResourceKey: Copy + Eq + Default {
    /// Stable 64-bit identity of the resource.
    fn key_bits(self) -> u64;
}

impl ResourceKey for u64 {
    fn key_bits(self) -> u64 {
        self
    }
}

macro_rules! impl_resource_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ResourceKey for $ty {
                fn key_bits(self) -> u64 {
                    ash::vk::Handle::as_raw(self)
                }
            }
        )*
    };
}

impl_resource_key!(vk::Buffer, vk::Image);
