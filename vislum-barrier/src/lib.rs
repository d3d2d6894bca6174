use std::ops::Deref;

pub mod access;
pub mod barrier;
pub mod batch;
pub mod config;
pub mod error;
pub mod range;
pub mod resource;
pub mod sink;
pub mod slice;
pub mod subresource;
pub mod tracker;
pub mod tree;
pub mod types;

mod macros;

pub use access::{Access, AccessFlags};
pub use barrier::BarrierSet;
pub use batch::BarrierBatch;
pub use config::BarrierSetConfig;
pub use error::ConfigError;
pub use range::AddressRange;
pub use resource::{BufferSliceHandle, ImageResource};
pub use sink::{AshCommandList, CmdBuffer, CommandSink, DependencyInfo};
pub use tracker::BarrierTracker;

/// A trait for objects that wrap Vulkan handles.
pub trait VkHandle {
    type Handle: ash::vk::Handle;

    /// Returns the Vulkan handle of the object.
    fn vk_handle(&self) -> Self::Handle;
}

pub struct DebugWrapper<T: ash::vk::Handle>(pub T);

impl<T> Deref for DebugWrapper<T>
where
    T: ash::vk::Handle,
{
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::fmt::Debug for DebugWrapper<T>
where
    T: ash::vk::Handle + Copy,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:X}", self.0.as_raw())
    }
}
