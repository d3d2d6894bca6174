use ash::vk;
use smallvec::SmallVec;

use crate::{
    DebugWrapper,
    types::{ImageMemoryBarrier2, MemoryBarrier2},
};

/// Command buffer of a command list that barriers are recorded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmdBuffer {
    /// Main command buffer.
    ExecBuffer,
    /// Runs before the main command buffer, used for resource initialization.
    InitBuffer,
    /// Runs on the transfer queue.
    SdmaBuffer,
}

/// One batch of barriers, recorded as a single pipeline barrier.
#[derive(Debug, Clone, Copy)]
pub struct DependencyInfo<'a> {
    pub memory_barriers: &'a [MemoryBarrier2],
    pub image_barriers: &'a [ImageMemoryBarrier2],
}

impl DependencyInfo<'_> {
    pub fn is_empty(&self) -> bool {
        self.memory_barriers.is_empty() && self.image_barriers.is_empty()
    }
}

/// Receiver of recorded barriers.
///
/// Implementations must record the barriers verbatim and in order.
pub trait CommandSink {
    fn pipeline_barrier(&mut self, cmd_buffer: CmdBuffer, dependency: &DependencyInfo<'_>);
}

/// Records barriers into Vulkan command buffers through `vkCmdPipelineBarrier2`.
pub struct AshCommandList {
    device: ash::Device,
    exec_buffer: DebugWrapper<vk::CommandBuffer>,
    init_buffer: DebugWrapper<vk::CommandBuffer>,
    sdma_buffer: DebugWrapper<vk::CommandBuffer>,
}

impl AshCommandList {
    /// Wraps the command buffers of one command list.
    ///
    /// All command buffers must be in the recording state whenever barriers
    /// are recorded, and the device must support synchronization2.
    pub fn new(
        device: ash::Device,
        exec_buffer: vk::CommandBuffer,
        init_buffer: vk::CommandBuffer,
        sdma_buffer: vk::CommandBuffer,
    ) -> Self {
        Self {
            device,
            exec_buffer: DebugWrapper(exec_buffer),
            init_buffer: DebugWrapper(init_buffer),
            sdma_buffer: DebugWrapper(sdma_buffer),
        }
    }

    /// Returns the Vulkan command buffer backing `cmd_buffer`.
    pub fn command_buffer(&self, cmd_buffer: CmdBuffer) -> vk::CommandBuffer {
        match cmd_buffer {
            CmdBuffer::ExecBuffer => *self.exec_buffer,
            CmdBuffer::InitBuffer => *self.init_buffer,
            CmdBuffer::SdmaBuffer => *self.sdma_buffer,
        }
    }
}

impl std::fmt::Debug for AshCommandList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AshCommandList")
            .field("exec_buffer", &self.exec_buffer)
            .field("init_buffer", &self.init_buffer)
            .field("sdma_buffer", &self.sdma_buffer)
            .finish()
    }
}

impl CommandSink for AshCommandList {
    fn pipeline_barrier(&mut self, cmd_buffer: CmdBuffer, dependency: &DependencyInfo<'_>) {
        let memory_barriers: SmallVec<[vk::MemoryBarrier2; 1]> = dependency
            .memory_barriers
            .iter()
            .map(|barrier| barrier.to_vk())
            .collect();

        let image_barriers: SmallVec<[vk::ImageMemoryBarrier2; 8]> = dependency
            .image_barriers
            .iter()
            .map(|barrier| barrier.to_vk())
            .collect();

        let dependency_info = vk::DependencyInfo::default()
            .memory_barriers(&memory_barriers)
            .image_memory_barriers(&image_barriers);

        unsafe {
            self.device
                .cmd_pipeline_barrier2(self.command_buffer(cmd_buffer), &dependency_info);
        }
    }
}
