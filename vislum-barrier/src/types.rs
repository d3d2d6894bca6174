use ash::vk;

use crate::{vk_enum, vk_enum_flags};

vk_enum! {
    pub enum ImageLayout: vk::ImageLayout {
        Undefined => UNDEFINED,
        General => GENERAL,
        ColorAttachmentOptimal => COLOR_ATTACHMENT_OPTIMAL,
        DepthStencilAttachmentOptimal => DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        DepthStencilReadOnlyOptimal => DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        ShaderReadOnlyOptimal => SHADER_READ_ONLY_OPTIMAL,
        TransferSrcOptimal => TRANSFER_SRC_OPTIMAL,
        TransferDstOptimal => TRANSFER_DST_OPTIMAL,
        Preinitialized => PREINITIALIZED,
        PresentSrcKhr => PRESENT_SRC_KHR,
    }
}

vk_enum_flags! {
    pub struct AccessFlags2: vk::AccessFlags2 {
        NONE => NONE,
        INDIRECT_COMMAND_READ => INDIRECT_COMMAND_READ,
        INDEX_READ => INDEX_READ,
        VERTEX_ATTRIBUTE_READ => VERTEX_ATTRIBUTE_READ,
        UNIFORM_READ => UNIFORM_READ,
        INPUT_ATTACHMENT_READ => INPUT_ATTACHMENT_READ,
        SHADER_READ => SHADER_READ,
        SHADER_WRITE => SHADER_WRITE,
        COLOR_ATTACHMENT_READ => COLOR_ATTACHMENT_READ,
        COLOR_ATTACHMENT_WRITE => COLOR_ATTACHMENT_WRITE,
        DEPTH_STENCIL_ATTACHMENT_READ => DEPTH_STENCIL_ATTACHMENT_READ,
        DEPTH_STENCIL_ATTACHMENT_WRITE => DEPTH_STENCIL_ATTACHMENT_WRITE,
        TRANSFER_READ => TRANSFER_READ,
        TRANSFER_WRITE => TRANSFER_WRITE,
        HOST_READ => HOST_READ,
        HOST_WRITE => HOST_WRITE,
        MEMORY_READ => MEMORY_READ,
        MEMORY_WRITE => MEMORY_WRITE,
        SHADER_SAMPLED_READ => SHADER_SAMPLED_READ,
        SHADER_STORAGE_READ => SHADER_STORAGE_READ,
        SHADER_STORAGE_WRITE => SHADER_STORAGE_WRITE,
        TRANSFORM_FEEDBACK_WRITE_EXT => TRANSFORM_FEEDBACK_WRITE_EXT,
        TRANSFORM_FEEDBACK_COUNTER_READ_EXT => TRANSFORM_FEEDBACK_COUNTER_READ_EXT,
        TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT => TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT,
        CONDITIONAL_RENDERING_READ_EXT => CONDITIONAL_RENDERING_READ_EXT,
    }
}

impl AccessFlags2 {
    /// Every access that only reads memory.
    pub const READ_MASK: Self = Self::INDIRECT_COMMAND_READ
        .union(Self::INDEX_READ)
        .union(Self::VERTEX_ATTRIBUTE_READ)
        .union(Self::UNIFORM_READ)
        .union(Self::INPUT_ATTACHMENT_READ)
        .union(Self::SHADER_READ)
        .union(Self::COLOR_ATTACHMENT_READ)
        .union(Self::DEPTH_STENCIL_ATTACHMENT_READ)
        .union(Self::TRANSFER_READ)
        .union(Self::HOST_READ)
        .union(Self::MEMORY_READ)
        .union(Self::SHADER_SAMPLED_READ)
        .union(Self::SHADER_STORAGE_READ)
        .union(Self::TRANSFORM_FEEDBACK_COUNTER_READ_EXT)
        .union(Self::CONDITIONAL_RENDERING_READ_EXT);

    /// Every access that writes memory.
    pub const WRITE_MASK: Self = Self::SHADER_WRITE
        .union(Self::COLOR_ATTACHMENT_WRITE)
        .union(Self::DEPTH_STENCIL_ATTACHMENT_WRITE)
        .union(Self::TRANSFER_WRITE)
        .union(Self::HOST_WRITE)
        .union(Self::MEMORY_WRITE)
        .union(Self::SHADER_STORAGE_WRITE)
        .union(Self::TRANSFORM_FEEDBACK_WRITE_EXT)
        .union(Self::TRANSFORM_FEEDBACK_COUNTER_WRITE_EXT);

    /// Accesses performed by the host rather than the device.
    pub const HOST_MASK: Self = Self::HOST_READ.union(Self::HOST_WRITE);

    /// Accesses performed by the device.
    pub const DEVICE_MASK: Self = Self::READ_MASK
        .union(Self::WRITE_MASK)
        .difference(Self::HOST_MASK);
}

vk_enum_flags! {
    pub struct PipelineStageFlags2: vk::PipelineStageFlags2 {
        NONE => NONE,
        TOP_OF_PIPE => TOP_OF_PIPE,
        DRAW_INDIRECT => DRAW_INDIRECT,
        VERTEX_INPUT => VERTEX_INPUT,
        VERTEX_SHADER => VERTEX_SHADER,
        TESSELLATION_CONTROL_SHADER => TESSELLATION_CONTROL_SHADER,
        TESSELLATION_EVALUATION_SHADER => TESSELLATION_EVALUATION_SHADER,
        GEOMETRY_SHADER => GEOMETRY_SHADER,
        FRAGMENT_SHADER => FRAGMENT_SHADER,
        EARLY_FRAGMENT_TESTS => EARLY_FRAGMENT_TESTS,
        LATE_FRAGMENT_TESTS => LATE_FRAGMENT_TESTS,
        COLOR_ATTACHMENT_OUTPUT => COLOR_ATTACHMENT_OUTPUT,
        COMPUTE_SHADER => COMPUTE_SHADER,
        ALL_COMMANDS => ALL_COMMANDS,
        ALL_GRAPHICS => ALL_GRAPHICS,
        TRANSFER => TRANSFER,
        COPY => COPY,
        RESOLVE => RESOLVE,
        BLIT => BLIT,
        CLEAR => CLEAR,
        BOTTOM_OF_PIPE => BOTTOM_OF_PIPE,
        HOST => HOST,
    }
}

impl PipelineStageFlags2 {
    /// Every stage except the host stage.
    pub const DEVICE_MASK: Self = Self::from_vk(vk::PipelineStageFlags2::from_raw(
        !vk::PipelineStageFlags2::HOST.as_raw(),
    ));
}

vk_enum_flags! {
    pub struct ImageAspectFlags: vk::ImageAspectFlags {
        COLOR => COLOR,
        DEPTH => DEPTH,
        STENCIL => STENCIL,
        METADATA => METADATA,
        PLANE_0 => PLANE_0,
        PLANE_1 => PLANE_1,
        PLANE_2 => PLANE_2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSubresourceRange {
    pub aspect_mask: ImageAspectFlags,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

impl ImageSubresourceRange {
    pub fn new(
        aspect_mask: ImageAspectFlags,
        base_mip_level: u32,
        level_count: u32,
        base_array_layer: u32,
        layer_count: u32,
    ) -> Self {
        Self {
            aspect_mask,
            base_mip_level,
            level_count,
            base_array_layer,
            layer_count,
        }
    }

    pub fn to_vk(self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask.to_vk(),
            base_mip_level: self.base_mip_level,
            level_count: self.level_count,
            base_array_layer: self.base_array_layer,
            layer_count: self.layer_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryBarrier2 {
    pub src_stage_mask: PipelineStageFlags2,
    pub src_access_mask: AccessFlags2,
    pub dst_stage_mask: PipelineStageFlags2,
    pub dst_access_mask: AccessFlags2,
}

impl MemoryBarrier2 {
    /// Returns `true` if the barrier has no execution dependency at all.
    pub fn is_empty(&self) -> bool {
        self.src_stage_mask.is_empty() && self.dst_stage_mask.is_empty()
    }

    pub fn to_vk(self) -> vk::MemoryBarrier2<'static> {
        vk::MemoryBarrier2::default()
            .src_stage_mask(self.src_stage_mask.to_vk())
            .src_access_mask(self.src_access_mask.to_vk())
            .dst_stage_mask(self.dst_stage_mask.to_vk())
            .dst_access_mask(self.dst_access_mask.to_vk())
    }
}

/// An image barrier, possibly carrying a layout transition or a queue family
/// ownership transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMemoryBarrier2 {
    pub image: vk::Image,
    pub src_stage_mask: PipelineStageFlags2,
    pub src_access_mask: AccessFlags2,
    pub dst_stage_mask: PipelineStageFlags2,
    pub dst_access_mask: AccessFlags2,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_queue_family_index: u32,
    pub dst_queue_family_index: u32,
    pub subresource_range: ImageSubresourceRange,
}

impl ImageMemoryBarrier2 {
    /// Returns `true` if the barrier changes the image layout.
    pub fn is_layout_transition(&self) -> bool {
        self.old_layout != self.new_layout
    }

    /// Returns `true` if the barrier is one half of a queue family ownership transfer.
    pub fn is_queue_transfer(&self) -> bool {
        self.src_queue_family_index != self.dst_queue_family_index
    }

    /// Drops the image specific parts of the barrier.
    pub fn memory_barrier(&self) -> MemoryBarrier2 {
        MemoryBarrier2 {
            src_stage_mask: self.src_stage_mask,
            src_access_mask: self.src_access_mask,
            dst_stage_mask: self.dst_stage_mask,
            dst_access_mask: self.dst_access_mask,
        }
    }

    pub fn to_vk(self) -> vk::ImageMemoryBarrier2<'static> {
        vk::ImageMemoryBarrier2::default()
            .image(self.image)
            .src_stage_mask(self.src_stage_mask.to_vk())
            .src_access_mask(self.src_access_mask.to_vk())
            .dst_stage_mask(self.dst_stage_mask.to_vk())
            .dst_access_mask(self.dst_access_mask.to_vk())
            .old_layout(self.old_layout.to_vk())
            .new_layout(self.new_layout.to_vk())
            .src_queue_family_index(self.src_queue_family_index)
            .dst_queue_family_index(self.dst_queue_family_index)
            .subresource_range(self.subresource_range.to_vk())
    }
}
