use ash::vk::{self, Handle};
use vislum_barrier::{
    AccessFlags, BarrierSet, BufferSliceHandle, CmdBuffer, CommandSink, DependencyInfo,
    ImageResource, VkHandle,
    types::{
        AccessFlags2, ImageAspectFlags, ImageLayout, ImageMemoryBarrier2, ImageSubresourceRange,
        MemoryBarrier2, PipelineStageFlags2,
    },
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct CommandLog {
    dependencies: Vec<(CmdBuffer, Vec<MemoryBarrier2>, Vec<ImageMemoryBarrier2>)>,
}

impl CommandSink for CommandLog {
    fn pipeline_barrier(&mut self, cmd_buffer: CmdBuffer, dependency: &DependencyInfo<'_>) {
        self.dependencies.push((
            cmd_buffer,
            dependency.memory_barriers.to_vec(),
            dependency.image_barriers.to_vec(),
        ));
    }
}

struct Texture {
    image: vk::Image,
    mip_levels: u32,
}

impl VkHandle for Texture {
    type Handle = vk::Image;

    fn vk_handle(&self) -> vk::Image {
        self.image
    }
}

impl ImageResource for Texture {
    fn aspect_mask(&self) -> ImageAspectFlags {
        ImageAspectFlags::COLOR
    }
}

fn level(texture: &Texture, level: u32) -> ImageSubresourceRange {
    debug_assert!(level < texture.mip_levels);
    ImageSubresourceRange::new(ImageAspectFlags::COLOR, level, 1, 0, 1)
}

/// Upload mip 0, then blit every level from the previous one.
#[test]
fn mip_chain_generation() {
    init_logger();

    let mut barriers = BarrierSet::new(CmdBuffer::ExecBuffer);
    let mut log = CommandLog::default();
    let texture = Texture {
        image: vk::Image::from_raw(0xdead_0000),
        mip_levels: 6,
    };

    let all = ImageSubresourceRange::new(ImageAspectFlags::COLOR, 0, texture.mip_levels, 0, 1);
    assert!(barriers.access_image(
        &texture,
        &all,
        ImageLayout::Undefined,
        PipelineStageFlags2::TOP_OF_PIPE,
        AccessFlags2::NONE,
        ImageLayout::TransferDstOptimal,
        PipelineStageFlags2::TRANSFER,
        AccessFlags2::TRANSFER_WRITE,
    ));
    barriers.record_commands(&mut log);

    for mip in 1..texture.mip_levels {
        assert!(barriers.is_image_dirty(&texture, &level(&texture, mip - 1), AccessFlags::READ));

        // Source level becomes readable
        assert!(barriers.access_image(
            &texture,
            &level(&texture, mip - 1),
            ImageLayout::TransferDstOptimal,
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_WRITE,
            ImageLayout::TransferSrcOptimal,
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_READ,
        ));
        barriers.record_commands(&mut log);
    }

    assert_eq!(log.dependencies.len(), texture.mip_levels as usize);
    for (mip, (cmd_buffer, memory, images)) in log.dependencies.iter().enumerate().skip(1) {
        assert_eq!(*cmd_buffer, CmdBuffer::ExecBuffer);
        assert!(memory.is_empty());
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].subresource_range.base_mip_level, mip as u32 - 1);
        assert_eq!(images[0].new_layout, ImageLayout::TransferSrcOptimal);
    }
}

/// Many small uploads into disjoint regions of one buffer, then one draw
/// reading all of them.
#[test]
fn staged_uploads_then_draw() {
    init_logger();

    let mut barriers = BarrierSet::new(CmdBuffer::InitBuffer);
    let mut log = CommandLog::default();
    let buffer = vk::Buffer::from_raw(0xbeef_0000);

    for i in 0..512 {
        let slice = BufferSliceHandle::new(buffer, i * 256, 256);
        assert!(!barriers.access_buffer(
            &slice,
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_WRITE,
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_WRITE,
        ));
    }

    assert!(!barriers.is_buffer_dirty(
        &BufferSliceHandle::new(buffer, 512 * 256, 1024),
        AccessFlags::WRITE
    ));

    let whole = BufferSliceHandle::new(buffer, 0, 512 * 256);
    assert_eq!(barriers.buffer_access(&whole), AccessFlags::WRITE);
    assert!(barriers.access_buffer(
        &whole,
        PipelineStageFlags2::TRANSFER,
        AccessFlags2::TRANSFER_WRITE,
        PipelineStageFlags2::VERTEX_INPUT,
        AccessFlags2::VERTEX_ATTRIBUTE_READ,
    ));

    barriers.finalize(&mut log);
    assert_eq!(log.dependencies.len(), 1);

    let (cmd_buffer, memory, images) = &log.dependencies[0];
    assert_eq!(*cmd_buffer, CmdBuffer::InitBuffer);
    assert!(images.is_empty());
    assert_eq!(memory[0].dst_stage_mask, PipelineStageFlags2::VERTEX_INPUT);
}

/// Barrier sets are reused across command lists.
#[test]
fn reuse_after_reset() {
    init_logger();

    let mut barriers = BarrierSet::new(CmdBuffer::ExecBuffer);
    let mut log = CommandLog::default();

    for frame in 0..4u64 {
        for i in 0..100 {
            let slice = BufferSliceHandle::new(vk::Buffer::from_raw(0x100 + i), 0, 64);
            barriers.access_buffer(
                &slice,
                PipelineStageFlags2::COMPUTE_SHADER,
                AccessFlags2::SHADER_WRITE,
                PipelineStageFlags2::COMPUTE_SHADER,
                AccessFlags2::SHADER_WRITE,
            );
        }

        let slice = BufferSliceHandle::new(vk::Buffer::from_raw(0x100 + frame), 0, 64);
        assert!(barriers.is_buffer_dirty(&slice, AccessFlags::READ));

        barriers.finalize(&mut log);
        barriers.reset();

        assert!(!barriers.has_resource_barriers());
        assert!(!barriers.is_buffer_dirty(&slice, AccessFlags::WRITE));
    }

    assert!(log.dependencies.is_empty());
}
