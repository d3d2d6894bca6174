use ash::vk::{self, Handle};

use crate::{
    access::{Access, AccessFlags},
    batch::BarrierBatch,
    config::BarrierSetConfig,
    error::ConfigError,
    range::AddressRange,
    resource::{BufferSliceHandle, ImageResource},
    sink::{CmdBuffer, CommandSink},
    slice::{BufferSlice, ImageSlice},
    subresource::SubresourceSet,
    tracker::BarrierTracker,
    types::{
        AccessFlags2, ImageLayout, ImageMemoryBarrier2, ImageSubresourceRange, MemoryBarrier2,
        PipelineStageFlags2,
    },
};

/// Barrier set.
///
/// Tracks resource accesses within a command buffer and accumulates the
/// barriers needed to resolve hazards between them. Accesses must be declared
/// in the order in which the GPU executes them.
#[derive(Debug)]
pub struct BarrierSet {
    batch: BarrierBatch,
    all_src_stages: PipelineStageFlags2,
    buf_slices: SubresourceSet<vk::Buffer, BufferSlice>,
    img_slices: SubresourceSet<vk::Image, ImageSlice>,
    tracker: BarrierTracker,
    coarse_tracking: bool,
}

static_assertions::assert_impl_all!(BarrierSet: Send, Sync);

impl BarrierSet {
    /// Creates a barrier set with the default configuration.
    pub fn new(cmd_buffer: CmdBuffer) -> Self {
        Self::from_valid_config(cmd_buffer, BarrierSetConfig::default())
    }

    pub fn with_config(cmd_buffer: CmdBuffer, config: BarrierSetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(cmd_buffer, config))
    }

    fn from_valid_config(cmd_buffer: CmdBuffer, config: BarrierSetConfig) -> Self {
        Self {
            batch: BarrierBatch::new(cmd_buffer),
            all_src_stages: PipelineStageFlags2::empty(),
            buf_slices: SubresourceSet::with_capacity(config.initial_buffer_capacity),
            img_slices: SubresourceSet::with_capacity(config.initial_image_capacity),
            tracker: BarrierTracker::new(),
            coarse_tracking: config.coarse_tracking,
        }
    }

    pub fn cmd_buffer(&self) -> CmdBuffer {
        self.batch.cmd_buffer()
    }

    /// Adds a global memory dependency without tracking any resource.
    pub fn access_memory(
        &mut self,
        src_stages: PipelineStageFlags2,
        src_access: AccessFlags2,
        dst_stages: PipelineStageFlags2,
        dst_access: AccessFlags2,
    ) {
        self.add_memory_barrier(&MemoryBarrier2 {
            src_stage_mask: src_stages,
            src_access_mask: src_access,
            dst_stage_mask: dst_stages,
            dst_access_mask: dst_access,
        });
    }

    /// Declares an access to a buffer slice.
    ///
    /// Appends a memory barrier if the access conflicts with a previous one,
    /// and returns whether it did.
    pub fn access_buffer(
        &mut self,
        slice: &BufferSliceHandle,
        src_stages: PipelineStageFlags2,
        src_access: AccessFlags2,
        dst_stages: PipelineStageFlags2,
        dst_access: AccessFlags2,
    ) -> bool {
        let access = AccessFlags::from_dependency(src_stages, dst_stages, dst_access);
        let dirty = self.is_buffer_dirty(slice, access);

        if dirty {
            self.add_memory_barrier(&MemoryBarrier2 {
                src_stage_mask: src_stages,
                src_access_mask: src_access,
                dst_stage_mask: dst_stages,
                dst_access_mask: dst_access,
            });
        }

        self.record_buffer(slice, access);
        dirty
    }

    /// Declares an access to image subresources.
    ///
    /// Layout transitions always produce an image barrier. Other accesses only
    /// produce a barrier if they conflict with a previous access. Returns
    /// whether a barrier was appended.
    #[allow(clippy::too_many_arguments)]
    pub fn access_image<I: ImageResource + ?Sized>(
        &mut self,
        image: &I,
        subresources: &ImageSubresourceRange,
        src_layout: ImageLayout,
        src_stages: PipelineStageFlags2,
        src_access: AccessFlags2,
        dst_layout: ImageLayout,
        dst_stages: PipelineStageFlags2,
        dst_access: AccessFlags2,
    ) -> bool {
        let mut access = AccessFlags::from_dependency(src_stages, dst_stages, dst_access);

        // Layout transitions write the image
        if src_layout != dst_layout {
            access |= AccessFlags::WRITE;
        }

        let needs_barrier = src_layout != dst_layout || self.is_image_dirty(image, subresources, access);

        if needs_barrier {
            self.add_image_barrier(&ImageMemoryBarrier2 {
                image: image.vk_handle(),
                src_stage_mask: src_stages,
                src_access_mask: src_access,
                dst_stage_mask: dst_stages,
                dst_access_mask: dst_access,
                old_layout: src_layout,
                new_layout: dst_layout,
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                subresource_range: full_aspects(image, subresources),
            });
        }

        self.record_image(image.vk_handle(), subresources, access);
        needs_barrier
    }

    /// Transfers ownership of image subresources to another queue.
    ///
    /// The release half of the transfer is recorded into this set, the
    /// acquire half into `acquire`. If both queues are the same, the pair
    /// degrades to a plain layout transition.
    #[allow(clippy::too_many_arguments)]
    pub fn release_image<I: ImageResource + ?Sized>(
        &mut self,
        acquire: &mut BarrierSet,
        image: &I,
        subresources: &ImageSubresourceRange,
        src_queue: u32,
        src_layout: ImageLayout,
        src_stages: PipelineStageFlags2,
        src_access: AccessFlags2,
        dst_queue: u32,
        dst_layout: ImageLayout,
        dst_stages: PipelineStageFlags2,
        dst_access: AccessFlags2,
    ) {
        let handle = image.vk_handle();
        let subresource_range = full_aspects(image, subresources);

        let release = ImageMemoryBarrier2 {
            image: handle,
            src_stage_mask: src_stages,
            src_access_mask: src_access,
            dst_stage_mask: PipelineStageFlags2::NONE,
            dst_access_mask: AccessFlags2::NONE,
            old_layout: src_layout,
            new_layout: dst_layout,
            src_queue_family_index: src_queue,
            dst_queue_family_index: dst_queue,
            subresource_range,
        };

        // The release barrier already performs the transition on the same queue
        let acquire_layout = if src_queue == dst_queue { dst_layout } else { src_layout };

        let acquire_barrier = ImageMemoryBarrier2 {
            image: handle,
            src_stage_mask: PipelineStageFlags2::NONE,
            src_access_mask: AccessFlags2::NONE,
            dst_stage_mask: dst_stages,
            dst_access_mask: dst_access,
            old_layout: acquire_layout,
            new_layout: dst_layout,
            src_queue_family_index: src_queue,
            dst_queue_family_index: dst_queue,
            subresource_range,
        };

        self.add_image_barrier(&release);
        acquire.add_image_barrier(&acquire_barrier);

        let access = AccessFlags::READ | AccessFlags::WRITE;
        self.record_image(handle, subresources, access);
        acquire.record_image(handle, subresources, access);
    }

    /// Checks whether an access to a buffer slice would conflict with a
    /// previous access.
    pub fn is_buffer_dirty(&self, slice: &BufferSliceHandle, access: AccessFlags) -> bool {
        if slice.length == 0 {
            return false;
        }

        if self.coarse_tracking && !self.tracker_may_conflict(&buffer_range(slice), access) {
            return false;
        }

        self.buf_slices.is_dirty(
            slice.handle,
            &BufferSlice::new(slice.offset, slice.length, access),
        )
    }

    /// Checks whether an access to image subresources would conflict with a
    /// previous access.
    pub fn is_image_dirty<I: ImageResource + ?Sized>(
        &self,
        image: &I,
        subresources: &ImageSubresourceRange,
        access: AccessFlags,
    ) -> bool {
        if is_empty_range(subresources) {
            return false;
        }

        let handle = image.vk_handle();

        if self.coarse_tracking
            && !self.tracker_may_conflict(&AddressRange::for_image(handle.as_raw(), subresources), access)
        {
            return false;
        }

        self.img_slices
            .is_dirty(handle, &ImageSlice::new(subresources, access))
    }

    /// Returns how a buffer slice has been accessed so far.
    pub fn buffer_access(&self, slice: &BufferSliceHandle) -> AccessFlags {
        if slice.length == 0 {
            return AccessFlags::empty();
        }

        if self.coarse_tracking && !self.tracker_has_any(&buffer_range(slice)) {
            return AccessFlags::empty();
        }

        self.buf_slices.access(
            slice.handle,
            &BufferSlice::new(slice.offset, slice.length, AccessFlags::empty()),
        )
    }

    /// Returns how image subresources have been accessed so far.
    pub fn image_access<I: ImageResource + ?Sized>(
        &self,
        image: &I,
        subresources: &ImageSubresourceRange,
    ) -> AccessFlags {
        if is_empty_range(subresources) {
            return AccessFlags::empty();
        }

        let handle = image.vk_handle();

        if self.coarse_tracking
            && !self.tracker_has_any(&AddressRange::for_image(handle.as_raw(), subresources))
        {
            return AccessFlags::empty();
        }

        self.img_slices
            .access(handle, &ImageSlice::new(subresources, AccessFlags::empty()))
    }

    /// Source stages of all barriers recorded since the last flush.
    pub fn src_stages(&self) -> PipelineStageFlags2 {
        self.all_src_stages
    }

    /// Checks whether any buffer or image access is being tracked.
    pub fn has_resource_barriers(&self) -> bool {
        !self.buf_slices.is_empty() || !self.img_slices.is_empty()
    }

    /// Checks whether recording would emit anything.
    pub fn has_pending_barriers(&self) -> bool {
        !self.batch.is_empty() || self.batch.has_host_barrier()
    }

    /// Records pending barriers. Host barriers stay pending until
    /// [`finalize`](Self::finalize), and tracked accesses are kept.
    pub fn record_commands(&mut self, sink: &mut dyn CommandSink) {
        self.batch.flush(sink);
        self.all_src_stages = PipelineStageFlags2::empty();
    }

    /// Records all pending barriers, including host barriers.
    pub fn finalize(&mut self, sink: &mut dyn CommandSink) {
        self.batch.finalize(sink);
        self.all_src_stages = PipelineStageFlags2::empty();
    }

    /// Drops all pending barriers and every tracked access.
    ///
    /// Allocations are kept for reuse.
    pub fn reset(&mut self) {
        log::trace!(
            "resetting barrier set for {:?}: {} buffers, {} images",
            self.cmd_buffer(),
            self.buf_slices.len(),
            self.img_slices.len(),
        );

        self.batch.reset();
        self.all_src_stages = PipelineStageFlags2::empty();
        self.buf_slices.clear();
        self.img_slices.clear();
        self.tracker.clear();
    }

    fn add_memory_barrier(&mut self, barrier: &MemoryBarrier2) {
        self.all_src_stages |= barrier.src_stage_mask;
        self.batch.add_memory_barrier(barrier);
    }

    fn add_image_barrier(&mut self, barrier: &ImageMemoryBarrier2) {
        self.all_src_stages |= barrier.src_stage_mask;
        self.batch.add_image_barrier(barrier);
    }

    fn record_buffer(&mut self, slice: &BufferSliceHandle, access: AccessFlags) {
        if access.is_empty() || slice.length == 0 {
            return;
        }

        if self.coarse_tracking {
            let range = buffer_range(slice);

            for kind in access.kinds() {
                self.tracker.insert_range(&range, kind);
            }
        }

        self.buf_slices.insert(
            slice.handle,
            &BufferSlice::new(slice.offset, slice.length, access),
        );
    }

    fn record_image(
        &mut self,
        handle: vk::Image,
        subresources: &ImageSubresourceRange,
        access: AccessFlags,
    ) {
        if access.is_empty() || is_empty_range(subresources) {
            return;
        }

        if self.coarse_tracking {
            let range = AddressRange::for_image(handle.as_raw(), subresources);

            for kind in access.kinds() {
                self.tracker.insert_range(&range, kind);
            }
        }

        self.img_slices
            .insert(handle, &ImageSlice::new(subresources, access));
    }

    /// Any pending write conflicts. Pending reads only conflict with writes.
    fn tracker_may_conflict(&self, range: &AddressRange, access: AccessFlags) -> bool {
        self.tracker.find_range(range, Access::Write)
            || (access.contains(AccessFlags::WRITE) && self.tracker.find_range(range, Access::Read))
    }

    fn tracker_has_any(&self, range: &AddressRange) -> bool {
        self.tracker.find_range(range, Access::Write) || self.tracker.find_range(range, Access::Read)
    }
}

fn buffer_range(slice: &BufferSliceHandle) -> AddressRange {
    AddressRange::for_buffer(slice.handle.as_raw(), slice.offset, slice.length)
}

fn is_empty_range(subresources: &ImageSubresourceRange) -> bool {
    subresources.level_count == 0 || subresources.layer_count == 0
}

fn full_aspects<I: ImageResource + ?Sized>(
    image: &I,
    subresources: &ImageSubresourceRange,
) -> ImageSubresourceRange {
    ImageSubresourceRange {
        aspect_mask: image.aspect_mask(),
        ..*subresources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VkHandle, sink::testing::RecordingSink, types::ImageAspectFlags};

    struct TestImage {
        handle: vk::Image,
        aspects: ImageAspectFlags,
    }

    impl TestImage {
        fn color(raw: u64) -> Self {
            Self {
                handle: vk::Image::from_raw(raw),
                aspects: ImageAspectFlags::COLOR,
            }
        }
    }

    impl VkHandle for TestImage {
        type Handle = vk::Image;

        fn vk_handle(&self) -> Self::Handle {
            self.handle
        }
    }

    impl ImageResource for TestImage {
        fn aspect_mask(&self) -> ImageAspectFlags {
            self.aspects
        }
    }

    fn buffer(offset: u64, length: u64) -> BufferSliceHandle {
        BufferSliceHandle::new(vk::Buffer::from_raw(0x1000), offset, length)
    }

    fn mip(level: u32) -> ImageSubresourceRange {
        ImageSubresourceRange::new(ImageAspectFlags::COLOR, level, 1, 0, 4)
    }

    fn write_buffer(set: &mut BarrierSet, slice: &BufferSliceHandle) -> bool {
        set.access_buffer(
            slice,
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_WRITE,
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_WRITE,
        )
    }

    fn read_buffer(set: &mut BarrierSet, slice: &BufferSliceHandle) -> bool {
        set.access_buffer(
            slice,
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_WRITE,
            PipelineStageFlags2::COMPUTE_SHADER,
            AccessFlags2::SHADER_READ,
        )
    }

    fn storage_write(set: &mut BarrierSet, image: &TestImage, subresources: &ImageSubresourceRange) -> bool {
        set.access_image(
            image,
            subresources,
            ImageLayout::General,
            PipelineStageFlags2::COMPUTE_SHADER,
            AccessFlags2::SHADER_WRITE,
            ImageLayout::General,
            PipelineStageFlags2::COMPUTE_SHADER,
            AccessFlags2::SHADER_WRITE,
        )
    }

    #[test]
    fn test_buffer_read_after_write() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut sink = RecordingSink::default();

        assert!(!write_buffer(&mut set, &buffer(0, 64)));
        assert!(set.is_buffer_dirty(&buffer(32, 64), AccessFlags::READ));
        assert!(read_buffer(&mut set, &buffer(32, 64)));
        assert!(!set.is_buffer_dirty(&buffer(128, 64), AccessFlags::READ));
        assert!(!read_buffer(&mut set, &buffer(128, 64)));

        assert_eq!(set.src_stages(), PipelineStageFlags2::TRANSFER);
        set.record_commands(&mut sink);

        assert_eq!(sink.barriers.len(), 1);
        assert_eq!(
            sink.barriers[0].memory_barriers,
            vec![MemoryBarrier2 {
                src_stage_mask: PipelineStageFlags2::TRANSFER,
                src_access_mask: AccessFlags2::TRANSFER_WRITE,
                dst_stage_mask: PipelineStageFlags2::COMPUTE_SHADER,
                dst_access_mask: AccessFlags2::SHADER_READ,
            }]
        );
        assert!(set.src_stages().is_empty());
    }

    #[test]
    fn test_reads_never_conflict() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);

        for offset in [0, 16, 32, 48] {
            assert!(!read_buffer(&mut set, &buffer(offset, 64)));
        }

        assert_eq!(set.buffer_access(&buffer(0, 256)), AccessFlags::READ);
        assert!(set.is_buffer_dirty(&buffer(8, 8), AccessFlags::WRITE));
        assert!(!set.has_pending_barriers());
    }

    #[test]
    fn test_buffer_access_matches_recorded_slices() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        write_buffer(&mut set, &buffer(0, 64));
        read_buffer(&mut set, &buffer(256, 64));

        assert_eq!(set.buffer_access(&buffer(0, 16)), AccessFlags::WRITE);
        assert_eq!(set.buffer_access(&buffer(256, 16)), AccessFlags::READ);
        assert_eq!(set.buffer_access(&buffer(128, 16)), AccessFlags::empty());
        assert_eq!(set.buffer_access(&buffer(0, 0)), AccessFlags::empty());
    }

    #[test]
    fn test_coarse_tracking_does_not_change_results() {
        let config = BarrierSetConfig {
            coarse_tracking: false,
            ..Default::default()
        };

        let mut coarse = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut precise = BarrierSet::with_config(CmdBuffer::ExecBuffer, config).unwrap();

        for (offset, write) in [(0, true), (32, false), (96, false), (64, true), (200, false)] {
            let slice = buffer(offset, 48);
            let (a, b) = if write {
                (write_buffer(&mut coarse, &slice), write_buffer(&mut precise, &slice))
            } else {
                (read_buffer(&mut coarse, &slice), read_buffer(&mut precise, &slice))
            };
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_adjacent_mips_are_merged() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let image = TestImage::color(0x2000);

        assert!(!storage_write(&mut set, &image, &mip(0)));
        assert!(!storage_write(&mut set, &image, &mip(1)));

        let both = ImageSubresourceRange::new(ImageAspectFlags::COLOR, 0, 2, 0, 4);
        assert_eq!(set.image_access(&image, &both), AccessFlags::WRITE);
        assert!(set.is_image_dirty(&image, &mip(1), AccessFlags::READ));
        assert!(!set.is_image_dirty(&image, &mip(2), AccessFlags::WRITE));
        assert!(!set.is_image_dirty(&TestImage::color(0x3000), &mip(0), AccessFlags::WRITE));
    }

    #[test]
    fn test_empty_query_access_sees_recorded_writes() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let image = TestImage::color(0x2000);

        write_buffer(&mut set, &buffer(0, 64));
        storage_write(&mut set, &image, &mip(0));

        assert!(set.is_buffer_dirty(&buffer(0, 64), AccessFlags::empty()));
        assert!(!set.is_buffer_dirty(&buffer(64, 64), AccessFlags::empty()));
        assert!(set.is_image_dirty(&image, &mip(0), AccessFlags::empty()));
        assert!(!set.is_image_dirty(&image, &mip(1), AccessFlags::empty()));

        read_buffer(&mut set, &buffer(256, 64));
        assert!(!set.is_buffer_dirty(&buffer(256, 64), AccessFlags::empty()));
    }

    #[test]
    fn test_remaining_subresources_cover_every_level() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut sink = RecordingSink::default();
        let image = TestImage::color(0x2000);
        let rest = ImageSubresourceRange::new(
            ImageAspectFlags::COLOR,
            1,
            vk::REMAINING_MIP_LEVELS,
            0,
            vk::REMAINING_ARRAY_LAYERS,
        );

        assert!(!storage_write(&mut set, &image, &rest));
        assert!(set.is_image_dirty(&image, &mip(3), AccessFlags::READ));
        assert!(!set.is_image_dirty(&image, &mip(0), AccessFlags::WRITE));
        assert!(storage_write(&mut set, &image, &mip(2)));

        assert!(set.access_image(
            &image,
            &rest,
            ImageLayout::General,
            PipelineStageFlags2::COMPUTE_SHADER,
            AccessFlags2::SHADER_WRITE,
            ImageLayout::ShaderReadOnlyOptimal,
            PipelineStageFlags2::FRAGMENT_SHADER,
            AccessFlags2::SHADER_READ,
        ));

        set.record_commands(&mut sink);
        let barrier = sink.barriers[0].image_barriers[0];
        assert_eq!(barrier.subresource_range.level_count, vk::REMAINING_MIP_LEVELS);
    }

    #[test]
    fn test_layout_transition_always_records_barrier() {
        let mut set = BarrierSet::new(CmdBuffer::InitBuffer);
        let mut sink = RecordingSink::default();
        let image = TestImage {
            handle: vk::Image::from_raw(0x2000),
            aspects: ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL,
        };
        let depth = ImageSubresourceRange::new(ImageAspectFlags::DEPTH, 0, 1, 0, 1);

        assert!(set.access_image(
            &image,
            &depth,
            ImageLayout::Undefined,
            PipelineStageFlags2::TOP_OF_PIPE,
            AccessFlags2::NONE,
            ImageLayout::DepthStencilAttachmentOptimal,
            PipelineStageFlags2::EARLY_FRAGMENT_TESTS,
            AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ));

        set.record_commands(&mut sink);

        let recorded = &sink.barriers[0];
        assert_eq!(recorded.cmd_buffer, CmdBuffer::InitBuffer);
        assert!(recorded.memory_barriers.is_empty());
        assert_eq!(recorded.image_barriers.len(), 1);

        let barrier = recorded.image_barriers[0];
        assert_eq!(barrier.old_layout, ImageLayout::Undefined);
        assert_eq!(barrier.new_layout, ImageLayout::DepthStencilAttachmentOptimal);
        assert_eq!(
            barrier.subresource_range.aspect_mask,
            ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL
        );
        assert_eq!(set.image_access(&image, &depth), AccessFlags::WRITE);
    }

    #[test]
    fn test_image_hazard_without_transition_is_memory_barrier() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut sink = RecordingSink::default();
        let image = TestImage::color(0x2000);

        storage_write(&mut set, &image, &mip(0));
        assert!(storage_write(&mut set, &image, &mip(0)));

        set.record_commands(&mut sink);
        assert!(sink.barriers[0].image_barriers.is_empty());
        assert_eq!(sink.barriers[0].memory_barriers.len(), 1);
    }

    #[test]
    fn test_release_to_other_queue() {
        let mut release = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut acquire = BarrierSet::new(CmdBuffer::SdmaBuffer);
        let image = TestImage::color(0x2000);

        release.release_image(
            &mut acquire,
            &image,
            &mip(0),
            0,
            ImageLayout::ColorAttachmentOptimal,
            PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            AccessFlags2::COLOR_ATTACHMENT_WRITE,
            1,
            ImageLayout::TransferSrcOptimal,
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_READ,
        );

        assert_eq!(release.image_access(&image, &mip(0)), AccessFlags::READ | AccessFlags::WRITE);
        assert_eq!(acquire.image_access(&image, &mip(0)), AccessFlags::READ | AccessFlags::WRITE);

        let mut sink = RecordingSink::default();
        release.record_commands(&mut sink);
        acquire.record_commands(&mut sink);

        assert_eq!(sink.barriers.len(), 2);

        let released = sink.barriers[0].image_barriers[0];
        assert_eq!(sink.barriers[0].cmd_buffer, CmdBuffer::ExecBuffer);
        assert!(released.dst_stage_mask.is_empty());
        assert_eq!(released.src_queue_family_index, 0);
        assert_eq!(released.dst_queue_family_index, 1);

        let acquired = sink.barriers[1].image_barriers[0];
        assert_eq!(sink.barriers[1].cmd_buffer, CmdBuffer::SdmaBuffer);
        assert!(acquired.src_stage_mask.is_empty());
        assert_eq!(acquired.old_layout, ImageLayout::ColorAttachmentOptimal);
        assert_eq!(acquired.new_layout, ImageLayout::TransferSrcOptimal);
    }

    #[test]
    fn test_release_to_same_queue() {
        let mut release = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut acquire = BarrierSet::new(CmdBuffer::InitBuffer);
        let image = TestImage::color(0x2000);

        release.release_image(
            &mut acquire,
            &image,
            &mip(0),
            0,
            ImageLayout::ColorAttachmentOptimal,
            PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            AccessFlags2::COLOR_ATTACHMENT_WRITE,
            0,
            ImageLayout::ShaderReadOnlyOptimal,
            PipelineStageFlags2::FRAGMENT_SHADER,
            AccessFlags2::SHADER_READ,
        );

        let mut sink = RecordingSink::default();
        acquire.record_commands(&mut sink);

        // Nothing left to transition, so only the memory dependency remains
        assert!(sink.barriers[0].image_barriers.is_empty());
        assert_eq!(
            sink.barriers[0].memory_barriers[0].dst_stage_mask,
            PipelineStageFlags2::FRAGMENT_SHADER
        );
    }

    #[test]
    fn test_host_read_waits_for_finalize() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut sink = RecordingSink::default();

        write_buffer(&mut set, &buffer(0, 64));
        assert!(set.access_buffer(
            &buffer(0, 64),
            PipelineStageFlags2::TRANSFER,
            AccessFlags2::TRANSFER_WRITE,
            PipelineStageFlags2::HOST,
            AccessFlags2::HOST_READ,
        ));

        set.record_commands(&mut sink);
        let recorded = sink.barriers.len();
        let host_access = sink
            .barriers
            .iter()
            .flat_map(|barrier| &barrier.memory_barriers)
            .any(|barrier| barrier.dst_access_mask.intersects(AccessFlags2::HOST_MASK));
        assert!(!host_access);
        assert!(set.has_pending_barriers());

        set.finalize(&mut sink);
        assert_eq!(sink.barriers.len(), recorded + 1);

        let host = sink.barriers[recorded].memory_barriers[0];
        assert_eq!(host.dst_stage_mask, PipelineStageFlags2::HOST);
        assert_eq!(host.dst_access_mask, AccessFlags2::HOST_READ);
        assert!(!set.has_pending_barriers());
    }

    #[test]
    fn test_access_memory_is_untracked() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut sink = RecordingSink::default();

        set.access_memory(
            PipelineStageFlags2::COMPUTE_SHADER,
            AccessFlags2::SHADER_WRITE,
            PipelineStageFlags2::DRAW_INDIRECT,
            AccessFlags2::INDIRECT_COMMAND_READ,
        );

        assert!(!set.has_resource_barriers());
        assert_eq!(set.src_stages(), PipelineStageFlags2::COMPUTE_SHADER);

        set.record_commands(&mut sink);
        assert_eq!(sink.barriers.len(), 1);
    }

    #[test]
    fn test_record_commands_keeps_tracking() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut sink = RecordingSink::default();

        write_buffer(&mut set, &buffer(0, 64));
        set.record_commands(&mut sink);

        assert!(set.has_resource_barriers());
        assert!(read_buffer(&mut set, &buffer(0, 64)));
    }

    #[test]
    fn test_reset() {
        let mut set = BarrierSet::new(CmdBuffer::ExecBuffer);
        let mut sink = RecordingSink::default();
        let image = TestImage::color(0x2000);

        write_buffer(&mut set, &buffer(0, 64));
        read_buffer(&mut set, &buffer(0, 64));
        storage_write(&mut set, &image, &mip(0));
        assert!(set.has_resource_barriers());

        set.reset();

        assert!(!set.has_resource_barriers());
        assert!(!set.has_pending_barriers());
        assert!(set.src_stages().is_empty());
        assert_eq!(set.buffer_access(&buffer(0, 64)), AccessFlags::empty());
        assert_eq!(set.image_access(&image, &mip(0)), AccessFlags::empty());

        set.finalize(&mut sink);
        assert!(sink.barriers.is_empty());

        assert!(!write_buffer(&mut set, &buffer(0, 64)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = BarrierSetConfig {
            initial_image_capacity: 3,
            ..Default::default()
        };

        assert!(BarrierSet::with_config(CmdBuffer::ExecBuffer, config).is_err());
    }
}
