use crate::{
    sink::{CmdBuffer, CommandSink, DependencyInfo},
    types::{AccessFlags2, ImageMemoryBarrier2, MemoryBarrier2, PipelineStageFlags2},
};

/// Barrier batch.
///
/// Accumulates barriers so that they can be recorded into a command buffer
/// in a single step. All memory barriers collapse into one.
#[derive(Debug)]
pub struct BarrierBatch {
    cmd_buffer: CmdBuffer,
    memory_barrier: MemoryBarrier2,
    host_src_stages: PipelineStageFlags2,
    host_dst_access: AccessFlags2,
    image_barriers: Vec<ImageMemoryBarrier2>,
}

impl BarrierBatch {
    pub fn new(cmd_buffer: CmdBuffer) -> Self {
        Self {
            cmd_buffer,
            memory_barrier: MemoryBarrier2::default(),
            host_src_stages: PipelineStageFlags2::empty(),
            host_dst_access: AccessFlags2::empty(),
            image_barriers: Vec::new(),
        }
    }

    pub fn cmd_buffer(&self) -> CmdBuffer {
        self.cmd_buffer
    }

    /// Adds a memory barrier.
    ///
    /// Host accesses only become visible at command list boundaries, so
    /// the host part of the barrier is deferred until [`finalize`](Self::finalize).
    pub fn add_memory_barrier(&mut self, barrier: &MemoryBarrier2) {
        if barrier.is_empty() {
            return;
        }

        let mut barrier = *barrier;

        if barrier.dst_access_mask.intersects(AccessFlags2::HOST_MASK) {
            self.host_src_stages |= barrier.src_stage_mask & PipelineStageFlags2::DEVICE_MASK;
            self.host_dst_access |= barrier.dst_access_mask & AccessFlags2::HOST_MASK;

            barrier.dst_stage_mask &= !PipelineStageFlags2::HOST;
            barrier.dst_access_mask &= !AccessFlags2::HOST_MASK;
        }

        self.memory_barrier.src_stage_mask |= barrier.src_stage_mask;
        self.memory_barrier.src_access_mask |= barrier.src_access_mask;
        self.memory_barrier.dst_stage_mask |= barrier.dst_stage_mask;
        self.memory_barrier.dst_access_mask |= barrier.dst_access_mask;
    }

    /// Adds an image barrier.
    ///
    /// Barriers without a layout transition or queue family ownership
    /// transfer turn into plain memory barriers.
    pub fn add_image_barrier(&mut self, barrier: &ImageMemoryBarrier2) {
        if barrier.is_layout_transition() || barrier.is_queue_transfer() {
            self.image_barriers.push(*barrier);
        } else {
            self.add_memory_barrier(&barrier.memory_barrier());
        }
    }

    /// Checks whether a flush would record anything.
    pub fn is_empty(&self) -> bool {
        self.memory_barrier.is_empty() && self.image_barriers.is_empty()
    }

    /// Checks whether host barriers are waiting for [`finalize`](Self::finalize).
    pub fn has_host_barrier(&self) -> bool {
        !self.host_src_stages.is_empty()
    }

    /// Records batched memory and image barriers.
    pub fn flush(&mut self, sink: &mut dyn CommandSink) {
        if self.is_empty() {
            return;
        }

        let memory_barriers: &[MemoryBarrier2] = if self.memory_barrier.is_empty() {
            &[]
        } else {
            std::slice::from_ref(&self.memory_barrier)
        };

        log::trace!(
            "recording barrier on {:?}: {} memory, {} image",
            self.cmd_buffer,
            memory_barriers.len(),
            self.image_barriers.len(),
        );

        sink.pipeline_barrier(
            self.cmd_buffer,
            &DependencyInfo {
                memory_barriers,
                image_barriers: &self.image_barriers,
            },
        );

        self.memory_barrier = MemoryBarrier2::default();
        self.image_barriers.clear();
    }

    /// Records batched barriers, including pending host barriers.
    pub fn finalize(&mut self, sink: &mut dyn CommandSink) {
        if self.has_host_barrier() {
            self.memory_barrier.src_stage_mask |= self.host_src_stages;
            self.memory_barrier.src_access_mask |= AccessFlags2::MEMORY_WRITE;
            self.memory_barrier.dst_stage_mask |= PipelineStageFlags2::HOST;
            self.memory_barrier.dst_access_mask |= self.host_dst_access;

            self.host_src_stages = PipelineStageFlags2::empty();
            self.host_dst_access = AccessFlags2::empty();
        }

        self.flush(sink);
    }

    /// Drops all pending barriers without recording them.
    pub fn reset(&mut self) {
        self.memory_barrier = MemoryBarrier2::default();
        self.host_src_stages = PipelineStageFlags2::empty();
        self.host_dst_access = AccessFlags2::empty();
        self.image_barriers.clear();
    }
}
