use crate::types::{AccessFlags2, PipelineStageFlags2};

/// The kind of access performed on a resource range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

bitflags::bitflags! {
    /// Coarse access classification used for hazard tracking.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

impl AccessFlags {
    /// Classifies Vulkan access flags into read and write accesses.
    pub fn from_access_mask(mask: AccessFlags2) -> Self {
        let mut result = Self::empty();

        if mask.intersects(AccessFlags2::READ_MASK) {
            result |= Self::READ;
        }

        if mask.intersects(AccessFlags2::WRITE_MASK) {
            result |= Self::WRITE;
        }

        result
    }

    /// Classifies the access of a dependency.
    ///
    /// `ALL_COMMANDS` on either side means we cannot reason about the access
    /// at all, so it is treated as a write.
    pub fn from_dependency(
        src_stages: PipelineStageFlags2,
        dst_stages: PipelineStageFlags2,
        access: AccessFlags2,
    ) -> Self {
        let mut result = Self::from_access_mask(access);

        if src_stages.contains(PipelineStageFlags2::ALL_COMMANDS)
            || dst_stages.contains(PipelineStageFlags2::ALL_COMMANDS)
        {
            result |= Self::WRITE;
        }

        result
    }

    /// Iterates over the individual access kinds.
    pub fn kinds(self) -> impl Iterator<Item = Access> {
        [(Self::READ, Access::Read), (Self::WRITE, Access::Write)]
            .into_iter()
            .filter_map(move |(flag, kind)| self.contains(flag).then_some(kind))
    }
}

impl From<Access> for AccessFlags {
    fn from(access: Access) -> Self {
        match access {
            Access::Read => Self::READ,
            Access::Write => Self::WRITE,
        }
    }
}
