use crate::{error::ConfigError, subresource::DEFAULT_CAPACITY};

/// Largest initial capacity a subresource set accepts.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 31;

/// Tuning knobs for a [`BarrierSet`](crate::barrier::BarrierSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierSetConfig {
    /// Hash slots allocated for buffers on the first buffer access.
    pub initial_buffer_capacity: usize,
    /// Hash slots allocated for images on the first image access.
    pub initial_image_capacity: usize,
    /// Consult the coarse range tracker before the subresource sets.
    pub coarse_tracking: bool,
}

impl Default for BarrierSetConfig {
    fn default() -> Self {
        Self {
            initial_buffer_capacity: DEFAULT_CAPACITY,
            initial_image_capacity: DEFAULT_CAPACITY,
            coarse_tracking: true,
        }
    }
}

impl BarrierSetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_capacity("initial_buffer_capacity", self.initial_buffer_capacity)?;
        validate_capacity("initial_image_capacity", self.initial_image_capacity)?;
        Ok(())
    }
}

fn validate_capacity(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if !value.is_power_of_two() {
        return Err(ConfigError::CapacityNotPowerOfTwo { name, value });
    }

    if value > MAX_INITIAL_CAPACITY {
        return Err(ConfigError::CapacityTooLarge {
            name,
            value,
            max: MAX_INITIAL_CAPACITY,
        });
    }

    Ok(())
}
