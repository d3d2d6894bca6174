/// Errors reported when validating a [`BarrierSetConfig`](crate::config::BarrierSetConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a non-zero power of two, got {value}")]
    CapacityNotPowerOfTwo { name: &'static str, value: usize },
    #[error("{name} must not exceed {max}, got {value}")]
    CapacityTooLarge {
        name: &'static str,
        value: usize,
        max: usize,
    },
}
