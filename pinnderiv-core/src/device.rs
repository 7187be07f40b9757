use std::fmt::Debug;

/// Represents the physical location where tensor data is stored.
///
/// Tensors and networks are tagged with a device. Nothing in this crate moves
/// data between devices on its own: every operation combining two tensors
/// checks that both live on the same device and reports a
/// `DerivError::DeviceMismatch` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageDevice {
    /// Main system memory (RAM). This is the default device.
    #[default]
    CPU,
    /// A CUDA-enabled GPU.
    GPU,
}

impl std::fmt::Display for StorageDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageDevice::CPU => write!(f, "cpu"),
            StorageDevice::GPU => write!(f, "gpu"),
        }
    }
}
