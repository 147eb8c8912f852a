// Erasure strategies share one contract: erase the device at a path, or say
// exactly why not. No state carries over between invocations.

pub mod encrypted;
pub mod overwrite;

pub use encrypted::EncryptedOverwrite;
pub use overwrite::BlockOverwrite;

use crate::{ErasureResult, WipeMethod};

/// Trait implemented by every erasure backend
pub trait ErasureStrategy: Send + Sync {
    /// Method this strategy implements
    fn method(&self) -> WipeMethod;

    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Erase the device at `device_path`. Returns only after the erase has
    /// finished or failed.
    fn execute(&self, device_path: &str) -> ErasureResult<()>;
}
