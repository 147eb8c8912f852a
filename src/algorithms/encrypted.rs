// Encrypted Overwrite has no interoperable key-destruction mechanism in this
// build, so the strategy refuses to run rather than report an erase it never did.

use super::ErasureStrategy;
use crate::{ErasureError, ErasureResult, WipeMethod};

pub struct EncryptedOverwrite;

impl ErasureStrategy for EncryptedOverwrite {
    fn method(&self) -> WipeMethod {
        WipeMethod::EncryptedOverwrite
    }

    fn name(&self) -> &str {
        "encrypted-overwrite"
    }

    fn execute(&self, device_path: &str) -> ErasureResult<()> {
        tracing::error!(device = device_path, "Encrypted overwrite requested but not available");
        Err(ErasureError::UnsupportedMethod(WipeMethod::EncryptedOverwrite))
    }
}
