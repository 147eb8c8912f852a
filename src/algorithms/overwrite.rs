// Block Overwrite - fixed three zero-filled passes over the full device
//
// Each pass rewinds to offset 0, writes 1 MiB zero chunks until the reported
// capacity is covered, then flushes durably. Short writes advance the offset
// and are not errors. Content is never read back.

use super::ErasureStrategy;
use crate::io::{BlockDevice, DeviceOpener, OVERWRITE_CHUNK_SIZE};
use crate::{ErasureError, ErasureResult, WipeMethod};
use std::sync::Arc;

pub const OVERWRITE_PASSES: u32 = 3;

pub struct BlockOverwrite {
    opener: Arc<dyn DeviceOpener>,
}

impl BlockOverwrite {
    pub fn new(opener: Arc<dyn DeviceOpener>) -> Self {
        Self { opener }
    }

    /// Run every pass against an already-opened device
    fn overwrite(device: &mut dyn BlockDevice, device_path: &str, size: u64) -> ErasureResult<()> {
        let zeros = vec![0u8; OVERWRITE_CHUNK_SIZE];

        for pass in 1..=OVERWRITE_PASSES {
            tracing::info!(device = device_path, pass, passes = OVERWRITE_PASSES, "Starting overwrite pass");

            device.rewind().map_err(|e| ErasureError::Io {
                pass,
                offset: 0,
                reason: format!("rewind failed: {}", e),
            })?;

            let mut written = 0u64;
            while written < size {
                let to_write = (size - written).min(OVERWRITE_CHUNK_SIZE as u64) as usize;
                let n = device
                    .write_chunk(&zeros[..to_write])
                    .map_err(|e| ErasureError::Io {
                        pass,
                        offset: written,
                        reason: e.to_string(),
                    })?;

                // A zero-length write would never make progress
                if n == 0 {
                    return Err(ErasureError::Io {
                        pass,
                        offset: written,
                        reason: "device accepted no bytes".to_string(),
                    });
                }
                written += n as u64;
            }

            device.sync().map_err(|e| ErasureError::Io {
                pass,
                offset: written,
                reason: format!("flush failed: {}", e),
            })?;

            tracing::info!(device = device_path, pass, bytes = written, "Overwrite pass flushed");
        }

        Ok(())
    }
}

impl ErasureStrategy for BlockOverwrite {
    fn method(&self) -> WipeMethod {
        WipeMethod::PlainOverwrite
    }

    fn name(&self) -> &str {
        "block-overwrite"
    }

    fn execute(&self, device_path: &str) -> ErasureResult<()> {
        // The handle lives only inside this call and is closed on every return path
        let mut device =
            self.opener
                .open_for_write(device_path)
                .map_err(|e| ErasureError::DeviceOpen {
                    path: device_path.to_string(),
                    reason: e.to_string(),
                })?;

        let size = device.capacity().map_err(|e| ErasureError::SizeQuery {
            path: device_path.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!(device = device_path, size, "Device capacity determined");

        Self::overwrite(device.as_mut(), device_path, size)
    }
}
