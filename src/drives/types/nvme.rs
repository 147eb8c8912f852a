use super::run_step;
use crate::algorithms::ErasureStrategy;
use crate::drives::command::{args, CommandRunner};
use crate::{ErasureError, ErasureResult, ToolStep, WipeMethod};
use std::sync::Arc;

/// nvme-cli sanitize action: crypto erase
const SANACT_CRYPTO_ERASE: &str = "4";
/// nvme-cli sanitize action: block erase
const SANACT_BLOCK_ERASE: &str = "2";

/// NVMe sanitize: crypto erase first, block erase as the fallback.
pub struct NvmeSanitize {
    runner: Arc<dyn CommandRunner>,
    nvme: String,
}

impl NvmeSanitize {
    pub fn new(runner: Arc<dyn CommandRunner>, nvme: impl Into<String>) -> Self {
        Self {
            runner,
            nvme: nvme.into(),
        }
    }

    fn sanitize(&self, device_path: &str, step: ToolStep, action: &str) -> ErasureResult<()> {
        run_step(
            self.runner.as_ref(),
            &self.nvme,
            step,
            args(&["sanitize", device_path, "-a", action, "--force"]),
        )
    }
}

impl ErasureStrategy for NvmeSanitize {
    fn method(&self) -> WipeMethod {
        WipeMethod::FirmwareErase
    }

    fn name(&self) -> &str {
        "nvme-sanitize"
    }

    fn execute(&self, device_path: &str) -> ErasureResult<()> {
        run_step(
            self.runner.as_ref(),
            &self.nvme,
            ToolStep::NvmeIdentify,
            args(&["id-ctrl", device_path]),
        )?;

        tracing::info!(device = device_path, "Attempting NVMe crypto sanitize");

        let crypto_err = match self.sanitize(device_path, ToolStep::NvmeCryptoSanitize, SANACT_CRYPTO_ERASE) {
            Ok(()) => {
                tracing::info!(device = device_path, "NVMe crypto sanitize completed");
                return Ok(());
            }
            Err(e) => e,
        };

        // A timed-out crypto sanitize may still be running in the controller
        if matches!(crypto_err, ErasureError::TimedOut { .. }) {
            return Err(crypto_err);
        }

        tracing::warn!(
            device = device_path,
            error = %crypto_err,
            "Crypto sanitize failed, falling back to block erase"
        );

        match self.sanitize(device_path, ToolStep::NvmeBlockSanitize, SANACT_BLOCK_ERASE) {
            Ok(()) => {
                tracing::info!(device = device_path, "NVMe block sanitize completed");
                Ok(())
            }
            Err(ErasureError::ExternalTool { step, detail }) => Err(ErasureError::ExternalTool {
                step,
                detail: format!("{} (crypto erase also failed: {})", detail, crypto_err),
            }),
            Err(e) => Err(e),
        }
    }
}
