// ATA Secure Erase via hdparm
//
// Three steps, each must exit 0 before the next runs:
//   1. hdparm -I <dev>                                          (identity / security feature set)
//   2. hdparm --user-master u --security-set-pass <pw> <dev>    (enter security mode)
//   3. hdparm --user-master u --security-erase <pw> <dev>       (erase, clears the password)
//
// Recovery hazard: if the run stops between steps 2 and 3 the drive is left
// locked with ATA_SECURITY_PASSWORD. Unlock it with
// `hdparm --user-master u --security-disable wipe <dev>` before reuse.

use super::run_step;
use crate::algorithms::ErasureStrategy;
use crate::drives::command::{args, CommandRunner};
use crate::{ErasureError, ErasureResult, ToolStep, WipeMethod};
use std::sync::Arc;

/// Single-session handshake token. Not a secret; the erase invalidates it.
pub const ATA_SECURITY_PASSWORD: &str = "wipe";

pub struct AtaSecureErase {
    runner: Arc<dyn CommandRunner>,
    hdparm: String,
}

impl AtaSecureErase {
    pub fn new(runner: Arc<dyn CommandRunner>, hdparm: impl Into<String>) -> Self {
        Self {
            runner,
            hdparm: hdparm.into(),
        }
    }
}

impl ErasureStrategy for AtaSecureErase {
    fn method(&self) -> WipeMethod {
        WipeMethod::AtaSecureErase
    }

    fn name(&self) -> &str {
        "ata-secure-erase"
    }

    fn execute(&self, device_path: &str) -> ErasureResult<()> {
        let runner = self.runner.as_ref();

        run_step(runner, &self.hdparm, ToolStep::AtaIdentify, args(&["-I", device_path]))?;

        run_step(
            runner,
            &self.hdparm,
            ToolStep::AtaSetPassword,
            args(&[
                "--user-master",
                "u",
                "--security-set-pass",
                ATA_SECURITY_PASSWORD,
                device_path,
            ]),
        )
        .inspect_err(|e| warn_if_locked(device_path, e))?;

        tracing::info!(device = device_path, "Starting ATA Secure Erase");

        run_step(
            runner,
            &self.hdparm,
            ToolStep::AtaErase,
            args(&[
                "--user-master",
                "u",
                "--security-erase",
                ATA_SECURITY_PASSWORD,
                device_path,
            ]),
        )
        .inspect_err(|e| warn_if_locked(device_path, e))?;

        tracing::info!(device = device_path, "ATA Secure Erase completed");
        Ok(())
    }
}

/// Whether a failed step may have left the security password set. An
/// interrupted set-password can still have reached the drive.
fn may_leave_drive_locked(err: &ErasureError) -> bool {
    matches!(
        err,
        ErasureError::TimedOut {
            step: ToolStep::AtaSetPassword | ToolStep::AtaErase,
            ..
        } | ErasureError::ExternalTool {
            step: ToolStep::AtaErase,
            ..
        }
    )
}

fn warn_if_locked(device_path: &str, err: &ErasureError) {
    if may_leave_drive_locked(err) {
        tracing::error!(
            device = device_path,
            error = %err,
            unlock = %format!(
                "hdparm --user-master u --security-disable {} {}",
                ATA_SECURITY_PASSWORD, device_path
            ),
            "ATA erase interrupted after the security password may have been set; the drive may be locked"
        );
    }
}
