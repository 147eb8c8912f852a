// Firmware-level erase strategies delegated to vendor tools

pub mod ata;
pub mod nvme;

pub use ata::{AtaSecureErase, ATA_SECURITY_PASSWORD};
pub use nvme::NvmeSanitize;

use super::command::{CommandError, CommandRunner};
use crate::{ErasureError, ErasureResult, ToolStep};

/// Run one step of a tool protocol; any nonzero exit fails the step.
pub(crate) fn run_step(
    runner: &dyn CommandRunner,
    program: &str,
    step: ToolStep,
    args: Vec<String>,
) -> ErasureResult<()> {
    tracing::debug!(%step, program, "Running erase step");

    match runner.run(program, &args) {
        Ok(outcome) if outcome.success => Ok(()),
        Ok(outcome) => Err(ErasureError::ExternalTool {
            step,
            detail: format!("{} {} returned {}", program, args.join(" "), outcome.describe()),
        }),
        Err(CommandError::TimedOut { after_secs, .. }) => {
            Err(ErasureError::TimedOut { step, after_secs })
        }
        Err(e) => Err(ErasureError::ExternalTool {
            step,
            detail: e.to_string(),
        }),
    }
}
