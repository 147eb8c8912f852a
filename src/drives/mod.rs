// Drive-level erase operations
//
// - command.rs: external process seam (hdparm, nvme-cli)
// - types/: firmware erase strategies (ATA Secure Erase, NVMe Sanitize)

pub mod command;
pub mod types;

pub use command::{CommandError, CommandOutcome, CommandRunner, SystemCommandRunner};
pub use types::{AtaSecureErase, NvmeSanitize, ATA_SECURITY_PASSWORD};
