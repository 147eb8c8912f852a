// Firmware erase sequences driven through a scripted command runner
//
// Tests cover: NVMe sanitize fallback, ATA step ordering, failure and
// timeout reporting per step.

mod common;

use common::mock_commands::FakeCommandRunner;
use common::mock_drive::SimulatedDrive;
use std::sync::Arc;
use zt_wipe::{ErasureError, ToolStep, WipeConfig, WipeMethod, WipeOrchestrator, WipeStatus};

const NVME: &str = "/dev/nvme0n1";
const SATA: &str = "/dev/sdb";

fn orchestrator(runner: &Arc<FakeCommandRunner>) -> WipeOrchestrator {
    WipeOrchestrator::new(
        runner.clone(),
        Arc::new(SimulatedDrive::with_capacity(0)),
        &WipeConfig::default(),
    )
}

#[test]
fn test_nvme_crypto_sanitize_success() {
    let runner = Arc::new(FakeCommandRunner::new());
    let result = orchestrator(&runner).wipe(NVME, WipeMethod::FirmwareErase);

    assert_eq!(result.status, WipeStatus::Success);
    assert_eq!(
        runner.calls(),
        vec![
            "nvme id-ctrl /dev/nvme0n1",
            "nvme sanitize /dev/nvme0n1 -a 4 --force",
        ]
    );
}

#[test]
fn test_nvme_fallback_attempted_exactly_once() {
    let runner = Arc::new(FakeCommandRunner::new());
    runner.fail("nvme sanitize /dev/nvme0n1 -a 4 --force", 1, "crypto erase not supported");

    let result = orchestrator(&runner).wipe(NVME, WipeMethod::FirmwareErase);

    assert_eq!(result.status, WipeStatus::Success);
    assert_eq!(runner.count_matching("-a 2"), 1);
    assert_eq!(runner.count_matching("-a 4"), 1);
}

#[test]
fn test_nvme_both_sanitize_actions_fail() {
    let runner = Arc::new(FakeCommandRunner::new());
    runner.fail("nvme sanitize /dev/nvme0n1 -a 4 --force", 1, "crypto erase not supported");
    runner.fail("nvme sanitize /dev/nvme0n1 -a 2 --force", 1, "sanitize in progress");

    let result = orchestrator(&runner).wipe(NVME, WipeMethod::FirmwareErase);

    match result.failure {
        Some(ErasureError::ExternalTool { step, detail }) => {
            assert_eq!(step, ToolStep::NvmeBlockSanitize);
            assert!(detail.contains("sanitize in progress"));
            assert!(detail.contains("crypto erase not supported"));
        }
        other => panic!("expected block sanitize failure, got {:?}", other),
    }
    assert_eq!(runner.calls().len(), 3);
}

#[test]
fn test_nvme_identify_failure_stops_before_sanitize() {
    let runner = Arc::new(FakeCommandRunner::new());
    runner.fail("nvme id-ctrl /dev/nvme0n1", 1, "not an NVMe device");

    let result = orchestrator(&runner).wipe(NVME, WipeMethod::FirmwareErase);

    assert!(matches!(
        result.failure,
        Some(ErasureError::ExternalTool { step: ToolStep::NvmeIdentify, .. })
    ));
    assert_eq!(runner.count_matching("sanitize"), 0);
}

#[test]
fn test_nvme_crypto_timeout_skips_fallback() {
    let runner = Arc::new(FakeCommandRunner::new());
    runner.time_out("nvme sanitize /dev/nvme0n1 -a 4 --force", 600);

    let result = orchestrator(&runner).wipe(NVME, WipeMethod::FirmwareErase);

    assert_eq!(
        result.failure,
        Some(ErasureError::TimedOut {
            step: ToolStep::NvmeCryptoSanitize,
            after_secs: 600,
        })
    );
    assert_eq!(runner.count_matching("-a 2"), 0);
}

#[test]
fn test_ata_steps_run_in_order() {
    let runner = Arc::new(FakeCommandRunner::new());
    let result = orchestrator(&runner).wipe(SATA, WipeMethod::AtaSecureErase);

    assert_eq!(result.status, WipeStatus::Success);
    assert_eq!(
        runner.calls(),
        vec![
            "hdparm -I /dev/sdb",
            "hdparm --user-master u --security-set-pass wipe /dev/sdb",
            "hdparm --user-master u --security-erase wipe /dev/sdb",
        ]
    );
}

#[test]
fn test_ata_set_password_failure_skips_erase() {
    let runner = Arc::new(FakeCommandRunner::new());
    runner.fail(
        "hdparm --user-master u --security-set-pass wipe /dev/sdb",
        5,
        "security frozen",
    );

    let result = orchestrator(&runner).wipe(SATA, WipeMethod::AtaSecureErase);

    assert!(matches!(
        result.failure,
        Some(ErasureError::ExternalTool { step: ToolStep::AtaSetPassword, .. })
    ));
    assert_eq!(runner.count_matching("--security-erase"), 0);
}

#[test]
fn test_ata_erase_failure_reports_erase_step() {
    let runner = Arc::new(FakeCommandRunner::new());
    runner.fail(
        "hdparm --user-master u --security-erase wipe /dev/sdb",
        1,
        "I/O error",
    );

    let result = orchestrator(&runner).wipe(SATA, WipeMethod::AtaSecureErase);

    assert_eq!(result.status, WipeStatus::Failure);
    assert!(matches!(
        result.failure,
        Some(ErasureError::ExternalTool { step: ToolStep::AtaErase, .. })
    ));
    assert_eq!(runner.calls().len(), 3);
}
