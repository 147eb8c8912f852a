#![allow(dead_code)]

/// Shared fakes for integration tests
///
/// - mock_commands: scripted external tool runner
/// - mock_drive: simulated block device with fault injection
/// - mock_service: in-memory chain-of-custody service
pub mod mock_commands;
pub mod mock_drive;
pub mod mock_service;
