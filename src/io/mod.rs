pub mod raw_device;

pub use raw_device::{RawDevice, RawDeviceOpener};

use std::io;

/// Overwrite buffer size used by block-level strategies (1 MiB)
pub const OVERWRITE_CHUNK_SIZE: usize = 1024 * 1024;

/// Writable handle to a target device, exclusively owned by one erase call.
///
/// Dropping the handle releases the underlying descriptor.
pub trait BlockDevice {
    /// Capacity in bytes as reported by the device
    fn capacity(&mut self) -> io::Result<u64>;

    /// Reposition to offset 0
    fn rewind(&mut self) -> io::Result<()>;

    /// Write from the current position. May write fewer bytes than given.
    fn write_chunk(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Durably flush everything written so far
    fn sync(&mut self) -> io::Result<()>;
}

/// Opens devices for synchronous writing
pub trait DeviceOpener: Send + Sync {
    fn open_for_write(&self, path: &str) -> io::Result<Box<dyn BlockDevice>>;
}
