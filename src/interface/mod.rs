pub mod serialport;

use crate::error::UploadResult;

/// Byte channel to the target's bootloader
pub trait DeviceInterface {
    /// Write all of `bytes` to the target device in one call
    fn send(&mut self, bytes: &[u8]) -> UploadResult<()>;

    /// Read a single byte, `None` when nothing arrived before the read timeout
    fn receive_byte(&mut self) -> UploadResult<Option<u8>>;
}

