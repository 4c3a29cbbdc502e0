use std::time::Duration;

/// Probe sent to the bootloader, echoed back when it is ready to receive
pub const HANDSHAKE_BYTE: u8 = 0xAA;

/// "BOOT" read as a little-endian u32
pub const BOOT_MAGIC: u32 = 0x544F_4F42;

pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_INTER_CHUNK_DELAY: Duration = Duration::from_secs(1);

pub const LENGTH_HEADER_SIZE: usize = 4;
pub const EXTENDED_HEADER_SIZE: usize = 12;
