use std::{path::PathBuf, time::Duration};

use clap::ValueEnum;

use crate::{
    constants::{
        DEFAULT_BAUD_RATE, DEFAULT_CHUNK_SIZE, DEFAULT_INTER_CHUNK_DELAY, DEFAULT_READ_TIMEOUT,
        DEFAULT_SETTLE_DELAY,
    },
    error::{UploadError, UploadResult},
};

/// Layout of the header sent ahead of the image bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum HeaderFormat {
    /// Image size only, as a little-endian u32
    #[default]
    Length,

    /// Magic, image size and checksum, each a little-endian u32.
    /// Only bootloaders built to parse it will accept this layout.
    Extended,
}

/// Everything a single upload needs, passed in at call time
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub device_path: String,
    pub image_path: PathBuf,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub chunk_size: usize,
    pub settle_delay: Duration,
    pub inter_chunk_delay: Duration,
    pub header_format: HeaderFormat,
}

impl UploadConfig {
    pub fn new(device_path: impl Into<String>, image_path: impl Into<PathBuf>) -> Self {
        UploadConfig {
            device_path: device_path.into(),
            image_path: image_path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            inter_chunk_delay: DEFAULT_INTER_CHUNK_DELAY,
            header_format: HeaderFormat::default(),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_inter_chunk_delay(mut self, inter_chunk_delay: Duration) -> Self {
        self.inter_chunk_delay = inter_chunk_delay;
        self
    }

    pub fn with_header_format(mut self, header_format: HeaderFormat) -> Self {
        self.header_format = header_format;
        self
    }

    /// Reject settings the transfer cannot run with
    pub fn validate(&self) -> UploadResult<()> {
        if self.chunk_size == 0 {
            return Err(UploadError::ConfigurationError(
                "Chunk size must be at least one byte".to_string(),
            ));
        }

        if self.baud_rate == 0 {
            return Err(UploadError::ConfigurationError(
                "Baud rate must be non-zero".to_string(),
            ));
        }

        if self.read_timeout.is_zero() {
            return Err(UploadError::ConfigurationError(
                "Read timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
