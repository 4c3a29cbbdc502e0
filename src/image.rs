use std::{fs::File, io::Read, path::Path, slice::Chunks};

use tracing::debug;

use crate::{
    constants::{BOOT_MAGIC, EXTENDED_HEADER_SIZE, LENGTH_HEADER_SIZE},
    error::{UploadError, UploadResult},
};

/// Raw kernel image, read fully into memory before anything touches the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Image { bytes }
    }

    /// Read the whole image file at `path`
    pub fn load(path: impl AsRef<Path>) -> UploadResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            UploadError::ImageError(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            UploadError::ImageError(format!("Could not read {}: {:?}", path.display(), e))
        })?;

        debug!("Loaded {} bytes from {}", bytes.len(), path.display());
        Ok(Image { bytes })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn checksum(&self) -> u32 {
        checksum(&self.bytes)
    }

    pub fn length_header(&self) -> UploadResult<[u8; LENGTH_HEADER_SIZE]> {
        length_header(self.size())
    }

    pub fn extended_header(&self) -> UploadResult<[u8; EXTENDED_HEADER_SIZE]> {
        extended_header(self.size(), self.checksum())
    }

    /// Split the image into sequential slices of at most `chunk_size` bytes.
    /// An empty image yields no chunks.
    pub fn chunks(&self, chunk_size: usize) -> UploadResult<Chunks<'_, u8>> {
        if chunk_size == 0 {
            return Err(UploadError::ConfigurationError(
                "Chunk size must be at least one byte".to_string(),
            ));
        }

        Ok(self.bytes.chunks(chunk_size))
    }
}

/// Sum of all bytes, truncated to 32 bits
pub fn checksum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |sum, byte| sum.wrapping_add(u32::from(*byte)))
}

fn encode_size(size: usize) -> UploadResult<u32> {
    u32::try_from(size).map_err(|_| UploadError::ImageTooLarge(size))
}

/// Image size as a little-endian u32
pub fn length_header(size: usize) -> UploadResult<[u8; LENGTH_HEADER_SIZE]> {
    Ok(encode_size(size)?.to_le_bytes())
}

/// Magic, size and checksum, each a little-endian u32
pub fn extended_header(size: usize, checksum: u32) -> UploadResult<[u8; EXTENDED_HEADER_SIZE]> {
    let mut header = [0u8; EXTENDED_HEADER_SIZE];
    header[0..4].copy_from_slice(&BOOT_MAGIC.to_le_bytes());
    header[4..8].copy_from_slice(&encode_size(size)?.to_le_bytes());
    header[8..12].copy_from_slice(&checksum.to_le_bytes());

    Ok(header)
}
