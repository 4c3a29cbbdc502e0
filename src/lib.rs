use std::path::Path;

pub use config::{HeaderFormat, UploadConfig};
use error::UploadResult;
pub use image::Image;
use interface::{DeviceInterface, serialport::SerialPortDevice};
use protocols::{
    UploadProtocol,
    kernel_upload::{KernelUpload, KernelUploadParams},
};
use tracing::info;
use util::{Delay, ThreadDelay};

pub mod config;
pub mod constants;
pub mod error;
pub mod image;
pub mod interface;
pub mod protocols;
pub mod util;

pub struct Uploader {
    protocol: Box<dyn UploadProtocol>,
    progress_bar_enable: bool,
}

impl Uploader {
    /// Open the serial device named in `config`. It stays open until the
    /// uploader is dropped.
    pub fn new(config: &UploadConfig) -> UploadResult<Self> {
        config.validate()?;
        let device = SerialPortDevice::new(
            config.device_path.clone(),
            config.baud_rate,
            config.read_timeout,
        )?;

        Self::from_interface(device, config)
    }

    pub fn from_interface(
        interface: impl DeviceInterface + 'static,
        config: &UploadConfig,
    ) -> UploadResult<Self> {
        Self::from_parts(interface, ThreadDelay, config)
    }

    /// Build an uploader from an already-open channel and a custom pacing source
    pub fn from_parts(
        interface: impl DeviceInterface + 'static,
        delay: impl Delay + 'static,
        config: &UploadConfig,
    ) -> UploadResult<Self> {
        config.validate()?;
        let protocol = KernelUpload::new(interface, delay, KernelUploadParams::from(config));

        Ok(Uploader {
            protocol: Box::new(protocol),
            progress_bar_enable: false,
        })
    }

    pub fn progress_bar(&mut self, enable: bool) {
        self.progress_bar_enable = enable;
    }

    /// Upload an image that is already in memory
    pub fn upload_image(&mut self, image: &Image) -> UploadResult<()> {
        self.protocol.upload_image(image, self.progress_bar_enable)
    }

    /// Read the image at `file_path` and upload it. A missing or unreadable
    /// file fails before the handshake.
    pub fn upload_file(&mut self, file_path: impl AsRef<Path>) -> UploadResult<()> {
        let image = Image::load(file_path)?;
        info!("Uploading {} bytes", image.size());

        self.upload_image(&image)
    }
}
