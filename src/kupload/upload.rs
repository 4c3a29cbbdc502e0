use std::{path::PathBuf, time::Duration};

use clap::Parser;
use kupload::{
    HeaderFormat, UploadConfig, Uploader,
    constants::{
        DEFAULT_BAUD_RATE, DEFAULT_CHUNK_SIZE, DEFAULT_INTER_CHUNK_DELAY, DEFAULT_READ_TIMEOUT,
        DEFAULT_SETTLE_DELAY,
    },
    error::UploadResult,
};

#[derive(Parser, Debug, Clone)]
pub(crate) struct UploadOptions {
    /// Serial device the bootloader listens on
    #[clap(short, long)]
    serial: String,

    /// Raw kernel image
    #[clap(short, long)]
    image: PathBuf,

    /// Baud rate
    #[clap(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baudrate: u32,

    /// Handshake read timeout in milliseconds
    #[clap(long, default_value_t = DEFAULT_READ_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,

    /// Largest number of bytes per write
    #[clap(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Pause after the header, in milliseconds
    #[clap(long, default_value_t = DEFAULT_SETTLE_DELAY.as_millis() as u64)]
    settle_ms: u64,

    /// Pause after each chunk, in milliseconds
    #[clap(long, default_value_t = DEFAULT_INTER_CHUNK_DELAY.as_millis() as u64)]
    chunk_delay_ms: u64,

    /// Header layout expected by the bootloader
    #[clap(long, value_enum, default_value_t = HeaderFormat::Length)]
    header: HeaderFormat,

    #[clap(long, default_value_t = false)]
    no_progress: bool,
}

impl From<UploadOptions> for UploadConfig {
    fn from(opts: UploadOptions) -> Self {
        UploadConfig::new(opts.serial, opts.image)
            .with_baud_rate(opts.baudrate)
            .with_read_timeout(Duration::from_millis(opts.timeout_ms))
            .with_chunk_size(opts.chunk_size)
            .with_settle_delay(Duration::from_millis(opts.settle_ms))
            .with_inter_chunk_delay(Duration::from_millis(opts.chunk_delay_ms))
            .with_header_format(opts.header)
    }
}

pub(crate) fn handle_upload(opts: UploadOptions) -> UploadResult<()> {
    let progress = !opts.no_progress;
    let config = UploadConfig::from(opts);

    // Read the image before opening the port so a bad path never touches the wire
    let image = kupload::Image::load(&config.image_path)?;

    let mut uploader = Uploader::new(&config)?;
    uploader.progress_bar(progress);
    uploader.upload_image(&image)?;

    Ok(())
}
