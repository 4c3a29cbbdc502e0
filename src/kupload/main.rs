use clap::{Parser, command};
use kupload::error::UploadResult;
use upload::{UploadOptions, handle_upload};

mod upload;

#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
enum Cli {
    /// Upload a kernel image to a waiting bootloader
    #[command(name = "upload", alias = "u")]
    Upload(UploadOptions),
}

fn main() -> UploadResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli {
        Cli::Upload(opts) => handle_upload(opts)?,
    }

    Ok(())
}
