use crate::{error::UploadResult, image::Image};
pub mod kernel_upload;

/// A host-side transfer scheme for pushing an image to a bootloader.
/// Only upload is implemented; a bootloader that reports back could add
/// verification here.
pub(crate) trait UploadProtocol {
    fn upload_image(&mut self, image: &Image, enable_progress_bar: bool) -> UploadResult<()>;
}
