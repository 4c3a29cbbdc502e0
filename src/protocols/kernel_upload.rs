use std::time::Duration;

use indicatif::ProgressBar;
use tracing::{debug, error, info, trace};

use crate::config::{HeaderFormat, UploadConfig};
use crate::constants::HANDSHAKE_BYTE;
use crate::error::{UploadError, UploadResult};
use crate::image::Image;
use crate::interface::DeviceInterface;
use crate::protocols::UploadProtocol;
use crate::util::{Delay, create_progress_bar};

#[derive(Debug, Clone)]
pub struct KernelUploadParams {
    pub chunk_size: usize,
    pub settle_delay: Duration,
    pub inter_chunk_delay: Duration,
    pub header_format: HeaderFormat,
}

impl From<&UploadConfig> for KernelUploadParams {
    fn from(config: &UploadConfig) -> Self {
        KernelUploadParams {
            chunk_size: config.chunk_size,
            settle_delay: config.settle_delay,
            inter_chunk_delay: config.inter_chunk_delay,
            header_format: config.header_format,
        }
    }
}

/// What came back from the bootloader after the handshake probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub received: Option<u8>,
}

impl Acknowledgement {
    /// A timed-out read is never ready
    pub fn is_ready(&self) -> bool {
        self.received == Some(HANDSHAKE_BYTE)
    }
}

/// Handshake, length header, then the raw image in paced chunks
pub struct KernelUpload<I: DeviceInterface, D: Delay> {
    device_interface: I,
    delay: D,
    params: KernelUploadParams,
}

impl<I: DeviceInterface, D: Delay> KernelUpload<I, D> {
    pub fn new(device_interface: I, delay: D, params: KernelUploadParams) -> Self {
        KernelUpload {
            device_interface,
            delay,
            params,
        }
    }

    /// Send the probe byte and read back exactly one byte
    pub fn handshake(&mut self) -> UploadResult<Acknowledgement> {
        self.device_interface.send(&[HANDSHAKE_BYTE])?;
        let received = self.device_interface.receive_byte()?;

        Ok(Acknowledgement { received })
    }

    fn header_bytes(&self, image: &Image) -> UploadResult<Vec<u8>> {
        let header = match self.params.header_format {
            HeaderFormat::Length => image.length_header()?.to_vec(),
            HeaderFormat::Extended => image.extended_header()?.to_vec(),
        };

        Ok(header)
    }

    /// Write the header in a single call and wait for the target to size its buffer
    pub fn send_header(&mut self, image: &Image) -> UploadResult<()> {
        let header = self.header_bytes(image)?;
        debug!("Sending {:?} header {:02X?}", self.params.header_format, header);

        self.device_interface.send(&header)?;
        self.delay.delay(self.params.settle_delay);
        Ok(())
    }

    /// Write every chunk in file order, pausing after each one
    pub fn stream_image(
        &mut self,
        image: &Image,
        progress: Option<&ProgressBar>,
    ) -> UploadResult<()> {
        let mut sent = 0usize;

        for (index, chunk) in image.chunks(self.params.chunk_size)?.enumerate() {
            self.device_interface.send(chunk)?;
            sent += chunk.len();
            trace!(
                "Chunk {} ({} bytes), {}/{}",
                index,
                chunk.len(),
                sent,
                image.size()
            );

            if let Some(pb) = progress {
                pb.inc(chunk.len() as u64);
            }

            self.delay.delay(self.params.inter_chunk_delay);
        }

        Ok(())
    }

    /// Run the whole exchange. Nothing past the probe byte goes out unless
    /// the bootloader echoes it back.
    pub fn transfer(&mut self, image: &Image, enable_progress_bar: bool) -> UploadResult<()> {
        if self.params.chunk_size == 0 {
            return Err(UploadError::ConfigurationError(
                "Chunk size must be at least one byte".to_string(),
            ));
        }

        // Oversized images must fail before anything is written
        self.header_bytes(image)?;
        debug!(
            "Image is {} bytes, checksum {:#010X}",
            image.size(),
            image.checksum()
        );

        let ack = self.handshake()?;
        if !ack.is_ready() {
            error!("Failed to receive acknowledgement, got {:?}", ack.received);
            return Err(UploadError::HandshakeFailed {
                received: ack.received,
            });
        }

        info!("Acknowledgement received");
        info!("Start data transmission");
        self.send_header(image)?;

        let pb = enable_progress_bar
            .then(|| create_progress_bar(image.size() as u64, "Uploading"));
        self.stream_image(image, pb.as_ref())?;
        if let Some(pb) = pb {
            pb.finish_with_message("Done");
        }

        info!("Data transmission completed");
        Ok(())
    }
}

impl<I: DeviceInterface, D: Delay> UploadProtocol for KernelUpload<I, D> {
    fn upload_image(&mut self, image: &Image, enable_progress_bar: bool) -> UploadResult<()> {
        self.transfer(image, enable_progress_bar)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Sent(Vec<u8>),
        Read,
        Paused(Duration),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct MockDevice {
        log: Log,
        replies: VecDeque<u8>,
        fail_writes_after: Option<usize>,
    }

    impl DeviceInterface for MockDevice {
        fn send(&mut self, bytes: &[u8]) -> UploadResult<()> {
            if let Some(remaining) = self.fail_writes_after.as_mut() {
                if *remaining == 0 {
                    return Err(UploadError::Communication("device unplugged".to_string()));
                }
                *remaining -= 1;
            }
            self.log.borrow_mut().push(Event::Sent(bytes.to_vec()));
            Ok(())
        }

        fn receive_byte(&mut self) -> UploadResult<Option<u8>> {
            self.log.borrow_mut().push(Event::Read);
            Ok(self.replies.pop_front())
        }
    }

    struct RecordingDelay {
        log: Log,
    }

    impl Delay for RecordingDelay {
        fn delay(&mut self, duration: Duration) {
            self.log.borrow_mut().push(Event::Paused(duration));
        }
    }

    fn params(header_format: HeaderFormat) -> KernelUploadParams {
        KernelUploadParams {
            chunk_size: 1024,
            settle_delay: Duration::from_secs(3),
            inter_chunk_delay: Duration::from_secs(1),
            header_format,
        }
    }

    fn uploader(
        replies: &[u8],
        header_format: HeaderFormat,
    ) -> (KernelUpload<MockDevice, RecordingDelay>, Log) {
        let log: Log = Rc::default();
        let device = MockDevice {
            log: Rc::clone(&log),
            replies: replies.iter().copied().collect(),
            fail_writes_after: None,
        };
        let delay = RecordingDelay {
            log: Rc::clone(&log),
        };

        (KernelUpload::new(device, delay, params(header_format)), log)
    }

    #[test]
    fn handshake_reports_received_byte() {
        let (mut upload, log) = uploader(&[0xAA], HeaderFormat::Length);
        let ack = upload.handshake().unwrap();

        assert!(ack.is_ready());
        assert_eq!(*log.borrow(), vec![Event::Sent(vec![0xAA]), Event::Read]);

        let (mut upload, _) = uploader(&[], HeaderFormat::Length);
        let ack = upload.handshake().unwrap();
        assert_eq!(ack.received, None);
        assert!(!ack.is_ready());
    }

    #[test]
    fn full_exchange_is_paced() {
        let bytes: Vec<u8> = (0..2500u32).map(|i| i as u8).collect();
        let image = Image::from_bytes(bytes.clone());
        let (mut upload, log) = uploader(&[0xAA], HeaderFormat::Length);

        upload.transfer(&image, false).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Sent(vec![0xAA]),
                Event::Read,
                Event::Sent(vec![0xC4, 0x09, 0x00, 0x00]),
                Event::Paused(Duration::from_secs(3)),
                Event::Sent(bytes[..1024].to_vec()),
                Event::Paused(Duration::from_secs(1)),
                Event::Sent(bytes[1024..2048].to_vec()),
                Event::Paused(Duration::from_secs(1)),
                Event::Sent(bytes[2048..].to_vec()),
                Event::Paused(Duration::from_secs(1)),
            ]
        );
    }

    #[test]
    fn extended_header_carries_magic_and_checksum() {
        let image = Image::from_bytes(vec![1, 2, 3]);
        let (mut upload, log) = uploader(&[0xAA], HeaderFormat::Extended);

        upload.transfer(&image, false).unwrap();

        assert_eq!(
            log.borrow()[2],
            Event::Sent(vec![
                0x42, 0x4F, 0x4F, 0x54, // BOOT
                0x03, 0x00, 0x00, 0x00, // size
                0x06, 0x00, 0x00, 0x00, // checksum
            ])
        );
    }

    #[test]
    fn mismatched_and_missing_ack_stop_identically() {
        for replies in [&[][..], &[0x55][..]] {
            let image = Image::from_bytes(vec![0; 10]);
            let (mut upload, log) = uploader(replies, HeaderFormat::Length);

            let result = upload.transfer(&image, false);

            assert!(matches!(
                result,
                Err(UploadError::HandshakeFailed { received }) if received == replies.first().copied()
            ));
            assert_eq!(*log.borrow(), vec![Event::Sent(vec![0xAA]), Event::Read]);
        }
    }

    #[test]
    fn write_failure_aborts_transfer() {
        let log: Log = Rc::default();
        let device = MockDevice {
            log: Rc::clone(&log),
            replies: VecDeque::from([0xAA]),
            // Probe and header succeed, first chunk fails
            fail_writes_after: Some(2),
        };
        let delay = RecordingDelay {
            log: Rc::clone(&log),
        };
        let mut upload = KernelUpload::new(device, delay, params(HeaderFormat::Length));

        let result = upload.transfer(&Image::from_bytes(vec![9; 3000]), false);

        assert!(matches!(result, Err(UploadError::Communication(_))));
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn zero_chunk_size_is_rejected_before_wire_activity() {
        let (upload, log) = uploader(&[0xAA], HeaderFormat::Length);
        let mut upload = KernelUpload {
            params: KernelUploadParams {
                chunk_size: 0,
                ..upload.params.clone()
            },
            ..upload
        };

        let result = upload.transfer(&Image::from_bytes(vec![1; 8]), false);

        assert!(matches!(result, Err(UploadError::ConfigurationError(_))));
        assert!(log.borrow().is_empty());
    }
}
