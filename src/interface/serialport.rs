use tracing::{debug, trace};

use super::DeviceInterface;

use crate::error::{UploadError, UploadResult};
use std::io::{Read, Write};
use std::time::Duration;

pub type ComPort = String;
pub type BaudRate = u32;

/// Serial port device_interface layer. The port is closed when this is dropped.
pub struct SerialPortDevice {
    port_name: ComPort,
    serial_port: Box<dyn serialport::SerialPort>,
}

impl SerialPortDevice {
    pub fn new(
        port: ComPort,
        baud: BaudRate,
        read_timeout: Duration,
    ) -> UploadResult<SerialPortDevice> {
        let serial_port = serialport::new(port.as_str(), baud)
            .timeout(read_timeout)
            .open()
            .map_err(|e| {
                UploadError::Communication(format!("Failed to open {}: {:?}", port, e))
            })?;

        debug!("Opened {} at {} baud", port, baud);
        Ok(SerialPortDevice {
            port_name: port,
            serial_port,
        })
    }
}

impl DeviceInterface for SerialPortDevice {
    fn send(&mut self, bytes: &[u8]) -> UploadResult<()> {
        self.serial_port
            .write_all(bytes)
            .map_err(|e| UploadError::Communication(format!("{:?}", e)))?;
        trace!("Sent {} bytes", bytes.len());
        Ok(())
    }

    fn receive_byte(&mut self) -> UploadResult<Option<u8>> {
        let mut buffer = [0u8; 1];

        let size = self
            .serial_port
            .read(&mut buffer)
            // Timeout reads as "nothing received"
            .or_else(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    Ok(0)
                } else {
                    Err(e)
                }
            })
            .map_err(|e| UploadError::Communication(format!("{:?}", e)))?;

        let received = (size == 1).then_some(buffer[0]);
        trace!("Received {:?}", received);
        Ok(received)
    }
}

impl Drop for SerialPortDevice {
    fn drop(&mut self) {
        debug!("Closed {}", self.port_name);
    }
}
