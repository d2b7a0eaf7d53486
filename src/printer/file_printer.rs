use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use log::debug;
use crate::{
    Error,
    readback::ReadbackSample
};
use super::Transport;

/// Printer reached through a character device, like `/dev/usb/lp0`
///
/// Status is read back from the same device. Timeouts are up to the kernel driver.
pub struct FilePrinter {
    file: File
}

impl FilePrinter {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FilePrinter, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;
        debug!("Opened {}", path.as_ref().display());
        Ok(FilePrinter {
            file
        })
    }
}

impl Transport for FilePrinter {
    fn read_status(&mut self, len: usize) -> Result<ReadbackSample, Error> {
        let mut buffer = vec![0u8; len];
        let count = self.file.read(&mut buffer)?;
        if count != len {
            debug!("Short readback, {} of {} bytes", count, len);
        }
        buffer.truncate(count);
        Ok(ReadbackSample::new(buffer))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        let count = self.file.write(bytes)?;
        self.file.flush()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_read_keeps_its_length() {
        let path = std::env::temp_dir().join(format!("dyesub-rs-status-{}", std::process::id()));
        std::fs::write(&path, [0x00, 0x00, 0x01]).unwrap();
        let mut printer = FilePrinter::open(&path).unwrap();
        let first = printer.read_status(12).unwrap();
        let second = printer.read_status(12).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(first.as_bytes(), &[0x00, 0x00, 0x01][..]);
        assert!(second.is_empty());
    }
}
