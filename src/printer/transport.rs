use crate::{
    Error,
    readback::ReadbackSample,
    transfer::Sink
};

/// Byte pipe to a printer
///
/// Opening happens in the implementor's constructor and closing when it is dropped. Every call blocks, with whatever timeout the implementor enforces; a timeout is an error like any other.
pub trait Transport {
    /// Reads one status block of `len` bytes
    ///
    /// A short read comes back at the length the device sent, it never matches a pattern.
    fn read_status(&mut self, len: usize) -> Result<ReadbackSample, Error>;

    /// Writes `bytes`, returns how many the device took
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Error>;

    /// Writes all of `bytes`, for short fixed commands
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let mut sent = 0;
        while sent < bytes.len() {
            match self.write(&bytes[sent..])? {
                0 => return Err(Error::WriteZero),
                count => sent += count
            }
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_status(&mut self, len: usize) -> Result<ReadbackSample, Error> {
        (**self).read_status(len)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        (**self).write(bytes)
    }
}

/// Lets a [ChunkedTransfer](crate::transfer::ChunkedTransfer) write into a transport
pub struct TransportSink<'a, T: Transport + ?Sized>(pub &'a mut T);

impl<'a, T: Transport + ?Sized> Sink for TransportSink<'a, T> {
    fn put(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        self.0.write(bytes)
    }
}
