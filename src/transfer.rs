//! Bounded copying of job blocks from a source to a sink

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use log::trace;
use crate::Error;

/// Default size of the intermediate buffer
pub const DEFAULT_CAPACITY: usize = 16384;

/// Something that takes bytes and may accept fewer than offered
pub trait Sink {
    /// Offers `bytes`, returns how many were accepted
    fn put(&mut self, bytes: &[u8]) -> Result<usize, Error>;
}

impl Sink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        self.extend_from_slice(bytes);
        Ok(bytes.len())
    }
}

/// Moves blocks through a bounded buffer
///
/// Bytes the sink did not take stay at the front of the buffer and go out first on the next write. The buffer survives between blocks, so bytes read ahead of one block are flushed as the start of the next.
/// ```rust
/// use dyesub_rs::transfer::ChunkedTransfer;
/// let mut transfer = ChunkedTransfer::with_prefix(64, b"abc");
/// let mut source: &[u8] = b"defgh";
/// let mut first = Vec::new();
/// let mut second = Vec::new();
/// transfer.transfer(&mut source, &mut first, 2)?;
/// transfer.transfer(&mut source, &mut second, 6)?;
/// assert_eq!(first, b"ab");
/// assert_eq!(second, b"cdefgh");
/// # Ok::<(), dyesub_rs::Error>(())
/// ```
pub struct ChunkedTransfer {
    buffer: VecDeque<u8>,
    capacity: usize
}

impl ChunkedTransfer {
    /// Creates an empty transfer, a capacity of 0 is bumped to 1
    pub fn new(capacity: usize) -> ChunkedTransfer {
        let capacity = capacity.max(1);
        ChunkedTransfer {
            buffer: VecDeque::with_capacity(capacity),
            capacity
        }
    }

    /// Creates a transfer whose buffer already holds `prefix`
    ///
    /// The buffer grows to hold the whole prefix if needed.
    pub fn with_prefix(capacity: usize, prefix: &[u8]) -> ChunkedTransfer {
        let mut transfer = ChunkedTransfer::new(capacity.max(prefix.len()));
        transfer.buffer.extend(prefix.iter());
        transfer
    }

    /// Bytes held but not yet sent
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Moves exactly `remaining` bytes to `sink`, returns the amount moved
    ///
    /// Buffered bytes count towards `remaining` and go first. Fails if the source ends early or the sink stops accepting bytes.
    pub fn transfer<R, S>(&mut self, source: &mut R, sink: &mut S, remaining: usize) -> Result<usize, Error>
    where
        R: Read + ?Sized,
        S: Sink + ?Sized
    {
        let mut moved = 0;
        let mut chunk = vec![0u8; self.capacity];
        while moved < remaining {
            let needed = remaining - moved;
            // Only what this block still needs is read, never more
            let wanted = needed.saturating_sub(self.buffer.len())
                .min(self.capacity.saturating_sub(self.buffer.len()));
            if wanted > 0 {
                let count = match source.read(&mut chunk[..wanted]) {
                    Ok(count) => count,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into())
                };
                if count == 0 && self.buffer.is_empty() {
                    return Err(Error::Truncated{expected: remaining, moved});
                }
                self.buffer.extend(chunk[..count].iter());
            }
            let offered = self.buffer.len().min(needed);
            let (front, back) = self.buffer.as_slices();
            let outgoing = if front.len() >= offered {
                &front[..offered]
            } else {
                chunk[..front.len()].copy_from_slice(front);
                chunk[front.len()..offered].copy_from_slice(&back[..offered - front.len()]);
                &chunk[..offered]
            };
            let accepted = sink.put(outgoing)?;
            if accepted == 0 {
                return Err(Error::WriteZero);
            }
            let accepted = accepted.min(offered);
            if accepted < offered {
                trace!("Short write, carrying {} bytes forward", offered - accepted);
            }
            self.buffer.drain(..accepted);
            moved += accepted;
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io;

    /// Takes at most half of what is offered, rounding up
    struct HalfSink(Vec<u8>);

    impl Sink for HalfSink {
        fn put(&mut self, bytes: &[u8]) -> Result<usize, Error> {
            let take = (bytes.len() + 1) / 2;
            self.0.extend_from_slice(&bytes[..take]);
            Ok(take)
        }
    }

    /// Hands out reads of scripted sizes
    struct StutterSource {
        data: Vec<u8>,
        position: usize,
        sizes: Vec<usize>,
        call: usize
    }

    impl Read for StutterSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let size = self.sizes[self.call % self.sizes.len()];
            self.call += 1;
            let count = size.min(buf.len()).min(self.data.len() - self.position);
            buf[..count].copy_from_slice(&self.data[self.position..self.position + count]);
            self.position += count;
            Ok(count)
        }
    }

    /// Accepts scripted amounts
    struct StutterSink {
        data: Vec<u8>,
        sizes: Vec<usize>,
        call: usize
    }

    impl Sink for StutterSink {
        fn put(&mut self, bytes: &[u8]) -> Result<usize, Error> {
            let size = self.sizes[self.call % self.sizes.len()];
            self.call += 1;
            let count = size.min(bytes.len());
            self.data.extend_from_slice(&bytes[..count]);
            Ok(count)
        }
    }

    struct BrokenSource;

    impl Read for BrokenSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "unplugged"))
        }
    }

    /// Interrupted before every read that would return data
    struct SignalledSource<'a> {
        data: &'a [u8],
        interrupted: bool,
        interruptions: usize
    }

    impl<'a> Read for SignalledSource<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                self.interruptions += 1;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.interrupted = false;
            self.data.read(buf)
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let data: Vec<u8> = (1..=10).collect();
        let mut source = SignalledSource{data: &data, interrupted: false, interruptions: 0};
        let mut sink = Vec::new();
        assert_eq!(ChunkedTransfer::new(4).transfer(&mut source, &mut sink, 10).unwrap(), 10);
        assert_eq!(sink, data);
        assert!(source.interruptions >= 3);
    }

    #[test]
    fn half_writes_are_carried_forward() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let mut source = &data[..];
        let mut sink = HalfSink(Vec::new());
        let mut transfer = ChunkedTransfer::new(64);
        let moved = transfer.transfer(&mut source, &mut sink, data.len()).unwrap();
        assert_eq!(moved, 1000);
        assert_eq!(sink.0, data);
        assert_eq!(transfer.buffered(), 0);
    }

    #[test]
    fn prefix_goes_first_and_leftovers_stay() {
        let mut transfer = ChunkedTransfer::with_prefix(4, b"0123456789");
        assert_eq!(transfer.capacity(), 10);
        let mut source: &[u8] = b"abc";
        let mut sink = Vec::new();
        assert_eq!(transfer.transfer(&mut source, &mut sink, 4).unwrap(), 4);
        assert_eq!(sink, b"0123");
        assert_eq!(transfer.buffered(), 6);
        let mut sink = Vec::new();
        assert_eq!(transfer.transfer(&mut source, &mut sink, 9).unwrap(), 9);
        assert_eq!(sink, b"456789abc");
    }

    #[test]
    fn early_end_of_source_fails() {
        let mut source: &[u8] = b"short";
        let mut sink = Vec::new();
        match ChunkedTransfer::new(8).transfer(&mut source, &mut sink, 10) {
            Err(Error::Truncated{expected: 10, moved: 5}) => (),
            other => panic!("unexpected {:?}", other)
        }
    }

    #[test]
    fn read_errors_fail() {
        let mut sink = Vec::new();
        assert!(matches!(ChunkedTransfer::new(8).transfer(&mut BrokenSource, &mut sink, 10), Err(Error::Io(_))));
    }

    #[test]
    fn refusing_sink_fails() {
        let mut source: &[u8] = b"data";
        let mut sink = StutterSink{data: Vec::new(), sizes: vec![0], call: 0};
        assert!(matches!(ChunkedTransfer::new(8).transfer(&mut source, &mut sink, 4), Err(Error::WriteZero)));
    }

    #[test]
    fn zero_bytes_is_a_no_op() {
        let mut source: &[u8] = b"";
        let mut sink = Vec::new();
        assert_eq!(ChunkedTransfer::new(8).transfer(&mut source, &mut sink, 0).unwrap(), 0);
    }

    proptest! {
        #[test]
        fn moves_exactly_remaining(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            extra in proptest::collection::vec(any::<u8>(), 0..64),
            reads in proptest::collection::vec(1usize..300, 1..8),
            writes in proptest::collection::vec(1usize..300, 1..8),
            capacity in 1usize..512
        ) {
            let mut all = data.clone();
            all.extend_from_slice(&extra);
            let mut source = StutterSource{data: all, position: 0, sizes: reads, call: 0};
            let mut sink = StutterSink{data: Vec::new(), sizes: writes, call: 0};
            let mut transfer = ChunkedTransfer::new(capacity);
            let moved = transfer.transfer(&mut source, &mut sink, data.len()).unwrap();
            prop_assert_eq!(moved, data.len());
            prop_assert_eq!(sink.data, data);
        }
    }
}
