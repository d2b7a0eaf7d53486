use std::io::{ErrorKind, Read};
use log::{debug, info, warn};
use crate::{
    Error, PrinterModel,
    transfer::{ChunkedTransfer, DEFAULT_CAPACITY}
};
use super::{Block, JobDescriptor, HEADER_WINDOW, parse_header, parse_header_as};

/// A job whose header has been read and recognized, but whose data still sits in the source
///
/// Nothing is sent anywhere at this point, so a bad job fails before any printer is touched.
pub struct JobReader<R: Read> {
    source: R,
    /// Bytes already taken from the source
    header: Vec<u8>,
    descriptor: JobDescriptor
}

impl<R: Read> JobReader<R> {
    /// Reads the header window and recognizes the job
    pub fn new(mut source: R) -> Result<JobReader<R>, Error> {
        let mut header = vec![0u8; HEADER_WINDOW];
        let mut filled = 0;
        while filled < HEADER_WINDOW {
            match source.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into())
            }
        }
        header.truncate(filled);
        let descriptor = parse_header(&header)?;
        info!("Recognized a {} job, {} plane(s) of {} bytes", descriptor.model(), descriptor.separations(), descriptor.plane_len());
        if let Some(twin) = descriptor.model().header_twin() {
            warn!("A {} job looks exactly like a {} job, pass the model explicitly if needed", descriptor.model(), twin);
        }
        Ok(JobReader {
            source,
            header,
            descriptor
        })
    }

    pub fn descriptor(&self) -> &JobDescriptor {
        &self.descriptor
    }

    /// Reads the job as `model` instead of the detected family
    pub fn with_model(mut self, model: PrinterModel) -> Result<JobReader<R>, Error> {
        if model != self.descriptor.model() {
            self.descriptor = parse_header_as(&self.header, model)?;
            info!("Job will be printed as {}", model);
        }
        Ok(self)
    }

    /// Reads the rest of the job into memory
    pub fn spool(mut self, capacity: usize) -> Result<SpooledJob, Error> {
        let descriptor = self.descriptor;
        let profile = descriptor.profile();
        let mut transfer = ChunkedTransfer::with_prefix(capacity, &self.header);

        let mut init = Vec::with_capacity(profile.init_length());
        transfer.transfer(&mut self.source, &mut init, profile.init_length())?;
        let mut planes = Vec::with_capacity(descriptor.separations() as usize);
        for _ in 0..descriptor.separations() {
            // The length comes straight from the header, the plane grows as it arrives
            let mut plane = Vec::with_capacity(descriptor.plane_block_len().min(DEFAULT_CAPACITY));
            transfer.transfer(&mut self.source, &mut plane, descriptor.plane_block_len())?;
            planes.push(plane);
        }
        let mut footer = Vec::with_capacity(profile.footer_length());
        transfer.transfer(&mut self.source, &mut footer, profile.footer_length())?;

        if transfer.buffered() > 0 {
            debug!("Ignoring {} bytes read past the end of the job", transfer.buffered());
        }
        debug!("Spooled {} bytes", init.len() + planes.iter().map(Vec::len).sum::<usize>() + footer.len());
        Ok(SpooledJob {
            descriptor,
            init,
            planes,
            footer
        })
    }
}

/// A whole job held in memory, ready to be sent any number of times
#[derive(Clone, Debug)]
pub struct SpooledJob {
    descriptor: JobDescriptor,
    init: Vec<u8>,
    /// Plane header plus raster, one entry per separation
    planes: Vec<Vec<u8>>,
    footer: Vec<u8>
}

impl SpooledJob {
    /// Recognizes and spools a job in one go
    ///
    /// ```rust
    /// use dyesub_rs::{PrinterModel, SpooledJob, job::Block};
    /// let mut job = vec![0u8; 12];
    /// job[..4].copy_from_slice(&[0x40, 0x00, 0x10, 0x11]);
    /// job.extend_from_slice(&[0x40, 0x01, 0x00, 0x00]);
    /// job.extend_from_slice(&4u32.to_le_bytes());
    /// job.resize(12 + 12 + 4, 0xaa);
    /// let spooled = SpooledJob::read(&job[..])?;
    /// assert_eq!(spooled.descriptor().model(), PrinterModel::SelphyES1);
    /// assert_eq!(spooled.planes().len(), 1);
    /// assert_eq!(spooled.block(Block::Plane(1)).len(), 16);
    /// # Ok::<(), dyesub_rs::Error>(())
    /// ```
    pub fn read<R: Read>(source: R) -> Result<SpooledJob, Error> {
        JobReader::new(source)?.spool(DEFAULT_CAPACITY)
    }

    pub fn descriptor(&self) -> &JobDescriptor {
        &self.descriptor
    }

    pub fn init(&self) -> &[u8] {
        &self.init
    }

    pub fn planes(&self) -> &[Vec<u8>] {
        &self.planes
    }

    pub fn footer(&self) -> &[u8] {
        &self.footer
    }

    /// Bytes of a block, empty for a plane the job does not carry
    pub fn block(&self, block: Block) -> &[u8] {
        match block {
            Block::Init => &self.init,
            Block::Plane(k) => match (k as usize).checked_sub(1).and_then(|i| self.planes.get(i)) {
                Some(plane) => plane,
                None => &[]
            },
            Block::Footer => &self.footer
        }
    }
}
