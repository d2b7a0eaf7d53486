pub use self::printer_profile::{Expect, Pattern, Phase, PaperCodes, PrinterProfile, PrinterProfileBuilder};
pub use self::printer_model::{PrinterModel, build_profiles, SELPHY_READBACK_LEN, KODAK_READBACK_LEN, SELPHY_PLANE_HEADER_LEN, KODAK_HEADER_LEN, KODAK_PADDING_LEN};
pub use self::transport::{Transport, TransportSink};
pub use self::usb_printer::{UsbPrinter, DEFAULT_USB_TIMEOUT};
pub use self::file_printer::FilePrinter;
pub use self::job_options::{JobOptions, JobOptionsBuilder, PaperPolicy, DEFAULT_POLL_INTERVAL};

mod printer_profile;
mod printer_model;
mod transport;
mod usb_printer;
mod file_printer;
mod job_options;

extern crate log;

use std::sync::atomic::Ordering;
use log::{debug, info, warn};
use crate::{
    Error,
    job::{JobMachine, Observation, SpooledJob},
    readback::ReadbackSample,
    transfer::ChunkedTransfer
};

/// Main dyesub-rs structure
///
/// Drives a spooled job through a printer, one copy after the other. Every wait on the printer is a poll of its status readback, without any timeout besides the one the transport enforces.
/// ```rust,no_run
/// use std::fs::File;
/// use dyesub_rs::{Printer, JobOptions, SpooledJob, UsbPrinter, DEFAULT_USB_TIMEOUT};
///
/// let job = SpooledJob::read(File::open("photo.raw")?)?;
/// let transport = UsbPrinter::open(job.descriptor().model(), None, DEFAULT_USB_TIMEOUT)?;
/// let mut printer = Printer::new(transport, JobOptions::builder().with_copies(2).build());
/// printer.print(&job)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Printer<T: Transport> {
    transport: T,
    options: JobOptions
}

impl<T: Transport> Printer<T> {
    pub fn new(transport: T, options: JobOptions) -> Printer<T> {
        Printer {
            transport,
            options
        }
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Gives the transport back, closing nothing
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Prints every requested copy of `job`, returns how many were printed
    ///
    /// The termination flag is only looked at once a copy is complete. Any transport error ends the job right away.
    pub fn print(&mut self, job: &SpooledJob) -> Result<u32, Error> {
        let mut transfer = ChunkedTransfer::new(self.options.buffer_capacity);
        let mut remaining = self.options.copies.max(1);
        let mut printed = 0;
        while remaining > 0 {
            info!("Printing copy {} of {}", printed + 1, printed + remaining);
            self.print_copy(job, &mut transfer)?;
            printed += 1;
            if self.options.terminate.load(Ordering::Relaxed) && remaining > 1 {
                info!("Termination requested, dropping {} remaining copies", remaining - 1);
                remaining = 1;
            }
            remaining -= 1;
        }
        info!("Job complete, {} cop{} printed", printed, if printed == 1 { "y" } else { "ies" });
        Ok(printed)
    }

    fn print_copy(&mut self, job: &SpooledJob, transfer: &mut ChunkedTransfer) -> Result<(), Error> {
        let descriptor = job.descriptor();
        let profile = descriptor.profile();
        if let Some(preamble) = profile.preamble() {
            self.transport.write_all(&preamble.as_bytes())?;
        }
        let mut machine = JobMachine::new(profile, descriptor);
        let mut previous: Option<ReadbackSample> = None;
        let mut paper_warned = false;
        while !machine.is_finished() {
            if let Some(block) = machine.next_block() {
                let bytes = job.block(block);
                // A zero length footer still finishes the job
                if !bytes.is_empty() {
                    debug!("Sending {}, {} bytes", block, bytes.len());
                    let mut source = bytes;
                    transfer.transfer(&mut source, &mut TransportSink(&mut self.transport), bytes.len())?;
                }
                machine.block_sent();
                continue;
            }

            if let Some(query) = profile.status_query() {
                self.transport.write_all(&query.as_bytes())?;
            }
            let sample = self.transport.read_status(profile.readback_length())?;
            let changed = previous.as_ref() != Some(&sample);
            if changed {
                debug!("Readback: {}", sample);
            }
            let advanced = match machine.observe(&sample) {
                Observation::Advanced(state) => {
                    info!("Printer state: {}", state);
                    paper_warned = false;
                    true
                },
                Observation::PaperMismatch{expected, found} => match self.options.paper_policy {
                    PaperPolicy::Abort => return Err(Error::PaperMismatch{expected, found}),
                    PaperPolicy::KeepPolling => {
                        if !paper_warned {
                            warn!("Incorrect paper loaded ({:#04x} vs {:#04x}), waiting for it to be changed", found, expected);
                            paper_warned = true;
                        }
                        false
                    }
                },
                Observation::Waiting => false
            };
            // Nothing new from the printer, give it some time
            if !advanced && !changed {
                std::thread::sleep(self.options.poll_interval);
            }
            previous = Some(sample);
        }
        Ok(())
    }
}
