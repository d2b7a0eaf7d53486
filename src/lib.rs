//! Library for driving dye-sublimation photo printers with rust
//!
//! Canon SELPHY (ES and CP series) and Kodak 6800 printers take a spooled job, a vendor specific header followed by raster colour planes, but only let each piece through once their status readback says they are ready for it. This library recognizes the job, then feeds it to the printer at the pace the printer asks for.
//!
//! ```rust,no_run
//! use std::fs::File;
//! use dyesub_rs::{Printer, JobOptions, SpooledJob, UsbPrinter, DEFAULT_USB_TIMEOUT};
//!
//! // The whole job is read up front, so copies do not read it again
//! let job = match SpooledJob::read(File::open("photo.raw").unwrap()) {
//!     Ok(job) => job,
//!     Err(e) => panic!("Error: {}", e)
//! };
//! // The job header tells which printer to look for
//! let transport = match UsbPrinter::open(job.descriptor().model(), None, DEFAULT_USB_TIMEOUT) {
//!     Ok(transport) => transport,
//!     Err(e) => panic!("No printer was found :( {}", e)
//! };
//! let mut printer = Printer::new(transport, JobOptions::default());
//! match printer.print(&job) {
//!     Ok(_) => (),
//!     Err(e) => println!("Error: {}", e)
//! }
//! ```
//!
//! ## Printer Details
//!
//! Each supported family is described by a [PrinterProfile](crate::PrinterProfile): block lengths, the readback expected before each phase, and where paper is checked. Profiles of the known families are built once and looked up through [PrinterModel](crate::PrinterModel).
//!
//! ```rust
//! use dyesub_rs::{PrinterModel, Phase};
//!
//! let profile = PrinterModel::SelphyES40.profile();
//! assert_eq!(profile.init_length(), 16);
//! assert_eq!(profile.planes(), 3);
//! assert!(profile.pattern(Phase::Done).is_some());
//! ```
//!
//! Printers are reached through a [Transport](crate::Transport). [UsbPrinter](crate::UsbPrinter) talks to the device with libusb, [FilePrinter](crate::FilePrinter) goes through a character device such as `/dev/usb/lp0`.

pub use printer::{
    Printer, PrinterProfile, PrinterProfileBuilder, PrinterModel,
    Expect, Pattern, Phase, PaperCodes,
    Transport, TransportSink, UsbPrinter, FilePrinter, DEFAULT_USB_TIMEOUT,
    JobOptions, JobOptionsBuilder, PaperPolicy, DEFAULT_POLL_INTERVAL,
    build_profiles, SELPHY_READBACK_LEN, KODAK_READBACK_LEN, SELPHY_PLANE_HEADER_LEN, KODAK_HEADER_LEN, KODAK_PADDING_LEN
};
pub use job::{JobDescriptor, SpooledJob, JobReader};
pub use error::{Error};

/// Fixed commands sent outside of the job data
pub mod command;
/// Recognition, spooling and sequencing of jobs
pub mod job;
pub mod readback;
pub mod transfer;

mod printer;
mod error;
