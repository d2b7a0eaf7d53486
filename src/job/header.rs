extern crate serde;

use serde::{Serialize, Deserialize};
use crate::{Expect, PrinterModel, PrinterProfile};

/// Bytes of a job needed to tell every family apart
pub const HEADER_WINDOW: usize = 28;

/// Every SELPHY job starts with this
const SELPHY_MAGIC: [u8; 2] = [0x40, 0x00];
/// Start of every SELPHY plane header
const PLANE_MAGIC: [u8; 2] = [0x40, 0x01];
/// Every Kodak job starts with this
const KODAK_MAGIC: [u8; 5] = [0x03, 0x1b, 0x43, 0x48, 0x43];
/// Bytes a SELPHY header needs, up to the end of the last plane length field
const SELPHY_NEEDED: usize = 20;
/// Bytes a Kodak header needs, up to the end of the rows field
const KODAK_NEEDED: usize = 14;
/// The CP-10 is the only CP printing planes of this size
const CP10_PLANE_LEN: usize = 688480;
/// ES40/CP790 plane sizes, indexed by the job's paper byte
const ES40_PLANE_LENGTHS: [usize; 4] = [2227456, 1601600, 698880, 2976512];
/// ES1 print mode byte for black and white jobs
const ES1_MONO_MODE: u8 = 0x10;

/// Why a job header was rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The job ended before the signature could be checked
    TooShort {
        needed: usize,
        got: usize
    },
    /// The header matches no known family
    UnknownSignature,
    /// The header belongs to a family that cannot be read as the requested one
    IncompatibleOverride {
        detected: PrinterModel,
        requested: PrinterModel
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            ParseError::TooShort{needed, got} => write!(formatter, "header needs {} bytes, job holds {}", needed, got),
            ParseError::UnknownSignature => write!(formatter, "header matches no known printer"),
            ParseError::IncompatibleOverride{detected, requested} => write!(formatter, "a {} job cannot be printed as {}", detected, requested)
        }
    }
}

impl std::error::Error for ParseError {}

/// What a job header says about the job
///
/// Built once per job by [parse_header](crate::job::parse_header), never changed afterwards.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobDescriptor {
    model: PrinterModel,
    monochrome: bool,
    /// Raster bytes of one plane, plane header excluded
    plane_len: usize,
    /// Paper the printer must report, `Ignore` when unchecked
    paper_code: Expect
}

impl JobDescriptor {
    fn resolve(model: PrinterModel, monochrome: bool, plane_len: usize, header: &[u8]) -> JobDescriptor {
        let profile = model.profile();
        let paper_code = profile.paper_job_offset()
            .and_then(|offset| header.get(offset))
            .map(|raw| profile.paper_codes().lookup(*raw))
            .unwrap_or(Expect::Ignore);
        JobDescriptor {
            model,
            monochrome,
            plane_len,
            paper_code
        }
    }

    pub fn model(&self) -> PrinterModel {
        self.model
    }

    pub fn monochrome(&self) -> bool {
        self.monochrome
    }

    pub fn plane_len(&self) -> usize {
        self.plane_len
    }

    pub fn paper_code(&self) -> Expect {
        self.paper_code
    }

    pub fn profile(&self) -> &'static PrinterProfile {
        self.model.profile()
    }

    /// Planes carried by the job: one for black and white, all of them otherwise
    pub fn separations(&self) -> u8 {
        if self.monochrome {
            1
        } else {
            self.profile().planes()
        }
    }

    /// Bytes sent per plane, plane header included
    pub fn plane_block_len(&self) -> usize {
        self.profile().plane_header_length() + self.plane_len
    }
}

/// Fields of a Kodak 6800 job header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KodakHeader {
    pub copies: u8,
    pub columns: u16,
    pub rows: u16,
    /// 0x00 for 6x4, 0x06 for 6x8, 0x07 for 5x7
    pub media: u8,
    pub laminate: bool
}

impl KodakHeader {
    /// Reads the header fields, `None` if the magic is missing or the header is cut short
    ///
    /// ```rust
    /// use dyesub_rs::job::KodakHeader;
    /// let header = [0x03, 0x1b, 0x43, 0x48, 0x43, 0x0a, 0x00, 0x00, 0x00,
    ///     0x01, 0x07, 0x34, 0x04, 0xd8, 0x06, 0x01, 0x00];
    /// let header = KodakHeader::parse(&header).unwrap();
    /// assert_eq!(header.raster_len(), 6_859_680);
    /// assert_eq!(header.padded_len(), 6_859_697);
    /// ```
    pub fn parse(header: &[u8]) -> Option<KodakHeader> {
        if header.len() < crate::printer::KODAK_HEADER_LEN || header[..KODAK_MAGIC.len()] != KODAK_MAGIC {
            return None;
        }
        Some(KodakHeader {
            copies: header[9],
            columns: u16::from_be_bytes([header[10], header[11]]),
            rows: u16::from_be_bytes([header[12], header[13]]),
            media: header[14],
            laminate: header[15] == 0x01
        })
    }

    /// Interleaved RGB raster following the header
    pub fn raster_len(&self) -> usize {
        self.rows as usize * self.columns as usize * 3
    }

    /// Raster plus its trailing padding
    pub fn padded_len(&self) -> usize {
        self.raster_len() + crate::printer::KODAK_PADDING_LEN
    }
}

fn le32(header: &[u8], offset: usize) -> usize {
    u32::from_le_bytes([header[offset], header[offset + 1], header[offset + 2], header[offset + 3]]) as usize
}

/// Works out the printer family and job parameters from the first bytes of a job
///
/// [HEADER_WINDOW](HEADER_WINDOW) bytes are always enough. The CP series and the CP900 share one header layout; such a job is reported as [SelphyCP](crate::PrinterModel::SelphyCP), see [parse_header_as].
/// ```rust
/// use dyesub_rs::{PrinterModel, job::parse_header};
/// let mut header = [0u8; 28];
/// header[..4].copy_from_slice(&[0x40, 0x00, 0x20, 0x11]);
/// header[12..14].copy_from_slice(&[0x40, 0x01]);
/// header[16..20].copy_from_slice(&0x0001e000u32.to_le_bytes());
/// let job = parse_header(&header)?;
/// assert_eq!(job.model(), PrinterModel::SelphyES1);
/// assert!(!job.monochrome());
/// assert_eq!(job.plane_len(), 0x0001e000);
/// # Ok::<(), dyesub_rs::job::ParseError>(())
/// ```
pub fn parse_header(header: &[u8]) -> Result<JobDescriptor, ParseError> {
    if header.len() >= KODAK_MAGIC.len() && header[..KODAK_MAGIC.len()] == KODAK_MAGIC {
        if header.len() < KODAK_NEEDED {
            return Err(ParseError::TooShort{needed: KODAK_NEEDED, got: header.len()});
        }
        let columns = u16::from_be_bytes([header[10], header[11]]) as usize;
        let rows = u16::from_be_bytes([header[12], header[13]]) as usize;
        return Ok(JobDescriptor::resolve(PrinterModel::Kodak6800, false, rows * columns * 3, header));
    }

    if header.len() < SELPHY_MAGIC.len() {
        return Err(ParseError::TooShort{needed: SELPHY_MAGIC.len(), got: header.len()});
    }
    if header[..2] != SELPHY_MAGIC {
        return Err(ParseError::UnknownSignature);
    }
    if header.len() < SELPHY_NEEDED {
        return Err(ParseError::TooShort{needed: SELPHY_NEEDED, got: header.len()});
    }

    // 12 byte init block, the first plane header follows
    if header[12..14] == PLANE_MAGIC {
        let plane_len = le32(header, 16);
        let (model, monochrome) = if header[2] == 0x00 {
            if plane_len == CP10_PLANE_LEN {
                (PrinterModel::SelphyCP10, false)
            } else {
                (PrinterModel::SelphyCP, false)
            }
        } else {
            (PrinterModel::SelphyES1, header[2] == ES1_MONO_MODE)
        };
        return Ok(JobDescriptor::resolve(model, monochrome, plane_len, header));
    }

    // 16 byte init block
    if header[16..18] == PLANE_MAGIC {
        let plane_len = le32(header, 12);
        let (model, monochrome) = if header[4] == 0x02 {
            (PrinterModel::SelphyES2, header[7] == 0x01)
        } else if ES40_PLANE_LENGTHS.get(header[2] as usize) == Some(&plane_len) {
            (PrinterModel::SelphyES40, header[3] == 0x01)
        } else {
            (PrinterModel::SelphyES3, header[3] == 0x01)
        };
        return Ok(JobDescriptor::resolve(model, monochrome, plane_len, header));
    }

    Err(ParseError::UnknownSignature)
}

/// Like [parse_header], but reads the job as `model`
///
/// Only the detected family itself, or the family sharing its header layout, is accepted.
/// ```rust
/// use dyesub_rs::{PrinterModel, job::parse_header_as};
/// let mut header = [0u8; 28];
/// header[..4].copy_from_slice(&[0x40, 0x00, 0x00, 0x01]);
/// header[12..14].copy_from_slice(&[0x40, 0x01]);
/// header[16..20].copy_from_slice(&1_000_000u32.to_le_bytes());
/// let job = parse_header_as(&header, PrinterModel::SelphyCP900)?;
/// assert_eq!(job.model(), PrinterModel::SelphyCP900);
/// assert!(parse_header_as(&header, PrinterModel::SelphyES1).is_err());
/// # Ok::<(), dyesub_rs::job::ParseError>(())
/// ```
pub fn parse_header_as(header: &[u8], model: PrinterModel) -> Result<JobDescriptor, ParseError> {
    let detected = parse_header(header)?;
    if detected.model == model {
        Ok(detected)
    } else if detected.model.header_twin() == Some(model) {
        Ok(JobDescriptor::resolve(model, detected.monochrome, detected.plane_len, header))
    } else {
        Err(ParseError::IncompatibleOverride{detected: detected.model, requested: model})
    }
}
