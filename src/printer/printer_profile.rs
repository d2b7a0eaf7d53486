extern crate serde;

use serde::{Serialize, Deserialize};
use crate::command::Command;
use super::PrinterModel;

/// One field of an expected readback
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Expect {
    /// The field must hold exactly this byte
    Byte(u8),
    /// Any byte is fine
    Ignore
}

impl Expect {
    /// True for the wildcard
    pub fn is_ignore(&self) -> bool {
        matches!(self, Expect::Ignore)
    }

    /// The concrete byte, if any
    pub fn byte(&self) -> Option<u8> {
        match self {
            Expect::Byte(b) => Some(*b),
            Expect::Ignore => None
        }
    }
}

/// Builds a [Pattern](crate::Pattern), `_` marks a wildcard field.
///
/// ```rust
/// use dyesub_rs::{pattern, Expect};
/// let pattern = pattern![0x02, 0x00, _, 0x01];
/// assert_eq!(pattern.fields()[2], Expect::Ignore);
/// assert_eq!(pattern.fields()[3], Expect::Byte(0x01));
/// ```
#[macro_export]
macro_rules! pattern {
    (@field _) => { $crate::Expect::Ignore };
    (@field $byte:expr) => { $crate::Expect::Byte($byte) };
    ($($field:tt),* $(,)?) => {
        $crate::Pattern::new(vec![$($crate::pattern!(@field $field)),*])
    };
}

/// Expected readback for one protocol phase
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Pattern(Vec<Expect>);

impl Pattern {
    pub fn new(fields: Vec<Expect>) -> Pattern {
        Pattern(fields)
    }

    /// A pattern that every readback of `len` bytes satisfies
    pub fn ignore_all(len: usize) -> Pattern {
        Pattern(vec![Expect::Ignore; len])
    }

    /// Requires `byte` at `index`, growing the pattern with wildcards if needed
    ///
    /// ```rust
    /// use dyesub_rs::{Pattern, Expect};
    /// let pattern = Pattern::ignore_all(58).with(0, 0x01).with(1, 0x03);
    /// assert_eq!(pattern.fields()[1], Expect::Byte(0x03));
    /// assert!(pattern.fields()[2].is_ignore());
    /// ```
    pub fn with(mut self, index: usize, byte: u8) -> Pattern {
        if self.0.len() <= index {
            self.0.resize(index + 1, Expect::Ignore);
        }
        self.0[index] = Expect::Byte(byte);
        self
    }

    pub fn fields(&self) -> &[Expect] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pads with wildcards, or cuts, to exactly `len` fields
    fn fit(mut self, len: usize) -> Pattern {
        self.0.resize(len, Expect::Ignore);
        self
    }
}

/// Readback phases that the job waits on
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Phase {
    /// Printer idle and willing to take a job
    Init,
    /// Printer ready for the given colour separation, counting from 1
    Ready(u8),
    /// Printer done with the last separation
    Done
}

impl std::fmt::Display for Phase {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Phase::Init => write!(formatter, "init"),
            Phase::Ready(k) => write!(formatter, "ready({})", k),
            Phase::Done => write!(formatter, "done")
        }
    }
}

/// Translates the paper code found in a job into the value the printer reports
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaperCodes([Expect; 256]);

impl PaperCodes {
    /// A table where every code is "don't care"
    pub fn ignore_all() -> PaperCodes {
        PaperCodes([Expect::Ignore; 256])
    }

    /// Maps the job code `raw` to the readback value `canonical`
    pub fn with(mut self, raw: u8, canonical: u8) -> PaperCodes {
        self.0[raw as usize] = Expect::Byte(canonical);
        self
    }

    pub fn lookup(&self, raw: u8) -> Expect {
        self.0[raw as usize]
    }
}

impl Default for PaperCodes {
    fn default() -> PaperCodes {
        PaperCodes::ignore_all()
    }
}

/// Protocol details of one printer family
///
/// Profiles for the known families live in a registry, see [PrinterModel::profile](crate::PrinterModel::profile). A custom profile can be put together with [PrinterProfile::builder](PrinterProfile::builder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrinterProfile {
    /// Family this profile describes
    pub (crate) model: PrinterModel,
    /// Human readable name
    pub (crate) name: String,
    /// Bytes of job data sent before the first plane
    pub (crate) init_length: usize,
    /// Bytes of job data sent after the last plane
    pub (crate) footer_length: usize,
    /// Bytes preceding each plane's raster data
    pub (crate) plane_header_length: usize,
    /// Length of a status readback
    pub (crate) readback_length: usize,
    pub (crate) init_pattern: Pattern,
    /// One pattern per colour separation
    pub (crate) ready_patterns: Vec<Pattern>,
    pub (crate) done_pattern: Pattern,
    /// Where the job header keeps its paper code
    pub (crate) paper_job_offset: Option<usize>,
    /// Where the readback reports the loaded paper
    pub (crate) paper_readback_offset: Option<usize>,
    pub (crate) paper_codes: PaperCodes,
    /// Written before each status read
    pub (crate) status_query: Option<Command>,
    /// Written once at the start of each copy
    pub (crate) preamble: Option<Command>
}

impl PrinterProfile {
    /// Creates a [PrinterProfileBuilder](crate::PrinterProfileBuilder)
    ///
    /// ```rust
    /// use dyesub_rs::{PrinterProfile, PrinterModel};
    /// let profile = PrinterProfile::builder(PrinterModel::SelphyCP, "My CP", 12)
    ///     .with_init_length(12)
    ///     .build();
    /// assert_eq!(profile.planes(), 1);
    /// ```
    pub fn builder<T: Into<String>>(model: PrinterModel, name: T, readback_length: usize) -> PrinterProfileBuilder {
        PrinterProfileBuilder::new(model, name, readback_length)
    }

    pub fn model(&self) -> PrinterModel {
        self.model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn init_length(&self) -> usize {
        self.init_length
    }

    pub fn footer_length(&self) -> usize {
        self.footer_length
    }

    pub fn plane_header_length(&self) -> usize {
        self.plane_header_length
    }

    pub fn readback_length(&self) -> usize {
        self.readback_length
    }

    /// Number of colour separations in a colour job
    pub fn planes(&self) -> u8 {
        self.ready_patterns.len() as u8
    }

    /// Expected readback for a phase, `None` for a separation the profile does not have
    pub fn pattern(&self, phase: Phase) -> Option<&Pattern> {
        match phase {
            Phase::Init => Some(&self.init_pattern),
            Phase::Ready(k) => (k as usize).checked_sub(1).and_then(|index| self.ready_patterns.get(index)),
            Phase::Done => Some(&self.done_pattern)
        }
    }

    pub fn paper_job_offset(&self) -> Option<usize> {
        self.paper_job_offset
    }

    pub fn paper_readback_offset(&self) -> Option<usize> {
        self.paper_readback_offset
    }

    pub fn paper_codes(&self) -> &PaperCodes {
        &self.paper_codes
    }

    pub fn status_query(&self) -> Option<Command> {
        self.status_query
    }

    pub fn preamble(&self) -> Option<Command> {
        self.preamble
    }
}

/// Helper structure to create a [PrinterProfile](crate::PrinterProfile)
///
/// Patterns shorter or longer than the readback length are padded with wildcards, or cut, when the profile is built.
pub struct PrinterProfileBuilder {
    model: PrinterModel,
    name: String,
    init_length: usize,
    footer_length: usize,
    plane_header_length: usize,
    readback_length: usize,
    init_pattern: Pattern,
    ready_patterns: Vec<Pattern>,
    done_pattern: Pattern,
    paper_job_offset: Option<usize>,
    paper_readback_offset: Option<usize>,
    paper_codes: PaperCodes,
    status_query: Option<Command>,
    preamble: Option<Command>
}

impl PrinterProfileBuilder {
    /// Creates a new [PrinterProfileBuilder](crate::PrinterProfileBuilder)
    ///
    /// By default nothing is sent around the planes, every pattern is a wildcard and no paper verification happens.
    pub fn new<T: Into<String>>(model: PrinterModel, name: T, readback_length: usize) -> PrinterProfileBuilder {
        PrinterProfileBuilder {
            model,
            name: name.into(),
            init_length: 0,
            footer_length: 0,
            plane_header_length: 0,
            readback_length,
            init_pattern: Pattern::ignore_all(readback_length),
            ready_patterns: Vec::new(),
            done_pattern: Pattern::ignore_all(readback_length),
            paper_job_offset: None,
            paper_readback_offset: None,
            paper_codes: PaperCodes::ignore_all(),
            status_query: None,
            preamble: None
        }
    }

    pub fn with_init_length(mut self, init_length: usize) -> PrinterProfileBuilder {
        self.init_length = init_length;
        self
    }

    pub fn with_footer_length(mut self, footer_length: usize) -> PrinterProfileBuilder {
        self.footer_length = footer_length;
        self
    }

    pub fn with_plane_header_length(mut self, plane_header_length: usize) -> PrinterProfileBuilder {
        self.plane_header_length = plane_header_length;
        self
    }

    pub fn with_init_pattern(mut self, pattern: Pattern) -> PrinterProfileBuilder {
        self.init_pattern = pattern;
        self
    }

    /// Adds the pattern for the next colour separation
    pub fn with_ready_pattern(mut self, pattern: Pattern) -> PrinterProfileBuilder {
        self.ready_patterns.push(pattern);
        self
    }

    pub fn with_done_pattern(mut self, pattern: Pattern) -> PrinterProfileBuilder {
        self.done_pattern = pattern;
        self
    }

    /// Enables paper verification
    ///
    /// The job byte at `job_offset` is translated through `paper_codes`, and the result is checked against the readback byte at `readback_offset`.
    /// ```rust
    /// use dyesub_rs::{PrinterProfileBuilder, PrinterModel, PaperCodes};
    /// let profile = PrinterProfileBuilder::new(PrinterModel::SelphyCP, "CP", 12)
    ///     .with_paper_verification(Some(3), Some(6), PaperCodes::ignore_all().with(0x01, 0x11))
    ///     .build();
    /// assert_eq!(profile.paper_readback_offset(), Some(6));
    /// ```
    pub fn with_paper_verification(mut self, job_offset: Option<usize>, readback_offset: Option<usize>, paper_codes: PaperCodes) -> PrinterProfileBuilder {
        self.paper_job_offset = job_offset;
        self.paper_readback_offset = readback_offset;
        self.paper_codes = paper_codes;
        self
    }

    pub fn with_status_query(mut self, command: Command) -> PrinterProfileBuilder {
        self.status_query = Some(command);
        self
    }

    pub fn with_preamble(mut self, command: Command) -> PrinterProfileBuilder {
        self.preamble = Some(command);
        self
    }

    /// Build the `PrinterProfile` that lies beneath the builder
    ///
    /// A profile without ready patterns gets a single wildcard one, so every job has at least one plane.
    pub fn build(self) -> PrinterProfile {
        let readback_length = self.readback_length;
        let mut ready_patterns: Vec<Pattern> = self.ready_patterns.into_iter()
            .map(|pattern| pattern.fit(readback_length))
            .collect();
        if ready_patterns.is_empty() {
            ready_patterns.push(Pattern::ignore_all(readback_length));
        }
        PrinterProfile {
            model: self.model,
            name: self.name,
            init_length: self.init_length,
            footer_length: self.footer_length,
            plane_header_length: self.plane_header_length,
            readback_length,
            init_pattern: self.init_pattern.fit(readback_length),
            ready_patterns,
            done_pattern: self.done_pattern.fit(readback_length),
            paper_job_offset: self.paper_job_offset,
            paper_readback_offset: self.paper_readback_offset,
            paper_codes: self.paper_codes,
            status_query: self.status_query,
            preamble: self.preamble
        }
    }
}
