use crate::job::ParseError;

/// Errors that this crate throws.
#[derive(Debug)]
pub enum Error {
    /// Error related to rusb
    RusbError(rusb::Error),
    /// Error coming from a file, a character device, or the job source
    Io(std::io::Error),
    /// The job header could not be recognized
    Parse(ParseError),
    /// No printer matching the model (and serial, if given) was found
    DeviceNotFound(String),
    /// This means no bulk endpoint pair could be found
    NoBulkEndpoint,
    /// The printer reports paper that does not match the job
    PaperMismatch {
        expected: u8,
        found: u8
    },
    /// The source ran dry before the whole block was moved
    Truncated {
        expected: usize,
        moved: usize
    },
    /// The sink accepted no bytes at all
    WriteZero,
    /// A model name that this library does not know about
    InvalidModel(String)
}

impl std::fmt::Display for Error {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        let content = match self {
            Error::RusbError(e) => format!("rusb error: {}", e),
            Error::Io(e) => format!("I/O error: {}", e),
            Error::Parse(e) => format!("Unrecognized job: {}", e),
            Error::DeviceNotFound(detail) => format!("No printer was found for {}", detail),
            Error::NoBulkEndpoint => "No bulk endpoint pair could be found".to_string(),
            Error::PaperMismatch{expected, found} => format!("Incorrect paper loaded, job wants {:#04x} but printer reports {:#04x}", expected, found),
            Error::Truncated{expected, moved} => format!("Job data ended early, moved {} of {} bytes", moved, expected),
            Error::WriteZero => "The printer accepted no data".to_string(),
            Error::InvalidModel(name) => format!("Unknown printer model \"{}\"", name)
        };
        write!(formatter, "{}", content)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::RusbError(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Parse(e) => Some(e),
            _ => None
        }
    }
}

impl From<rusb::Error> for Error {
    fn from(e: rusb::Error) -> Self {
        Error::RusbError(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}
