//! Job recognition, spooling, and the transitions a job goes through
pub use self::header::{HEADER_WINDOW, JobDescriptor, KodakHeader, ParseError, parse_header, parse_header_as};
pub use self::spool::{JobReader, SpooledJob};
pub use self::state::{Block, JobMachine, JobState, Observation};

mod header;
mod spool;
mod state;
