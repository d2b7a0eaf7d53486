use std::sync::{Arc, atomic::AtomicBool};
use std::time::Duration;
use crate::transfer::DEFAULT_CAPACITY;

/// Default wait between two identical readbacks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What to do when the printer reports the wrong paper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaperPolicy {
    /// Warn, and keep polling until the paper gets changed
    KeepPolling,
    /// Give up the job with [Error::PaperMismatch](crate::Error::PaperMismatch)
    Abort
}

impl Default for PaperPolicy {
    fn default() -> Self {
        PaperPolicy::KeepPolling
    }
}

/// How a job gets printed
#[derive(Clone, Debug)]
pub struct JobOptions {
    pub (crate) copies: u32,
    pub (crate) poll_interval: Duration,
    pub (crate) buffer_capacity: usize,
    pub (crate) paper_policy: PaperPolicy,
    /// Once set, no copy starts after the current one
    pub (crate) terminate: Arc<AtomicBool>
}

impl JobOptions {
    pub fn builder() -> JobOptionsBuilder {
        JobOptionsBuilder::new()
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn paper_policy(&self) -> PaperPolicy {
        self.paper_policy
    }

    /// Flag to raise to stop after the copy being printed
    pub fn terminate(&self) -> &Arc<AtomicBool> {
        &self.terminate
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        JobOptionsBuilder::new().build()
    }
}

/// Helper structure to create [JobOptions](crate::JobOptions)
///
/// ```rust
/// use std::time::Duration;
/// use dyesub_rs::{JobOptions, PaperPolicy};
/// let options = JobOptions::builder()
///     .with_copies(2)
///     .with_poll_interval(Duration::from_millis(250))
///     .with_paper_policy(PaperPolicy::Abort)
///     .build();
/// assert_eq!(options.copies(), 2);
/// ```
pub struct JobOptionsBuilder {
    copies: u32,
    poll_interval: Duration,
    buffer_capacity: usize,
    paper_policy: PaperPolicy,
    terminate: Option<Arc<AtomicBool>>
}

impl JobOptionsBuilder {
    pub fn new() -> JobOptionsBuilder {
        JobOptionsBuilder {
            copies: 1,
            poll_interval: DEFAULT_POLL_INTERVAL,
            buffer_capacity: DEFAULT_CAPACITY,
            paper_policy: PaperPolicy::default(),
            terminate: None
        }
    }

    /// Copies to print, at least one is always printed
    pub fn with_copies(mut self, copies: u32) -> JobOptionsBuilder {
        self.copies = copies.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> JobOptionsBuilder {
        self.poll_interval = poll_interval;
        self
    }

    /// Size of the buffer blocks go through on their way to the printer
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> JobOptionsBuilder {
        self.buffer_capacity = buffer_capacity;
        self
    }

    pub fn with_paper_policy(mut self, paper_policy: PaperPolicy) -> JobOptionsBuilder {
        self.paper_policy = paper_policy;
        self
    }

    /// Shares a termination flag, usually one a signal handler raises
    pub fn with_terminate(mut self, terminate: Arc<AtomicBool>) -> JobOptionsBuilder {
        self.terminate = Some(terminate);
        self
    }

    pub fn build(self) -> JobOptions {
        JobOptions {
            copies: self.copies,
            poll_interval: self.poll_interval,
            buffer_capacity: self.buffer_capacity,
            paper_policy: self.paper_policy,
            terminate: self.terminate.unwrap_or_default()
        }
    }
}

impl Default for JobOptionsBuilder {
    fn default() -> Self {
        JobOptionsBuilder::new()
    }
}
