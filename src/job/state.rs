extern crate serde;

use serde::{Serialize, Deserialize};
use crate::{
    Phase, PrinterProfile,
    readback::{self, ReadbackSample}
};
use super::JobDescriptor;

/// Where a job copy stands
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum JobState {
    /// Waiting for the printer to accept a job
    Idle,
    /// Init block may be sent
    PrinterReady,
    /// Waiting for the printer to want the first plane
    InitSent,
    /// The given plane may be sent, counting from 1
    ReadyColor(u8),
    /// The given plane went out, waiting on the printer
    ColorSent(u8),
    /// Footer may be sent
    Done,
    Finished
}

impl std::fmt::Display for JobState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            JobState::Idle => write!(formatter, "idle"),
            JobState::PrinterReady => write!(formatter, "printer ready"),
            JobState::InitSent => write!(formatter, "init sent"),
            JobState::ReadyColor(k) => write!(formatter, "ready for plane {}", k),
            JobState::ColorSent(k) => write!(formatter, "plane {} sent", k),
            JobState::Done => write!(formatter, "done"),
            JobState::Finished => write!(formatter, "finished")
        }
    }
}

/// A piece of the job sent in one go
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Block {
    Init,
    /// Plane header and raster of a plane, counting from 1
    Plane(u8),
    Footer
}

impl std::fmt::Display for Block {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Block::Init => write!(formatter, "init block"),
            Block::Plane(k) => write!(formatter, "plane {}", k),
            Block::Footer => write!(formatter, "footer")
        }
    }
}

/// What a readback did to the job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// The readback matched, the job moved to this state
    Advanced(JobState),
    /// No match yet, keep polling
    Waiting,
    /// The printer holds the wrong paper, the state did not change
    PaperMismatch {
        expected: u8,
        found: u8
    }
}

/// Transitions of one job copy, without any I/O
///
/// Readback driven states tell which [Phase] they wait for through [awaiting](JobMachine::awaiting), the others tell which [Block] to send through [next_block](JobMachine::next_block).
pub struct JobMachine<'a> {
    profile: &'a PrinterProfile,
    job: &'a JobDescriptor,
    state: JobState
}

impl<'a> JobMachine<'a> {
    pub fn new(profile: &'a PrinterProfile, job: &'a JobDescriptor) -> JobMachine<'a> {
        JobMachine {
            profile,
            job,
            state: JobState::Idle
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == JobState::Finished
    }

    /// Phase the current state waits for, if it waits at all
    pub fn awaiting(&self) -> Option<Phase> {
        let planes = self.profile.planes();
        match self.state {
            JobState::Idle => Some(Phase::Init),
            JobState::InitSent => Some(Phase::Ready(1)),
            JobState::ColorSent(k) if k < planes => Some(Phase::Ready(k + 1)),
            JobState::ColorSent(_) => Some(Phase::Done),
            _ => None
        }
    }

    /// Feeds a readback to a waiting state
    ///
    /// A state that is not waiting ignores it.
    pub fn observe(&mut self, sample: &ReadbackSample) -> Observation {
        let phase = match self.awaiting() {
            Some(phase) => phase,
            None => return Observation::Waiting
        };
        if let Some((expected, found)) = readback::paper_conflict(self.profile, self.job.paper_code(), sample) {
            return Observation::PaperMismatch{expected, found};
        }
        if !readback::matches(self.profile, phase, sample) {
            return Observation::Waiting;
        }
        self.state = match self.state {
            JobState::Idle => JobState::PrinterReady,
            JobState::InitSent => JobState::ReadyColor(1),
            // Black and white jobs stop after their single plane
            JobState::ColorSent(k) if k < self.profile.planes() && !self.job.monochrome() => JobState::ReadyColor(k + 1),
            JobState::ColorSent(_) => JobState::Done,
            other => other
        };
        Observation::Advanced(self.state)
    }

    /// Block the current state sends, if it sends one
    pub fn next_block(&self) -> Option<Block> {
        match self.state {
            JobState::PrinterReady => Some(Block::Init),
            JobState::ReadyColor(k) => Some(Block::Plane(k)),
            JobState::Done => Some(Block::Footer),
            _ => None
        }
    }

    /// Marks the block from [next_block](JobMachine::next_block) as fully sent
    pub fn block_sent(&mut self) {
        self.state = match self.state {
            JobState::PrinterReady => JobState::InitSent,
            JobState::ReadyColor(k) => JobState::ColorSent(k),
            JobState::Done => JobState::Finished,
            other => other
        };
    }
}
