extern crate serde;

use serde::{Serialize, Deserialize};

/// Every Kodak command starts with this sequence
const KODAK_MAGIC: [u8; 5] = [0x03, 0x1b, 0x43, 0x48, 0x43];
/// Kodak commands are zero padded to this length
const KODAK_COMMAND_LEN: usize = 16;

/// Fixed commands sent to a printer outside of the job data
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Asks a Kodak 6800 for its status block. Equivalent to `03 1b 43 48 43 03`
    KodakStatusQuery,
    /// Wakes a Kodak 6800 up before a job. Equivalent to `03 1b 43 48 43 1a`
    KodakAttention
}

impl Command {
    pub fn as_bytes(&self) -> Vec<u8> {
        let opcode = match self {
            Command::KodakStatusQuery => 0x03,
            Command::KodakAttention => 0x1a
        };
        let mut res = Vec::with_capacity(KODAK_COMMAND_LEN);
        res.extend_from_slice(&KODAK_MAGIC);
        res.push(opcode);
        res.resize(KODAK_COMMAND_LEN, 0x00);
        res
    }
}
