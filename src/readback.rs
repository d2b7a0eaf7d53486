//! Comparison of printer status readbacks against the expected patterns

use std::cmp::Ordering;
use crate::{Expect, Pattern, Phase, PrinterProfile};

/// A status block, as read from the printer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadbackSample(Vec<u8>);

impl ReadbackSample {
    pub fn new(bytes: Vec<u8>) -> ReadbackSample {
        ReadbackSample(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }
}

impl From<Vec<u8>> for ReadbackSample {
    fn from(bytes: Vec<u8>) -> ReadbackSample {
        ReadbackSample(bytes)
    }
}

/// Hex dump, as used in the logs
impl std::fmt::Display for ReadbackSample {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(formatter, " ")?;
            }
            write!(formatter, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Compares a sample against a pattern, field by field
///
/// Wildcards always match and the field at `skip`, if any, is left out. The ordering of the first differing field is returned, a sample too short to hold a field compares as `Less`.
/// ```rust
/// use std::cmp::Ordering;
/// use dyesub_rs::{pattern, readback::{compare, ReadbackSample}};
/// let pattern = pattern![0x04, _, 0x07];
/// assert_eq!(compare(&pattern, &ReadbackSample::new(vec![0x04, 0x99, 0x07]), None), Ordering::Equal);
/// assert_eq!(compare(&pattern, &ReadbackSample::new(vec![0x05, 0x00, 0x00]), None), Ordering::Greater);
/// ```
pub fn compare(pattern: &Pattern, sample: &ReadbackSample, skip: Option<usize>) -> Ordering {
    for (index, expect) in pattern.fields().iter().enumerate() {
        if Some(index) == skip {
            continue;
        }
        let expected = match expect {
            Expect::Ignore => continue,
            Expect::Byte(b) => *b
        };
        let ordering = match sample.get(index) {
            Some(found) => found.cmp(&expected),
            None => Ordering::Less
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// True when the sample satisfies the profile's pattern for `phase`
///
/// The paper field is not looked at, see [paper_mismatch]. A phase the profile has no pattern for never matches, and neither does a sample shorter than the pattern, even when the missing fields are wildcards.
pub fn matches(profile: &PrinterProfile, phase: Phase, sample: &ReadbackSample) -> bool {
    match profile.pattern(phase) {
        Some(pattern) if sample.len() < pattern.len() => false,
        Some(pattern) => compare(pattern, sample, profile.paper_readback_offset()) == Ordering::Equal,
        None => false
    }
}

/// True when the job wants a specific paper and the printer reports another one
///
/// Nothing else in the sample matters.
pub fn paper_mismatch(profile: &PrinterProfile, paper_code: Expect, sample: &ReadbackSample) -> bool {
    paper_conflict(profile, paper_code, sample).is_some()
}

/// The expected and the reported paper byte, when they differ
pub fn paper_conflict(profile: &PrinterProfile, paper_code: Expect, sample: &ReadbackSample) -> Option<(u8, u8)> {
    let offset = profile.paper_readback_offset()?;
    let expected = paper_code.byte()?;
    match sample.get(offset) {
        Some(found) if found != expected => Some((expected, found)),
        // A sample too short to report paper proves nothing
        _ => None
    }
}
