use std::fmt;

use crate::error::ParseError;

/// A range of sequence coordinates
///
/// By convention, start and stop are zero-based.
/// The start position is always inclusive and the stop position is always exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: usize, // inclusive
    pub stop: usize,  // exclusive
}

impl Interval {
    pub fn new(start: usize, stop: usize) -> Result<Interval, ParseError> {
        if stop < start {
            Err(ParseError::somewhere(
                "low < high",
                format!("{}>={}", start, stop),
            ))
        } else {
            Ok(Interval { start, stop })
        }
    }

    /// The window of `flank` bases on either side of a 1-based `position`
    ///
    /// Windows that would start before the first base are cut off at zero,
    /// so that their length gives them away as incomplete.
    pub fn around(position: usize, flank: usize) -> Interval {
        let center = position.saturating_sub(1); // to zero-based
        Interval {
            start: center.saturating_sub(flank),
            stop: position + flank,
        }
    }

    /// Cut the interval down to a sequence of length `seq_len`
    pub fn clamp(&self, seq_len: usize) -> Interval {
        let stop = self.stop.min(seq_len);
        Interval {
            start: self.start.min(stop),
            stop,
        }
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.stop
    }

    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.stop)
    }
}
