//! Character ranges over a document's text.
//!
//! A [`Range`] is the half-open interval `[pos, pos + length)`. A range with
//! `length == 0` is a zero-width insertion point and is distinct from any
//! non-empty range.

use crate::{error::Result, Error, Offset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire shape of a [`Range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRange {
    pub pos: Offset,
    pub length: Offset,
}

/// A half-open span of character offsets.
///
/// Ordering is by start, then by length, which is the order the tracked-change
/// list keeps its entries in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawRange", into = "RawRange")]
pub struct Range {
    pos: Offset,
    length: Offset,
}

impl Range {
    /// Create a range starting at `pos` covering `length` characters.
    ///
    /// # Panics
    ///
    /// Panics if `pos + length` overflows. Use [`Range::try_new`] for
    /// untrusted input.
    pub fn new(pos: Offset, length: Offset) -> Self {
        match Self::try_new(pos, length) {
            Ok(range) => range,
            Err(err) => panic!("{err}"),
        }
    }

    /// Create a range, rejecting bounds whose end is not representable.
    pub fn try_new(pos: Offset, length: Offset) -> Result<Self> {
        if pos.checked_add(length).is_none() {
            return Err(Error::MalformedInput(format!(
                "range end overflows: pos {pos}, length {length}"
            )));
        }
        Ok(Self { pos, length })
    }

    pub fn from_raw(raw: RawRange) -> Result<Self> {
        Self::try_new(raw.pos, raw.length)
    }

    pub fn to_raw(&self) -> RawRange {
        RawRange {
            pos: self.pos,
            length: self.length,
        }
    }

    pub fn pos(&self) -> Offset {
        self.pos
    }

    pub fn length(&self) -> Offset {
        self.length
    }

    pub fn start(&self) -> Offset {
        self.pos
    }

    /// Exclusive end offset.
    pub fn end(&self) -> Offset {
        self.pos + self.length
    }

    /// Whether this is a zero-width insertion point.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// True if the ranges overlap or share a boundary, so that their union
    /// is one contiguous range. A zero-width range on either boundary of
    /// another range touches it.
    pub fn touches(&self, other: &Range) -> bool {
        self.end() >= other.start() && other.end() >= self.start()
    }

    /// True if the ranges share at least one character, or one of them is an
    /// insertion point strictly inside the other.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start() < other.end() && self.end() > other.start()
    }

    /// True if one range ends exactly where the other starts.
    pub fn abuts(&self, other: &Range) -> bool {
        self.end() == other.start() || self.start() == other.end()
    }

    /// True if `other` lies entirely within this range.
    pub fn contains(&self, other: &Range) -> bool {
        self.start() <= other.start() && self.end() >= other.end()
    }

    /// True if a cursor at `pos` sits inside this range or on either edge.
    pub fn contains_cursor(&self, pos: Offset) -> bool {
        self.start() <= pos && pos <= self.end()
    }

    /// The span shared by both ranges. Touching ranges share a zero-width
    /// span at their common boundary.
    pub fn intersect(&self, other: &Range) -> Option<Range> {
        let start = self.start().max(other.start());
        let end = self.end().min(other.end());
        (start <= end).then(|| Range {
            pos: start,
            length: end - start,
        })
    }

    /// Whether [`Range::merge`] would succeed.
    pub fn can_merge(&self, other: &Range) -> bool {
        self.touches(other)
    }

    /// Widen this range to cover the union of both ranges.
    pub fn merge(&mut self, other: &Range) -> Result<()> {
        if !self.can_merge(other) {
            return Err(Error::InvalidOperation(format!(
                "cannot merge ranges {self} and {other}"
            )));
        }
        let start = self.start().min(other.start());
        let end = self.end().max(other.end());
        self.pos = start;
        self.length = end - start;
        Ok(())
    }
}

impl TryFrom<RawRange> for Range {
    type Error = Error;

    fn try_from(raw: RawRange) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<Range> for RawRange {
    fn from(range: Range) -> Self {
        range.to_raw()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start(), self.end())
    }
}
