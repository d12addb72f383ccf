//! Tracked changes and their consolidation policy.
//!
//! Merge eligibility is attribution first, geometry second: two changes are
//! only ever combined when they record the same kind of edit by the same
//! user, and only then is adjacency considered. Merging widens the surviving
//! change's range and keeps the most recent timestamp.

use crate::{error::Result, Error, Range, RawRange, RawTrackingProps, TrackingProps};
use serde::{Deserialize, Serialize};

/// Wire shape of a [`TrackedChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrackedChange {
    pub range: RawRange,
    pub tracking: RawTrackingProps,
}

/// A span of document text with its attribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTrackedChange", into = "RawTrackedChange")]
pub struct TrackedChange {
    range: Range,
    tracking: TrackingProps,
}

impl TrackedChange {
    pub fn new(range: Range, tracking: TrackingProps) -> Self {
        Self { range, tracking }
    }

    pub fn from_raw(raw: RawTrackedChange) -> Result<Self> {
        Ok(Self {
            range: Range::from_raw(raw.range)?,
            tracking: TrackingProps::from_raw(raw.tracking)?,
        })
    }

    pub fn to_raw(&self) -> RawTrackedChange {
        RawTrackedChange {
            range: self.range.to_raw(),
            tracking: self.tracking.to_raw(),
        }
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::malformed)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::malformed)
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn tracking(&self) -> &TrackingProps {
        &self.tracking
    }

    /// Whether `other` can be folded into this change.
    ///
    /// Requires identical kind and user id, then ranges that touch.
    pub fn can_merge(&self, other: &TrackedChange) -> bool {
        self.tracking.kind() == other.tracking.kind()
            && self.tracking.user_id() == other.tracking.user_id()
            && self.range.touches(&other.range)
            && self.range.can_merge(&other.range)
    }

    /// [`TrackedChange::can_merge`] against a value of unknown shape.
    ///
    /// Anything that does not deserialize as a tracked change cannot be
    /// merged, so this answers `false` instead of failing.
    pub fn can_merge_raw(&self, other: &serde_json::Value) -> bool {
        match TrackedChange::deserialize(other) {
            Ok(other) => self.can_merge(&other),
            Err(_) => false,
        }
    }

    /// Fold `other` into this change, consuming it.
    ///
    /// On success the range covers both spans and the timestamp is the later
    /// of the two; a tie keeps this change's timestamp. Merging changes that
    /// cannot merge is a caller bug and fails with
    /// [`Error::InvalidOperation`], leaving this change untouched.
    pub fn merge(&mut self, other: TrackedChange) -> Result<()> {
        if !self.can_merge(&other) {
            return Err(Error::InvalidOperation(format!(
                "cannot merge {} by '{}' at {} with {} by '{}' at {}",
                self.tracking.kind(),
                self.tracking.user_id(),
                self.range,
                other.tracking.kind(),
                other.tracking.user_id(),
                other.range,
            )));
        }
        self.range.merge(&other.range)?;
        self.tracking.advance_to(other.tracking.ts());
        Ok(())
    }
}

impl TryFrom<RawTrackedChange> for TrackedChange {
    type Error = Error;

    fn try_from(raw: RawTrackedChange) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<TrackedChange> for RawTrackedChange {
    fn from(change: TrackedChange) -> Self {
        change.to_raw()
    }
}
