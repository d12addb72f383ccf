//! Attribution metadata attached to a tracked change.

use crate::{error::Result, Error, RawTimestamp, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of edit a tracked change records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insertion,
    Deletion,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insertion => write!(f, "insertion"),
            ChangeKind::Deletion => write!(f, "deletion"),
        }
    }
}

/// Wire shape of [`TrackingProps`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrackingProps {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub user_id: UserId,
    pub ts: RawTimestamp,
}

/// Who made an edit, what kind of edit it was, and when it was last touched.
///
/// Kind and user are fixed at construction. Only the timestamp moves, and
/// only forward, when changes are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTrackingProps", into = "RawTrackingProps")]
pub struct TrackingProps {
    kind: ChangeKind,
    user_id: UserId,
    ts: Timestamp,
}

impl TrackingProps {
    /// Create tracking props. The user id must be non-empty.
    pub fn new(kind: ChangeKind, user_id: impl Into<UserId>, ts: Timestamp) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(Error::MalformedInput(
                "tracking props require a user id".to_string(),
            ));
        }
        Ok(Self { kind, user_id, ts })
    }

    pub fn insertion(user_id: impl Into<UserId>, ts: Timestamp) -> Result<Self> {
        Self::new(ChangeKind::Insertion, user_id, ts)
    }

    pub fn deletion(user_id: impl Into<UserId>, ts: Timestamp) -> Result<Self> {
        Self::new(ChangeKind::Deletion, user_id, ts)
    }

    pub fn from_raw(raw: RawTrackingProps) -> Result<Self> {
        let ts = Timestamp::from_raw(raw.ts)?;
        Self::new(raw.kind, raw.user_id, ts)
    }

    pub fn to_raw(&self) -> RawTrackingProps {
        RawTrackingProps {
            kind: self.kind,
            user_id: self.user_id.clone(),
            ts: self.ts.to_raw(),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    /// Same kind of edit by the same user. Timestamps are not compared.
    pub fn same_attribution(&self, other: &TrackingProps) -> bool {
        self.kind == other.kind && self.user_id == other.user_id
    }

    /// Move the timestamp to `ts` if it is strictly later than the current one.
    pub(crate) fn advance_to(&mut self, ts: Timestamp) {
        self.ts = Timestamp::later(self.ts, ts);
    }
}

impl TryFrom<RawTrackingProps> for TrackingProps {
    type Error = Error;

    fn try_from(raw: RawTrackingProps) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<TrackingProps> for RawTrackingProps {
    fn from(props: TrackingProps) -> Self {
        props.to_raw()
    }
}
