//! # Redline Engine
//!
//! The tracked-change core of a collaborative text editor.
//!
//! A tracked change ("suggestion") marks a contiguous span of document text
//! with who inserted or deleted it and when. This crate holds those changes
//! and keeps them consistent and minimal: touching changes with identical
//! attribution collapse into one, and changes by different authors never
//! silently combine.
//!
//! ## Design Principles
//!
//! - **No IO**: values in, values out
//! - **Attribution first**: kind and author must match before geometry is considered
//! - **Fail fast**: merging incompatible changes is an error, never a silent no-op
//! - **Lossless wire format**: every type round-trips through its raw JSON shape
//!
//! ## Core Concepts
//!
//! ### Ranges
//!
//! A [`Range`] is the half-open interval `[pos, pos + length)` over the
//! document's characters. Zero-length ranges are insertion points.
//!
//! ### Tracking Props
//!
//! [`TrackingProps`] carry the [`ChangeKind`] (insertion or deletion), the
//! author's user id, and a [`Timestamp`]. Timestamps accept either ISO-8601
//! strings or epoch milliseconds and serialize back in the shape they came in.
//!
//! ### Tracked Changes
//!
//! A [`TrackedChange`] pairs one range with one set of tracking props.
//! [`TrackedChange::can_merge`] checks kind, author, then adjacency;
//! [`TrackedChange::merge`] consumes the other change, widens the range and
//! keeps the later timestamp.
//!
//! ### Tracked Change Lists
//!
//! A [`TrackedChangeList`] keeps a document's changes sorted and
//! consolidated, rejecting changes that would overlap another author's.
//!
//! ## Quick Start
//!
//! ```rust
//! use redline_engine::{Range, Timestamp, TrackedChange, TrackedChangeList, TrackingProps};
//!
//! let first = TrackedChange::new(
//!     Range::new(10, 5),
//!     TrackingProps::insertion("U1", Timestamp::from_millis(100).unwrap()).unwrap(),
//! );
//! let second = TrackedChange::new(
//!     Range::new(15, 5),
//!     TrackingProps::insertion("U1", Timestamp::from_millis(200).unwrap()).unwrap(),
//! );
//!
//! let mut list = TrackedChangeList::new();
//! list.add(first).unwrap();
//! list.add(second).unwrap();
//!
//! assert_eq!(list.len(), 1);
//! let merged = &list.as_slice()[0];
//! assert_eq!(*merged.range(), Range::new(10, 10));
//! assert_eq!(merged.tracking().ts().as_millis(), 200);
//! ```
//!
//! ## FFI
//!
//! The [`ffi`] module provides C-compatible functions for embedding the
//! engine in a host editor. All data is exchanged as JSON strings.

pub mod error;
pub mod ffi;
pub mod list;
pub mod range;
pub mod timestamp;
pub mod tracked_change;
pub mod tracking;

// Re-export main types at crate root
pub use error::Error;
pub use list::TrackedChangeList;
pub use range::{Range, RawRange};
pub use timestamp::{RawTimestamp, Timestamp, TimestampFormat};
pub use tracked_change::{RawTrackedChange, TrackedChange};
pub use tracking::{ChangeKind, RawTrackingProps, TrackingProps};

/// Type aliases for clarity
pub type Offset = usize;
pub type UserId = String;
