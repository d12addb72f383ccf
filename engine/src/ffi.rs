//! FFI layer for host editor integration.
//!
//! This module provides C-compatible functions so an editor written in
//! another language can keep its tracked changes in the engine.
//! All data crosses the boundary as JSON strings in the raw wire shapes.
//!
//! # Memory Management
//!
//! - Strings returned by `redline_*` functions are allocated by Rust
//! - Caller must free them with `redline_string_free`
//! - List pointers must be freed with `redline_list_free`
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>"}` on failure

use crate::{Range, TrackedChange, TrackedChangeList};
use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Result wrapper for FFI responses.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum FfiResult<T: serde::Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: serde::Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn err(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `redline_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => CString::from(c"{\"error\":\"string contained null bytes\"}").into_raw(),
    }
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn err_string(message: impl Into<String>) -> *mut c_char {
    to_c_string(FfiResult::<()>::err(message).to_json())
}

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `redline_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn redline_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Tracked Changes
// ============================================================================

/// Check whether two tracked changes can merge.
///
/// # Returns
/// 1 if they can merge, 0 otherwise. Null pointers and anything that is not
/// a well-formed tracked change answer 0.
///
/// # Safety
/// - `change_json` and `other_json` must be valid null-terminated C strings or null
#[no_mangle]
pub unsafe extern "C" fn redline_change_can_merge(
    change_json: *const c_char,
    other_json: *const c_char,
) -> i32 {
    let change = match from_c_string(change_json).map(|s| TrackedChange::from_json(&s)) {
        Some(Ok(c)) => c,
        _ => return 0,
    };

    let other: serde_json::Value = match from_c_string(other_json)
        .and_then(|s| serde_json::from_str(&s).ok())
    {
        Some(v) => v,
        None => return 0,
    };

    change.can_merge_raw(&other) as i32
}

/// Merge `other_json` into `change_json`.
///
/// # Returns
/// JSON string: `{"ok": TrackedChange}` or `{"error": "message"}`
///
/// # Safety
/// - `change_json` and `other_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `redline_string_free`
#[no_mangle]
pub unsafe extern "C" fn redline_change_merge(
    change_json: *const c_char,
    other_json: *const c_char,
) -> *mut c_char {
    let (change_str, other_str) = match (from_c_string(change_json), from_c_string(other_json)) {
        (Some(a), Some(b)) => (a, b),
        _ => return err_string("invalid tracked change JSON"),
    };

    let parsed = TrackedChange::from_json(&change_str)
        .and_then(|change| Ok((change, TrackedChange::from_json(&other_str)?)));
    let (mut change, other) = match parsed {
        Ok(pair) => pair,
        Err(e) => return err_string(e.to_string()),
    };

    match change.merge(other) {
        Ok(()) => to_c_string(FfiResult::ok(change).to_json()),
        Err(e) => err_string(e.to_string()),
    }
}

// ============================================================================
// List Lifecycle
// ============================================================================

/// Create an empty tracked change list.
///
/// # Returns
/// Pointer to the list. Free with `redline_list_free`.
#[no_mangle]
pub extern "C" fn redline_list_new() -> *mut TrackedChangeList {
    Box::into_raw(Box::new(TrackedChangeList::new()))
}

/// Load a tracked change list from a JSON array of raw tracked changes.
///
/// # Returns
/// Pointer to the list, or null on failure.
///
/// # Safety
/// - `json` must be a valid null-terminated C string or null
/// - Caller must free the returned pointer with `redline_list_free`
#[no_mangle]
pub unsafe extern "C" fn redline_list_from_json(json: *const c_char) -> *mut TrackedChangeList {
    let json_str = match from_c_string(json) {
        Some(s) => s,
        None => return ptr::null_mut(),
    };

    match TrackedChangeList::from_json(&json_str) {
        Ok(list) => Box::into_raw(Box::new(list)),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a list.
///
/// # Safety
/// - `list` must be a valid pointer from `redline_list_new` or `redline_list_from_json`
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn redline_list_free(list: *mut TrackedChangeList) {
    if !list.is_null() {
        drop(Box::from_raw(list));
    }
}

// ============================================================================
// List Operations
// ============================================================================

/// Add a tracked change to the list, consolidating with its neighbours.
///
/// # Returns
/// JSON string: `{"ok": null}` or `{"error": "message"}`
///
/// # Safety
/// - `list` must be a valid list pointer or null
/// - `change_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `redline_string_free`
#[no_mangle]
pub unsafe extern "C" fn redline_list_add(
    list: *mut TrackedChangeList,
    change_json: *const c_char,
) -> *mut c_char {
    let list = match list.as_mut() {
        Some(l) => l,
        None => return err_string("null list pointer"),
    };

    let change_str = match from_c_string(change_json) {
        Some(s) => s,
        None => return err_string("invalid tracked change JSON"),
    };

    let change = match TrackedChange::from_json(&change_str) {
        Ok(c) => c,
        Err(e) => return err_string(e.to_string()),
    };

    match list.add(change) {
        Ok(()) => to_c_string(FfiResult::ok(()).to_json()),
        Err(e) => err_string(e.to_string()),
    }
}

/// Remove every tracked change lying entirely within a range.
///
/// # Arguments
/// - `range_json`: JSON string of a raw range `{"pos": .., "length": ..}`
///
/// # Returns
/// JSON string: `{"ok": [TrackedChange, ...]}` with the removed changes, or
/// `{"error": "message"}`
///
/// # Safety
/// - `list` must be a valid list pointer or null
/// - `range_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `redline_string_free`
#[no_mangle]
pub unsafe extern "C" fn redline_list_remove_in_range(
    list: *mut TrackedChangeList,
    range_json: *const c_char,
) -> *mut c_char {
    let list = match list.as_mut() {
        Some(l) => l,
        None => return err_string("null list pointer"),
    };

    let range_str = match from_c_string(range_json) {
        Some(s) => s,
        None => return err_string("invalid range JSON"),
    };

    let range: Range = match serde_json::from_str(&range_str) {
        Ok(r) => r,
        Err(e) => return err_string(format!("parse error: {}", e)),
    };

    let removed = list.remove_in_range(&range);
    to_c_string(FfiResult::ok(removed).to_json())
}

/// Serialize the list.
///
/// # Returns
/// JSON string: `{"ok": [TrackedChange, ...]}` or `{"error": "message"}`
///
/// # Safety
/// - `list` must be a valid list pointer or null
/// - Caller must free the returned string with `redline_string_free`
#[no_mangle]
pub unsafe extern "C" fn redline_list_to_json(list: *const TrackedChangeList) -> *mut c_char {
    match list.as_ref() {
        Some(l) => to_c_string(FfiResult::ok(l).to_json()),
        None => err_string("null list pointer"),
    }
}

/// Number of tracked changes in the list, or -1 for a null pointer.
///
/// # Safety
/// - `list` must be a valid list pointer or null
#[no_mangle]
pub unsafe extern "C" fn redline_list_len(list: *const TrackedChangeList) -> i64 {
    match list.as_ref() {
        Some(l) => l.len() as i64,
        None => -1,
    }
}

/// Get the engine version.
///
/// # Returns
/// Static string pointer (do not free)
#[no_mangle]
pub extern "C" fn redline_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
