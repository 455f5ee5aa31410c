//! C FFI surface for reel.
//!
//! Pattern: opaque SessionHandle + C strings + JSON serialization.
//!
//! A host list screen opens a session with the queue it is showing, feeds
//! taps and reply events in, and polls `reel_snapshot` each frame. Any
//! platform with C FFI (Dart, Swift, Kotlin, Python) can use this.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use reel_core::{Session, UpdateQueue, ViewerCommand, ViewerConfig, ViewerResult};

// ---------------------------------------------------------------------------
// Error handling (thread-local last error)
// ---------------------------------------------------------------------------

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn set_error(msg: String) {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = Some(msg));
}

fn clear_error() {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = None);
}

/// Returns the last error message (caller frees with `reel_string_free`).
#[no_mangle]
pub extern "C" fn reel_last_error() -> *mut c_char {
    LAST_ERROR.with(|cell| {
        cell.borrow_mut()
            .take()
            .and_then(|s| CString::new(s).ok())
            .map(|s| s.into_raw())
            .unwrap_or(ptr::null_mut())
    })
}

/// Frees a string returned from reel FFI.
///
/// # Safety
/// Must be a pointer returned from this FFI and not already freed.
#[no_mangle]
pub unsafe extern "C" fn reel_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}

// ---------------------------------------------------------------------------
// Opaque handle
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct SessionHandle {
    _private: [u8; 0],
}

struct SessionHandleInner {
    session: Session,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Opens a viewing session over `queue_json` starting at `start_index` and
/// starts its heartbeat. `config_json` may be NULL for defaults.
///
/// Returns NULL on a malformed queue or an out-of-range start index; see
/// `reel_last_error`. Unusable config is logged and replaced by defaults.
///
/// # Safety
/// `queue_json` must be a valid null-terminated C string; `config_json`
/// must be one or NULL.
#[no_mangle]
pub unsafe extern "C" fn reel_session_open(
    queue_json: *const c_char,
    start_index: u32,
    config_json: *const c_char,
) -> *mut SessionHandle {
    clear_error();
    let config = read_config(config_json);
    let opened = read_queue(queue_json, &config).and_then(|queue| {
        Session::open(queue, start_index as usize, config).map_err(|e| e.to_string())
    });
    into_handle(opened)
}

/// Like `reel_session_open`, starting at the item whose id is `start_id`.
/// An unknown id fails the same way as an out-of-range index.
///
/// # Safety
/// `queue_json` and `start_id` must be valid null-terminated C strings;
/// `config_json` must be one or NULL.
#[no_mangle]
pub unsafe extern "C" fn reel_session_open_at_id(
    queue_json: *const c_char,
    start_id: *const c_char,
    config_json: *const c_char,
) -> *mut SessionHandle {
    clear_error();
    let config = read_config(config_json);
    let opened = read_cstr(start_id).and_then(|id| {
        read_queue(queue_json, &config)
            .and_then(|queue| Session::open_at_id(queue, &id, config).map_err(|e| e.to_string()))
    });
    into_handle(opened)
}

/// Stops the heartbeat and releases the session.
#[no_mangle]
pub extern "C" fn reel_session_close(handle: *mut SessionHandle) {
    if !handle.is_null() {
        unsafe {
            let inner = Box::from_raw(handle as *mut SessionHandleInner);
            inner.session.shutdown();
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Current snapshot as JSON (caller frees).
#[no_mangle]
pub extern "C" fn reel_snapshot(handle: *mut SessionHandle) -> *mut c_char {
    clear_error();
    match session_ref(handle) {
        Ok(session) => json_to_cstr(&session.snapshot()),
        Err(e) => err_null(e),
    }
}

/// Reply log of item `index` as a JSON array (caller frees), or NULL if the
/// index is out of range.
#[no_mangle]
pub extern "C" fn reel_replies(handle: *mut SessionHandle, index: u32) -> *mut c_char {
    clear_error();
    let session = match session_ref(handle) {
        Ok(s) => s,
        Err(e) => return err_null(e),
    };
    match session.replies(index as usize) {
        Some(replies) => json_to_cstr(&replies),
        None => err_null(format!("no item at index {}", index)),
    }
}

/// First `limit` replies of item `index` plus the hidden count, as
/// `{"shown": [...], "more": N}` (caller frees). NULL if out of range.
#[no_mangle]
pub extern "C" fn reel_replies_preview(
    handle: *mut SessionHandle,
    index: u32,
    limit: u32,
) -> *mut c_char {
    clear_error();
    let session = match session_ref(handle) {
        Ok(s) => s,
        Err(e) => return err_null(e),
    };
    match session.replies_preview(index as usize, limit as usize) {
        Some(preview) => json_to_cstr(&preview),
        None => err_null(format!("no item at index {}", index)),
    }
}

/// Ids shown so far this session, as a JSON array (caller frees).
#[no_mangle]
pub extern "C" fn reel_seen(handle: *mut SessionHandle) -> *mut c_char {
    clear_error();
    match session_ref(handle) {
        Ok(session) => json_to_cstr(&session.seen_ids()),
        Err(e) => err_null(e),
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Send a command. `json` is a ViewerCommand JSON.
/// Returns 1 on success, 0 on error.
#[no_mangle]
pub extern "C" fn reel_command(handle: *mut SessionHandle, json: *const c_char) -> i32 {
    clear_error();
    let session = match session_ref(handle) {
        Ok(s) => s,
        Err(e) => return err_zero(e),
    };
    let json_str = match read_cstr(json) {
        Ok(s) => s,
        Err(e) => return err_zero(e),
    };
    let cmd: ViewerCommand = match serde_json::from_str(&json_str) {
        Ok(v) => v,
        Err(e) => return err_zero(e.to_string()),
    };
    status(session.command(cmd))
}

/// Tap at `x` on a view `width` wide. Returns 1 on success, 0 on error.
#[no_mangle]
pub extern "C" fn reel_tap(handle: *mut SessionHandle, x: f32, width: f32) -> i32 {
    clear_error();
    match session_ref(handle) {
        Ok(session) => status(session.on_tap(x, width)),
        Err(e) => err_zero(e),
    }
}

/// Long press down (`pressed != 0`) or released (`pressed == 0`).
#[no_mangle]
pub extern "C" fn reel_long_press(handle: *mut SessionHandle, pressed: i32) -> i32 {
    clear_error();
    match session_ref(handle) {
        Ok(session) if pressed != 0 => status(session.on_long_press_start()),
        Ok(session) => status(session.on_long_press_end()),
        Err(e) => err_zero(e),
    }
}

#[no_mangle]
pub extern "C" fn reel_reply_open(handle: *mut SessionHandle) -> i32 {
    clear_error();
    match session_ref(handle) {
        Ok(session) => status(session.on_reply_open()),
        Err(e) => err_zero(e),
    }
}

/// Submit a reply. Blank text closes the draft without replying and still
/// counts as success. Returns 1 on success, 0 on error.
#[no_mangle]
pub extern "C" fn reel_reply_submit(handle: *mut SessionHandle, text: *const c_char) -> i32 {
    clear_error();
    let session = match session_ref(handle) {
        Ok(s) => s,
        Err(e) => return err_zero(e),
    };
    let text_str = match read_cstr(text) {
        Ok(s) => s,
        Err(e) => return err_zero(e),
    };
    status(session.on_reply_submit(&text_str))
}

#[no_mangle]
pub extern "C" fn reel_reply_cancel(handle: *mut SessionHandle) -> i32 {
    clear_error();
    match session_ref(handle) {
        Ok(session) => status(session.on_reply_cancel()),
        Err(e) => err_zero(e),
    }
}

/// Close the viewer (the handle stays valid until `reel_session_close`).
#[no_mangle]
pub extern "C" fn reel_request_close(handle: *mut SessionHandle) -> i32 {
    clear_error();
    match session_ref(handle) {
        Ok(session) => status(session.on_request_close()),
        Err(e) => err_zero(e),
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Returns the FFI API version.
#[no_mangle]
pub extern "C" fn reel_version() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_config(ptr: *const c_char) -> ViewerConfig {
    if ptr.is_null() {
        return ViewerConfig::default();
    }
    let parsed = read_cstr(ptr)
        .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).map_err(|e| e.to_string()));
    match parsed {
        Ok(v) => ViewerConfig::from_value(&v),
        Err(e) => {
            log::warn!("reel: unreadable viewer config ({}), using defaults", e);
            ViewerConfig::default()
        }
    }
}

fn read_queue(ptr: *const c_char, config: &ViewerConfig) -> Result<UpdateQueue, String> {
    let json = read_cstr(ptr)?;
    UpdateQueue::from_json(&json, config).map_err(|e| e.to_string())
}

fn into_handle(opened: Result<Session, String>) -> *mut SessionHandle {
    match opened {
        Ok(session) => {
            session.start();
            Box::into_raw(Box::new(SessionHandleInner { session })) as *mut SessionHandle
        }
        Err(e) => err_null_handle(e),
    }
}

fn session_ref<'a>(handle: *mut SessionHandle) -> Result<&'a Session, String> {
    if handle.is_null() {
        return Err("null session handle".into());
    }
    let inner = unsafe { &*(handle as *mut SessionHandleInner) };
    Ok(&inner.session)
}

fn read_cstr(ptr: *const c_char) -> Result<String, String> {
    if ptr.is_null() {
        return Err("null string pointer".into());
    }
    unsafe {
        CStr::from_ptr(ptr)
            .to_str()
            .map(String::from)
            .map_err(|_| "invalid utf-8".into())
    }
}

fn status<T>(result: ViewerResult<T>) -> i32 {
    match result {
        Ok(_) => 1,
        Err(e) => err_zero(e.to_string()),
    }
}

fn json_to_cstr<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => to_cstr(json),
        Err(e) => err_null(e.to_string()),
    }
}

fn to_cstr(s: String) -> *mut c_char {
    CString::new(s)
        .map(|c| c.into_raw())
        .unwrap_or(ptr::null_mut())
}

fn err_null(msg: String) -> *mut c_char {
    set_error(msg);
    ptr::null_mut()
}

fn err_null_handle(msg: String) -> *mut SessionHandle {
    log::warn!("reel: session open failed: {}", msg);
    set_error(msg);
    ptr::null_mut()
}

fn err_zero(msg: String) -> i32 {
    set_error(msg);
    0
}

// ---------------------------------------------------------------------------
// FFI Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    const QUEUE: &str = r#"[
        {"id": "me", "author": "My Status"},
        {"id": "alice", "author": "Alice", "kind": "video", "duration": "0:15",
         "replies": [{"text": "Looking good!", "submitted_at_ms": 1}]},
        {"id": "bob", "author": "Bob's Business", "business": true}
    ]"#;

    /// Open a session via FFI. Slow heartbeat so tests see stable state.
    fn ffi_session(start: u32) -> *mut SessionHandle {
        let queue = c(QUEUE);
        let config = c(r#"{"tick_interval_ms": 50}"#);
        let handle = unsafe { reel_session_open(queue.as_ptr(), start, config.as_ptr()) };
        assert!(!handle.is_null(), "reel_session_open returned null");
        handle
    }

    /// Read a *mut c_char into a String and free it.
    fn read_ffi_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null(), "FFI returned null string");
        let s = unsafe { CStr::from_ptr(ptr).to_str().unwrap().to_string() };
        unsafe { reel_string_free(ptr) };
        s
    }

    fn snapshot(handle: *mut SessionHandle) -> serde_json::Value {
        serde_json::from_str(&read_ffi_string(reel_snapshot(handle))).unwrap()
    }

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    #[test]
    fn ffi_version() {
        assert_eq!(reel_version(), 1);
    }

    #[test]
    fn ffi_open_close_lifecycle() {
        let handle = ffi_session(1);
        let snap = snapshot(handle);
        assert_eq!(snap["current_index"], 1);
        assert_eq!(snap["current_id"], "alice");
        assert_eq!(snap["duration_ms"], 15_000);
        assert_eq!(snap["state"], "playing");
        reel_session_close(handle);
    }

    #[test]
    fn ffi_invalid_start_index_returns_null() {
        let queue = c(QUEUE);
        let handle = unsafe { reel_session_open(queue.as_ptr(), 3, ptr::null()) };
        assert!(handle.is_null());
        let msg = read_ffi_string(reel_last_error());
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn ffi_malformed_queue_returns_null() {
        let queue = c("not json");
        let handle = unsafe { reel_session_open(queue.as_ptr(), 0, ptr::null()) };
        assert!(handle.is_null());
        assert!(!reel_last_error().is_null());
    }

    #[test]
    fn ffi_unparseable_config_uses_defaults() {
        let queue = c(QUEUE);
        let config = c("{not json");
        let handle = unsafe { reel_session_open(queue.as_ptr(), 0, config.as_ptr()) };
        assert!(!handle.is_null());
        assert_eq!(snapshot(handle)["duration_ms"], 15_000);
        reel_session_close(handle);
    }

    #[test]
    fn ffi_open_at_id() {
        let queue = c(QUEUE);
        let id = c("bob");
        let handle = unsafe { reel_session_open_at_id(queue.as_ptr(), id.as_ptr(), ptr::null()) };
        assert!(!handle.is_null());
        assert_eq!(snapshot(handle)["current_index"], 2);
        reel_session_close(handle);

        let missing = c("carol");
        let handle =
            unsafe { reel_session_open_at_id(queue.as_ptr(), missing.as_ptr(), ptr::null()) };
        assert!(handle.is_null());
        let msg = read_ffi_string(reel_last_error());
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn ffi_null_handle_returns_error() {
        let ptr = reel_snapshot(ptr::null_mut());
        assert!(ptr.is_null());
        let msg = read_ffi_string(reel_last_error());
        assert!(msg.contains("null"));
        assert_eq!(reel_tap(ptr::null_mut(), 1.0, 3.0), 0);
    }

    // -------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------

    #[test]
    fn ffi_tap_zones() {
        let handle = ffi_session(1);

        assert_eq!(reel_tap(handle, 150.0, 300.0), 1);
        assert_eq!(snapshot(handle)["paused"], true);

        assert_eq!(reel_tap(handle, 250.0, 300.0), 1);
        assert_eq!(snapshot(handle)["current_index"], 2);

        assert_eq!(reel_tap(handle, 50.0, 300.0), 1);
        assert_eq!(reel_tap(handle, 50.0, 300.0), 1);
        assert_eq!(snapshot(handle)["current_index"], 0);

        // rewind past the first item closes
        assert_eq!(reel_tap(handle, 50.0, 300.0), 1);
        assert_eq!(snapshot(handle)["closed"], true);

        // explicit input after close is an error
        assert_eq!(reel_tap(handle, 50.0, 300.0), 0);
        let msg = read_ffi_string(reel_last_error());
        assert!(msg.contains("closed"));

        reel_session_close(handle);
    }

    #[test]
    fn ffi_long_press() {
        let handle = ffi_session(0);
        assert_eq!(reel_long_press(handle, 1), 1);
        assert_eq!(snapshot(handle)["state"], "paused");
        assert_eq!(reel_long_press(handle, 0), 1);
        assert_eq!(snapshot(handle)["state"], "playing");
        reel_session_close(handle);
    }

    #[test]
    fn ffi_reply_round_trip() {
        let handle = ffi_session(1);
        assert_eq!(reel_reply_open(handle), 1);
        assert_eq!(snapshot(handle)["composing"], true);

        let text = c("Where is this?");
        assert_eq!(reel_reply_submit(handle, text.as_ptr()), 1);
        let snap = snapshot(handle);
        assert_eq!(snap["composing"], false);
        assert_eq!(snap["reply_count"], 2);

        let replies: Vec<serde_json::Value> =
            serde_json::from_str(&read_ffi_string(reel_replies(handle, 1))).unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1]["text"], "Where is this?");

        assert!(reel_replies(handle, 9).is_null());

        let preview: serde_json::Value =
            serde_json::from_str(&read_ffi_string(reel_replies_preview(handle, 1, 1))).unwrap();
        assert_eq!(preview["shown"].as_array().unwrap().len(), 1);
        assert_eq!(preview["shown"][0]["text"], "Looking good!");
        assert_eq!(preview["more"], 1);
        assert!(reel_replies_preview(handle, 9, 2).is_null());

        reel_session_close(handle);
    }

    #[test]
    fn ffi_reply_cancel_keeps_log() {
        let handle = ffi_session(0);
        assert_eq!(reel_reply_open(handle), 1);
        assert_eq!(reel_reply_cancel(handle), 1);
        let snap = snapshot(handle);
        assert_eq!(snap["reply_count"], 0);
        assert_eq!(snap["state"], "playing");
        reel_session_close(handle);
    }

    #[test]
    fn ffi_command_json() {
        let handle = ffi_session(0);
        let cmd = c(r#"{"action":"next"}"#);
        assert_eq!(reel_command(handle, cmd.as_ptr()), 1);
        assert_eq!(snapshot(handle)["current_index"], 1);

        let bad = c(r#"{"action":"warp"}"#);
        assert_eq!(reel_command(handle, bad.as_ptr()), 0);

        let seen: Vec<String> = serde_json::from_str(&read_ffi_string(reel_seen(handle))).unwrap();
        assert_eq!(seen, vec!["me", "alice"]);

        assert_eq!(reel_request_close(handle), 1);
        assert_eq!(snapshot(handle)["closed"], true);
        reel_session_close(handle);
    }

    // -------------------------------------------------------------------
    // String free safety
    // -------------------------------------------------------------------

    #[test]
    fn ffi_string_free_null_safe() {
        unsafe { reel_string_free(ptr::null_mut()) };
    }
}
