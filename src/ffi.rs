//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Memory management
//! - Strings returned through `out_*` parameters are allocated on the Rust heap.
//! - Callers **must** free them with `npg_free_string`.
//! - Passing a null pointer to the free function is a no-op.
//!
//! ## Configuration
//! - `config_json` is an optional null-terminated JSON pipeline config
//!   (geometry, policy, letterhead, footer links). Missing fields take their
//!   defaults; `NULL` means the A4 notice defaults.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int`: `0` success, `1` null pointer,
//!   `2` invalid UTF-8, `3` invalid JSON, `4` unusable page geometry,
//!   `5` other pagination failure, `6` output not representable as a C string.
//! - Error details can be retrieved via `npg_last_error`.
//!
//! ## Thread safety
//! - `npg_last_error` uses a thread-local, so it is safe to call from
//!   multiple threads.
//!
//! ## Usage from C
//! ```c
//! char *pages = NULL;
//! if (npg_paginate_json((const uint8_t *)html, strlen(html), NULL, &pages) == 0) {
//!     puts(pages);
//!     npg_free_string(pages);
//! } else {
//!     fprintf(stderr, "%s\n", npg_last_error());
//! }
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::error::PaginationError;
use crate::layout_config::PaginatedDocument;
use crate::pipeline::{generate_print_html, paginate_html_default, PipelineConfig};
use crate::render::render_print_html;

pub const NPG_OK: c_int = 0;
pub const NPG_ERR_NULL: c_int = 1;
pub const NPG_ERR_UTF8: c_int = 2;
pub const NPG_ERR_JSON: c_int = 3;
pub const NPG_ERR_GEOMETRY: c_int = 4;
pub const NPG_ERR_PAGINATION: c_int = 5;
pub const NPG_ERR_OUTPUT: c_int = 6;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

fn fail(code: c_int, msg: &str) -> c_int {
    set_last_error(msg);
    code
}

fn error_code(e: &PaginationError) -> c_int {
    match e {
        e if e.is_configuration() => NPG_ERR_GEOMETRY,
        PaginationError::Json(_) => NPG_ERR_JSON,
        _ => NPG_ERR_PAGINATION,
    }
}

/// Read the HTML input buffer.
///
/// # Safety
/// `html_ptr` must point to `html_len` valid bytes.
unsafe fn html_arg<'a>(html_ptr: *const u8, html_len: u32) -> Result<&'a str, c_int> {
    if html_ptr.is_null() {
        return Err(fail(NPG_ERR_NULL, "Null pointer argument"));
    }
    let bytes = slice::from_raw_parts(html_ptr, html_len as usize);
    std::str::from_utf8(bytes).map_err(|e| fail(NPG_ERR_UTF8, &format!("Invalid UTF-8: {e}")))
}

/// Parse the optional config argument.
///
/// # Safety
/// `config_json`, if non-null, must point to a valid null-terminated string.
unsafe fn config_arg(config_json: *const c_char) -> Result<PipelineConfig, c_int> {
    if config_json.is_null() {
        return Ok(PipelineConfig::default());
    }
    let json = CStr::from_ptr(config_json)
        .to_str()
        .map_err(|e| fail(NPG_ERR_UTF8, &format!("Invalid UTF-8 in config: {e}")))?;
    PipelineConfig::from_json(json).map_err(|e| fail(NPG_ERR_JSON, &format!("Invalid config: {e}")))
}

/// Hand `text` to the caller through `out`.
///
/// # Safety
/// `out` must be a valid pointer.
unsafe fn write_out(text: String, out: *mut *mut c_char) -> c_int {
    match CString::new(text) {
        Ok(cs) => {
            *out = cs.into_raw();
            clear_last_error();
            NPG_OK
        }
        Err(e) => fail(NPG_ERR_OUTPUT, &format!("Output contains a NUL byte: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Paginate an HTML body and return the paginated document as JSON.
///
/// # Parameters
/// - `html_ptr`: pointer to UTF-8 HTML bytes (not necessarily null-terminated)
/// - `html_len`: length of the HTML data in bytes
/// - `config_json`: optional null-terminated JSON config, or `NULL`
/// - `out_json`: on success, receives a null-terminated JSON string
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `npg_last_error`.
///
/// # Safety
/// - `html_ptr` must point to `html_len` valid bytes.
/// - `config_json` must be null or a valid null-terminated string.
/// - `out_json` must be a valid pointer.
/// - The caller must free `*out_json` by calling `npg_free_string`.
#[no_mangle]
pub unsafe extern "C" fn npg_paginate_json(
    html_ptr: *const u8,
    html_len: u32,
    config_json: *const c_char,
    out_json: *mut *mut c_char,
) -> c_int {
    if out_json.is_null() {
        return fail(NPG_ERR_NULL, "Null pointer argument");
    }
    let html = match html_arg(html_ptr, html_len) {
        Ok(h) => h,
        Err(code) => return code,
    };
    let config = match config_arg(config_json) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match paginate_html_default(html, &config).and_then(|doc| doc.to_json()) {
        Ok(json) => write_out(json, out_json),
        Err(e) => fail(error_code(&e), &e.to_string()),
    }
}

/// Paginate an HTML body and return print-ready HTML for all pages.
///
/// # Safety
/// Same as `npg_paginate_json`; `*out_html` must be freed with
/// `npg_free_string`.
#[no_mangle]
pub unsafe extern "C" fn npg_render_print_html(
    html_ptr: *const u8,
    html_len: u32,
    config_json: *const c_char,
    out_html: *mut *mut c_char,
) -> c_int {
    if out_html.is_null() {
        return fail(NPG_ERR_NULL, "Null pointer argument");
    }
    let html = match html_arg(html_ptr, html_len) {
        Ok(h) => h,
        Err(code) => return code,
    };
    let config = match config_arg(config_json) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match generate_print_html(html, &config) {
        Ok((print, _doc)) => write_out(print, out_html),
        Err(e) => fail(error_code(&e), &e.to_string()),
    }
}

/// Render print HTML from a paginated document JSON previously produced by
/// `npg_paginate_json` (possibly edited by the caller).
///
/// The config supplies the letterhead and footer; its geometry is ignored in
/// favour of the document's own.
///
/// # Safety
/// - `doc_json` must be a valid null-terminated string.
/// - `config_json` must be null or a valid null-terminated string.
/// - `out_html` must be a valid pointer; free it with `npg_free_string`.
#[no_mangle]
pub unsafe extern "C" fn npg_render_document(
    doc_json: *const c_char,
    config_json: *const c_char,
    out_html: *mut *mut c_char,
) -> c_int {
    if doc_json.is_null() || out_html.is_null() {
        return fail(NPG_ERR_NULL, "Null pointer argument");
    }
    let json = match CStr::from_ptr(doc_json).to_str() {
        Ok(s) => s,
        Err(e) => return fail(NPG_ERR_UTF8, &format!("Invalid UTF-8: {e}")),
    };
    let doc = match PaginatedDocument::from_json(json) {
        Ok(d) => d,
        Err(e) => return fail(NPG_ERR_JSON, &format!("Invalid document: {e}")),
    };
    let options = match config_arg(config_json) {
        Ok(c) if config_json.is_null() => crate::render::RenderOptions {
            title: None,
            ..c.render_options()
        },
        Ok(c) => c.render_options(),
        Err(code) => return code,
    };
    write_out(render_print_html(&doc, &options), out_html)
}

/// Free a string returned through an `out_*` parameter.
///
/// # Safety
/// `s` must have been returned by one of the `npg_*` functions.
#[no_mangle]
pub unsafe extern "C" fn npg_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `npg_*` call on the same
/// thread. The caller should **not** free this pointer – it is managed
/// internally.
///
/// Returns null if the last call succeeded.
#[no_mangle]
pub extern "C" fn npg_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn npg_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn take_string(p: *mut c_char) -> String {
        let s = unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string();
        unsafe { npg_free_string(p) };
        s
    }

    #[test]
    fn ffi_paginate_json() {
        let html = b"<h1>Hello FFI</h1><p>Body</p>";
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { npg_paginate_json(html.as_ptr(), html.len() as u32, ptr::null(), &mut out) };
        assert_eq!(rc, NPG_OK);
        assert!(npg_last_error().is_null());
        let doc = PaginatedDocument::from_json(&take_string(out)).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].content, "<h1>Hello FFI</h1><p>Body</p>");
    }

    #[test]
    fn ffi_render_print_html_with_config() {
        let html = b"<p>Payment is due.</p>";
        let config = CString::new(
            r#"{"title": "Demand Note", "letterhead": {"reference": "S1234567A", "recipient_name": "Jane Tan"}}"#,
        )
        .unwrap();
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe {
            npg_render_print_html(html.as_ptr(), html.len() as u32, config.as_ptr(), &mut out)
        };
        assert_eq!(rc, NPG_OK);
        let print = take_string(out);
        assert!(print.contains("<title>Demand Note</title>"));
        assert!(print.contains("S1234567A"));
        assert!(print.contains("Page 1 of 1"));
    }

    #[test]
    fn ffi_render_document_round_trip() {
        let html = b"<p>x</p>";
        let mut pages: *mut c_char = ptr::null_mut();
        let rc = unsafe { npg_paginate_json(html.as_ptr(), html.len() as u32, ptr::null(), &mut pages) };
        assert_eq!(rc, NPG_OK);
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { npg_render_document(pages, ptr::null(), &mut out) };
        unsafe { npg_free_string(pages) };
        assert_eq!(rc, NPG_OK);
        assert!(take_string(out).contains("<main class=\"document-body\"><p>x</p></main>"));
    }

    #[test]
    fn ffi_null_input() {
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { npg_paginate_json(ptr::null(), 0, ptr::null(), &mut out) };
        assert_eq!(rc, NPG_ERR_NULL);
        assert!(out.is_null());
        assert!(!npg_last_error().is_null());
    }

    #[test]
    fn ffi_bad_config_json() {
        let html = b"<p>x</p>";
        let config = CString::new("{not json").unwrap();
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { npg_paginate_json(html.as_ptr(), html.len() as u32, config.as_ptr(), &mut out) };
        assert_eq!(rc, NPG_ERR_JSON);
    }

    #[test]
    fn ffi_impossible_geometry() {
        let html = b"<p>x</p>";
        let config = CString::new(r#"{"geometry": {"footer_height": 5000}}"#).unwrap();
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { npg_paginate_json(html.as_ptr(), html.len() as u32, config.as_ptr(), &mut out) };
        assert_eq!(rc, NPG_ERR_GEOMETRY);
        let msg = unsafe { CStr::from_ptr(npg_last_error()) }.to_str().unwrap();
        assert!(msg.contains("first pages"), "{msg}");
    }

    #[test]
    fn ffi_version() {
        let v = npg_version();
        let version = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
