//! Scalar SQL functions registered on every catalog connection.
//!
//! sqlx only exposes collations, so the function goes through the raw
//! handle of each new connection.

use std::ffi::{c_char, c_int, CStr};

use libsqlite3_sys as ffi;
use sqlx::SqliteConnection;

/// `STRIP_PUNCTUATION(text)`: every character that is not a letter, digit,
/// `_` or whitespace becomes a space. NULL stays NULL.
pub const STRIP_PUNCTUATION: &str = "STRIP_PUNCTUATION";
const STRIP_PUNCTUATION_C: &CStr = c"STRIP_PUNCTUATION";

/// Folds punctuation and symbols to spaces, leaving word characters as they
/// are. Matches the catalog's whole-word `FullSearch` matching.
pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

unsafe extern "C" fn strip_punctuation_sqlite(
    ctx: *mut ffi::sqlite3_context,
    argc: c_int,
    argv: *mut *mut ffi::sqlite3_value,
) {
    unsafe {
        if argc != 1 {
            ffi::sqlite3_result_null(ctx);
            return;
        }
        let value = *argv;
        if ffi::sqlite3_value_type(value) == ffi::SQLITE_NULL {
            ffi::sqlite3_result_null(ctx);
            return;
        }
        // text before bytes: the length refers to the UTF-8 conversion
        let text = ffi::sqlite3_value_text(value);
        if text.is_null() {
            ffi::sqlite3_result_null(ctx);
            return;
        }
        let len = ffi::sqlite3_value_bytes(value).max(0) as usize;
        let bytes = std::slice::from_raw_parts(text, len);
        let out = strip_punctuation(&String::from_utf8_lossy(bytes));
        ffi::sqlite3_result_text(
            ctx,
            out.as_ptr().cast::<c_char>(),
            out.len() as c_int,
            ffi::SQLITE_TRANSIENT(),
        );
    }
}

/// Registers the catalog functions on `conn`.
pub async fn register(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let mut handle = conn.lock_handle().await?;
    let db = handle.as_raw_handle().as_ptr();

    let rc = unsafe {
        ffi::sqlite3_create_function_v2(
            db,
            STRIP_PUNCTUATION_C.as_ptr(),
            1,
            ffi::SQLITE_UTF8 | ffi::SQLITE_DETERMINISTIC,
            std::ptr::null_mut(),
            Some(strip_punctuation_sqlite),
            None,
            None,
            None,
        )
    };
    if rc != ffi::SQLITE_OK {
        return Err(sqlx::Error::Protocol(format!(
            "failed to register {} (sqlite code {})",
            STRIP_PUNCTUATION, rc
        )));
    }
    Ok(())
}
