//! C ABI for the depver extractor
//!
//! Build with `cargo build -p depver-ffi --release` to get a shared library
//! (`libdepver_ffi.so`, `libdepver_ffi.dylib` or `depver_ffi.dll`) that a host
//! process can load directly.
//!
//! # Ownership
//!
//! Every buffer returned by [`extract_dependencies`] is allocated here and
//! owned by the caller, who must hand it back to [`release_buffer`] exactly
//! once. Releasing a buffer twice, or releasing a pointer that did not come
//! from this library, is undefined behaviour; nothing here tracks
//! outstanding buffers.
//!
//! An empty string means extraction failed. A manifest without any data
//! still yields a JSON object with empty fields.

use std::ffi::{CStr, CString, c_char};

/// Extracts the dependency record of a go.mod file as a NUL-terminated JSON
/// string, or an empty string when the input is null, not UTF-8, empty or
/// malformed.
///
/// The returned pointer is never null.
///
/// # Safety
///
/// `manifest` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extract_dependencies(manifest: *const c_char) -> *mut c_char {
    let text = if manifest.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(manifest) }.to_str().ok()
    };

    let output = text.map(depver::extract_dependencies).unwrap_or_default();
    into_buffer(output)
}

/// Frees a buffer returned by [`extract_dependencies`]. Null is ignored.
///
/// # Safety
///
/// `buffer` must be null or a pointer returned by [`extract_dependencies`]
/// that has not been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn release_buffer(buffer: *mut c_char) {
    if buffer.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(buffer) });
}

/// [`extract_dependencies`] under the symbol name existing ctypes loaders bind.
///
/// # Safety
///
/// Same contract as [`extract_dependencies`].
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn getDepVer(manifest: *const c_char) -> *mut c_char {
    unsafe { extract_dependencies(manifest) }
}

/// [`release_buffer`] under the symbol name existing ctypes loaders bind.
///
/// # Safety
///
/// Same contract as [`release_buffer`].
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn freeCByte(buffer: *mut c_char) {
    unsafe { release_buffer(buffer) }
}

fn into_buffer(output: String) -> *mut c_char {
    // Records are JSON, which never contains a raw NUL
    CString::new(output).unwrap_or_default().into_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(input: &CStr) -> String {
        unsafe {
            let buffer = extract_dependencies(input.as_ptr());
            assert!(!buffer.is_null());
            let output = CStr::from_ptr(buffer).to_str().unwrap().to_string();
            release_buffer(buffer);
            output
        }
    }

    #[test]
    fn test_round_trip_through_c_strings() {
        let output = call(c"module example.com/foo\nrequire a.com/x v1.0.0\n");
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["ModPath"], "example.com/foo");
        assert_eq!(value["DepVer"], serde_json::json!(["a.com/x;v1.0.0"]));
    }

    #[test]
    fn test_failures_return_empty_buffer() {
        assert_eq!(call(c""), "");
        assert_eq!(call(c"not a valid manifest {{{"), "");
    }

    #[test]
    fn test_null_input() {
        unsafe {
            let buffer = extract_dependencies(std::ptr::null());
            assert!(!buffer.is_null());
            assert_eq!(CStr::from_ptr(buffer).to_bytes(), b"");
            release_buffer(buffer);
        }
    }

    #[test]
    fn test_invalid_utf8_input() {
        let input = CString::new(vec![b'm', 0xff, 0xfe]).unwrap();
        assert_eq!(call(&input), "");
    }

    #[test]
    fn test_release_null_is_noop() {
        unsafe { release_buffer(std::ptr::null_mut()) };
    }

    #[test]
    fn test_legacy_symbols() {
        let input = c"module example.com/legacy\ngo 1.20\n";
        unsafe {
            let buffer = getDepVer(input.as_ptr());
            let output = CStr::from_ptr(buffer).to_str().unwrap().to_string();
            freeCByte(buffer);
            assert!(output.contains(r#""MinGoVer":"1.20""#));
        }
    }

    #[test]
    fn test_concurrent_calls() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    let text = CString::new(format!("module example.com/m{i}\n")).unwrap();
                    call(&text)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let output = handle.join().unwrap();
            assert!(output.contains(&format!("example.com/m{i}")));
        }
    }
}
