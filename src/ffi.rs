//! Symbols exported to the host process.
//!
//! Every entry point returns `0` on success and `1` on failure. Nothing
//! else crosses the boundary; the reason for a failure only goes to the log.

use core::ffi::{c_char, c_int};
use std::{ffi::CStr, panic::AssertUnwindSafe};

use anyhow::bail;

use crate::{
    utils::{path_from_bytes, DynResult},
    writer::{write_definition, Status},
};

/// `GoInt` on 64-bit targets.
pub type GoInt = i64;

/// Layout of cgo's `GoString`, which is what the host builds with ctypes
/// when binding `Unmarshal`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct GoString {
    pub p: *const c_char,
    pub n: isize,
}

impl GoString {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            p: bytes.as_ptr() as *const c_char,
            n: bytes.len() as isize,
        }
    }

    pub const fn null() -> Self {
        Self {
            p: core::ptr::null(),
            n: 0,
        }
    }

    /// Fails on a negative length, or a null pointer with a non-zero length.
    unsafe fn as_bytes<'a>(&self) -> DynResult<&'a [u8]> {
        if self.n < 0 {
            bail!("negative string length {}", self.n);
        }
        if self.n == 0 {
            return Ok(&[]);
        }
        if self.p.is_null() {
            bail!("null string pointer with length {}", self.n);
        }
        Ok(core::slice::from_raw_parts(
            self.p as *const u8,
            self.n as usize,
        ))
    }
}

fn write_bytes(definition: Option<&[u8]>, name: Option<&[u8]>) -> DynResult<()> {
    let definition = definition.unwrap_or_default();
    let Some(name) = name else {
        bail!("no destination path given");
    };
    let path = path_from_bytes(name)?;
    write_definition(definition, path)
}

fn guarded(f: impl FnOnce() -> DynResult<()>) -> Status {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.into(),
        Err(_) => {
            tracing::error!("definition write panicked");
            Status::Failed
        }
    }
}

/// Writes the NUL-terminated `definition_raw` to the file named by `name`.
///
/// A null `definition_raw` is written as an empty file. A null `name` fails.
///
/// # Safety
///
/// Non-null arguments must point to valid NUL-terminated strings that stay
/// alive for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn definition_write(
    definition_raw: *const c_char,
    name: *const c_char,
) -> c_int {
    let definition = if definition_raw.is_null() {
        None
    } else {
        Some(CStr::from_ptr(definition_raw).to_bytes())
    };
    let name = if name.is_null() {
        None
    } else {
        Some(CStr::from_ptr(name).to_bytes())
    };
    guarded(|| write_bytes(definition, name)).code()
}

/// cgo-compatible entry point taking length-delimited strings.
///
/// # Safety
///
/// Each `GoString` must describe `n` readable bytes at `p`, or have a
/// length of zero.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn Unmarshal(definition_raw: GoString, name: GoString) -> GoInt {
    let definition = definition_raw.as_bytes();
    let name = name.as_bytes();
    guarded(|| write_bytes(Some(definition?), Some(name?))).code() as GoInt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_length_is_rejected() {
        let s = GoString {
            p: b"abc".as_ptr() as *const c_char,
            n: -1,
        };
        assert!(unsafe { s.as_bytes() }.is_err());
    }

    #[test]
    fn null_with_zero_length_is_empty() {
        assert!(unsafe { GoString::null().as_bytes() }.unwrap().is_empty());
    }

    #[test]
    fn null_with_length_is_rejected() {
        let s = GoString {
            p: core::ptr::null(),
            n: 4,
        };
        assert!(unsafe { s.as_bytes() }.is_err());
    }

    #[test]
    fn non_utf8_definition_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.def");
        let name = path.to_str().unwrap().as_bytes();
        write_bytes(Some(&[0xff, 0xfe][..]), Some(name)).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), [0xffu8, 0xfe]);
    }

    #[test]
    fn panics_become_failure() {
        assert_eq!(guarded(|| panic!("boom")), Status::Failed);
    }
}
