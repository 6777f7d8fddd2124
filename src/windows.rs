/*!
The Windows backend, built on `FindFirstFileExW`/`FindNextFileW`/`FindClose`.

The native API has no "open, then fetch" mode: starting a search already returns the first
entry. The lister keeps that entry pending and hands it out on the first `advance`, so callers
see the same open → advance → ... → `false` sequence as on POSIX.
*/
// UNSAFETY: FFI calls to the Win32 file search API.
use crate::lister::{DirectoryLister, cursor_acquired, cursor_released};
use crate::translate::windows::{
    ERROR_FILE_NOT_FOUND, ERROR_INVALID_NAME, ERROR_NO_MORE_FILES, ERROR_PATH_NOT_FOUND,
    ERROR_SUCCESS, translate,
};
use crate::{EntryType, NativeCode, PortableError};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::os::windows::ffi::{OsStrExt as _, OsStringExt as _};
use std::path::Path;
use std::ptr::null;
use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE;
use windows_sys::Win32::Storage::FileSystem::FIND_FIRST_EX_LARGE_FETCH;
use windows_sys::Win32::Storage::FileSystem::FindClose;
use windows_sys::Win32::Storage::FileSystem::FindExInfoBasic;
use windows_sys::Win32::Storage::FileSystem::FindExSearchNameMatch;
use windows_sys::Win32::Storage::FileSystem::FindFirstFileExW;
use windows_sys::Win32::Storage::FileSystem::FindNextFileW;
use windows_sys::Win32::Storage::FileSystem::WIN32_FIND_DATAW;
use windows_sys::Win32::System::Diagnostics::Debug::FORMAT_MESSAGE_FROM_SYSTEM;
use windows_sys::Win32::System::Diagnostics::Debug::FORMAT_MESSAGE_IGNORE_INSERTS;
use windows_sys::Win32::System::Diagnostics::Debug::FormatMessageW;

#[allow(clippy::cast_possible_wrap, reason = "DWORD stored bit-for-bit")]
const fn native(code: u32) -> NativeCode {
    code as NativeCode
}

/// `GetLastError()` as a [`NativeCode`]
#[inline]
fn last_error_code() -> NativeCode {
    // SAFETY: always safe
    native(unsafe { GetLastError() })
}

/**
 Builds the NUL terminated `<dir>\*` search pattern for `path`.

 The API reads up to the first NUL, so a path containing one would silently list a prefix
 of it; that is refused with `ERROR_INVALID_NAME`. An empty path names nothing (it would
 otherwise become `\*`, the root of the current drive) and is refused with
 `ERROR_PATH_NOT_FOUND`.
*/
fn search_pattern(path: &Path) -> Result<Vec<u16>, u32> {
    let mut wide: Vec<u16> = path.as_os_str().encode_wide().collect();
    if wide.is_empty() {
        return Err(ERROR_PATH_NOT_FOUND);
    }
    if wide.contains(&0) {
        return Err(ERROR_INVALID_NAME);
    }
    if !matches!(wide.last(), Some(&sep) if sep == u16::from(b'\\') || sep == u16::from(b'/')) {
        wide.push(u16::from(b'\\'));
    }
    wide.push(u16::from(b'*'));
    wide.push(0);
    Ok(wide)
}

/**
 Windows directory cursor.

 Owns the search handle and the `WIN32_FIND_DATAW` record the API writes each entry into.
 `first_pending` is set when the search started successfully and the first entry it returned
 has not been handed out yet.

 Like every handle it is tied to the thread that opened it (it is neither `Send` nor `Sync`).
*/
pub struct WindowsLister {
    /// `INVALID_HANDLE_VALUE` when the search failed to start or after release
    handle: HANDLE,
    data: WIN32_FIND_DATAW,
    first_pending: bool,
    /// Whether `data` holds the current entry
    has_current: bool,
    err: NativeCode,
}

impl core::fmt::Debug for WindowsLister {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowsLister")
            .field("open", &self.is_open())
            .field("first_pending", &self.first_pending)
            .field("has_current", &self.has_current)
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}

impl WindowsLister {
    #[inline]
    fn release(&mut self) {
        self.has_current = false;
        self.first_pending = false;
        if self.handle != INVALID_HANDLE_VALUE {
            // SAFETY: the handle came from FindFirstFileExW and is closed exactly once, here
            let ok = unsafe { FindClose(self.handle) };
            self.handle = INVALID_HANDLE_VALUE;
            cursor_released();
            if ok == 0 {
                log::warn!("FindClose failed: {}", format_message(last_error_code()));
            }
        }
    }

    /// The name of the current entry as UTF-16, without the NUL terminator.
    #[inline]
    #[must_use]
    pub fn current_name_wide(&self) -> Option<&[u16]> {
        if !self.has_current {
            return None;
        }
        let name = &self.data.cFileName;
        let len = name.iter().position(|&c| c == 0).unwrap_or(name.len());
        Some(&name[..len])
    }
}

impl DirectoryLister for WindowsLister {
    fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        // SAFETY: WIN32_FIND_DATAW is plain data, all zeroes is a valid value
        let mut data: WIN32_FIND_DATAW = unsafe { core::mem::zeroed() };
        let pattern = match search_pattern(path) {
            Ok(pattern) => pattern,
            Err(code) => {
                log::debug!("refusing to open {}: invalid path", path.display());
                return Self {
                    handle: INVALID_HANDLE_VALUE,
                    data,
                    first_pending: false,
                    has_current: false,
                    err: native(code),
                };
            }
        };

        // SAFETY: the pattern is NUL terminated and `data` is valid for writes
        let handle = unsafe {
            FindFirstFileExW(
                pattern.as_ptr(),
                FindExInfoBasic,
                (&raw mut data).cast(),
                FindExSearchNameMatch,
                null(),
                FIND_FIRST_EX_LARGE_FETCH,
            )
        };

        if handle == INVALID_HANDLE_VALUE {
            let mut err = last_error_code();
            // The directory exists but nothing matched the wildcard, an empty listing
            if err == native(ERROR_FILE_NOT_FOUND) {
                err = native(ERROR_NO_MORE_FILES);
            } else {
                log::debug!(
                    "FindFirstFileExW({}) failed: {}",
                    path.display(),
                    format_message(err)
                );
            }
            return Self {
                handle,
                data,
                first_pending: false,
                has_current: false,
                err,
            };
        }

        cursor_acquired();
        Self {
            handle,
            data,
            first_pending: true,
            has_current: false,
            err: native(ERROR_SUCCESS),
        }
    }

    fn advance(&mut self) -> bool {
        if self.first_pending {
            self.first_pending = false;
            self.has_current = true;
            return true;
        }
        self.has_current = false;
        if self.handle == INVALID_HANDLE_VALUE || self.err != native(ERROR_SUCCESS) {
            return false;
        }

        // SAFETY: the handle is a live search handle and `data` is valid for writes
        let ok = unsafe { FindNextFileW(self.handle, &raw mut self.data) };
        if ok == 0 {
            self.err = last_error_code();
            if self.err != native(ERROR_NO_MORE_FILES) {
                log::debug!("FindNextFileW failed: {}", format_message(self.err));
            }
            return false;
        }
        self.has_current = true;
        true
    }

    #[inline]
    fn current_name(&self) -> Option<Cow<'_, OsStr>> {
        self.current_name_wide()
            .map(|wide| Cow::Owned(OsString::from_wide(wide)))
    }

    #[inline]
    fn current_type(&self) -> Option<EntryType> {
        self.has_current
            .then(|| EntryType::from_attributes(self.data.dwFileAttributes))
    }

    #[inline]
    fn raw_error(&self) -> NativeCode {
        self.err
    }

    #[inline]
    fn last_error(&self) -> PortableError {
        translate(self.err)
    }

    #[inline]
    fn is_open(&self) -> bool {
        self.handle != INVALID_HANDLE_VALUE
    }
}

impl Drop for WindowsLister {
    /// Closes the search handle; a search that never started holds nothing.
    #[inline]
    fn drop(&mut self) {
        self.release();
    }
}

/// `FormatMessageW` from the system table, trimmed of its trailing line break.
pub(crate) fn format_message(code: NativeCode) -> String {
    let mut buf = [0_u16; 512];
    #[allow(clippy::cast_sign_loss, reason = "DWORD stored bit-for-bit")]
    let message_id = code as u32;
    // SAFETY: the buffer is valid for writes of its whole length, no inserts are used
    let len = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            null(),
            message_id,
            0,
            buf.as_mut_ptr(),
            buf.len() as u32,
            null(),
        )
    };
    if len == 0 {
        return format!("Unknown error {code}");
    }
    let message = String::from_utf16_lossy(&buf[..len as usize]);
    message.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain([0]).collect()
    }

    #[test]
    fn pattern_appends_the_wildcard_once() {
        assert_eq!(search_pattern(Path::new(r"C:\dir")), Ok(wide(r"C:\dir\*")));
        assert_eq!(search_pattern(Path::new(r"C:\dir\")), Ok(wide(r"C:\dir\*")));
        assert_eq!(search_pattern(Path::new("C:/dir/")), Ok(wide("C:/dir/*")));
    }

    #[test]
    fn empty_and_nul_paths_are_refused() {
        assert_eq!(search_pattern(Path::new("")), Err(ERROR_PATH_NOT_FOUND));
        let with_nul = PathBuf::from(OsString::from_wide(&[u16::from(b'a'), 0, u16::from(b'b')]));
        assert_eq!(search_pattern(&with_nul), Err(ERROR_INVALID_NAME));
    }
}
