/*!
The POSIX backend, built on `opendir`/`readdir`/`closedir`.

`readdir` reports both exhaustion and failure with a null pointer, only `errno` tells them
apart, so `errno` is cleared right before the call and read right after it, then captured on
the handle. Nothing else runs on the thread in between.
*/
use crate::lister::{DirectoryLister, cursor_acquired, cursor_released};
use crate::translate::posix::translate;
use crate::{EntryType, NativeCode, PortableError};
use core::ptr::NonNull;
use libc::{DIR, EINVAL, c_char, c_int, dirent};
use std::borrow::Cow;
use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt as _;
use std::path::Path;

const_assert!(
    size_of::<NativeCode>() == size_of::<c_int>(),
    "errno must fit a NativeCode"
);

#[cfg(not(any(
    target_os = "linux",
    target_os = "emscripten",
    target_os = "hurd",
    target_os = "dragonfly",
    target_os = "android",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "illumos",
    target_os = "solaris"
)))]
compile_error!(
    "no errno accessor for this unix target (supported: linux, android, macos, ios, freebsd, \
     dragonfly, openbsd, netbsd, illumos, solaris, emscripten, hurd)"
);

/// Returns a pointer to the calling thread's `errno`.
#[inline]
fn errno_location() -> *mut c_int {
    // SAFETY: these functions have no preconditions and return a valid thread local pointer
    unsafe {
        #[cfg(any(
            target_os = "linux",
            target_os = "emscripten",
            target_os = "hurd",
            target_os = "dragonfly"
        ))]
        {
            libc::__errno_location()
        }
        #[cfg(any(target_os = "android", target_os = "openbsd", target_os = "netbsd"))]
        {
            libc::__errno()
        }
        #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
        {
            libc::__error()
        }
        #[cfg(any(target_os = "illumos", target_os = "solaris"))]
        {
            libc::___errno()
        }
    }
}

#[inline]
fn clear_errno() {
    // SAFETY: the pointer is valid for the current thread
    unsafe { *errno_location() = 0 };
}

#[inline]
fn read_errno() -> NativeCode {
    // SAFETY: the pointer is valid for the current thread
    unsafe { *errno_location() }
}

/**
 POSIX directory cursor.

 Holds the `DIR` stream returned by `opendir` and the record of the last successful `readdir`.
 That record is owned by the stream and is only valid until the next `readdir` or `closedir`,
 which is why entries are only ever handed out as borrows of the handle.

 Like every handle it is tied to the thread that opened it (it is neither `Send` nor `Sync`).
*/
#[derive(Debug)]
pub struct PosixLister {
    /// `None` when `opendir` failed or after release
    dir: Option<NonNull<DIR>>,
    /// The last record returned by `readdir`, `None` when no entry is current
    current: Option<NonNull<dirent>>,
    /// `errno` captured by the last failing call, 0 otherwise
    err: NativeCode,
    /// Set once `readdir` returned null, whether cleanly or not
    exhausted: bool,
}

impl PosixLister {
    #[inline]
    fn release(&mut self) {
        self.current = None;
        if let Some(dir) = self.dir.take() {
            // SAFETY: the stream came from opendir and is closed exactly once, here
            let res = unsafe { libc::closedir(dir.as_ptr()) };
            cursor_released();
            if res != 0 {
                log::warn!("closedir failed: {}", std::io::Error::last_os_error());
            }
        }
    }

    /// Borrow the last record returned by `readdir`
    #[inline]
    fn record(&self) -> Option<*const dirent> {
        self.current.map(|ptr| ptr.as_ptr().cast_const())
    }

    /// The name of the current entry as raw bytes, without the NUL terminator.
    #[inline]
    #[must_use]
    pub fn current_name_bytes(&self) -> Option<&[u8]> {
        let drnt = self.record()?;
        // SAFETY: `current` is only set to a record from the open stream and cleared before
        // the next readdir/closedir; the returned slice borrows `self`, which outlives neither
        let name = unsafe { access_dirent!(drnt, d_name) };
        Some(name.to_bytes())
    }
}

impl DirectoryLister for PosixLister {
    fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let mut lister = Self {
            dir: None,
            current: None,
            err: 0,
            exhausted: false,
        };

        // A path with an interior NUL can never name a file
        let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
            lister.err = EINVAL;
            log::debug!("refusing to open {}: interior NUL byte", path.display());
            return lister;
        };

        let ptr: *const c_char = c_path.as_ptr();
        // SAFETY: the pointer is null terminated and lives until the end of the call
        let dir = unsafe { libc::opendir(ptr) };
        match NonNull::new(dir) {
            Some(dir) => {
                cursor_acquired();
                lister.dir = Some(dir);
            }
            None => {
                lister.err = read_errno();
                log::debug!(
                    "opendir({}) failed: {}",
                    path.display(),
                    crate::error_message(lister.err)
                );
            }
        }
        lister
    }

    fn advance(&mut self) -> bool {
        self.current = None;
        if self.exhausted || self.err != 0 {
            return false;
        }
        let Some(dir) = self.dir else {
            return false;
        };

        clear_errno();
        // SAFETY: `dir` is a live stream owned by this handle
        let drnt = unsafe { libc::readdir(dir.as_ptr()) };
        // Read before anything else can clobber it
        let errno = read_errno();

        match NonNull::new(drnt) {
            Some(drnt) => {
                self.current = Some(drnt);
                true
            }
            None => {
                self.exhausted = true;
                self.err = errno;
                if errno != 0 {
                    log::debug!("readdir failed: {}", crate::error_message(errno));
                }
                false
            }
        }
    }

    #[inline]
    fn current_name(&self) -> Option<Cow<'_, OsStr>> {
        self.current_name_bytes()
            .map(|bytes| Cow::Borrowed(OsStr::from_bytes(bytes)))
    }

    #[inline]
    fn current_type(&self) -> Option<EntryType> {
        let drnt = self.record()?;
        // SAFETY: as in `current_name_bytes`
        let d_type = unsafe { access_dirent!(drnt, d_type) };
        Some(EntryType::from_dtype(d_type))
    }

    #[inline]
    fn raw_error(&self) -> NativeCode {
        self.err
    }

    #[inline]
    fn last_error(&self) -> PortableError {
        if self.err == 0 && self.exhausted {
            PortableError::EndOfStream
        } else {
            translate(self.err)
        }
    }

    #[inline]
    fn is_open(&self) -> bool {
        self.dir.is_some()
    }
}

impl Drop for PosixLister {
    /**
    Closes the directory stream to prevent resource leaks.

    File descriptors are limited system resources, a failed open holds none.
    */
    #[inline]
    fn drop(&mut self) {
        self.release();
    }
}

/// `strerror_r` into a stack buffer, falling back to a generic message for unknown codes.
pub(crate) fn strerror(code: NativeCode) -> String {
    let mut buf = [0 as c_char; 256];
    // SAFETY: the buffer is valid for writes of its whole length
    let res = unsafe { libc::strerror_r(code, buf.as_mut_ptr(), buf.len()) };
    if res != 0 {
        return format!("Unknown error {code}");
    }
    // SAFETY: on success strerror_r leaves a NUL terminated string in the buffer
    let msg = unsafe { core::ffi::CStr::from_ptr(buf.as_ptr()) };
    let msg = msg.to_string_lossy();
    if msg.is_empty() {
        format!("Unknown error {code}")
    } else {
        msg.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_is_cleared_and_read_back() {
        // SAFETY: the pointer is valid for the current thread
        unsafe { *errno_location() = libc::ENOENT };
        assert_eq!(read_errno(), libc::ENOENT);
        clear_errno();
        assert_eq!(read_errno(), 0);
    }

    #[test]
    fn errno_is_per_thread() {
        // SAFETY: the pointer is valid for the current thread
        unsafe { *errno_location() = libc::EACCES };
        let other = std::thread::spawn(|| {
            clear_errno();
            read_errno()
        })
        .join()
        .unwrap();
        assert_eq!(other, 0);
        assert_eq!(read_errno(), libc::EACCES);
        clear_errno();
    }
}
