/*!
Native error code translation.

Each backend records the raw code its platform left behind; this module turns those codes
into [`PortableError`] and into human readable messages. The tables are pure functions with no
state. Codes without a dedicated portable case are preserved verbatim in
[`PortableError::Other`] so callers can still report the exact condition.
*/
use crate::{NativeCode, PortableError};

/// Translation table for `errno` values.
#[cfg(unix)]
pub mod posix {
    use crate::{NativeCode, PortableError};
    use libc::{EACCES, ENOENT, ENOTDIR, EPERM};

    /**
    Maps an `errno` value to the portable taxonomy.

    POSIX has no "no more entries" errno (`readdir` returns null and leaves `errno` alone), so
    this table never produces `EndOfStream`; the POSIX backend tracks exhaustion itself.
    */
    #[inline]
    #[must_use]
    pub const fn translate(code: NativeCode) -> PortableError {
        match code {
            0 => PortableError::Success,
            EACCES | EPERM => PortableError::NoAccess,
            ENOENT => PortableError::NoSuchEntry,
            ENOTDIR => PortableError::NotADirectory,
            other => PortableError::Other(other),
        }
    }
}

/// Translation table for Win32 error codes.
///
/// The table is plain data so it compiles (and is tested) on every target; on Windows the
/// constants are checked against `windows-sys` at compile time.
pub mod windows {
    use crate::{NativeCode, PortableError};

    pub const ERROR_SUCCESS: u32 = 0;
    pub const ERROR_FILE_NOT_FOUND: u32 = 2;
    pub const ERROR_PATH_NOT_FOUND: u32 = 3;
    pub const ERROR_ACCESS_DENIED: u32 = 5;
    pub const ERROR_NO_MORE_FILES: u32 = 18;
    pub const ERROR_INVALID_NAME: u32 = 123;
    pub const ERROR_DIRECTORY: u32 = 267;

    #[cfg(windows)]
    const_assert!(
        ERROR_SUCCESS == windows_sys::Win32::Foundation::ERROR_SUCCESS
            && ERROR_FILE_NOT_FOUND == windows_sys::Win32::Foundation::ERROR_FILE_NOT_FOUND
            && ERROR_PATH_NOT_FOUND == windows_sys::Win32::Foundation::ERROR_PATH_NOT_FOUND
            && ERROR_ACCESS_DENIED == windows_sys::Win32::Foundation::ERROR_ACCESS_DENIED
            && ERROR_NO_MORE_FILES == windows_sys::Win32::Foundation::ERROR_NO_MORE_FILES
            && ERROR_INVALID_NAME == windows_sys::Win32::Foundation::ERROR_INVALID_NAME
            && ERROR_DIRECTORY == windows_sys::Win32::Foundation::ERROR_DIRECTORY,
        "win32 error code table is out of sync with windows-sys"
    );

    /// Maps a `GetLastError()` value (stored bit-for-bit as a [`NativeCode`]) to the portable taxonomy.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss, reason = "DWORD round trip")]
    pub const fn translate(code: NativeCode) -> PortableError {
        match code as u32 {
            ERROR_SUCCESS => PortableError::Success,
            ERROR_NO_MORE_FILES => PortableError::EndOfStream,
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => PortableError::NoSuchEntry,
            ERROR_ACCESS_DENIED => PortableError::NoAccess,
            ERROR_DIRECTORY => PortableError::NotADirectory,
            _ => PortableError::Other(code),
        }
    }
}

/// Translates a native code with the table of the platform this crate was built for.
#[inline]
#[must_use]
pub const fn translate(code: NativeCode) -> PortableError {
    #[cfg(unix)]
    {
        posix::translate(code)
    }
    #[cfg(windows)]
    {
        windows::translate(code)
    }
}

/**
Returns the system's human readable message for a native code.

This is a pure function of `code`, independent of any handle: `strerror_r` on POSIX,
`FormatMessageW` on Windows. Codes the system has no message for still produce a
descriptive string.
*/
#[must_use]
pub fn error_message(code: NativeCode) -> String {
    #[cfg(unix)]
    {
        crate::posix::strerror(code)
    }
    #[cfg(windows)]
    {
        crate::windows::format_message(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_table_maps_every_known_code() {
        use super::windows::*;
        let table = [
            (ERROR_SUCCESS, PortableError::Success),
            (ERROR_NO_MORE_FILES, PortableError::EndOfStream),
            (ERROR_FILE_NOT_FOUND, PortableError::NoSuchEntry),
            (ERROR_PATH_NOT_FOUND, PortableError::NoSuchEntry),
            (ERROR_ACCESS_DENIED, PortableError::NoAccess),
            (ERROR_DIRECTORY, PortableError::NotADirectory),
        ];
        for (code, expected) in table {
            assert_eq!(translate_windows(code), expected, "code {code}");
        }
    }

    #[allow(clippy::cast_possible_wrap, reason = "DWORD round trip")]
    fn translate_windows(code: u32) -> PortableError {
        super::windows::translate(code as NativeCode)
    }

    #[test]
    fn windows_unknown_codes_are_preserved() {
        // ERROR_SHARING_VIOLATION
        assert_eq!(translate_windows(32), PortableError::Other(32));
        // high-bit HRESULT style values survive the DWORD round trip
        let hresult = 0x8007_0005_u32;
        let translated = translate_windows(hresult);
        #[allow(clippy::cast_sign_loss, reason = "DWORD round trip")]
        let raw = translated.raw_code().map(|c| c as u32);
        assert_eq!(raw, Some(hresult));
    }

    #[cfg(unix)]
    #[test]
    fn posix_table() {
        assert_eq!(posix::translate(0), PortableError::Success);
        assert_eq!(posix::translate(libc::EACCES), PortableError::NoAccess);
        assert_eq!(posix::translate(libc::EPERM), PortableError::NoAccess);
        assert_eq!(posix::translate(libc::ENOENT), PortableError::NoSuchEntry);
        assert_eq!(posix::translate(libc::ENOTDIR), PortableError::NotADirectory);
        assert_eq!(posix::translate(libc::EIO), PortableError::Other(libc::EIO));
        assert_eq!(
            posix::translate(libc::EMFILE).raw_code(),
            Some(libc::EMFILE)
        );
    }

    #[cfg(unix)]
    #[test]
    fn native_table_is_the_posix_one() {
        assert_eq!(translate(libc::ENOENT), posix::translate(libc::ENOENT));
    }

    #[test]
    fn messages_are_never_empty() {
        assert!(!error_message(2).is_empty());
        // Not a code any platform defines
        assert!(!error_message(987_654).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn posix_messages_match_std() {
        let expected = std::io::Error::from_raw_os_error(libc::ENOENT).to_string();
        let message = error_message(libc::ENOENT);
        // std appends " (os error N)" to the same strerror_r text
        assert!(expected.starts_with(&message), "{expected:?} vs {message:?}");
    }
}
