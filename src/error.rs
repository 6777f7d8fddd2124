use crate::translate::error_message;
use core::fmt;

/// A raw error code as captured from the platform.
///
/// `errno` on POSIX, `GetLastError()` on Windows (the DWORD is stored bit-for-bit).
pub type NativeCode = i32;

/// The portable error taxonomy shared by every backend.
///
/// A value is always derived from a native code captured on a lister handle, see
/// [`crate::translate`] for the per-platform tables. `Success` and `EndOfStream` are not
/// failures, they are the two "nothing went wrong" states a caller can observe once
/// [`advance`](crate::DirectoryLister::advance) returns `false` (or before it has been called).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortableError {
    /// No error has been recorded
    Success,
    /// The enumeration finished normally
    EndOfStream,
    /// The path (or an entry) does not exist
    NoSuchEntry,
    /// Permission denied
    NoAccess,
    /// The path exists but is not a directory
    NotADirectory,
    /// Any native condition without a dedicated case, carrying the raw code
    Other(NativeCode),
}

impl PortableError {
    /// Returns `true` for a recorded failure, ie anything but `Success` or `EndOfStream`.
    #[inline]
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::Success | Self::EndOfStream)
    }

    /// Returns `true` for the only clean termination of an enumeration.
    #[inline]
    #[must_use]
    pub const fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /// The raw code of an unmapped native condition.
    #[inline]
    #[must_use]
    pub const fn raw_code(&self) -> Option<NativeCode> {
        match *self {
            Self::Other(code) => Some(code),
            _ => None,
        }
    }

    /**
    Converts the state left behind after `advance` returned `false` into a `Result`.

    `Success` and `EndOfStream` become `Ok(())`, everything else is returned as the error.

    # Errors
    Returns `Err(self)` when the value is a failure.
    */
    #[inline]
    pub const fn into_result(self) -> Result<(), Self> {
        if self.is_failure() { Err(self) } else { Ok(()) }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl fmt::Display for PortableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Operation was successful"),
            Self::EndOfStream => write!(f, "No more directory entries"),
            Self::NoSuchEntry => write!(f, "No such file or directory"),
            Self::NoAccess => write!(f, "Permission denied"),
            Self::NotADirectory => write!(f, "Not a directory"),
            Self::Other(code) => write!(f, "OS error {code}: {}", error_message(*code)),
        }
    }
}

impl std::error::Error for PortableError {}
