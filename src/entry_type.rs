#![allow(clippy::inline_always)]
use core::fmt;

/// `FILE_ATTRIBUTE_DIRECTORY`
pub const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
/// `FILE_ATTRIBUTE_REPARSE_POINT`
pub const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;

// `d_type` values, identical on every platform whose `struct dirent` carries the field
#[cfg(unix)]
const DT_DIR: u8 = 4;
#[cfg(unix)]
const DT_REG: u8 = 8;
#[cfg(unix)]
const DT_LNK: u8 = 10;

#[cfg(has_d_type)]
const_assert!(
    DT_DIR == libc::DT_DIR
        && DT_REG == libc::DT_REG
        && DT_LNK == libc::DT_LNK,
    "d_type constants are out of sync with libc"
);

#[cfg(windows)]
const_assert!(
    FILE_ATTRIBUTE_DIRECTORY == windows_sys::Win32::Storage::FileSystem::FILE_ATTRIBUTE_DIRECTORY
        && FILE_ATTRIBUTE_REPARSE_POINT
            == windows_sys::Win32::Storage::FileSystem::FILE_ATTRIBUTE_REPARSE_POINT,
    "file attribute constants are out of sync with windows-sys"
);

/**
The coarse type of a directory entry, as reported by the enumeration itself.

No extra filesystem call is ever made to produce it, which makes the two backends report
links differently:

- POSIX reports `DT_LNK` as [`EntryType::SymbolicLink`]. Many filesystems leave `d_type` unset,
  in which case the entry is [`EntryType::Unknown`] and a caller needing certainty must stat it.
- Windows reports every reparse point (symlinks, junctions, mount points...) as
  [`EntryType::Unknown`], since the real type needs a second resolution step. Windows never
  produces [`EntryType::SymbolicLink`].
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryType {
    File,
    Directory,
    SymbolicLink,
    Unknown,
}

impl EntryType {
    #[must_use]
    #[inline(always)]
    /// Converts a `d_type` value to an `EntryType`
    ///
    /// Devices, fifos and sockets have no portable category and map to `Unknown`.
    #[cfg(unix)]
    pub const fn from_dtype(d_type: u8) -> Self {
        match d_type {
            DT_DIR => Self::Directory,
            DT_REG => Self::File,
            DT_LNK => Self::SymbolicLink,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    #[inline(always)]
    /// Converts a `dwFileAttributes` mask to an `EntryType`
    ///
    /// The reparse point check comes first, a directory symlink carries both bits.
    pub const fn from_attributes(attributes: u32) -> Self {
        if attributes & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
            Self::Unknown
        } else if attributes & FILE_ATTRIBUTE_DIRECTORY != 0 {
            Self::Directory
        } else {
            Self::File
        }
    }

    /// Classifies `std` metadata obtained without following links
    #[must_use]
    #[inline]
    pub fn from_std(file_type: std::fs::FileType) -> Self {
        match file_type {
            ft if ft.is_symlink() => Self::SymbolicLink,
            ft if ft.is_dir() => Self::Directory,
            ft if ft.is_file() => Self::File,
            _ => Self::Unknown,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File)
    }

    #[inline]
    #[must_use]
    pub const fn is_symlink(self) -> bool {
        matches!(self, Self::SymbolicLink)
    }

    #[inline]
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
            Self::SymbolicLink => write!(f, "Symlink"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
