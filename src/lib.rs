/*!
A portable directory cursor.

`dirlister` enumerates the entries of a single directory (name plus a coarse [`EntryType`])
over the native API of the platform it was built for, `opendir`/`readdir` on POSIX and
`FindFirstFileExW`/`FindNextFileW` on Windows, and reports failures through a small portable
taxonomy ([`PortableError`]) instead of platform error codes.

The central piece is the [`DirectoryLister`] contract, implemented by [`ListerHandle`]:

```
use dirlister::{DirectoryLister, EntryType, ListerHandle, PortableError};

let dir = std::env::temp_dir().join("dirlister_lib_doc");
let _ = std::fs::remove_dir_all(&dir);
std::fs::create_dir_all(dir.join("sub")).unwrap();

let mut handle = ListerHandle::open(&dir);
let mut seen = Vec::new();
while handle.advance() {
    if let Some(entry) = handle.current() {
        if !entry.is_dot_or_dot_dot() {
            seen.push((entry.name().to_owned(), entry.entry_type()));
        }
    }
}
// `false` alone means "exhausted or failed", the recorded error tells which
assert_eq!(handle.last_error(), PortableError::EndOfStream);
handle.close();

assert_eq!(seen, vec![("sub".into(), EntryType::Directory)]);
let _ = std::fs::remove_dir_all(&dir);
```

Opening never fails: a handle for a missing directory simply reports
[`PortableError::NoSuchEntry`] once advanced. Handles release their native cursor on
[`close`](DirectoryLister::close) or when dropped, and stay on the thread that opened them.

Higher level helpers are built on the same handle: [`Entries`] (an iterator of owned
entries) and [`list_directory`] (entries grouped into directories, files and links).
*/
#![allow(clippy::pub_use)]
#![allow(clippy::missing_inline_in_public_items)]
#![allow(clippy::pattern_type_mismatch)]
#![allow(clippy::exhaustive_enums)]
#![allow(clippy::exhaustive_structs)]

#[cfg(not(any(unix, windows)))]
compile_error!("dirlister supports POSIX and Windows targets only");

#[macro_use]
mod macros;

mod entry_type;
mod error;
mod list;
mod lister;
pub mod translate;

#[cfg(unix)]
mod posix;
#[cfg(windows)]
mod windows;


pub use entry_type::EntryType;
pub use error::{NativeCode, PortableError};
pub use list::{ListResults, list_directory};
pub use lister::{DirectoryEntry, DirectoryLister, Entries, ListedEntry, live_cursors};
pub use translate::error_message;

#[cfg(unix)]
pub use posix::PosixLister;
#[cfg(windows)]
pub use windows::WindowsLister;

/// The directory cursor of the platform this crate was built for.
#[cfg(unix)]
pub type ListerHandle = PosixLister;
/// The directory cursor of the platform this crate was built for.
#[cfg(windows)]
pub type ListerHandle = WindowsLister;
