use crate::{EntryType, NativeCode, PortableError};
use std::borrow::Cow;
use std::cell::Cell;
use std::ffi::{OsStr, OsString};
use std::path::Path;

thread_local! {
    static LIVE_CURSORS: Cell<usize> = const { Cell::new(0) };
}

/**
Returns the number of native directory cursors currently held by handles of this thread.

Handles cannot leave the thread that opened them, so the count is exact for the calling
thread. Every successful native open increments it and every release decrements it; a
balanced count after closing or dropping all handles means nothing leaked.
*/
#[must_use]
pub fn live_cursors() -> usize {
    LIVE_CURSORS.with(Cell::get)
}

#[inline]
pub(crate) fn cursor_acquired() {
    LIVE_CURSORS.with(|count| count.set(count.get() + 1));
}

#[inline]
pub(crate) fn cursor_released() {
    LIVE_CURSORS.with(|count| {
        debug_assert!(count.get() > 0, "released a cursor that was never acquired");
        count.set(count.get().saturating_sub(1));
    });
}

/**
 A cursor over the entries of one directory.

 The handle is always obtained through [`open`](Self::open), which never fails: a failed open
 yields a handle whose recorded error is set and whose [`advance`](Self::advance) reports `false`
 without touching the filesystem again. Errors therefore surface in one place, through
 [`last_error`](Self::last_error), whenever `advance` returns `false`:

 ```
 use dirlister::{DirectoryLister, ListerHandle, PortableError};

 let mut handle = ListerHandle::open(std::env::temp_dir());
 let mut count = 0;
 while handle.advance() {
     let _name = handle.current_name();
     count += 1;
 }
 assert_eq!(handle.last_error(), PortableError::EndOfStream);
 handle.close();
 # assert!(count >= 2); // `.` and `..` are reported too
 ```

 Implementations release their native cursor exactly once, on [`close`](Self::close) or on drop,
 whatever state the handle is in. Closing consumes the handle, so it can't be used afterwards.
*/
pub trait DirectoryLister: Sized {
    /// Starts enumerating `path`. The path is handed to the OS as is, without normalisation.
    fn open<P: AsRef<Path>>(path: P) -> Self;

    /**
    Moves to the next entry.

    Returns `true` when a new entry is current. Returns `false` once the directory is exhausted
    or an error occurred; [`last_error`](Self::last_error) tells the two apart.
    */
    fn advance(&mut self) -> bool;

    /// The name of the current entry, or `None` when no entry is current.
    fn current_name(&self) -> Option<Cow<'_, OsStr>>;

    /// The type of the current entry, or `None` when no entry is current.
    ///
    /// Uses only what the last [`advance`](Self::advance) already fetched.
    fn current_type(&self) -> Option<EntryType>;

    /// The native code captured by the most recent operation.
    fn raw_error(&self) -> NativeCode;

    /// The portable form of the state left behind by the most recent operation.
    fn last_error(&self) -> PortableError;

    /// Whether this handle holds a native cursor (ie the open succeeded and it is not released).
    fn is_open(&self) -> bool;

    /// A borrowed view of the current entry, valid until the next `advance` or `close`.
    #[inline]
    fn current(&self) -> Option<DirectoryEntry<'_>> {
        Some(DirectoryEntry {
            name: self.current_name()?,
            entry_type: self.current_type()?,
        })
    }

    /// Releases the native cursor.
    #[inline]
    fn close(self) {
        drop(self);
    }

    /// Turns the handle into an iterator of owned entries.
    #[inline]
    fn into_entries(self) -> Entries<Self> {
        Entries::new(self)
    }
}

/// A transient view of a lister's current entry.
///
/// It borrows the handle, so it cannot outlive the next call to `advance` (the POSIX record it
/// reads from is owned by the directory stream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry<'a> {
    name: Cow<'a, OsStr>,
    entry_type: EntryType,
}

impl<'a> DirectoryEntry<'a> {
    /// The raw OS encoded file name (not a path)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Returns `true` for the `.` and `..` pseudo entries
    #[inline]
    #[must_use]
    pub fn is_dot_or_dot_dot(&self) -> bool {
        is_dot_or_dot_dot(&self.name)
    }

    /// Copies the entry out of the handle
    #[inline]
    #[must_use]
    pub fn to_owned_entry(&self) -> ListedEntry {
        ListedEntry {
            name: self.name.clone().into_owned(),
            entry_type: self.entry_type,
        }
    }

    #[inline]
    #[must_use]
    pub fn into_name(self) -> Cow<'a, OsStr> {
        self.name
    }
}

#[inline]
pub(crate) fn is_dot_or_dot_dot(name: &OsStr) -> bool {
    matches!(name.as_encoded_bytes(), b"." | b"..")
}

/// An owned directory entry, as yielded by [`Entries`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListedEntry {
    pub name: OsString,
    pub entry_type: EntryType,
}

/**
 An iterator adapter over any [`DirectoryLister`].

 Yields `Ok` for every entry, then either stops (end of stream) or yields exactly one `Err`
 with the recorded failure and stops. The iterator is fused. The `.` and `..` entries are
 skipped unless [`with_dot_entries`](Self::with_dot_entries) is set.
*/
#[derive(Debug)]
pub struct Entries<L: DirectoryLister> {
    lister: L,
    dot_entries: bool,
    finished: bool,
}

impl<L: DirectoryLister> Entries<L> {
    #[inline]
    #[must_use]
    pub const fn new(lister: L) -> Self {
        Self {
            lister,
            dot_entries: false,
            finished: false,
        }
    }

    /// Also yield the `.` and `..` pseudo entries where the platform reports them
    #[inline]
    #[must_use]
    pub const fn with_dot_entries(mut self, dot_entries: bool) -> Self {
        self.dot_entries = dot_entries;
        self
    }

    /// The state the underlying handle was left in
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> PortableError {
        self.lister.last_error()
    }

    /// Gives back the underlying handle
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> L {
        self.lister
    }
}

impl<L: DirectoryLister> Iterator for Entries<L> {
    type Item = Result<ListedEntry, PortableError>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        while self.lister.advance() {
            match self.lister.current() {
                Some(entry) if self.dot_entries || !entry.is_dot_or_dot_dot() => {
                    return Some(Ok(entry.to_owned_entry()));
                }
                _ => {}
            }
        }
        self.finished = true;
        self.lister.last_error().into_result().err().map(Err)
    }
}

impl<L: DirectoryLister> core::iter::FusedIterator for Entries<L> {}
