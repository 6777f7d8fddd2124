use crate::{DirectoryLister, EntryType, ListerHandle, PortableError};
use std::path::{Path, PathBuf};

/**
 The entries of one directory, grouped by kind.

 Paths are the listed directory joined with each entry name. Symbolic links always appear in
 `symlinks`; they additionally appear in `directories` or `files` depending on how
 [`list_directory`] was asked to treat them.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResults {
    pub directories: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
    pub symlinks: Vec<PathBuf>,
}

impl ListResults {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// Uses a stat call to resolve what `readdir`/`FindNextFileW` could not tell, without following links
#[inline]
fn resolve_unknown(path: &Path) -> Option<EntryType> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) => Some(EntryType::from_std(metadata.file_type())),
        Err(e) => {
            // Vanished between the read and the stat
            log::debug!("skipping {}: {e}", path.display());
            None
        }
    }
}

/**
 Lists `dir` into [`ListResults`], skipping the `.` and `..` entries.

 Entries the native lister reports as `Unknown` (filesystems without `d_type`, Windows reparse
 points) are classified with an extra `symlink_metadata` call. Links are recorded in
 `symlinks`; when `follow_links` is set they are also classified by their target, a link to a
 directory going to `directories` and anything else (including a dangling link) to `files`.
 Without `follow_links` every link is also recorded in `files`. Entries that disappear while
 being classified are skipped.

 # Errors
 Returns the portable error recorded on the handle when the directory can't be opened or
 reading it fails. A clean end of stream is not an error.

 # Examples
 ```
 use dirlister::list_directory;

 let dir = std::env::temp_dir().join("dirlister_doc_list");
 let _ = std::fs::remove_dir_all(&dir);
 std::fs::create_dir_all(dir.join("sub")).unwrap();
 std::fs::write(dir.join("a.txt"), "a").unwrap();

 let results = list_directory(&dir, false).unwrap();
 assert_eq!(results.directories, vec![dir.join("sub")]);
 assert_eq!(results.files, vec![dir.join("a.txt")]);
 let _ = std::fs::remove_dir_all(&dir);
 ```
*/
pub fn list_directory<P: AsRef<Path>>(
    dir: P,
    follow_links: bool,
) -> Result<ListResults, PortableError> {
    let dir = dir.as_ref();
    let mut results = ListResults::default();
    let mut handle = ListerHandle::open(dir);

    while handle.advance() {
        let Some(entry) = handle.current() else {
            continue;
        };
        if entry.is_dot_or_dot_dot() {
            continue;
        }
        let path = dir.join(entry.name());

        let entry_type = match entry.entry_type() {
            EntryType::Unknown => match resolve_unknown(&path) {
                Some(resolved) => resolved,
                None => continue,
            },
            known => known,
        };

        match entry_type {
            EntryType::Directory => results.directories.push(path),
            EntryType::SymbolicLink => {
                let target_is_dir =
                    follow_links && std::fs::metadata(&path).is_ok_and(|m| m.is_dir());
                if target_is_dir {
                    results.directories.push(path.clone());
                } else {
                    results.files.push(path.clone());
                }
                results.symlinks.push(path);
            }
            EntryType::File | EntryType::Unknown => results.files.push(path),
        }
    }

    let outcome = handle.last_error();
    handle.close();
    outcome.into_result().map(|()| results)
}
