#![allow(clippy::indexing_slicing, reason = "trivially in bounds")]
use compile_time_ls_colours::file_type_colour;
use dirlister::{EntryType, ListedEntry};
use std::io::{BufWriter, IsTerminal as _, Write, stdout};

const NEWLINE: &[u8] = b"\n";
const NEWLINE_SLASH: &[u8] = b"/\n";
const NEWLINE_RESET: &[u8] = b"\x1b[0m\n";
const NEWLINE_SLASH_RESET: &[u8] = b"/\x1b[0m\n";

const NULL_TERMINATED_SLASH: &[u8] = b"/\0";
const NULL_TERMINATED: &[u8] = b"\0";
// Indexed by `is_dir`, the second slot appends a slash
const NEWLINES_RESET: [&[u8]; 2] = [NEWLINE_RESET, NEWLINE_SLASH_RESET];
const NEWLINES_PLAIN: [&[u8]; 2] = [NEWLINE, NEWLINE_SLASH];
const NULL_TERMINATED_PLAIN: [&[u8]; 2] = [NULL_TERMINATED, NULL_TERMINATED_SLASH];

const RESET: &[u8] = b"\x1b[0m";

/// Writes listed entries to stdout, one name per line
pub struct Printer<I>
where
    I: Iterator<Item = ListedEntry>,
{
    nocolour: bool,
    sort: bool,
    null_terminated: bool,
    entries: I,
}

impl<I> Printer<I>
where
    I: Iterator<Item = ListedEntry>,
{
    #[inline]
    pub const fn new(entries: I) -> Self {
        Self {
            nocolour: false,
            sort: false,
            null_terminated: false,
            entries,
        }
    }

    #[must_use]
    /// Print with no colour if enabled (always disabled with "`NO_COLOUR`" or "`NO_COLOR`" environment variables)
    pub const fn nocolour(mut self, nocolour: bool) -> Self {
        self.nocolour = nocolour;
        self
    }

    #[must_use]
    /// Sort entries by name
    pub const fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    /// Terminate names with NUL instead of a newline (useful for xargs)
    pub const fn null_terminated(mut self, null_terminated: bool) -> Self {
        self.null_terminated = null_terminated;
        self
    }

    /// Print the entries
    pub fn print(self) -> std::io::Result<()> {
        let std_out = stdout();
        let is_terminal = std_out.is_terminal();
        let use_colour = use_colour(is_terminal, self.nocolour, self.null_terminated);

        let mut writer = if is_terminal {
            BufWriter::new(std_out)
        } else {
            BufWriter::with_capacity(16 * 4096, std_out)
        };

        if self.sort {
            let mut collected: Vec<ListedEntry> = self.entries.collect();
            collected.sort_unstable();
            write_iter(&mut writer, collected, use_colour, self.null_terminated)?;
        } else {
            write_iter(&mut writer, self.entries, use_colour, self.null_terminated)?;
        }

        writer.flush()
    }
}

/// Colour only goes to a terminal, and never with NUL terminators (the escapes end in newlines)
fn use_colour(is_terminal: bool, nocolour: bool, null_terminated: bool) -> bool {
    is_terminal && !null_terminated && !colour_disabled(nocolour)
}

fn colour_disabled(nocolour: bool) -> bool {
    nocolour
        || std::env::var("NO_COLOUR").is_ok_and(|x| x.eq_ignore_ascii_case("TRUE"))
        || std::env::var("NO_COLOR").is_ok_and(|x| x.eq_ignore_ascii_case("TRUE"))
}

#[inline]
fn write_iter<W, J>(
    writer: &mut W,
    entries: J,
    use_colour: bool,
    null_terminated: bool,
) -> std::io::Result<()>
where
    W: Write,
    J: IntoIterator<Item = ListedEntry>,
{
    if use_colour {
        write_coloured(writer, entries)
    } else {
        write_nocolour(writer, entries, null_terminated)
    }
}

/// The bytes after the last `.`, a leading dot (hidden files) is not an extension
#[inline]
fn extension(name: &[u8]) -> Option<&[u8]> {
    let pos = name.iter().rposition(|&b| b == b'.')?;
    (pos != 0 && pos + 1 < name.len()).then(|| &name[pos + 1..])
}

#[inline]
fn entry_colour(entry: &ListedEntry) -> &[u8] {
    match entry.entry_type {
        EntryType::File | EntryType::Unknown => extension(entry.name.as_encoded_bytes())
            .map_or(RESET, |ext| file_type_colour!(ext)),
        EntryType::Directory => file_type_colour!(directory),
        EntryType::SymbolicLink => file_type_colour!(symlink),
    }
}

#[inline]
fn write_nocolour<W, I>(writer: &mut W, entries: I, null_terminated: bool) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = ListedEntry>,
{
    let terminators = if null_terminated {
        NULL_TERMINATED_PLAIN
    } else {
        NEWLINES_PLAIN
    };
    for entry in entries {
        writer.write_all(entry.name.as_encoded_bytes())?;
        writer.write_all(terminators[usize::from(entry.entry_type.is_dir())])?;
    }
    Ok(())
}

#[inline]
fn write_coloured<W, I>(writer: &mut W, entries: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = ListedEntry>,
{
    for entry in entries {
        writer.write_all(entry_colour(&entry))?;
        writer.write_all(entry.name.as_encoded_bytes())?;
        writer.write_all(NEWLINES_RESET[usize::from(entry.entry_type.is_dir())])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, entry_type: EntryType) -> ListedEntry {
        ListedEntry {
            name: name.into(),
            entry_type,
        }
    }

    #[test]
    fn extension_ignores_leading_and_trailing_dots() {
        assert_eq!(extension(b"main.rs"), Some(&b"rs"[..]));
        assert_eq!(extension(b"archive.tar.gz"), Some(&b"gz"[..]));
        assert_eq!(extension(b".bashrc"), None);
        assert_eq!(extension(b"trailing."), None);
        assert_eq!(extension(b"Makefile"), None);
    }

    #[test]
    fn plain_output_marks_directories() {
        let mut out = Vec::new();
        write_nocolour(
            &mut out,
            [
                entry("src", EntryType::Directory),
                entry("lib.rs", EntryType::File),
            ],
            false,
        )
        .unwrap();
        assert_eq!(out, b"src/\nlib.rs\n");
    }

    #[test]
    fn null_terminated_output() {
        let mut out = Vec::new();
        write_nocolour(
            &mut out,
            [
                entry("a", EntryType::File),
                entry("b", EntryType::Directory),
            ],
            true,
        )
        .unwrap();
        assert_eq!(out, b"a\0b/\0");
    }

    #[test]
    fn null_terminated_output_is_never_coloured() {
        assert!(!use_colour(true, false, true));
        assert!(!use_colour(true, true, false));
        assert!(!use_colour(false, false, false));
    }

    #[test]
    fn coloured_output_resets_after_each_name() {
        let mut out = Vec::new();
        write_coloured(&mut out, [entry("link", EntryType::SymbolicLink)]).unwrap();
        assert!(out.ends_with(b"link\x1b[0m\n"));
        assert!(out.starts_with(file_type_colour!(symlink)));
    }
}
