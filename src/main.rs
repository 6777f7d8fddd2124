#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
#![allow(clippy::exit)]
#![allow(clippy::struct_excessive_bools)]

use clap::{ArgAction, CommandFactory, Parser, ValueHint, value_parser};
use clap_complete::aot::{Shell, generate};
use dirlister::{
    DirectoryLister, EntryType, ListedEntry, ListerHandle, PortableError, list_directory,
};
use regex::bytes::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::ffi::OsString;
use std::io::stdout;
use std::process::ExitCode;
mod logger;
mod printer;
use printer::Printer;

//this allocator is more efficient than the system one for lots of small name allocations
#[cfg(all(
    feature = "mimalloc",
    any(target_os = "linux", target_os = "macos", target_os = "android")
))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

const TYPE_CHARS: [&str; 4] = ["f:File", "d:Directory", "l:Symlink", "u:Unknown"];

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
///List the entries of one directory with the native directory cursor.
pub struct Args {
    #[arg(value_name = "PATTERN", help = "Regex to match entry names against", index = 1)]
    pattern: Option<String>,
    #[arg(
        value_name = "PATH",
        help = "Directory to list (defaults to the current directory)",
        value_hint = ValueHint::DirPath,
        index = 2
    )]
    directory: Option<OsString>,
    #[arg(
        short = 'H',
        long = "hidden",
        help = "Shows hidden entries eg .gitignore or .bashrc"
    )]
    hidden: bool,
    #[arg(
        short = 'a',
        long = "all",
        help = "Also show the . and .. entries (implies --hidden)",
        conflicts_with = "follow"
    )]
    all: bool,
    #[arg(
        short = 'i',
        long = "ignore-case",
        help = "Match the pattern case insensitively"
    )]
    ignore_case: bool,
    #[arg(
        short = 'F',
        long = "fixed-strings",
        help = "Treat the pattern as a fixed string, not a regex"
    )]
    fixed_string: bool,
    #[arg(
        short = 't',
        long = "type",
        help = format!("Select types of entries (can use multiple times), available options are {TYPE_CHARS:?}"),
        value_delimiter = ',',
        num_args = 1..,
    )]
    type_of: Option<Vec<String>>,
    #[arg(
        short = 'L',
        long = "follow",
        help = "Classify entries with a stat call, following symlinks (never shows . and ..)"
    )]
    follow: bool,
    #[arg(short = 's', long = "sort", help = "Sort entries by name")]
    sort: bool,
    #[arg(
        short = '0',
        long = "print0",
        help = "Separate results with NUL instead of newlines"
    )]
    null_terminated: bool,
    #[arg(long = "nocolour", alias = "nocolor", help = "Disable colouring")]
    nocolour: bool,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help = "Log more (-v debug, -vv trace)"
    )]
    verbose: u8,
    #[arg(
        long = "generate",
        action = ArgAction::Set,
        value_parser = value_parser!(Shell),
        help = "Generate shell completions"
    )]
    generate: Option<Shell>,
}

/// Returns whether `entry_type` is one of the requested type characters
fn type_selected(types: &[char], entry_type: EntryType) -> bool {
    types.iter().any(|&c| match c {
        'f' => entry_type.is_file(),
        'd' => entry_type.is_dir(),
        'l' => entry_type.is_symlink(),
        'u' => entry_type.is_unknown(),
        _ => false,
    })
}

fn build_pattern(args: &Args) -> Option<Regex> {
    let pattern = args.pattern.as_ref()?;
    let pattern = if args.fixed_string {
        regex::escape(pattern)
    } else {
        pattern.clone()
    };
    match RegexBuilder::new(&pattern)
        .case_insensitive(args.ignore_case)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(e) => {
            eprintln!("Invalid pattern: {e}");
            std::process::exit(2);
        }
    }
}

/// Reads `dir` through the raw cursor, classification is whatever the OS reported
fn read_native(dir: &OsString, show_dots: bool) -> Result<Vec<ListedEntry>, PortableError> {
    ListerHandle::open(dir)
        .into_entries()
        .with_dot_entries(show_dots)
        .collect()
}

/// Reads `dir` through `list_directory`, links resolved with stat calls
fn read_followed(dir: &OsString) -> Result<Vec<ListedEntry>, PortableError> {
    let results = list_directory(dir, true)?;
    let named = |path: &std::path::PathBuf, entry_type| {
        path.file_name().map(|name| ListedEntry {
            name: name.to_owned(),
            entry_type,
        })
    };
    let mut entries: Vec<ListedEntry> = Vec::with_capacity(results.len());
    // Links show up in both groups, report them once as links
    let links: HashSet<&std::path::PathBuf> = results.symlinks.iter().collect();
    for path in &results.symlinks {
        entries.extend(named(path, EntryType::SymbolicLink));
    }
    for path in results.directories.iter().filter(|p| !links.contains(p)) {
        entries.extend(named(path, EntryType::Directory));
    }
    for path in results.files.iter().filter(|p| !links.contains(p)) {
        entries.extend(named(path, EntryType::File));
    }
    Ok(entries)
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbose);

    if let Some(generator) = args.generate {
        let mut cmd = Args::command();
        let cmd_clone = cmd.clone();
        generate(
            generator,
            &mut cmd,
            cmd_clone.get_name().to_owned(),
            &mut stdout(),
        );
        return ExitCode::SUCCESS;
    }

    let directory = args.directory.clone().unwrap_or_else(|| ".".into());
    let pattern = build_pattern(&args);
    let types: Option<Vec<char>> = args
        .type_of
        .as_ref()
        .map(|t| t.iter().flat_map(|s| s.to_lowercase().chars().collect::<Vec<_>>()).collect());
    let show_hidden = args.hidden || args.all;

    log::debug!("listing {}", directory.to_string_lossy());
    let listed = if args.follow {
        read_followed(&directory)
    } else {
        read_native(&directory, args.all)
    };

    let entries = match listed {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("{}: {e}", directory.to_string_lossy());
            return ExitCode::FAILURE;
        }
    };

    let selected = entries.into_iter().filter(|entry| {
        let name = entry.name.as_encoded_bytes();
        (show_hidden || !name.starts_with(b"."))
            && pattern.as_ref().is_none_or(|re| re.is_match(name))
            && types
                .as_deref()
                .is_none_or(|t| type_selected(t, entry.entry_type))
    });

    let printed = Printer::new(selected)
        .sort(args.sort)
        .nocolour(args.nocolour)
        .null_terminated(args.null_terminated)
        .print();

    match printed {
        Ok(()) => ExitCode::SUCCESS,
        // Closing the pipe early (eg `| head`) is not an error
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Failed to write output: {e}");
            ExitCode::FAILURE
        }
    }
}
