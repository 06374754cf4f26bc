// gotools-core/src/path.rs

//! Working-directory checks and the Windows path translation used when a
//! command has to change directory through a `cd` prefix.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DRIVE_PREFIX: Regex = Regex::new(r"^[A-Za-z]:").unwrap();
    // `\s\Projects\x`, the form POSIX-flavoured tooling uses for drive `s:`.
    static ref DRIVE_RELATIVE: Regex = Regex::new(r"^\\([A-Za-z])(?:\\(.*))?$").unwrap();
}

/// The shell conventions a command line is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// `cmd /C`, backslash paths, working directory set through `cd /d`.
    Windows,
    /// `sh -c`, working directory passed natively to the spawn.
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Returns `true` when `path` may be used as an execution root.
///
/// Purely syntactic: a drive-letter prefix (`C:`) or a leading `/` or `\`.
/// The filesystem is never consulted, so `..` segments and symlinks are
/// accepted as written.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || DRIVE_PREFIX.is_match(path)
}

/// Translates a working directory into the form `cmd.exe` expects in a
/// `cd /d` prefix.
///
/// Forward slashes become backslashes, then a drive-relative path such as
/// `\s\Projects\x` is rewritten to `s:\Projects\x`.
pub fn to_windows_dir(path: &str) -> String {
    let translated = path.replace('/', "\\");
    match DRIVE_RELATIVE.captures(&translated) {
        Some(caps) => {
            let drive = &caps[1];
            let rest = caps.get(2).map_or("", |m| m.as_str());
            format!("{}:\\{}", drive, rest)
        }
        None => translated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_absolute_accepts_rooted_paths() {
        for path in ["/abs/project", "\\server\\share", "C:\\work", "c:/work", "z:", "/"] {
            assert!(is_absolute(path), "{} should be accepted", path);
        }
    }

    #[test]
    fn test_is_absolute_rejects_relative_paths() {
        for path in ["", "project", "./project", "../up", "1:\\nope", "~/go/src", " /leading-space"] {
            assert!(!is_absolute(path), "{:?} should be rejected", path);
        }
    }

    #[test]
    fn test_drive_relative_rewrite() {
        assert_eq!(to_windows_dir("\\s\\Projects\\x"), "s:\\Projects\\x");
        assert_eq!(to_windows_dir("/s/Projects/x"), "s:\\Projects\\x");
        assert_eq!(to_windows_dir("/c"), "c:\\");
    }

    #[test]
    fn test_windows_dir_leaves_other_paths_alone() {
        assert_eq!(to_windows_dir("C:/work/app"), "C:\\work\\app");
        assert_eq!(to_windows_dir("D:\\go\\src"), "D:\\go\\src");
        // Multi-letter first segments are ordinary directories.
        assert_eq!(to_windows_dir("/home/dev"), "\\home\\dev");
    }
}
