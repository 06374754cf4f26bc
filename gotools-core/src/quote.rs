// gotools-core/src/quote.rs

//! Makes caller-supplied values safe to splice into a shell command line.
//!
//! On Unix the value becomes exactly one `sh` word with nothing left to
//! expand. `cmd.exe` has no quoting that disables `%` expansion or the `^`
//! escape, so on Windows values carrying its metacharacters are refused.

use crate::path::Platform;
use std::borrow::Cow;
use thiserror::Error;

/// Characters `cmd.exe` acts on inside (or by breaking out of) double quotes.
const CMD_METACHARACTERS: &[char] = &['&', '|', '<', '>', '^', '%', '"', '\r', '\n', '\0'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Value {value:?} contains a NUL byte and cannot be passed to the shell")]
    Nul { value: String },

    #[error("Value {value:?} contains '{found}', which cmd.exe would interpret")]
    CmdMetacharacter { value: String, found: char },
}

/// Quotes `value` as a single shell word for `platform`.
///
/// Plain values (`./...`, `coverage.out`) come back unchanged.
pub fn quote_arg(value: &str, platform: Platform) -> Result<Cow<'_, str>, QuoteError> {
    match platform {
        Platform::Unix => {
            shlex::try_quote(value).map_err(|_| QuoteError::Nul { value: value.to_string() })
        }
        Platform::Windows => {
            check_cmd_safe(value)?;
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                Ok(Cow::Owned(format!("\"{}\"", value)))
            } else {
                Ok(Cow::Borrowed(value))
            }
        }
    }
}

/// Refuses values `cmd.exe` would expand, escape or split on.
pub fn check_cmd_safe(value: &str) -> Result<(), QuoteError> {
    match value.chars().find(|c| CMD_METACHARACTERS.contains(c)) {
        Some(found) => Err(QuoteError::CmdMetacharacter { value: value.to_string(), found }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix_words(value: &str) -> Vec<String> {
        let line = format!("go vet {}", quote_arg(value, Platform::Unix).unwrap());
        shlex::split(&line).unwrap()
    }

    #[test]
    fn test_plain_values_are_left_alone() {
        for value in ["./...", "./cmd/...", ".", "coverage.out", "ci/lint.yml", "warning"] {
            assert_eq!(quote_arg(value, Platform::Unix).unwrap(), value);
            assert_eq!(quote_arg(value, Platform::Windows).unwrap(), value);
        }
    }

    #[test]
    fn test_unix_values_stay_one_literal_word() {
        let hostile = [
            "./...;touch pwned",
            "./...;echo${IFS}INJECTED>&2",
            "a b $(touch pwned)",
            "`touch pwned`",
            "./... && rm -rf .",
            "it's \"quoted\"",
        ];
        for value in hostile {
            assert_eq!(unix_words(value), vec!["go", "vet", value], "value {:?}", value);
        }
    }

    #[test]
    fn test_unix_rejects_nul() {
        assert!(matches!(quote_arg("a\0b", Platform::Unix), Err(QuoteError::Nul { .. })));
    }

    #[test]
    fn test_windows_quotes_whitespace() {
        assert_eq!(quote_arg("./my pkg/...", Platform::Windows).unwrap(), "\"./my pkg/...\"");
    }

    #[test]
    fn test_windows_rejects_cmd_metacharacters() {
        for value in ["./... & calc", "a|b", "%PATH%", "x\"y", "^", "a>b"] {
            let err = quote_arg(value, Platform::Windows).unwrap_err();
            assert!(matches!(err, QuoteError::CmdMetacharacter { .. }), "value {:?}", value);
        }
        let msg = check_cmd_safe("./... & calc").unwrap_err().to_string();
        assert!(msg.contains("'&'"), "Unexpected message: {}", msg);
    }
}
