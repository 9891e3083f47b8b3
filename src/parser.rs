//! Line-oriented parser for sectioned config files.
//!
//! ```text
//! # comment
//! ; also a comment
//! [section]
//! key = value
//! key = repeated keys append
//! other: multi-line
//!     continuation lines are joined with a newline
//! ```
//!
//! Each source becomes a map of section → key → list of values. A key that is
//! assigned more than once keeps every assignment in order, which is what
//! multi opts read; single-valued opts use the last one.
//!
//! Alongside the sections as written, a normalized copy keys sections by their
//! lowercased name (except `DEFAULT`, which is kept as is). Lookups go through
//! the normalized copy; the original names are kept for listing sections.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Section name → key → every value assigned to that key, in file order.
pub type Sections = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// The section all top-level (ungrouped) opts read from.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// One parsed config source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSource {
    pub path: PathBuf,
    pub sections: Sections,
    pub normalized: Sections,
}

/// Lowercase a section/group name, leaving `DEFAULT` untouched.
pub fn normalize_section(name: &str) -> String {
    if name == DEFAULT_SECTION {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// Parse `content`. `path` is only used in error messages and recorded on the
/// result.
pub fn parse_str(content: &str, path: &Path) -> Result<ParsedSource, ConfigError> {
    let mut parser = Parser {
        path,
        out: ParsedSource {
            path: path.to_path_buf(),
            ..ParsedSource::default()
        },
        section: None,
        pending: None,
    };
    for (idx, line) in content.lines().enumerate() {
        parser.line(idx + 1, line)?;
    }
    parser.flush();
    Ok(parser.out)
}

struct Parser<'a> {
    path: &'a Path,
    out: ParsedSource,
    section: Option<String>,
    /// Key being assigned and its value lines so far.
    pending: Option<(String, Vec<String>)>,
}

impl Parser<'_> {
    fn line(&mut self, lineno: usize, raw: &str) -> Result<(), ConfigError> {
        let line = raw.trim_end();
        if line.is_empty() {
            // Blank lines end multi-line values.
            self.flush();
            return Ok(());
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            return Ok(());
        }

        // While a key is pending, every indented non-assignment line belongs
        // to its value, even one starting with `[`.
        let indented = trimmed.len() != line.len();
        if indented && !is_assignment(trimmed) {
            match self.pending.as_mut() {
                Some((_, value)) => {
                    value.push(trimmed.to_string());
                    return Ok(());
                }
                None if !trimmed.starts_with('[') => {
                    return Err(self.error(lineno, line, "Unexpected continuation line"));
                }
                None => {}
            }
        }

        self.flush();

        if trimmed.starts_with('[') {
            let section = self.section_name(lineno, line, trimmed)?;
            self.open_section(section);
            return Ok(());
        }

        let (key, value) = self.split_key_value(lineno, line, trimmed)?;
        if self.section.is_none() {
            return Err(self.error(
                lineno,
                line,
                "Section must be started before assignment",
            ));
        }
        self.pending = Some((key, vec![value]));
        Ok(())
    }

    fn section_name(&self, lineno: usize, line: &str, header: &str) -> Result<String, ConfigError> {
        let Some(inner) = header.strip_prefix('[').and_then(|h| h.strip_suffix(']')) else {
            return Err(self.error(lineno, line, "Invalid section (must end with ])"));
        };
        let name = inner.trim();
        if name.is_empty() {
            return Err(self.error(lineno, line, "Empty section name"));
        }
        Ok(name.to_string())
    }

    fn split_key_value(
        &self,
        lineno: usize,
        line: &str,
        text: &str,
    ) -> Result<(String, String), ConfigError> {
        let Some(at) = separator_index(text) else {
            return Err(self.error(lineno, line, "No ':' or '=' found in assignment"));
        };
        let key = text[..at].trim();
        if key.is_empty() {
            return Err(self.error(lineno, line, "Key cannot be empty"));
        }
        Ok((key.to_string(), unquote(text[at + 1..].trim()).to_string()))
    }

    fn open_section(&mut self, section: String) {
        self.out.sections.entry(section.clone()).or_default();
        self.out
            .normalized
            .entry(normalize_section(&section))
            .or_default();
        self.section = Some(section);
    }

    /// Store the pending assignment, if any, in the current section.
    fn flush(&mut self) {
        let Some((key, lines)) = self.pending.take() else {
            return;
        };
        let Some(section) = self.section.as_deref() else {
            return;
        };
        let value = lines.join("\n");
        self.out
            .sections
            .entry(section.to_string())
            .or_default()
            .entry(key.clone())
            .or_default()
            .push(value.clone());
        self.out
            .normalized
            .entry(normalize_section(section))
            .or_default()
            .entry(key)
            .or_default()
            .push(value);
    }

    fn error(&self, lineno: usize, line: &str, message: &str) -> ConfigError {
        ConfigError::parse(self.path, lineno, line, message)
    }
}

/// Position of the first `=` or `:`, whichever comes first.
fn separator_index(text: &str) -> Option<usize> {
    text.find(['=', ':'])
}

/// Whether an indented line starts a new assignment rather than continuing a
/// value. Keys never contain whitespace, so `and more: text` continues.
fn is_assignment(text: &str) -> bool {
    match separator_index(text) {
        Some(at) => {
            let key = text[..at].trim();
            !key.is_empty() && !key.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
