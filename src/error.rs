use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}", no_such_option(.name, .group.as_deref()))]
    NoSuchOption { name: String, group: Option<String> },

    #[error("no such group: {0}")]
    NoSuchGroup(String),

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("illegal name {0} with prefix _")]
    IllegalOptName(String),

    #[error("value required for option: {}", qualified(.name, .group.as_deref()))]
    RequiredOptionMissing { name: String, group: Option<String> },

    #[error("Failed to find some config files: {}", join_paths(.0))]
    FilesNotFound(Vec<PathBuf>),

    #[error("Failed to open some config files: {}", join_paths(.0))]
    FilesPermissionDenied(Vec<PathBuf>),

    #[error("at {}:{line}, {message}: {text:?}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        text: String,
        message: String,
    },

    #[error("Value for option {opt} is not valid: {source}")]
    InvalidValue {
        opt: String,
        #[source]
        source: ValueError,
    },

    #[error("Default value for option {opt} is not valid: {source}")]
    InvalidDefault {
        opt: String,
        #[source]
        source: ValueError,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot read option {opt} as the requested type: {reason}")]
    TypeMismatch { opt: String, reason: String },
}

/// Conversion failure raised by an [`OptType`](crate::OptType).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("invalid {kind} value: {value:?}")]
    Invalid { kind: &'static str, value: String },

    #[error("{value:?} is not one of the allowed choices [{}]", .choices.join(", "))]
    NotInChoices { value: String, choices: Vec<String> },

    #[error("{value} is outside the allowed range [{}, {}]", bound(.min), bound(.max))]
    OutOfRange {
        value: String,
        min: Option<String>,
        max: Option<String>,
    },

    #[error("duplicate key {0:?} in mapping")]
    DuplicateKey(String),
}

fn no_such_option(name: &str, group: Option<&str>) -> String {
    match group {
        Some(group) => format!("no such option in group {group}: {name}"),
        None => format!("no such option: {name}"),
    }
}

fn qualified(name: &str, group: Option<&str>) -> String {
    match group {
        Some(group) => format!("{group}.{name}"),
        None => name.to_string(),
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn bound(b: &Option<String>) -> &str {
    b.as_deref().unwrap_or("-")
}

impl ConfigError {
    pub(crate) fn parse(path: &Path, line: usize, text: &str, message: &str) -> Self {
        ConfigError::Parse {
            path: path.to_path_buf(),
            line,
            text: text.to_string(),
            message: message.to_string(),
        }
    }
}
