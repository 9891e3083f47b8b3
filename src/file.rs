//! Config file discovery and loading.
//!
//! # Loading
//!
//! [`load_namespace`] reads a list of files in order and parses each into a
//! fresh [`Namespace`]. Files given later in the list override files given
//! earlier: every parsed file is placed in front of the ones before it.
//!
//! Missing and unreadable files are recorded on the namespace instead of
//! aborting the pass, so the caller can report every bad path at once. A
//! syntax error, or any other I/O failure, aborts immediately.
//!
//! Paths are tilde-expanded and made absolute before reading, so diagnostics
//! always carry the full path.
//!
//! # Discovery
//!
//! [`find_config_files`] resolves each [`SearchPath`] to a directory and keeps
//! `{dir}/{project}.conf` when it exists. Search paths are listed lowest
//! priority first, the same order [`load_namespace`] expects.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;
use crate::namespace::Namespace;
use crate::parser;
use crate::types::SearchPath;

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `project` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{project}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, project: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", project)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Search paths used when a project does not pick its own:
/// `~/.{project}/`, the platform config directory, then `/etc/{project}/`.
pub fn default_search_paths(project: &str) -> Vec<SearchPath> {
    vec![
        SearchPath::Home(format!(".{project}")),
        SearchPath::Platform,
        SearchPath::Path(PathBuf::from("/etc").join(project)),
    ]
}

/// Existing `{project}.conf` files across `search_paths`, lowest priority
/// first.
pub fn find_config_files(project: &str, search_paths: &[SearchPath]) -> Vec<PathBuf> {
    let file_name = format!("{project}.conf");
    let mut found: Vec<PathBuf> = Vec::new();
    for sp in search_paths {
        let Some(dir) = resolve_search_path(sp, project) else {
            continue;
        };
        let candidate = fix_path(&dir.join(&file_name));
        if candidate.is_file() && !found.contains(&candidate) {
            found.push(candidate);
        }
    }
    found
}

/// Apply tilde expansion and make the path absolute.
pub fn fix_path(path: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match directories::UserDirs::new() {
            Some(user) => user.home_dir().join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    std::path::absolute(&expanded).unwrap_or(expanded)
}

/// How an attempt to read one source turned out.
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    Read(String),
    NotFound,
    PermissionDenied,
}

/// Read a file, separating the access failures that are batched from the
/// ones that are not.
pub(crate) fn read_source(path: &Path) -> Result<ReadOutcome, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(ReadOutcome::Read(content)),
        Err(e) => classify(path, e),
    }
}

fn classify(path: &Path, err: io::Error) -> Result<ReadOutcome, ConfigError> {
    match err.kind() {
        io::ErrorKind::NotFound => Ok(ReadOutcome::NotFound),
        io::ErrorKind::PermissionDenied => Ok(ReadOutcome::PermissionDenied),
        _ => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        }),
    }
}

/// Parse `files` in order into a new [`Namespace`].
///
/// Never touches shared state; the caller decides whether to install the
/// result.
pub fn load_namespace<P: AsRef<Path>>(files: &[P]) -> Result<Namespace, ConfigError> {
    let mut namespace = Namespace::new();
    let mut config_files = Vec::with_capacity(files.len());

    for file in files {
        let path = fix_path(file.as_ref());
        config_files.push(path.clone());
        match read_source(&path)? {
            ReadOutcome::Read(content) => {
                let parsed = parser::parse_str(&content, &path)?;
                debug!(
                    path = %path.display(),
                    sections = parsed.sections.len(),
                    "parsed config file"
                );
                namespace.add_parsed(parsed);
            }
            ReadOutcome::NotFound => {
                debug!(path = %path.display(), "config file not found");
                namespace.file_not_found(path);
            }
            ReadOutcome::PermissionDenied => {
                debug!(path = %path.display(), "config file permission denied");
                namespace.file_permission_denied(path);
            }
        }
    }

    namespace.set_config_files(config_files);
    Ok(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use toml::Value;

    #[test]
    fn resolve_explicit_path() {
        let p = PathBuf::from("/tmp/myapp");
        let resolved = resolve_search_path(&SearchPath::Path(p.clone()), "ignored");
        assert_eq!(resolved, Some(p));
    }

    #[test]
    fn fix_path_makes_relative_paths_absolute() {
        let fixed = fix_path(Path::new("app.conf"));
        assert!(fixed.is_absolute());
        assert!(fixed.ends_with("app.conf"));
    }

    #[test]
    fn fix_path_keeps_absolute_paths() {
        assert_eq!(
            fix_path(Path::new("/etc/app.conf")),
            PathBuf::from("/etc/app.conf")
        );
    }

    #[test]
    fn fix_path_expands_tilde() {
        let Some(user) = directories::UserDirs::new() else {
            return;
        };
        let fixed = fix_path(Path::new("~/.app/app.conf"));
        assert_eq!(fixed, user.home_dir().join(".app/app.conf"));
    }

    #[test]
    fn classify_batches_access_errors_only() {
        let p = Path::new("/x.conf");
        assert!(matches!(
            classify(p, io::Error::from(io::ErrorKind::NotFound)),
            Ok(ReadOutcome::NotFound)
        ));
        assert!(matches!(
            classify(p, io::Error::from(io::ErrorKind::PermissionDenied)),
            Ok(ReadOutcome::PermissionDenied)
        ));
        assert!(matches!(
            classify(p, io::Error::from(io::ErrorKind::InvalidData)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn later_file_overrides_earlier() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.conf");
        let b = dir.path().join("b.conf");
        fs::write(&a, "[api]\nport = 1000\nhost = a\n").unwrap();
        fs::write(&b, "[api]\nport = 2000\n").unwrap();

        let ns = load_namespace(&[&a, &b]).unwrap();
        assert_eq!(
            ns.get_value(&[(Some("api"), "port")], false),
            Some(Value::String("2000".into()))
        );
        assert_eq!(
            ns.get_value(&[(Some("api"), "host")], false),
            Some(Value::String("a".into()))
        );
        assert_eq!(ns.config_files(), [a, b]);
    }

    #[test]
    fn missing_files_are_collected() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.conf");
        fs::write(&good, "[s]\nk = v\n").unwrap();
        let missing1 = dir.path().join("missing1.conf");
        let missing2 = dir.path().join("missing2.conf");

        let ns = load_namespace(&[&missing1, &missing2, &good]).unwrap();
        assert_eq!(ns.files_not_found(), [missing1, missing2]);
        assert!(ns.get_value(&[(Some("s"), "k")], false).is_some());
    }

    #[test]
    fn syntax_error_aborts() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.conf");
        fs::write(&bad, "[s]\nno separator here\n").unwrap();
        let err = load_namespace(&[&bad]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));
    }

    #[test]
    fn find_config_files_checks_each_dir() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        fs::write(low.path().join("zen.conf"), "").unwrap();
        fs::write(high.path().join("zen.conf"), "").unwrap();

        let found = find_config_files(
            "zen",
            &[
                SearchPath::Path(low.path().to_path_buf()),
                SearchPath::Path(empty.path().to_path_buf()),
                SearchPath::Path(high.path().to_path_buf()),
            ],
        );
        assert_eq!(
            found,
            [low.path().join("zen.conf"), high.path().join("zen.conf")]
        );
    }

    #[test]
    fn default_search_paths_end_with_etc() {
        let paths = default_search_paths("zen");
        assert_eq!(paths[0], SearchPath::Home(".zen".into()));
        assert_eq!(paths[2], SearchPath::Path(PathBuf::from("/etc/zen")));
    }
}
