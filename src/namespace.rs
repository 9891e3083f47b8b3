//! The result of one parse pass over a list of config files.

use std::path::PathBuf;

use toml::Value;
use tracing::warn;

use crate::error::ConfigError;
use crate::merge::MergedSources;
use crate::parser::{DEFAULT_SECTION, ParsedSource};

/// Parsed files merged by precedence, plus the files that could not be opened.
///
/// Access failures are recorded rather than raised so one diagnostic can name
/// every bad file; [`check_access`](Self::check_access) turns them into an
/// error.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    sources: MergedSources,
    config_files: Vec<PathBuf>,
    files_not_found: Vec<PathBuf>,
    files_permission_denied: Vec<PathBuf>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_parsed(&mut self, source: ParsedSource) {
        self.sources.add(source);
    }

    pub(crate) fn set_config_files(&mut self, files: Vec<PathBuf>) {
        self.config_files = files;
    }

    pub(crate) fn file_not_found(&mut self, path: PathBuf) {
        self.files_not_found.push(path);
    }

    pub(crate) fn file_permission_denied(&mut self, path: PathBuf) {
        self.files_permission_denied.push(path);
    }

    /// Every file this namespace was built from, in the order given.
    pub fn config_files(&self) -> &[PathBuf] {
        &self.config_files
    }

    pub fn files_not_found(&self) -> &[PathBuf] {
        &self.files_not_found
    }

    pub fn files_permission_denied(&self) -> &[PathBuf] {
        &self.files_permission_denied
    }

    /// Fail with the batched access diagnostics, missing files first.
    ///
    /// When both kinds of failure are present the unreadable files are logged
    /// at `warn` so the one diagnostic still names every bad file.
    pub fn check_access(&self) -> Result<(), ConfigError> {
        if !self.files_not_found.is_empty() {
            if !self.files_permission_denied.is_empty() {
                warn!(
                    files = ?self.files_permission_denied,
                    "config files could not be opened"
                );
            }
            return Err(ConfigError::FilesNotFound(self.files_not_found.clone()));
        }
        if !self.files_permission_denied.is_empty() {
            return Err(ConfigError::FilesPermissionDenied(
                self.files_permission_denied.clone(),
            ));
        }
        Ok(())
    }

    /// Raw file value for `names`, where a `None` section means `DEFAULT`.
    ///
    /// Single-valued lookups return the last assignment as a string;
    /// multi-valued lookups return every assignment as an array of strings.
    pub fn get_value(&self, names: &[(Option<&str>, &str)], multi: bool) -> Option<Value> {
        let names: Vec<(String, String)> = names
            .iter()
            .map(|(section, key)| {
                (
                    section.unwrap_or(DEFAULT_SECTION).to_string(),
                    key.to_string(),
                )
            })
            .collect();
        let mut values = self.sources.lookup(&names, multi)?;
        if multi {
            Some(Value::Array(values.into_iter().map(Value::String).collect()))
        } else {
            values.pop().map(Value::String)
        }
    }

    /// Every section name in every parsed file, highest-priority file first,
    /// without repeats.
    pub fn sections(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for src in self.sources.sources() {
            for section in src.sections.keys() {
                if !seen.contains(section) {
                    seen.push(section.clone());
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use parking_lot::Mutex;
    use std::path::Path;
    use std::sync::Arc;
    use tracing_subscriber::fmt::MakeWriter;

    fn namespace(files: &[&str]) -> Namespace {
        let mut ns = Namespace::new();
        for content in files {
            ns.add_parsed(parse_str(content, Path::new("/test/app.conf")).unwrap());
        }
        ns
    }

    #[test]
    fn none_group_reads_default_section() {
        let ns = namespace(&["[DEFAULT]\ndebug = true\n"]);
        let got = ns.get_value(&[(None, "debug")], false);
        assert_eq!(got, Some(Value::String("true".into())));
    }

    #[test]
    fn single_value_is_last_assignment() {
        let ns = namespace(&["[s]\nk = a\nk = b\n"]);
        assert_eq!(
            ns.get_value(&[(Some("s"), "k")], false),
            Some(Value::String("b".into()))
        );
    }

    #[test]
    fn multi_value_is_array() {
        let ns = namespace(&["[s]\nk = a\n", "[s]\nk = b\n"]);
        assert_eq!(
            ns.get_value(&[(Some("s"), "k")], true),
            Some(Value::Array(vec![
                Value::String("a".into()),
                Value::String("b".into())
            ]))
        );
    }

    #[test]
    fn check_access_reports_missing_before_denied() {
        let mut ns = Namespace::new();
        assert!(ns.check_access().is_ok());
        ns.file_permission_denied("/locked.conf".into());
        ns.file_not_found("/gone.conf".into());
        assert!(matches!(
            ns.check_access().unwrap_err(),
            ConfigError::FilesNotFound(paths) if paths == vec![PathBuf::from("/gone.conf")]
        ));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn check_access_logs_denied_files_alongside_missing() {
        let mut ns = Namespace::new();
        ns.file_not_found("/gone.conf".into());
        ns.file_permission_denied("/locked.conf".into());

        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();
        let err = tracing::subscriber::with_default(subscriber, || ns.check_access()).unwrap_err();

        assert!(matches!(err, ConfigError::FilesNotFound(_)));
        let logged = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("/locked.conf"), "{logged}");
    }

    #[test]
    fn sections_deduplicated_latest_first() {
        let ns = namespace(&["[a]\n[shared]\n", "[b]\n[shared]\n[Unregistered]\n"]);
        assert_eq!(ns.sections(), ["Unregistered", "b", "shared", "a"]);
    }
}
