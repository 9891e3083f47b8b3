use std::path::PathBuf;

/// Where to look for a project's config file.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp".into())`.
    Home(String),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Every registered option and its resolved value.
    List,
    /// One option, as `dest` or `group.dest`.
    Get { key: String },
    /// Every section found in the parsed files.
    Sections,
}

/// Settings for one parse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    validate_default_values: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert every default and default override while parsing, failing the
    /// parse if one does not fit its option's type. Off by default, in which
    /// case overrides are returned as given.
    pub fn validate_default_values(mut self, validate: bool) -> Self {
        self.validate_default_values = validate;
        self
    }

    pub fn validates_default_values(&self) -> bool {
        self.validate_default_values
    }
}
