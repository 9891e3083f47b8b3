//! Typed configuration options for long-running services. Register option
//! schemas, parse INI-style files, and read resolved values from anywhere.
//!
//! confopts is a registry of option schemas shared by every component of a
//! service. Components register the options they need, the service parses its
//! config files once at startup (and again on reload), and every component
//! reads typed, validated values afterwards.
//!
//! ```ignore
//! let conf = ConfigOpts::new();
//! conf.register_opts(
//!     [
//!         Opt::string("school").required(true).default("bupt"),
//!         Opt::string("classes").default("grade 3"),
//!         Opt::integer("number-of-students").default(50),
//!     ],
//!     Some("education"),
//! )?;
//! conf.parse(&["/etc/zen/zen.conf"])?;
//!
//! let school = conf.get("school", Some("education"))?;
//! let education: Education = conf.group("education")?.deserialize()?;
//! ```
//!
//! # Option schemas
//!
//! An [`Opt`] names a value, says how raw text converts into it (an
//! [`OptType`]), and carries its default and flags:
//!
//! - **`required`**: parsing fails with
//!   [`RequiredOptionMissing`](ConfigError::RequiredOptionMissing) unless the
//!   option resolves to a value.
//! - **`secret`**: the value is shown as `****` in listings and logged dumps.
//! - **`multi`**: every assignment in every file is kept, oldest first,
//!   instead of only the last one.
//!
//! Option names may contain `-`. Values are read and stored under the `dest`,
//! the name with `-` replaced by `_`. Options live either at the top level
//! (read from the `[DEFAULT]` section) or in a named group (read from the
//! section of the same name, matched case-insensitively).
//!
//! # File format
//!
//! ```text
//! # comment
//! [DEFAULT]
//! debug = true
//!
//! [education]
//! school: "Example University"
//! motto = first line
//!     continued on an indented line
//! ```
//!
//! Sections are mandatory. Keys are separated from values by `=` or `:`,
//! whichever comes first. Indented lines continue the previous value and a
//! blank line ends it. A key assigned twice keeps every value.
//!
//! # Precedence
//!
//! ```text
//! Intrinsic default     Opt::default(...)
//!        ↑ overridden by
//! Default override      ConfigOpts::set_default(...)
//!        ↑ overridden by
//! Config files          in the order given to parse, later files win
//!        ↑ overridden by
//! Locked value          ConfigOpts::lock_value(...)
//! ```
//!
//! File values and intrinsic defaults are always converted with the option's
//! type. A file value that does not convert fails the read with
//! [`InvalidValue`](ConfigError::InvalidValue); the registry does not fall
//! back to the default.
//!
//! # Parsing and reloading
//!
//! [`ConfigOpts::parse`] builds a complete [`Namespace`] from the files, checks
//! it, and only then installs it. Missing and unreadable files are reported
//! together. A failed parse leaves the previous namespace active, so
//! [`ConfigOpts::reload`] can be called from a signal handler while other
//! threads keep reading.
//!
//! # Discovery
//!
//! [`find_config_files`] looks for `<project>.conf` in a list of
//! [`SearchPath`]s. [`default_search_paths`] gives the usual list for a
//! service: a dot directory in `$HOME`, the platform config directory, then
//! `/etc/<project>`.
//!
//! # Core library, no CLI framework required
//!
//! Listing and lookup go through [`ConfigAction`] and
//! [`ConfigOpts::handle`], which return a displayable [`ConfigResult`]. For
//! [clap](https://docs.rs/clap) users, the `cli` module (behind the `clap`
//! Cargo feature, on by default) provides `ConfigArgs` with a repeatable
//! `--config-file` flag and `config list|get|sections` subcommands. To use
//! confopts without clap:
//!
//! ```toml
//! confopts = { version = "...", default-features = false }
//! ```
//!
//! # Logging
//!
//! confopts logs through [`tracing`] and never installs a subscriber. Each
//! file read is logged at `debug`, each installed namespace at `info`, and a
//! failed reload at `warn`. [`ConfigOpts::log_opt_values`] dumps every option
//! at a chosen level.

pub mod convert;
pub mod error;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod file;
mod merge;
mod namespace;
mod ops;
mod opt;
mod parser;
mod registry;
mod resolve;
mod validate;
mod view;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use convert::{IpVersion, OptType};
pub use error::{ConfigError, ValueError};
pub use file::{default_search_paths, find_config_files, fix_path, load_namespace};
pub use merge::MergedSources;
pub use namespace::Namespace;
pub use ops::ConfigResult;
pub use opt::{Opt, OptGroup};
pub use parser::{DEFAULT_SECTION, ParsedSource, Sections, normalize_section, parse_str};
pub use registry::ConfigOpts;
pub use resolve::convert_value;
pub use types::{ConfigAction, ParseOptions, SearchPath};
pub use view::GroupView;

pub use toml::Value;
