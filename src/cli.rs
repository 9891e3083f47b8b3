//! Clap adapter for confopts.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! [`ConfigArgs`] gives an application a repeatable `--config-file` flag and
//! `config list|get|sections` subcommands. [`ConfigArgs::into_action()`] turns
//! the parsed arguments into a [`ConfigAction`](crate::ConfigAction), which
//! [`ConfigOpts::handle()`](crate::ConfigOpts::handle) runs. Applications using
//! another argument parser build `ConfigAction` values directly.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::ConfigAction;

/// Clap-derived args for the `config` subcommand group.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
///
/// let Commands::Config(args) = Cli::parse().command;
/// conf.parse(&args.config_files())?;
/// println!("{}", conf.handle(&args.into_action())?);
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config file to read. Repeat to read several; later files win.
    #[arg(long = "config-file", value_name = "PATH", global = true)]
    pub config_file: Vec<PathBuf>,

    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show every registered option and its resolved value.
    List,
    /// Show the resolved value and help text of one option.
    Get {
        /// `dest` or `group.dest` (e.g. "education.school").
        key: String,
    },
    /// Show every section found in the config files.
    Sections,
}

impl ConfigArgs {
    /// The `--config-file` paths, in the order given.
    pub fn config_files(&self) -> Vec<PathBuf> {
        self.config_file.clone()
    }

    /// Bare `config` and `config list` both map to `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key },
            Some(ConfigSubcommand::Sections) => ConfigAction::Sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Wrapper so we can use `try_parse_from` on the subcommand.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> ConfigArgs {
        TestCli::try_parse_from(args).unwrap().config
    }

    #[test]
    fn parse_no_subcommand_is_list() {
        let args = parse(&["test"]);
        assert!(args.config_files().is_empty());
        assert_eq!(args.into_action(), ConfigAction::List);
    }

    #[test]
    fn parse_list() {
        assert_eq!(parse(&["test", "list"]).into_action(), ConfigAction::List);
    }

    #[test]
    fn parse_get() {
        let action = parse(&["test", "get", "education.school"]).into_action();
        assert_eq!(
            action,
            ConfigAction::Get {
                key: "education.school".into(),
            }
        );
    }

    #[test]
    fn parse_sections() {
        assert_eq!(
            parse(&["test", "sections"]).into_action(),
            ConfigAction::Sections
        );
    }

    #[test]
    fn config_files_keep_order() {
        let args = parse(&[
            "test",
            "--config-file",
            "/etc/zen/zen.conf",
            "--config-file",
            "local.conf",
            "list",
        ]);
        assert_eq!(
            args.config_files(),
            [PathBuf::from("/etc/zen/zen.conf"), PathBuf::from("local.conf")]
        );
    }

    #[test]
    fn config_file_after_subcommand() {
        let args = parse(&["test", "get", "debug", "--config-file", "a.conf"]);
        assert_eq!(args.config_files(), [PathBuf::from("a.conf")]);
    }

    #[test]
    fn get_requires_key() {
        assert!(TestCli::try_parse_from(["test", "get"]).is_err());
    }

    #[test]
    fn invalid_subcommand_errors() {
        let result = TestCli::try_parse_from(["test", "nope"]);
        assert!(result.is_err());
    }
}
