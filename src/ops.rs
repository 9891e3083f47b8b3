//! Config operations: value listing, key lookup, logged dumps, and result
//! types.
//!
//! Provides the logic behind `config list`, `config get` and `config sections`,
//! and the `ConfigResult` enum that callers use to display results. Options
//! marked secret are always shown as `****`.

use std::fmt;

use toml::Value;
use tracing::Level;

use crate::error::ConfigError;
use crate::registry::ConfigOpts;

const REDACTED: &str = "****";
const NOT_SET: &str = "<not set>";

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// One option's resolved value and its help text.
    KeyValue {
        key: String,
        value: String,
        help: Option<String>,
    },
    /// Every registered option and its resolved value.
    Listing { entries: Vec<(String, String)> },
    /// Every section name found in the parsed files.
    Sections(Vec<String>),
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::KeyValue { key, value, help } => {
                if let Some(help) = help {
                    writeln!(f, "# {help}")?;
                }
                write!(f, "{key} = {value}")
            }
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
            ConfigResult::Sections(sections) => write!(f, "{}", sections.join("\n")),
        }
    }
}

/// List every registered option as `dest` or `group.dest`, top level first.
pub fn list_values(conf: &ConfigOpts) -> Result<ConfigResult, ConfigError> {
    let mut entries = Vec::new();
    for (group, opt) in conf.registered_opts() {
        let value = conf.get(opt.dest_key(), group.as_deref())?;
        let key = match &group {
            Some(group) => format!("{group}.{}", opt.dest_key()),
            None => opt.dest_key().to_string(),
        };
        entries.push((key, display_value(value.as_ref(), opt.is_secret())));
    }
    Ok(ConfigResult::Listing { entries })
}

/// Look up one option by `dest` or `group.dest`.
///
/// A dotted key whose prefix is not a registered group is looked up as a
/// top-level dest.
pub fn get_value(conf: &ConfigOpts, key: &str) -> Result<ConfigResult, ConfigError> {
    let (group, dest) = match key.split_once('.') {
        Some((group, dest)) if conf.group(group).is_ok() => (Some(group), dest),
        _ => (None, key),
    };

    let opt = conf
        .registered_opts()
        .into_iter()
        .find(|(g, opt)| g.as_deref() == group && opt.dest_key() == dest)
        .map(|(_, opt)| opt)
        .ok_or_else(|| ConfigError::NoSuchOption {
            name: dest.to_string(),
            group: group.map(str::to_string),
        })?;

    let value = conf.get(dest, group)?;
    Ok(ConfigResult::KeyValue {
        key: key.to_string(),
        value: display_value(value.as_ref(), opt.is_secret()),
        help: opt.help_text().map(str::to_string),
    })
}

/// Log every option and its value at `level`.
pub fn log_opt_values(conf: &ConfigOpts, level: Level) {
    macro_rules! log_at {
        ($($arg:tt)+) => {
            if level == Level::ERROR {
                tracing::error!($($arg)+)
            } else if level == Level::WARN {
                tracing::warn!($($arg)+)
            } else if level == Level::INFO {
                tracing::info!($($arg)+)
            } else if level == Level::DEBUG {
                tracing::debug!($($arg)+)
            } else {
                tracing::trace!($($arg)+)
            }
        };
    }

    log_at!("{}", "*".repeat(80));
    log_at!("Configuration options gathered from:");
    log_at!("config files: {:?}", conf.config_files());
    log_at!("{}", "=".repeat(80));

    for (group, opt) in conf.registered_opts() {
        let key = match &group {
            Some(group) => format!("{group}.{}", opt.dest_key()),
            None => opt.dest_key().to_string(),
        };
        let value = match conf.get(opt.dest_key(), group.as_deref()) {
            Ok(value) => display_value(value.as_ref(), opt.is_secret()),
            Err(e) => format!("<error: {e}>"),
        };
        log_at!("{key:<30} = {value}");
    }

    log_at!("{}", "*".repeat(80));
}

/// Format a resolved value for display.
fn display_value(value: Option<&Value>, secret: bool) -> String {
    match value {
        None => NOT_SET.to_string(),
        Some(_) if secret => REDACTED.to_string(),
        Some(value) => format_value(value),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Table(t) => t
            .iter()
            .map(|(k, v)| format!("{k}:{}", format_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{conf_file, education_opts};
    use crate::opt::Opt;
    use crate::types::ConfigAction;
    use tempfile::TempDir;

    fn conf() -> ConfigOpts {
        let conf = ConfigOpts::new();
        conf.register_opts(education_opts(), Some("education")).unwrap();
        conf.register_opts(
            [
                Opt::boolean("debug").default(false),
                Opt::string("db-password").secret(true).default("hunter2"),
                Opt::list("hosts").default("a,b"),
                Opt::string("motd"),
            ],
            None,
        )
        .unwrap();
        conf
    }

    #[test]
    fn list_values_includes_all_keys() {
        let result = list_values(&conf()).unwrap();
        match result {
            ConfigResult::Listing { entries } => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(
                    keys,
                    [
                        "db_password",
                        "debug",
                        "hosts",
                        "motd",
                        "education.classes",
                        "education.number_of_students",
                        "education.school",
                    ]
                );
            }
            other => panic!("Expected Listing, got {other:?}"),
        }
    }

    #[test]
    fn list_values_redacts_and_formats() {
        let result = list_values(&conf()).unwrap();
        let ConfigResult::Listing { entries } = result else {
            panic!("Expected Listing");
        };
        let value = |key: &str| entries.iter().find(|(k, _)| k == key).unwrap().1.clone();
        assert_eq!(value("db_password"), "****");
        assert_eq!(value("debug"), "false");
        assert_eq!(value("hosts"), "a, b");
        assert_eq!(value("motd"), "<not set>");
        assert_eq!(value("education.number_of_students"), "50");
    }

    #[test]
    fn get_grouped_key() {
        let result = get_value(&conf(), "education.school").unwrap();
        assert_eq!(
            result,
            ConfigResult::KeyValue {
                key: "education.school".into(),
                value: "bupt".into(),
                help: Some("School the service reports for".into()),
            }
        );
    }

    #[test]
    fn get_top_level_key() {
        match get_value(&conf(), "debug").unwrap() {
            ConfigResult::KeyValue { value, help, .. } => {
                assert_eq!(value, "false");
                assert_eq!(help, None);
            }
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn get_secret_is_redacted() {
        match get_value(&conf(), "db_password").unwrap() {
            ConfigResult::KeyValue { value, .. } => assert_eq!(value, "****"),
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn get_nonexistent_key() {
        assert!(matches!(
            get_value(&conf(), "education.nope"),
            Err(ConfigError::NoSuchOption { .. })
        ));
        assert!(matches!(
            get_value(&conf(), "nope"),
            Err(ConfigError::NoSuchOption { .. })
        ));
    }

    #[test]
    fn handle_sections() {
        let dir = TempDir::new().unwrap();
        let path = conf_file(&dir, "zen.conf", "[education]\n[api]\nport = 444\n");
        let conf = conf();
        conf.parse(&[&path]).unwrap();
        let result = conf.handle(&ConfigAction::Sections).unwrap();
        assert_eq!(result, ConfigResult::Sections(vec!["api".into(), "education".into()]));
        assert_eq!(result.to_string(), "api\neducation");
    }

    #[test]
    fn handle_get_reads_parsed_value() {
        let dir = TempDir::new().unwrap();
        let path = conf_file(&dir, "zen.conf", "[education]\nclasses = Grade 4\n");
        let conf = conf();
        conf.parse(&[&path]).unwrap();
        let result = conf
            .handle(&ConfigAction::Get {
                key: "education.classes".into(),
            })
            .unwrap();
        assert_eq!(result.to_string(), "# Class name\neducation.classes = Grade 4");
    }

    #[test]
    fn log_opt_values_does_not_fail_on_bad_values() {
        let dir = TempDir::new().unwrap();
        let path = conf_file(&dir, "zen.conf", "[education]\nnumber_of_students = lots\n");
        let conf = conf();
        conf.parse(&[&path]).unwrap();
        conf.log_opt_values(Level::INFO);
        conf.log_opt_values(Level::TRACE);
    }

    #[test]
    fn listing_display_format() {
        let result = ConfigResult::Listing {
            entries: vec![
                ("host".into(), "localhost".into()),
                ("port".into(), "8080".into()),
            ],
        };
        assert_eq!(format!("{result}"), "host = localhost\nport = 8080");
    }
}
