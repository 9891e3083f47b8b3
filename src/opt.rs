//! Option schemas and option groups.

use std::collections::BTreeMap;

use toml::Value;

use crate::convert::{IpVersion, OptType};

/// Schema for one configurable value.
///
/// An `Opt` names the value, says how to convert it, and carries its default
/// and flags. Two opts are equal when every field is equal; registering an
/// equal opt twice is a no-op, registering a different one under the same
/// `dest` is a [`DuplicateOption`](crate::ConfigError::DuplicateOption).
///
/// ```ignore
/// let opts = vec![
///     Opt::string("school").required(true).default("bupt"),
///     Opt::integer("number-of-students").default(50),
///     Opt::string("db-password").secret(true),
/// ];
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Opt {
    name: String,
    dest: String,
    opt_type: OptType,
    default: Option<Value>,
    help: Option<String>,
    required: bool,
    secret: bool,
    multi: bool,
}

impl Opt {
    /// An option of any type. `dest` is `name` with `-` replaced by `_`.
    pub fn new(name: &str, opt_type: OptType) -> Self {
        Self {
            name: name.to_string(),
            dest: name.replace('-', "_"),
            opt_type,
            default: None,
            help: None,
            required: false,
            secret: false,
            multi: false,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, OptType::string())
    }

    pub fn string_choices<I, S>(name: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, OptType::choices(choices))
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, OptType::Boolean)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, OptType::integer())
    }

    pub fn integer_range(name: &str, min: Option<i64>, max: Option<i64>) -> Self {
        Self::new(name, OptType::integer_range(min, max))
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, OptType::float())
    }

    pub fn list(name: &str) -> Self {
        Self::new(name, OptType::list())
    }

    pub fn dict(name: &str) -> Self {
        Self::new(name, OptType::dict())
    }

    pub fn ip(name: &str, version: Option<IpVersion>) -> Self {
        Self::new(name, OptType::ip_address(version))
    }

    /// An option that may be assigned repeatedly. Its value is the list of
    /// every assignment across all files, each converted with `item_type`.
    pub fn multi(name: &str, item_type: OptType) -> Self {
        Self {
            multi: true,
            ..Self::new(name, item_type)
        }
    }

    pub fn multi_string(name: &str) -> Self {
        Self::multi(name, OptType::MultiString)
    }

    /// Use an explicit lookup key instead of the one derived from the name.
    pub fn dest(mut self, dest: &str) -> Self {
        self.dest = dest.to_string();
        self
    }

    /// The default value, as raw text or already typed.
    pub fn default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Secret values are redacted in listings and logged dumps.
    pub fn secret(mut self, secret: bool) -> Self {
        self.secret = secret;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dest_key(&self) -> &str {
        &self.dest
    }

    pub fn opt_type(&self) -> &OptType {
        &self.opt_type
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub(crate) fn has_reserved_prefix(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// A named collection of opts. Each group reads from the config file section
/// of the same name (compared case-insensitively).
#[derive(Debug, Clone, PartialEq)]
pub struct OptGroup {
    name: String,
    title: String,
    help: Option<String>,
}

impl OptGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            title: format!("{name} options"),
            help: None,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title_text(&self) -> &str {
        &self.title
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

/// Registration record for one `(group, dest)`.
#[derive(Debug, Clone)]
pub(crate) struct OptEntry {
    pub opt: Opt,
    /// Set by `set_default`; wins over the opt's own default.
    pub default_override: Option<Value>,
    /// Set by `lock_value`; wins over everything.
    pub locked: Option<Value>,
}

impl OptEntry {
    pub fn new(opt: Opt) -> Self {
        Self {
            opt,
            default_override: None,
            locked: None,
        }
    }
}

/// The opts registered under one scope (top level or a group).
pub(crate) type OptTable = BTreeMap<String, OptEntry>;

/// A registered group and its opts.
#[derive(Debug, Clone)]
pub(crate) struct GroupEntry {
    pub group: OptGroup,
    pub opts: OptTable,
}

impl GroupEntry {
    pub fn new(group: OptGroup) -> Self {
        Self {
            group,
            opts: OptTable::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dest_replaces_hyphens() {
        let opt = Opt::integer("number-of-students");
        assert_eq!(opt.name(), "number-of-students");
        assert_eq!(opt.dest_key(), "number_of_students");
    }

    #[test]
    fn explicit_dest_wins() {
        let opt = Opt::string("db-url").dest("connection");
        assert_eq!(opt.dest_key(), "connection");
    }

    #[test]
    fn equality_is_structural() {
        let a = Opt::string("host").default("localhost");
        let b = Opt::string("host").default("localhost");
        let c = Opt::string("host").default("0.0.0.0");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Opt::string("host").default("localhost").secret(true));
    }

    #[test]
    fn multi_string_is_multi() {
        let opt = Opt::multi_string("backend");
        assert!(opt.is_multi());
        assert_eq!(opt.opt_type(), &OptType::MultiString);
        assert!(!Opt::list("backend").is_multi());
    }

    #[test]
    fn reserved_prefix_detected() {
        assert!(Opt::string("_hidden").has_reserved_prefix());
        assert!(!Opt::string("visible_").has_reserved_prefix());
    }

    #[test]
    fn group_title_defaults_from_name() {
        let group = OptGroup::new("education");
        assert_eq!(group.title_text(), "education options");
        assert_eq!(OptGroup::new("api").title("API").title_text(), "API");
    }
}
