use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::error::ConfigError;
use crate::opt::OptGroup;
use crate::registry::ConfigOpts;

/// Read access to the options of one group.
///
/// Returned by [`ConfigOpts::group`]. Every read goes through the registry, so
/// a view always reflects the latest parse and default overrides.
#[derive(Debug, Clone)]
pub struct GroupView<'a> {
    conf: &'a ConfigOpts,
    group: OptGroup,
}

impl<'a> GroupView<'a> {
    pub(crate) fn new(conf: &'a ConfigOpts, group: OptGroup) -> Self {
        Self { conf, group }
    }

    pub fn name(&self) -> &str {
        self.group.name()
    }

    pub fn group(&self) -> &OptGroup {
        &self.group
    }

    pub fn get(&self, dest: &str) -> Result<Option<Value>, ConfigError> {
        self.conf.get(dest, Some(self.name()))
    }

    pub fn get_as<T: DeserializeOwned>(&self, dest: &str) -> Result<Option<T>, ConfigError> {
        self.conf.get_as(dest, Some(self.name()))
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.keys().iter().any(|k| k == dest)
    }

    /// Registered dests, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.conf.group_keys(self.name()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Every option in the group that has a value, keyed by dest.
    pub fn to_table(&self) -> Result<Table, ConfigError> {
        let mut table = Table::new();
        for dest in self.conf.group_keys(self.name())? {
            if let Some(value) = self.get(&dest)? {
                table.insert(dest, value);
            }
        }
        Ok(table)
    }

    /// Deserialize the whole group into `T`, field names matching dests.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Value::Table(self.to_table()?)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::TypeMismatch {
                opt: self.name().to_string(),
                reason: e.to_string(),
            })
    }
}
