use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use toml::Value;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::file;
use crate::namespace::Namespace;
use crate::ops::{self, ConfigResult};
use crate::opt::{GroupEntry, Opt, OptEntry, OptGroup, OptTable};
use crate::resolve::{self, ResolveInput};
use crate::types::{ConfigAction, ParseOptions};
use crate::validate;
use crate::view::GroupView;

type CacheKey = (Option<String>, String);

#[derive(Debug, Default)]
struct State {
    opts: OptTable,
    groups: BTreeMap<String, GroupEntry>,
    namespace: Option<Arc<Namespace>>,
    validate_default_values: bool,
    /// Resolved values. Filled under a shared `State` lock, cleared under the
    /// exclusive one.
    cache: RwLock<HashMap<CacheKey, Option<Value>>>,
}

impl State {
    fn table(&self, group: Option<&str>) -> Result<&OptTable, ConfigError> {
        match group {
            None => Ok(&self.opts),
            Some(name) => self
                .groups
                .get(name)
                .map(|g| &g.opts)
                .ok_or_else(|| ConfigError::NoSuchGroup(name.to_string())),
        }
    }

    fn table_mut(&mut self, group: Option<&str>) -> Result<&mut OptTable, ConfigError> {
        match group {
            None => Ok(&mut self.opts),
            Some(name) => self
                .groups
                .get_mut(name)
                .map(|g| &mut g.opts)
                .ok_or_else(|| ConfigError::NoSuchGroup(name.to_string())),
        }
    }

    /// Like [`table_mut`](Self::table_mut), creating the group if needed.
    fn table_autocreate(&mut self, group: Option<&str>) -> &mut OptTable {
        match group {
            None => &mut self.opts,
            Some(name) => {
                &mut self
                    .groups
                    .entry(name.to_string())
                    .or_insert_with(|| GroupEntry::new(OptGroup::new(name)))
                    .opts
            }
        }
    }

    /// The table of `group`, registering it first if needed. Existing groups
    /// keep their metadata.
    fn group_autocreate(&mut self, group: OptGroup) -> &mut OptTable {
        &mut self
            .groups
            .entry(group.name().to_string())
            .or_insert_with(|| GroupEntry::new(group))
            .opts
    }

    fn entry(&self, dest: &str, group: Option<&str>) -> Result<&OptEntry, ConfigError> {
        self.table(group)?
            .get(dest)
            .ok_or_else(|| no_such_option(dest, group))
    }

    fn entry_mut(&mut self, dest: &str, group: Option<&str>) -> Result<&mut OptEntry, ConfigError> {
        self.table_mut(group)?
            .get_mut(dest)
            .ok_or_else(|| no_such_option(dest, group))
    }

    fn clear_cache(&mut self) {
        self.cache.get_mut().clear();
    }
}

fn no_such_option(dest: &str, group: Option<&str>) -> ConfigError {
    ConfigError::NoSuchOption {
        name: dest.to_string(),
        group: group.map(str::to_string),
    }
}

/// Register `opt` in `table`.
///
/// Returns `false` if an equal opt is already registered under the same
/// `dest`, and fails if a different one is.
fn register_into(table: &mut OptTable, opt: Opt) -> Result<bool, ConfigError> {
    if let Some(existing) = table.get(opt.dest_key()) {
        if existing.opt != opt {
            return Err(ConfigError::DuplicateOption(opt.name().to_string()));
        }
        return Ok(false);
    }
    table.insert(opt.dest_key().to_string(), OptEntry::new(opt));
    Ok(true)
}

/// The option registry: schemas, the parsed config files, and resolution.
///
/// `ConfigOpts` is shared by reference (typically in an `Arc`) between the
/// components that register options and the ones that read them. Reads run
/// concurrently; mutations are serialized and every mutation invalidates the
/// value cache.
///
/// ```ignore
/// let conf = ConfigOpts::new();
/// conf.register_opts(
///     [
///         Opt::string("school").required(true).default("bupt"),
///         Opt::integer("number-of-students").default(50),
///     ],
///     Some("education"),
/// )?;
/// conf.parse(&["/etc/zen/zen.conf"])?;
///
/// let school = conf.get("school", Some("education"))?;
/// let students: Option<i64> = conf.get_as("number_of_students", Some("education"))?;
/// ```
///
/// # Parsing and reloading
///
/// [`parse`](Self::parse) reads every file into a new [`Namespace`] without
/// touching the registry, checks it, and only then installs it. A failed parse
/// leaves the previous namespace in place. [`reload`](Self::reload) does the
/// same but reports failure as `false` plus a logged warning instead of an
/// error, so a running service keeps its last good configuration.
#[derive(Debug, Default)]
pub struct ConfigOpts {
    state: RwLock<State>,
    /// Serializes mutations, including the unlocked file parsing in `parse`.
    writer: Mutex<()>,
}

impl ConfigOpts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a mutation under the exclusive lock and invalidate the cache.
    fn mutate<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let _guard = self.writer.lock();
        let mut state = self.state.write();
        let result = f(&mut *state);
        state.clear_cache();
        result
    }

    /// Register an option at the top level, or in `group` (created if needed).
    ///
    /// Returns `true` if the option was newly added, `false` if an identical
    /// option was already registered.
    pub fn register_opt(&self, opt: Opt, group: Option<&str>) -> Result<bool, ConfigError> {
        if opt.has_reserved_prefix() {
            return Err(ConfigError::IllegalOptName(opt.name().to_string()));
        }
        self.mutate(|state| register_into(state.table_autocreate(group), opt))
    }

    /// Register several options. Stops at the first failure; options before it
    /// stay registered.
    pub fn register_opts<I>(&self, opts: I, group: Option<&str>) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = Opt>,
    {
        self.mutate(|state| {
            for opt in opts {
                if opt.has_reserved_prefix() {
                    return Err(ConfigError::IllegalOptName(opt.name().to_string()));
                }
                register_into(state.table_autocreate(group), opt)?;
            }
            Ok(())
        })
    }

    /// Register an option in `group`, creating the group with its title and
    /// help if it does not exist yet.
    pub fn register_opt_in(&self, opt: Opt, group: OptGroup) -> Result<bool, ConfigError> {
        if opt.has_reserved_prefix() {
            return Err(ConfigError::IllegalOptName(opt.name().to_string()));
        }
        self.mutate(|state| register_into(state.group_autocreate(group), opt))
    }

    /// [`register_opts`](Self::register_opts) for a group given by value.
    pub fn register_opts_in<I>(&self, opts: I, group: OptGroup) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = Opt>,
    {
        self.mutate(|state| {
            let table = state.group_autocreate(group);
            for opt in opts {
                if opt.has_reserved_prefix() {
                    return Err(ConfigError::IllegalOptName(opt.name().to_string()));
                }
                register_into(table, opt)?;
            }
            Ok(())
        })
    }

    /// Register a group with its title and help. A group that already exists
    /// keeps its original metadata.
    pub fn register_group(&self, group: OptGroup) {
        self.mutate(|state| {
            state
                .groups
                .entry(group.name().to_string())
                .or_insert_with(|| GroupEntry::new(group));
        });
    }

    /// Remove the option registered under `opt`'s `dest`, if any.
    pub fn unregister_opt(&self, opt: &Opt, group: Option<&str>) -> Result<(), ConfigError> {
        self.mutate(|state| {
            state.table_mut(group)?.remove(opt.dest_key());
            Ok(())
        })
    }

    pub fn unregister_opts<'a, I>(&self, opts: I, group: Option<&str>) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = &'a Opt>,
    {
        self.mutate(|state| {
            let table = state.table_mut(group)?;
            for opt in opts {
                table.remove(opt.dest_key());
            }
            Ok(())
        })
    }

    /// Override an option's default. A value from a config file still wins.
    pub fn set_default<V: Into<Value>>(
        &self,
        dest: &str,
        value: V,
        group: Option<&str>,
    ) -> Result<(), ConfigError> {
        let value = value.into();
        self.mutate(|state| {
            state.entry_mut(dest, group)?.default_override = Some(value);
            Ok(())
        })
    }

    /// Remove an override set by [`set_default`](Self::set_default).
    pub fn clear_default(&self, dest: &str, group: Option<&str>) -> Result<(), ConfigError> {
        self.mutate(|state| {
            state.entry_mut(dest, group)?.default_override = None;
            Ok(())
        })
    }

    /// Pin an option to `value`, ignoring config files and defaults until
    /// [`unlock_value`](Self::unlock_value). The value is returned as given.
    pub fn lock_value<V: Into<Value>>(
        &self,
        dest: &str,
        value: V,
        group: Option<&str>,
    ) -> Result<(), ConfigError> {
        let value = value.into();
        self.mutate(|state| {
            state.entry_mut(dest, group)?.locked = Some(value);
            Ok(())
        })
    }

    pub fn unlock_value(&self, dest: &str, group: Option<&str>) -> Result<(), ConfigError> {
        self.mutate(|state| {
            state.entry_mut(dest, group)?.locked = None;
            Ok(())
        })
    }

    /// Resolve an option's value. `None` means the option has no value in any
    /// config file and no default.
    pub fn get(&self, dest: &str, group: Option<&str>) -> Result<Option<Value>, ConfigError> {
        let state = self.state.read();
        let entry = state.entry(dest, group)?;
        let key = (group.map(str::to_string), dest.to_string());

        if let Some(cached) = state.cache.read().get(&key) {
            return Ok(cached.clone());
        }

        let value = resolve::resolve(ResolveInput {
            entry,
            group,
            namespace: state.namespace.as_deref(),
            validate_default_values: state.validate_default_values,
        })?;
        state.cache.write().insert(key, value.clone());
        Ok(value)
    }

    /// Resolve an option and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        dest: &str,
        group: Option<&str>,
    ) -> Result<Option<T>, ConfigError> {
        self.get(dest, group)?
            .map(|value| {
                value.try_into().map_err(|e: toml::de::Error| ConfigError::TypeMismatch {
                    opt: dest.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// A view of one group's values.
    pub fn group(&self, name: &str) -> Result<GroupView<'_>, ConfigError> {
        let state = self.state.read();
        let entry = state
            .groups
            .get(name)
            .ok_or_else(|| ConfigError::NoSuchGroup(name.to_string()))?;
        Ok(GroupView::new(self, entry.group.clone()))
    }

    /// Parse `files` with default [`ParseOptions`].
    pub fn parse<P: AsRef<Path>>(&self, files: &[P]) -> Result<(), ConfigError> {
        self.parse_with(files, ParseOptions::default())
    }

    /// Parse `files` in order (later files override earlier ones), check
    /// access failures, defaults and required options, then install the
    /// result. On any error the previously installed namespace stays active.
    pub fn parse_with<P: AsRef<Path>>(
        &self,
        files: &[P],
        options: ParseOptions,
    ) -> Result<(), ConfigError> {
        let _guard = self.writer.lock();
        let validate_default_values = options.validates_default_values();

        let namespace = file::load_namespace(files)?;
        namespace.check_access()?;

        {
            let state = self.state.read();
            if validate_default_values {
                validate::check_defaults(&state.opts, &state.groups)?;
            }
            validate::check_required(
                &state.opts,
                &state.groups,
                &namespace,
                validate_default_values,
            )?;
        }

        let file_count = namespace.config_files().len();
        let mut state = self.state.write();
        state.namespace = Some(Arc::new(namespace));
        state.validate_default_values = validate_default_values;
        state.clear_cache();
        info!(files = file_count, "installed config namespace");
        Ok(())
    }

    /// Like [`parse`](Self::parse), but never fails: errors are logged and
    /// reported as `false`, keeping the previous configuration active.
    pub fn reload<P: AsRef<Path>>(&self, files: &[P]) -> bool {
        let options = ParseOptions::new()
            .validate_default_values(self.state.read().validate_default_values);
        match self.parse_with(files, options) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to reload config files");
                false
            }
        }
    }

    /// Reload the files of the active namespace.
    pub fn reload_config_files(&self) -> bool {
        let files = self.config_files();
        self.reload(&files)
    }

    /// Drop the active namespace and return to the state before the first
    /// parse. Registered options, overrides and locks are kept.
    pub fn clear(&self) {
        self.mutate(|state| {
            state.namespace = None;
            state.validate_default_values = false;
        });
    }

    /// [`clear`](Self::clear), and also drop every default override and
    /// locked value.
    pub fn reset(&self) {
        self.mutate(|state| {
            state.namespace = None;
            state.validate_default_values = false;
            let State { opts, groups, .. } = state;
            let entries = opts
                .values_mut()
                .chain(groups.values_mut().flat_map(|g| g.opts.values_mut()));
            for entry in entries {
                entry.default_override = None;
                entry.locked = None;
            }
        });
    }

    /// Every section name seen in the parsed files, registered or not.
    pub fn list_all_sections(&self) -> std::vec::IntoIter<String> {
        let sections = match &self.state.read().namespace {
            Some(namespace) => namespace.sections(),
            None => Vec::new(),
        };
        sections.into_iter()
    }

    /// The files of the active namespace, in the order given to `parse`.
    pub fn config_files(&self) -> Vec<PathBuf> {
        match &self.state.read().namespace {
            Some(namespace) => namespace.config_files().to_vec(),
            None => Vec::new(),
        }
    }

    /// The active namespace, if a parse has succeeded.
    pub fn namespace(&self) -> Option<Arc<Namespace>> {
        self.state.read().namespace.clone()
    }

    /// Whether `name` is a top-level option dest or a group name.
    pub fn contains(&self, name: &str) -> bool {
        let state = self.state.read();
        state.opts.contains_key(name) || state.groups.contains_key(name)
    }

    /// Number of top-level options plus number of groups.
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.opts.len() + state.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-level option dests, then group names.
    pub fn keys(&self) -> Vec<String> {
        let state = self.state.read();
        state
            .opts
            .keys()
            .chain(state.groups.keys())
            .cloned()
            .collect()
    }

    /// Dests registered in `group`.
    pub(crate) fn group_keys(&self, group: &str) -> Result<Vec<String>, ConfigError> {
        let state = self.state.read();
        Ok(state.table(Some(group))?.keys().cloned().collect())
    }

    /// Every registered option with its group name, top level first.
    pub fn registered_opts(&self) -> Vec<(Option<String>, Opt)> {
        let state = self.state.read();
        validate::all_entries(&state.opts, &state.groups)
            .map(|(group, entry)| (group.map(str::to_string), entry.opt.clone()))
            .collect()
    }

    /// Run a [`ConfigAction`] against this registry.
    pub fn handle(&self, action: &ConfigAction) -> Result<ConfigResult, ConfigError> {
        match action {
            ConfigAction::List => ops::list_values(self),
            ConfigAction::Get { key } => ops::get_value(self, key),
            ConfigAction::Sections => Ok(ConfigResult::Sections(
                self.list_all_sections().collect(),
            )),
        }
    }

    /// Log every option and its value at `level`, secrets redacted.
    pub fn log_opt_values(&self, level: tracing::Level) {
        ops::log_opt_values(self, level);
    }
}
