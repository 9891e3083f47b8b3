//! Whole-registry checks run once per parse, against a namespace that is not
//! installed yet.
//!
//! - Required options must resolve to a value unless a default override is set.
//! - In validating mode, every default and default override must convert with
//!   its option's type.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::namespace::Namespace;
use crate::opt::{GroupEntry, OptEntry, OptTable};
use crate::resolve::{self, ResolveInput};

/// Every registration record with its group name, top level first.
pub(crate) fn all_entries<'a>(
    opts: &'a OptTable,
    groups: &'a BTreeMap<String, GroupEntry>,
) -> impl Iterator<Item = (Option<&'a str>, &'a OptEntry)> {
    opts.values().map(|entry| (None, entry)).chain(
        groups
            .iter()
            .flat_map(|(name, g)| g.opts.values().map(move |entry| (Some(name.as_str()), entry))),
    )
}

/// Fail with [`RequiredOptionMissing`](ConfigError::RequiredOptionMissing) for
/// the first required option that resolves to nothing.
pub fn check_required(
    opts: &OptTable,
    groups: &BTreeMap<String, GroupEntry>,
    namespace: &Namespace,
    validate_default_values: bool,
) -> Result<(), ConfigError> {
    for (group, entry) in all_entries(opts, groups) {
        if !entry.opt.is_required() || entry.default_override.is_some() {
            continue;
        }
        let value = resolve::resolve(ResolveInput {
            entry,
            group,
            namespace: Some(namespace),
            validate_default_values,
        })?;
        if value.is_none() {
            return Err(ConfigError::RequiredOptionMissing {
                name: entry.opt.name().to_string(),
                group: group.map(str::to_string),
            });
        }
    }
    Ok(())
}

/// Convert every default and default override, failing on the first that
/// does not fit.
pub fn check_defaults(
    opts: &OptTable,
    groups: &BTreeMap<String, GroupEntry>,
) -> Result<(), ConfigError> {
    for (_, entry) in all_entries(opts, groups) {
        let candidates = entry.opt.default_value().into_iter().chain(&entry.default_override);
        for value in candidates {
            resolve::convert_default(&entry.opt, value)?;
        }
    }
    Ok(())
}
