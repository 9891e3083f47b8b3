//! Value resolution for one registered option.
//!
//! Operates on borrowed registry state with no I/O and no locking, so the
//! whole precedence chain is testable with synthetic inputs. First match wins:
//!
//! 1. Locked value (`lock_value`), returned verbatim
//! 2. Value from the parsed config files, converted by the opt's type
//! 3. Default override (`set_default`), converted only in validating mode
//! 4. The opt's own default, converted
//! 5. `None`

use toml::Value;

use crate::convert::OptType;
use crate::error::{ConfigError, ValueError};
use crate::namespace::Namespace;
use crate::opt::{Opt, OptEntry};

/// Everything needed to resolve one option.
pub struct ResolveInput<'a> {
    pub entry: &'a OptEntry,
    /// Registered group name; `None` for top-level opts.
    pub group: Option<&'a str>,
    /// The parsed files, if a parse has happened.
    pub namespace: Option<&'a Namespace>,
    pub validate_default_values: bool,
}

/// Resolve an option's value through every layer.
pub fn resolve(input: ResolveInput<'_>) -> Result<Option<Value>, ConfigError> {
    let opt = &input.entry.opt;

    if let Some(locked) = &input.entry.locked {
        return Ok(Some(locked.clone()));
    }

    if let Some(namespace) = input.namespace {
        if let Some(raw) = file_value(opt, input.group, namespace) {
            return convert_value(opt, &raw)
                .map(Some)
                .map_err(|source| ConfigError::InvalidValue {
                    opt: opt.name().to_string(),
                    source,
                });
        }
    }

    if let Some(value) = &input.entry.default_override {
        if !input.validate_default_values {
            return Ok(Some(value.clone()));
        }
        return convert_default(opt, value).map(Some);
    }

    match opt.default_value() {
        Some(default) => convert_default(opt, default).map(Some),
        None => Ok(None),
    }
}

/// The raw value for `opt` in the parsed files: its `dest` first, then its
/// declared name as an alias.
fn file_value(opt: &Opt, group: Option<&str>, namespace: &Namespace) -> Option<Value> {
    let mut names = vec![(group, opt.dest_key())];
    if opt.name() != opt.dest_key() {
        names.push((group, opt.name()));
    }
    namespace.get_value(&names, opt.is_multi())
}

/// Convert a value with the opt's type. Multi opts convert every item; a
/// scalar given for a multi opt becomes a one-item list.
pub fn convert_value(opt: &Opt, value: &Value) -> Result<Value, ValueError> {
    if !opt.is_multi() {
        return opt.opt_type().convert(value);
    }
    match value {
        Value::Array(items) => convert_items(opt.opt_type(), items),
        scalar => convert_items(opt.opt_type(), std::slice::from_ref(scalar)),
    }
}

fn convert_items(item_type: &OptType, items: &[Value]) -> Result<Value, ValueError> {
    items
        .iter()
        .map(|item| item_type.convert(item))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

pub(crate) fn convert_default(opt: &Opt, value: &Value) -> Result<Value, ConfigError> {
    convert_value(opt, value).map_err(|source| ConfigError::InvalidDefault {
        opt: opt.name().to_string(),
        source,
    })
}
