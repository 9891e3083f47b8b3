//! Option types: converters from raw config text to typed values.
//!
//! Every [`OptType`] turns a [`Value`] into a validated [`Value`] of its own
//! shape. Raw file values arrive as `Value::String`; defaults may arrive
//! already typed. Feeding a converted value back through the same type returns
//! it unchanged, so defaults can be written either way:
//!
//! ```ignore
//! let port = OptType::integer_range(Some(1), Some(65535));
//! assert_eq!(port.convert_str("8080")?, Value::Integer(8080));
//! assert_eq!(port.convert(&Value::Integer(8080))?, Value::Integer(8080));
//! ```
//!
//! | Type          | Raw grammar                         | Result            |
//! |---------------|-------------------------------------|-------------------|
//! | `String`      | any text, optionally from `choices` | `Value::String`   |
//! | `Boolean`     | `true/1/on/yes`, `false/0/off/no`   | `Value::Boolean`  |
//! | `Integer`     | decimal, optional `[min, max]`      | `Value::Integer`  |
//! | `Float`       | decimal, optional `[min, max]`      | `Value::Float`    |
//! | `List`        | `a, b, c`                           | `Value::Array`    |
//! | `Dict`        | `k1:v1, k2:v2`                      | `Value::Table`    |
//! | `IpAddress`   | IPv4 or IPv6 literal                | canonical string  |
//! | `MultiString` | any text (item type of multi opts)  | `Value::String`   |

use std::net::IpAddr;

use toml::{Table, Value};

use crate::error::ValueError;

/// Restricts an [`OptType::IpAddress`] to one address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

/// The type of an option: how its raw text is converted and validated.
#[derive(Debug, Clone, PartialEq)]
pub enum OptType {
    String { choices: Option<Vec<String>> },
    Boolean,
    Integer { min: Option<i64>, max: Option<i64> },
    Float { min: Option<f64>, max: Option<f64> },
    List { item: Box<OptType> },
    Dict { value: Box<OptType> },
    IpAddress { version: Option<IpVersion> },
    MultiString,
}

impl Default for OptType {
    fn default() -> Self {
        OptType::String { choices: None }
    }
}

impl OptType {
    pub fn string() -> Self {
        OptType::String { choices: None }
    }

    pub fn choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OptType::String {
            choices: Some(choices.into_iter().map(Into::into).collect()),
        }
    }

    pub fn integer() -> Self {
        OptType::Integer {
            min: None,
            max: None,
        }
    }

    pub fn integer_range(min: Option<i64>, max: Option<i64>) -> Self {
        OptType::Integer { min, max }
    }

    pub fn float() -> Self {
        OptType::Float {
            min: None,
            max: None,
        }
    }

    /// A comma-separated list of strings.
    pub fn list() -> Self {
        OptType::List {
            item: Box::new(OptType::string()),
        }
    }

    pub fn list_of(item: OptType) -> Self {
        OptType::List {
            item: Box::new(item),
        }
    }

    /// A comma-separated `key:value` mapping with string values.
    pub fn dict() -> Self {
        OptType::Dict {
            value: Box::new(OptType::string()),
        }
    }

    pub fn dict_of(value: OptType) -> Self {
        OptType::Dict {
            value: Box::new(value),
        }
    }

    pub fn ip_address(version: Option<IpVersion>) -> Self {
        OptType::IpAddress { version }
    }

    /// Short name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            OptType::String { .. } => "string",
            OptType::Boolean => "boolean",
            OptType::Integer { .. } => "integer",
            OptType::Float { .. } => "float",
            OptType::List { .. } => "list",
            OptType::Dict { .. } => "dict",
            OptType::IpAddress { .. } => "IP address",
            OptType::MultiString => "multi-string",
        }
    }

    /// Convert raw text from a config file.
    pub fn convert_str(&self, raw: &str) -> Result<Value, ValueError> {
        self.convert(&Value::String(raw.to_string()))
    }

    /// Convert a raw string or an already-typed value.
    pub fn convert(&self, value: &Value) -> Result<Value, ValueError> {
        match self {
            OptType::String { choices } => convert_string(value, choices.as_deref()),
            OptType::MultiString => convert_string(value, None),
            OptType::Boolean => convert_bool(value),
            OptType::Integer { min, max } => convert_integer(value, *min, *max),
            OptType::Float { min, max } => convert_float(value, *min, *max),
            OptType::List { item } => convert_list(item, value),
            OptType::Dict { value: item } => convert_dict(item, value),
            OptType::IpAddress { version } => convert_ip(value, *version),
        }
    }

    fn invalid(&self, value: &Value) -> ValueError {
        ValueError::Invalid {
            kind: self.kind(),
            value: raw_text(value),
        }
    }
}

/// Text of a value as it would appear in a config file.
pub(crate) fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn convert_string(value: &Value, choices: Option<&[String]>) -> Result<Value, ValueError> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => value.to_string(),
        other => {
            return Err(ValueError::Invalid {
                kind: "string",
                value: other.to_string(),
            });
        }
    };
    if let Some(choices) = choices {
        if !choices.iter().any(|c| *c == s) {
            return Err(ValueError::NotInChoices {
                value: s,
                choices: choices.to_vec(),
            });
        }
    }
    Ok(Value::String(s))
}

fn convert_bool(value: &Value) -> Result<Value, ValueError> {
    match value {
        Value::Boolean(b) => Ok(Value::Boolean(*b)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Ok(Value::Boolean(true)),
            "false" | "0" | "off" | "no" => Ok(Value::Boolean(false)),
            _ => Err(OptType::Boolean.invalid(value)),
        },
        _ => Err(OptType::Boolean.invalid(value)),
    }
}

fn convert_integer(value: &Value, min: Option<i64>, max: Option<i64>) -> Result<Value, ValueError> {
    let n = match value {
        Value::Integer(n) => *n,
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| OptType::integer().invalid(value))?,
        _ => return Err(OptType::integer().invalid(value)),
    };
    let below = min.is_some_and(|m| n < m);
    let above = max.is_some_and(|m| n > m);
    if below || above {
        return Err(ValueError::OutOfRange {
            value: n.to_string(),
            min: min.map(|m| m.to_string()),
            max: max.map(|m| m.to_string()),
        });
    }
    Ok(Value::Integer(n))
}

fn convert_float(value: &Value, min: Option<f64>, max: Option<f64>) -> Result<Value, ValueError> {
    let x = match value {
        Value::Float(x) => *x,
        Value::Integer(n) => *n as f64,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| OptType::float().invalid(value))?,
        _ => return Err(OptType::float().invalid(value)),
    };
    if x.is_nan() {
        return Err(OptType::float().invalid(value));
    }
    let below = min.is_some_and(|m| x < m);
    let above = max.is_some_and(|m| x > m);
    if below || above {
        return Err(ValueError::OutOfRange {
            value: x.to_string(),
            min: min.map(|m| m.to_string()),
            max: max.map(|m| m.to_string()),
        });
    }
    Ok(Value::Float(x))
}

fn convert_list(item: &OptType, value: &Value) -> Result<Value, ValueError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| item.convert(v))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::String(s) => split_items(s)
            .map(|part| item.convert_str(part))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(ValueError::Invalid {
            kind: "list",
            value: other.to_string(),
        }),
    }
}

fn convert_dict(item: &OptType, value: &Value) -> Result<Value, ValueError> {
    let mut table = Table::new();
    match value {
        Value::Table(existing) => {
            for (k, v) in existing {
                table.insert(k.clone(), item.convert(v)?);
            }
        }
        Value::String(s) => {
            for pair in split_items(s) {
                let (k, v) = pair.split_once(':').ok_or_else(|| ValueError::Invalid {
                    kind: "dict",
                    value: pair.to_string(),
                })?;
                let key = k.trim();
                if key.is_empty() {
                    return Err(ValueError::Invalid {
                        kind: "dict",
                        value: pair.to_string(),
                    });
                }
                if table.contains_key(key) {
                    return Err(ValueError::DuplicateKey(key.to_string()));
                }
                table.insert(key.to_string(), item.convert_str(v.trim())?);
            }
        }
        other => {
            return Err(ValueError::Invalid {
                kind: "dict",
                value: other.to_string(),
            });
        }
    }
    Ok(Value::Table(table))
}

fn convert_ip(value: &Value, version: Option<IpVersion>) -> Result<Value, ValueError> {
    let invalid = || OptType::ip_address(version).invalid(value);
    let Value::String(s) = value else {
        return Err(invalid());
    };
    let addr: IpAddr = s.trim().parse().map_err(|_| invalid())?;
    let family_ok = match version {
        Some(IpVersion::V4) => addr.is_ipv4(),
        Some(IpVersion::V6) => addr.is_ipv6(),
        None => true,
    };
    if !family_ok {
        return Err(invalid());
    }
    Ok(Value::String(addr.to_string()))
}

/// Split a comma-separated value, trimming items. Blank input is an empty list.
fn split_items(s: &str) -> impl Iterator<Item = &str> {
    let trimmed = s.trim();
    trimmed
        .split(',')
        .map(str::trim)
        .filter(move |_| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.into())
    }

    #[test]
    fn string_passes_text_through() {
        assert_eq!(OptType::string().convert_str("hello").unwrap(), s("hello"));
    }

    #[test]
    fn string_stringifies_scalar_defaults() {
        assert_eq!(OptType::string().convert(&Value::Integer(3)).unwrap(), s("3"));
    }

    #[test]
    fn string_choices_enforced() {
        let t = OptType::choices(["fast", "slow"]);
        assert_eq!(t.convert_str("fast").unwrap(), s("fast"));
        let err = t.convert_str("medium").unwrap_err();
        assert!(matches!(err, ValueError::NotInChoices { .. }));
    }

    #[test]
    fn boolean_accepts_common_spellings() {
        for raw in ["true", "TRUE", "1", "on", "Yes"] {
            assert_eq!(OptType::Boolean.convert_str(raw).unwrap(), Value::Boolean(true));
        }
        for raw in ["false", "0", "OFF", "no"] {
            assert_eq!(OptType::Boolean.convert_str(raw).unwrap(), Value::Boolean(false));
        }
        assert!(OptType::Boolean.convert_str("maybe").is_err());
    }

    #[test]
    fn integer_parses_and_trims() {
        assert_eq!(OptType::integer().convert_str(" 42 ").unwrap(), Value::Integer(42));
        assert_eq!(OptType::integer().convert_str("-7").unwrap(), Value::Integer(-7));
    }

    #[test]
    fn integer_rejects_non_numeric() {
        let err = OptType::integer().convert_str("forty").unwrap_err();
        assert_eq!(
            err,
            ValueError::Invalid {
                kind: "integer",
                value: "forty".into()
            }
        );
    }

    #[test]
    fn integer_bounds() {
        let t = OptType::integer_range(Some(1), Some(10));
        assert!(t.convert_str("1").is_ok());
        assert!(t.convert_str("10").is_ok());
        assert!(matches!(
            t.convert_str("11").unwrap_err(),
            ValueError::OutOfRange { .. }
        ));
        assert!(t.convert(&Value::Integer(0)).is_err());
    }

    #[test]
    fn float_accepts_integers_and_bounds() {
        assert_eq!(OptType::float().convert_str("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(OptType::float().convert(&Value::Integer(2)).unwrap(), Value::Float(2.0));
        let t = OptType::Float {
            min: Some(0.0),
            max: Some(1.0),
        };
        assert!(t.convert_str("1.01").is_err());
        assert!(OptType::float().convert_str("nan").is_err());
    }

    #[test]
    fn list_splits_and_trims() {
        let v = OptType::list().convert_str("a, b ,c").unwrap();
        assert_eq!(v, Value::Array(vec![s("a"), s("b"), s("c")]));
        assert_eq!(OptType::list().convert_str("  ").unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn list_converts_items() {
        let t = OptType::list_of(OptType::integer());
        assert_eq!(
            t.convert_str("1,2").unwrap(),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert!(t.convert_str("1,x").is_err());
    }

    #[test]
    fn dict_parses_pairs() {
        let v = OptType::dict().convert_str("a:1, b : two").unwrap();
        let table = v.as_table().unwrap();
        assert_eq!(table["a"], s("1"));
        assert_eq!(table["b"], s("two"));
    }

    #[test]
    fn dict_rejects_missing_colon_and_duplicates() {
        assert!(OptType::dict().convert_str("a=1").is_err());
        assert_eq!(
            OptType::dict().convert_str("a:1,a:2").unwrap_err(),
            ValueError::DuplicateKey("a".into())
        );
    }

    #[test]
    fn ip_address_versions() {
        let any = OptType::ip_address(None);
        assert_eq!(any.convert_str("10.0.0.1").unwrap(), s("10.0.0.1"));
        assert_eq!(any.convert_str("::1").unwrap(), s("::1"));
        assert!(any.convert_str("10.0.0.256").is_err());

        let v4 = OptType::ip_address(Some(IpVersion::V4));
        assert!(v4.convert_str("::1").is_err());
        let v6 = OptType::ip_address(Some(IpVersion::V6));
        assert!(v6.convert_str("127.0.0.1").is_err());
    }

    #[test]
    fn converting_twice_is_a_no_op() {
        let cases: Vec<(OptType, &str)> = vec![
            (OptType::string(), "x"),
            (OptType::Boolean, "yes"),
            (OptType::integer(), "5"),
            (OptType::float(), "0.25"),
            (OptType::list_of(OptType::integer()), "1,2"),
            (OptType::dict(), "k:v"),
            (OptType::ip_address(None), "0:0::1"),
            (OptType::MultiString, "m"),
        ];
        for (t, raw) in cases {
            let once = t.convert_str(raw).unwrap();
            let twice = t.convert(&once).unwrap();
            assert_eq!(once, twice, "{} not idempotent", t.kind());
        }
    }
}
