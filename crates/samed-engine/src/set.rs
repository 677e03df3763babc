//! `set` option handling.
//!
//! `set` is parsed like any other `ARGV` command (its argument is
//! `name[=value]`, optionally prefixed or suffixed with `!` to toggle a
//! boolean), but its *semantics* — looking an option up by closest unique
//! prefix, coercing the value to the option's declared kind, and toggling
//! rather than assigning when given a bang — are specific enough to this one
//! command to live in their own module rather than crowd `handlers.rs`.
//!
//! Both `:set foo!` (trailing bang) and `:set !foo` (leading bang) must
//! toggle — real configurations use both forms interchangeably.

use samed_error::{ErrorKind, EngineError};

/// What kind of value an option holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// `1/0/true/false/yes/no/on/off`, case-insensitive.
    Bool,
    /// An integer in `0..=i32::MAX`.
    Number,
    /// An arbitrary string.
    String,
}

/// The value an option was set to.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// A boolean value.
    Bool(bool),
    /// A numeric value.
    Number(i32),
    /// A string value.
    String(String),
}

/// One entry in an editor's option table.
#[derive(Debug, Clone, Copy)]
pub struct OptionDef {
    /// Option name, looked up by closest unique prefix (same rule as
    /// command names).
    pub name: &'static str,
    /// The kind of value this option holds.
    pub kind: OptionKind,
}

/// Look up `name` in `options` by exact match, then by unique prefix, the
/// same rule [`samed_command::Registry::lookup`] uses for command names.
pub fn lookup_option<'a>(options: &'a [OptionDef], name: &str) -> Option<&'a OptionDef> {
    if let Some(exact) = options.iter().find(|o| o.name == name) {
        return Some(exact);
    }
    let mut candidates = options.iter().filter(|o| o.name.starts_with(name));
    let first = candidates.next()?;
    if candidates.next().is_none() {
        Some(first)
    } else {
        None
    }
}

/// Parse and resolve one `set` argument (e.g. `"autoindent"`, `"!autoindent"`,
/// `"noautoindent"`, `"autoindent!"`, `"tabwidth=4"`) against `options` and
/// the option's *current* value (needed to compute what toggling produces).
///
/// Returns the option name and its new value, or an error if the name is
/// unknown/ambiguous or the value does not parse as the option's kind.
pub fn resolve(arg: &str, options: &[OptionDef], current: impl Fn(&str) -> Option<OptionValue>) -> Result<(String, OptionValue), EngineError> {
    let (mut name, mut toggle) = (arg, false);
    if let Some(rest) = name.strip_prefix('!') {
        name = rest;
        toggle = true;
    }
    if let Some(rest) = name.strip_suffix('!') {
        name = rest;
        toggle = true;
    }
    let mut negate_prefix = false;
    let (lookup_name, explicit_value) = match name.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => {
            if let Some(rest) = name.strip_prefix("no") {
                negate_prefix = true;
                (rest, None)
            } else {
                (name, None)
            }
        }
    };
    let def = lookup_option(options, lookup_name).ok_or_else(|| EngineError::with_detail(ErrorKind::Command, 0, lookup_name.to_string()))?;

    let value = match (def.kind, explicit_value) {
        (OptionKind::Bool, Some(v)) => OptionValue::Bool(parse_bool(v).ok_or_else(|| EngineError::new(ErrorKind::Command, 0))?),
        (OptionKind::Bool, None) => {
            let existing = match current(def.name) {
                Some(OptionValue::Bool(b)) => b,
                _ => false,
            };
            let base = if negate_prefix { !existing } else { true };
            OptionValue::Bool(if toggle { !existing } else { base })
        }
        (OptionKind::Number, Some(v)) => {
            let n: i32 = v.parse().map_err(|_| EngineError::new(ErrorKind::Count, 0))?;
            if n < 0 {
                return Err(EngineError::new(ErrorKind::Count, 0));
            }
            OptionValue::Number(n)
        }
        (OptionKind::Number, None) => {
            return Err(EngineError::with_detail(ErrorKind::Command, 0, format!("{} requires a value", def.name)));
        }
        (OptionKind::String, Some(v)) => OptionValue::String(v.to_string()),
        (OptionKind::String, None) => {
            return Err(EngineError::with_detail(ErrorKind::Command, 0, format!("{} requires a value", def.name)));
        }
    };
    Ok((def.name.to_string(), value))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: &[OptionDef] = &[
        OptionDef { name: "autoindent", kind: OptionKind::Bool },
        OptionDef { name: "tabwidth", kind: OptionKind::Number },
        OptionDef { name: "syntax", kind: OptionKind::String },
    ];

    fn no_current(_: &str) -> Option<OptionValue> {
        None
    }

    #[test]
    fn bare_name_sets_bool_true() {
        let (name, value) = resolve("autoindent", OPTIONS, no_current).unwrap();
        assert_eq!(name, "autoindent");
        assert_eq!(value, OptionValue::Bool(true));
    }

    #[test]
    fn no_prefix_sets_bool_false() {
        let (name, value) = resolve("noautoindent", OPTIONS, no_current).unwrap();
        assert_eq!(name, "autoindent");
        assert_eq!(value, OptionValue::Bool(false));
    }

    #[test]
    fn trailing_bang_toggles_against_current_value() {
        let current = |n: &str| if n == "autoindent" { Some(OptionValue::Bool(true)) } else { None };
        let (_, value) = resolve("autoindent!", OPTIONS, current).unwrap();
        assert_eq!(value, OptionValue::Bool(false));
    }

    #[test]
    fn leading_bang_toggles_the_same_as_trailing() {
        let current = |n: &str| if n == "autoindent" { Some(OptionValue::Bool(true)) } else { None };
        let (_, value) = resolve("!autoindent", OPTIONS, current).unwrap();
        assert_eq!(value, OptionValue::Bool(false));
    }

    #[test]
    fn number_option_requires_nonnegative_value() {
        let (_, value) = resolve("tabwidth=4", OPTIONS, no_current).unwrap();
        assert_eq!(value, OptionValue::Number(4));
        assert!(resolve("tabwidth=-1", OPTIONS, no_current).is_err());
    }

    #[test]
    fn unique_prefix_resolves_option_name() {
        let (name, _) = resolve("tab=8", OPTIONS, no_current).unwrap();
        assert_eq!(name, "tabwidth");
    }

    #[test]
    fn string_option_without_value_is_an_error() {
        assert!(resolve("syntax", OPTIONS, no_current).is_err());
    }
}
