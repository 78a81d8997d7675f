//! Typed values of flags and arguments.

use std::{collections::HashMap, fmt, time::Duration};

use strum;
use thiserror;

/// Type tag of a flag or argument, shown in help and in `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ValueKind {
    #[strum(serialize = "string")]
    String,
    #[strum(serialize = "string list")]
    StringList,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "bool list")]
    BoolList,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "int list")]
    IntList,
    #[strum(serialize = "int64")]
    Int64,
    #[strum(serialize = "int64 list")]
    Int64List,
    #[strum(serialize = "uint")]
    Uint,
    #[strum(serialize = "uint list")]
    UintList,
    #[strum(serialize = "uint64")]
    Uint64,
    #[strum(serialize = "uint64 list")]
    Uint64List,
    #[strum(serialize = "float64")]
    Float64,
    #[strum(serialize = "float64 list")]
    Float64List,
    #[strum(serialize = "duration")]
    Duration,
    #[strum(serialize = "duration list")]
    DurationList,
}

/// A parsed flag or argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    StringList(Vec<String>),
    Bool(bool),
    BoolList(Vec<bool>),
    Int(isize),
    IntList(Vec<isize>),
    Int64(i64),
    Int64List(Vec<i64>),
    Uint(usize),
    UintList(Vec<usize>),
    Uint64(u64),
    Uint64List(Vec<u64>),
    Float64(f64),
    Float64List(Vec<f64>),
    Duration(Duration),
    DurationList(Vec<Duration>),
}

/// Text could not be converted to a value of the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind} value")]
pub struct ValueError {
    pub kind: ValueKind,
    pub value: String,
}

impl ValueKind {
    pub fn is_list(self) -> bool {
        matches!(
            self,
            ValueKind::StringList
                | ValueKind::BoolList
                | ValueKind::IntList
                | ValueKind::Int64List
                | ValueKind::UintList
                | ValueKind::Uint64List
                | ValueKind::Float64List
                | ValueKind::DurationList
        )
    }

    /// Empty list of this kind, used as the implicit default of list arguments.
    pub(crate) fn empty_list(self) -> Option<Value> {
        let value = match self {
            ValueKind::StringList => Value::StringList(Vec::new()),
            ValueKind::BoolList => Value::BoolList(Vec::new()),
            ValueKind::IntList => Value::IntList(Vec::new()),
            ValueKind::Int64List => Value::Int64List(Vec::new()),
            ValueKind::UintList => Value::UintList(Vec::new()),
            ValueKind::Uint64List => Value::Uint64List(Vec::new()),
            ValueKind::Float64List => Value::Float64List(Vec::new()),
            ValueKind::DurationList => Value::DurationList(Vec::new()),
            _ => return None,
        };
        Some(value)
    }

    /// Parse a single scalar token. List kinds parse each element of `items`.
    pub fn parse(self, text: &str) -> Result<Value, ValueError> {
        let err = || ValueError {
            kind: self,
            value: text.to_string(),
        };
        let value = match self {
            ValueKind::String => Value::String(text.to_string()),
            ValueKind::Bool => Value::Bool(parse_bool(text).ok_or_else(err)?),
            ValueKind::Int => Value::Int(text.parse().map_err(|_| err())?),
            ValueKind::Int64 => Value::Int64(text.parse().map_err(|_| err())?),
            ValueKind::Uint => Value::Uint(text.parse().map_err(|_| err())?),
            ValueKind::Uint64 => Value::Uint64(text.parse().map_err(|_| err())?),
            ValueKind::Float64 => Value::Float64(text.parse().map_err(|_| err())?),
            ValueKind::Duration => Value::Duration(parse_duration(text).ok_or_else(err)?),
            list => return list.parse_list(std::slice::from_ref(&text.to_string())),
        };
        Ok(value)
    }

    /// Parse the already split elements of a list value.
    pub fn parse_list(self, items: &[String]) -> Result<Value, ValueError> {
        macro_rules! elements {
            ($variant:ident, $scalar:ident) => {{
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match ValueKind::$scalar.parse(item)? {
                        Value::$scalar(v) => out.push(v),
                        _ => unreachable!(),
                    }
                }
                Value::$variant(out)
            }};
        }
        let value = match self {
            ValueKind::StringList => Value::StringList(items.to_vec()),
            ValueKind::BoolList => elements!(BoolList, Bool),
            ValueKind::IntList => elements!(IntList, Int),
            ValueKind::Int64List => elements!(Int64List, Int64),
            ValueKind::UintList => elements!(UintList, Uint),
            ValueKind::Uint64List => elements!(Uint64List, Uint64),
            ValueKind::Float64List => elements!(Float64List, Float64),
            ValueKind::DurationList => elements!(DurationList, Duration),
            scalar => match items {
                [item] => return scalar.parse(item),
                _ => {
                    return Err(ValueError {
                        kind: scalar,
                        value: items.join(","),
                    })
                }
            },
        };
        Ok(value)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::StringList(_) => ValueKind::StringList,
            Value::Bool(_) => ValueKind::Bool,
            Value::BoolList(_) => ValueKind::BoolList,
            Value::Int(_) => ValueKind::Int,
            Value::IntList(_) => ValueKind::IntList,
            Value::Int64(_) => ValueKind::Int64,
            Value::Int64List(_) => ValueKind::Int64List,
            Value::Uint(_) => ValueKind::Uint,
            Value::UintList(_) => ValueKind::UintList,
            Value::Uint64(_) => ValueKind::Uint64,
            Value::Uint64List(_) => ValueKind::Uint64List,
            Value::Float64(_) => ValueKind::Float64,
            Value::Float64List(_) => ValueKind::Float64List,
            Value::Duration(_) => ValueKind::Duration,
            Value::DurationList(_) => ValueKind::DurationList,
        }
    }

    /// Append the elements of another list of the same kind.
    /// Returns `false` (and does nothing) when the kinds differ or are not lists.
    pub(crate) fn extend(&mut self, other: Value) -> bool {
        match (self, other) {
            (Value::StringList(a), Value::StringList(b)) => a.extend(b),
            (Value::BoolList(a), Value::BoolList(b)) => a.extend(b),
            (Value::IntList(a), Value::IntList(b)) => a.extend(b),
            (Value::Int64List(a), Value::Int64List(b)) => a.extend(b),
            (Value::UintList(a), Value::UintList(b)) => a.extend(b),
            (Value::Uint64List(a), Value::Uint64List(b)) => a.extend(b),
            (Value::Float64List(a), Value::Float64List(b)) => a.extend(b),
            (Value::DurationList(a), Value::DurationList(b)) => a.extend(b),
            _ => return false,
        }
        true
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", v)?;
    }
    f.write_str("]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Uint(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Duration(v) => write!(f, "{:?}", v),
            Value::StringList(v) => write_list(f, v),
            Value::BoolList(v) => write_list(f, v),
            Value::IntList(v) => write_list(f, v),
            Value::Int64List(v) => write_list(f, v),
            Value::UintList(v) => write_list(f, v),
            Value::Uint64List(v) => write_list(f, v),
            Value::Float64List(v) => write_list(f, v),
            Value::DurationList(v) => {
                f.write_str("[")?;
                for (i, d) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:?}", d)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Accepts the same spellings as Go's `strconv.ParseBool`.
fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parses durations such as `300ms`, `1.5h` or `2h45m`.
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.strip_prefix('+').unwrap_or(text);
    if text == "0" {
        return Some(Duration::ZERO);
    }
    if text.is_empty() {
        return None;
    }
    let mut rest = text;
    let mut total = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return None;
        }
        let number: f64 = number.parse().ok()?;
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let nanos_per_unit = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        total += number * nanos_per_unit;
        rest = tail;
    }
    if !total.is_finite() || total > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total.round() as u64))
}

/// Value of a flag or argument together with the information
/// whether it was given by the user or filled in from the default.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueEntry {
    pub value: Value,
    pub is_default: bool,
}

/// Parsed values keyed by the flag's long name or the argument's name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: HashMap<String, ValueEntry>,
}

/// Flag values keyed by the long flag name.
pub type FlagMap = ValueMap;
/// Argument values keyed by the argument name.
pub type ArgMap = ValueMap;

macro_rules! getters {
    ($( $(#[$meta:meta])* $name:ident: $variant:ident => $ret:ty, |$v:ident| $conv:expr; )+) => {
        $(
            $(#[$meta])*
            pub fn $name(&self, name: &str) -> Option<$ret> {
                match self.value(name)? {
                    Value::$variant($v) => Some($conv),
                    _ => None,
                }
            }
        )+
    };
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ValueEntry> {
        self.entries.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|e| &e.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns `true` when the value was filled in from the default.
    pub fn is_default(&self, name: &str) -> bool {
        self.entries.get(name).map_or(false, |e| e.is_default)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value, is_default: bool) {
        self.entries.insert(name.into(), ValueEntry { value, is_default });
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ValueEntry> {
        self.entries.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ValueEntry> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    getters! {
        string: String => &str, |v| v.as_str();
        string_list: StringList => &[String], |v| v.as_slice();
        bool: Bool => bool, |v| *v;
        bool_list: BoolList => &[bool], |v| v.as_slice();
        int: Int => isize, |v| *v;
        int_list: IntList => &[isize], |v| v.as_slice();
        int64: Int64 => i64, |v| *v;
        int64_list: Int64List => &[i64], |v| v.as_slice();
        uint: Uint => usize, |v| *v;
        uint_list: UintList => &[usize], |v| v.as_slice();
        uint64: Uint64 => u64, |v| *v;
        uint64_list: Uint64List => &[u64], |v| v.as_slice();
        float64: Float64 => f64, |v| *v;
        float64_list: Float64List => &[f64], |v| v.as_slice();
        duration: Duration => Duration, |v| *v;
        duration_list: DurationList => &[Duration], |v| v.as_slice();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_tags() {
        assert_eq!(ValueKind::String.to_string(), "string");
        assert_eq!(ValueKind::IntList.to_string(), "int list");
        assert_eq!(ValueKind::Float64.to_string(), "float64");
        assert!(ValueKind::DurationList.is_list());
        assert!(!ValueKind::Uint64.is_list());
    }

    #[test]
    fn parses_scalars() {
        assert_eq!(ValueKind::Bool.parse("true"), Ok(Value::Bool(true)));
        assert_eq!(ValueKind::Bool.parse("0"), Ok(Value::Bool(false)));
        assert!(ValueKind::Bool.parse("yes").is_err());
        assert_eq!(ValueKind::Int.parse("-12"), Ok(Value::Int(-12)));
        assert!(ValueKind::Uint.parse("-1").is_err());
        assert_eq!(ValueKind::Float64.parse("1.5"), Ok(Value::Float64(1.5)));
        assert_eq!(
            ValueKind::Duration.parse("1m30s"),
            Ok(Value::Duration(Duration::from_secs(90)))
        );
    }

    #[test]
    fn parses_lists() {
        let items: Vec<String> = vec!["1".into(), "2".into()];
        assert_eq!(ValueKind::IntList.parse_list(&items), Ok(Value::IntList(vec![1, 2])));
        let err = ValueKind::BoolList.parse_list(&["true".into(), "x".into()]).unwrap_err();
        assert_eq!(err.kind, ValueKind::Bool);
        assert_eq!(err.value, "x");
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("300ms"), Some(Duration::from_millis(300)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("2h45m"), Some(Duration::from_secs(9900)));
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("5x"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn display() {
        assert_eq!(Value::StringList(vec!["a".into(), "b".into()]).to_string(), "[a b]");
        assert_eq!(Value::IntList(vec![]).to_string(), "[]");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn typed_getters() {
        let mut map = ValueMap::new();
        map.insert("host", Value::String("www.test.com".into()), false);
        map.insert("verbose", Value::Bool(true), true);
        assert_eq!(map.string("host"), Some("www.test.com"));
        assert_eq!(map.bool("verbose"), Some(true));
        assert!(map.is_default("verbose"));
        assert_eq!(map.int("host"), None);
        assert_eq!(map.string("missing"), None);
    }
}
