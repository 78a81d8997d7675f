//! Positional arguments of commands.

use crate::error::{BuilderError, ParseError};
use crate::lex;
use crate::value::{ArgMap, Value, ValueKind};

/// Description of a positional argument.
///
/// List arguments take a single comma separated token and are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    name: String,
    help: String,
    kind: ValueKind,
    default: Option<Value>,
    optional: bool,
    min: Option<usize>,
    max: Option<usize>,
}

macro_rules! constructors {
    ($( $name:ident => $kind:ident ),+ $(,)?) => {
        $(
            pub fn $name(name: impl Into<String>) -> Self {
                Self::new(name, ValueKind::$kind)
            }
        )+
    };
}

impl Arg {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Arg {
            name: name.into(),
            help: String::new(),
            kind,
            default: None,
            optional: kind.is_list(),
            min: None,
            max: None,
        }
    }

    constructors! {
        string => String,
        string_list => StringList,
        bool => Bool,
        bool_list => BoolList,
        int => Int,
        int_list => IntList,
        int64 => Int64,
        int64_list => Int64List,
        uint => Uint,
        uint_list => UintList,
        uint64 => Uint64,
        uint64_list => Uint64List,
        float64 => Float64,
        float64_list => Float64List,
        duration => Duration,
        duration_list => DurationList,
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Value used when the argument is not given. Makes the argument optional.
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.optional = true;
        self
    }

    /// Minimum number of elements of a list argument.
    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    /// Maximum number of elements of a list argument.
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_list(&self) -> bool {
        self.kind.is_list()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    fn check_bounds(&self, got: usize) -> Result<(), ParseError> {
        let violated = match (self.min, self.max) {
            (Some(min), _) if got < min => Some(("at least", min)),
            (_, Some(max)) if got > max => Some(("at most", max)),
            _ => None,
        };
        match violated {
            Some((bound, count)) => Err(ParseError::ListBounds {
                name: self.name.clone(),
                bound,
                count,
                got,
            }),
            None => Ok(()),
        }
    }

    /// Parse a single shell token. List bounds are checked before element types.
    pub(crate) fn parse_token(&self, token: &str) -> Result<Value, ParseError> {
        let invalid = |source| ParseError::InvalidArgValue {
            arg: self.name.clone(),
            source,
        };
        if self.kind.is_list() {
            let items = lex::split_list(token)?;
            self.check_bounds(items.len())?;
            self.kind.parse_list(&items).map_err(invalid)
        } else {
            self.kind.parse(lex::trim_quotes(token)).map_err(invalid)
        }
    }

    /// Value of an argument that was not given: its default or an empty list.
    pub(crate) fn fallback(&self) -> Option<Value> {
        self.default.clone().or_else(|| self.kind.empty_list())
    }
}

/// Ordered collection of positional arguments owned by a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    list: Vec<Arg>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument, validating its name, bounds and default.
    pub fn register(&mut self, arg: Arg) -> Result<(), BuilderError> {
        if arg.name.is_empty() || arg.name.contains(char::is_whitespace) {
            return Err(BuilderError::MalformedName {
                kind: "argument",
                name: arg.name,
                reason: "must be a single non-empty word",
            });
        }
        if self.get(&arg.name).is_some() {
            return Err(BuilderError::DuplicateRegistration {
                kind: "argument",
                name: arg.name,
            });
        }
        if !arg.is_list() && (arg.min.is_some() || arg.max.is_some()) {
            return Err(BuilderError::InvalidConfiguration(format!(
                "argument '{}': min/max only apply to list arguments",
                arg.name
            )));
        }
        if let (Some(min), Some(max)) = (arg.min, arg.max) {
            if max < min {
                return Err(BuilderError::InvalidListBounds {
                    name: arg.name,
                    min,
                    max,
                });
            }
        }
        if let Some(default) = &arg.default {
            if default.kind() != arg.kind {
                return Err(BuilderError::MismatchedDefault {
                    name: arg.name,
                    expected: arg.kind.to_string(),
                });
            }
        }
        self.list.push(arg);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.list.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Parse arguments in registration order and return the unconsumed tokens.
    ///
    /// Nothing is written to `res` when parsing fails.
    pub fn parse(&self, args: &[String], res: &mut ArgMap) -> Result<Vec<String>, ParseError> {
        let mut rest = args;
        let mut parsed = Vec::with_capacity(self.list.len());
        for arg in &self.list {
            match rest.split_first() {
                None if !arg.optional => {
                    return Err(ParseError::MissingArgument(arg.name.clone()));
                }
                None => {
                    if let Some(value) = arg.fallback() {
                        parsed.push((arg.name.as_str(), value, true));
                    }
                }
                Some((token, tail)) => {
                    parsed.push((arg.name.as_str(), arg.parse_token(token)?, false));
                    rest = tail;
                }
            }
        }
        for (name, value, is_default) in parsed {
            res.insert(name, value, is_default);
        }
        Ok(rest.to_vec())
    }
}
