//! Typed flags of commands and of the application itself.

use std::time::Duration;

use crate::error::{BuilderError, ParseError};
use crate::lex;
use crate::value::{FlagMap, Value, ValueKind};

/// Description of a single flag.
///
/// ```rust
/// # use modal_shell::Flag;
/// let flag = Flag::bool("boolf", true).short('b').help("enable the check");
/// assert_eq!(flag.long_name(), "boolf");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    short: Option<char>,
    long: String,
    help: String,
    default: Value,
    show_default: bool,
}

impl Flag {
    /// Flag with an arbitrary default; its type is the type of the default.
    pub fn new(long: impl Into<String>, default: Value) -> Self {
        Flag {
            short: None,
            long: long.into(),
            help: String::new(),
            show_default: !matches!(default, Value::Bool(_)),
            default,
        }
    }

    pub fn string(long: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(long, Value::String(default.into()))
    }

    pub fn string_list<I, S>(long: impl Into<String>, default: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(long, Value::StringList(default.into_iter().map(Into::into).collect()))
    }

    pub fn bool(long: impl Into<String>, default: bool) -> Self {
        Self::new(long, Value::Bool(default))
    }

    pub fn int(long: impl Into<String>, default: isize) -> Self {
        Self::new(long, Value::Int(default))
    }

    pub fn int64(long: impl Into<String>, default: i64) -> Self {
        Self::new(long, Value::Int64(default))
    }

    pub fn uint(long: impl Into<String>, default: usize) -> Self {
        Self::new(long, Value::Uint(default))
    }

    pub fn uint64(long: impl Into<String>, default: u64) -> Self {
        Self::new(long, Value::Uint64(default))
    }

    pub fn float64(long: impl Into<String>, default: f64) -> Self {
        Self::new(long, Value::Float64(default))
    }

    pub fn duration(long: impl Into<String>, default: Duration) -> Self {
        Self::new(long, Value::Duration(default))
    }

    /// Single character shortcut, used as `-c`.
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Show the default value in help messages. Enabled for all but bool flags.
    pub fn show_default(mut self, show: bool) -> Self {
        self.show_default = show;
        self
    }

    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    pub fn long_name(&self) -> &str {
        &self.long
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> ValueKind {
        self.default.kind()
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn shows_default(&self) -> bool {
        self.show_default
    }

    fn matches(&self, token: &str) -> bool {
        match token.strip_prefix("--") {
            Some(long) => long == self.long,
            None => {
                let mut chars = token.chars();
                chars.next() == Some('-')
                    && self.short.is_some()
                    && chars.next() == self.short
                    && chars.next().is_none()
            }
        }
    }

    /// Parse the value of this flag, consuming the next token when the value was not
    /// given in the `--flag=VALUE` form. Returns the remaining tokens.
    fn parse_value<'t>(
        &self,
        token: &str,
        equal: Option<&str>,
        rest: &'t [String],
        res: &mut FlagMap,
    ) -> Result<&'t [String], ParseError> {
        let invalid = |source| ParseError::InvalidFlagValue {
            flag: token.to_string(),
            source,
        };
        let kind = self.kind();

        if kind == ValueKind::Bool {
            let value = match equal {
                Some(text) if !text.is_empty() => kind.parse(text).map_err(invalid)?,
                _ => Value::Bool(true),
            };
            res.insert(self.long.as_str(), value, false);
            return Ok(rest);
        }

        let (text, rest) = match equal {
            Some(text) => (text, rest),
            None => match rest.split_first() {
                Some((text, tail)) => (text.as_str(), tail),
                None => return Err(ParseError::MissingFlagValue(token.to_string())),
            },
        };

        let value = if kind.is_list() {
            let items = lex::split_list(text)?;
            let value = kind.parse_list(&items).map_err(invalid)?;
            // repeated occurrences accumulate, but never on top of the default
            match res.get(&self.long) {
                Some(entry) if !entry.is_default => {
                    let mut merged = entry.value.clone();
                    if merged.extend(value.clone()) {
                        merged
                    } else {
                        value
                    }
                }
                _ => value,
            }
        } else {
            kind.parse(lex::trim_quotes(text)).map_err(invalid)?
        };
        res.insert(self.long.as_str(), value, false);
        Ok(rest)
    }
}

/// Ordered collection of flags owned by a command (or by the application).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flags {
    list: Vec<Flag>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag, rejecting malformed or duplicate names.
    pub fn register(&mut self, flag: Flag) -> Result<(), BuilderError> {
        let malformed = |reason| BuilderError::MalformedName {
            kind: "flag",
            name: flag.long.clone(),
            reason,
        };
        if flag.long.is_empty() {
            return Err(malformed("long name must not be empty"));
        } else if flag.long.starts_with('-') {
            return Err(malformed("must not start with a '-'"));
        } else if flag.long.contains(|c: char| c.is_whitespace() || c == '=') {
            return Err(malformed("must not contain whitespace or '='"));
        }
        if let Some(short) = flag.short {
            if short == '-' || short == '=' || short.is_whitespace() {
                return Err(BuilderError::MalformedName {
                    kind: "flag shortcut",
                    name: short.to_string(),
                    reason: "must be a single printable character other than '-'",
                });
            }
        }
        for existing in &self.list {
            if flag.short.is_some() && existing.short == flag.short {
                return Err(BuilderError::DuplicateRegistration {
                    kind: "flag shortcut",
                    name: flag.short.map(String::from).unwrap_or_default(),
                });
            }
            if existing.long == flag.long {
                return Err(BuilderError::DuplicateRegistration {
                    kind: "flag",
                    name: flag.long,
                });
            }
        }
        self.list.push(flag);
        Ok(())
    }

    pub fn get(&self, long: &str) -> Option<&Flag> {
        self.list.iter().find(|f| f.long == long)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Parse all leading flags of `args` into `res` and return the remaining tokens.
    ///
    /// Parsing stops at the first token not starting with `-`, or after the `--`
    /// separator (which is dropped). Every flag without a value in `res` afterwards
    /// gets its default.
    pub fn parse(&self, args: &[String], res: &mut FlagMap) -> Result<Vec<String>, ParseError> {
        let mut rest = args;
        while let Some((first, tail)) = rest.split_first() {
            if !first.starts_with('-') {
                break;
            }
            rest = tail;
            if first == "--" {
                break;
            }
            let (token, equal) = match first.find('=') {
                Some(pos) if pos > 0 => (&first[..pos], Some(&first[pos + 1..])),
                _ => (first.as_str(), None),
            };
            let flag = self
                .list
                .iter()
                .find(|f| f.matches(token))
                .ok_or_else(|| ParseError::InvalidFlag(token.to_string()))?;
            rest = flag.parse_value(token, equal, rest, res)?;
        }

        for flag in &self.list {
            if !res.contains(&flag.long) {
                res.insert(flag.long.as_str(), flag.default.clone(), true);
            }
        }
        Ok(rest.to_vec())
    }

    /// Restore the default of a single flag. Returns `false` for unknown names.
    pub fn reset(&self, long: &str, res: &mut FlagMap) -> bool {
        match self.get(long) {
            Some(flag) => {
                res.insert(long, flag.default.clone(), true);
                true
            }
            None => false,
        }
    }

    /// Restore the defaults of all flags.
    pub fn reset_all(&self, res: &mut FlagMap) {
        for flag in &self.list {
            res.insert(flag.long.as_str(), flag.default.clone(), true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(s: &str) -> Vec<String> {
        lex::split(s).unwrap()
    }

    fn sample() -> Flags {
        let mut flags = Flags::new();
        flags.register(Flag::bool("verbose", false).short('v')).unwrap();
        flags.register(Flag::string("name", "anon").short('n')).unwrap();
        flags.register(Flag::string_list("tags", ["x"])).unwrap();
        flags.register(Flag::int("count", 1).short('c')).unwrap();
        flags.register(Flag::duration("timeout", Duration::from_secs(1))).unwrap();
        flags
    }

    #[test]
    fn register_rejects_bad_names() {
        let mut flags = sample();
        assert!(matches!(
            flags.register(Flag::bool("", false)),
            Err(BuilderError::MalformedName { .. })
        ));
        assert!(matches!(
            flags.register(Flag::bool("-x", false)),
            Err(BuilderError::MalformedName { .. })
        ));
        assert!(matches!(
            flags.register(Flag::bool("other", false).short('-')),
            Err(BuilderError::MalformedName { .. })
        ));
        assert!(matches!(
            flags.register(Flag::bool("verbose", false)),
            Err(BuilderError::DuplicateRegistration { kind: "flag", .. })
        ));
        assert!(matches!(
            flags.register(Flag::bool("other", false).short('v')),
            Err(BuilderError::DuplicateRegistration { kind: "flag shortcut", .. })
        ));
        assert_eq!(flags.len(), 5);
    }

    #[test]
    fn parses_leading_flags() {
        let flags = sample();
        let mut res = FlagMap::new();
        let rest = flags
            .parse(&words("-v --name bob -c=3 --timeout=1m rest --count 5"), &mut res)
            .unwrap();
        assert_eq!(rest, ["rest", "--count", "5"]);
        assert_eq!(res.bool("verbose"), Some(true));
        assert_eq!(res.string("name"), Some("bob"));
        assert_eq!(res.int("count"), Some(3));
        assert_eq!(res.duration("timeout"), Some(Duration::from_secs(60)));
        assert!(!res.is_default("count"));
        // defaults for the rest
        assert_eq!(res.string_list("tags"), Some(&["x".to_string()][..]));
        assert!(res.is_default("tags"));
    }

    #[test]
    fn every_flag_has_a_value() {
        let flags = sample();
        let mut res = FlagMap::new();
        assert!(flags.parse(&[], &mut res).unwrap().is_empty());
        assert_eq!(res.len(), flags.len());
        assert!(flags.iter().all(|f| res.is_default(f.long_name())));
    }

    #[test]
    fn double_dash_ends_flags() {
        let flags = sample();
        let mut res = FlagMap::new();
        let rest = flags.parse(&words("-v -- -c 3"), &mut res).unwrap();
        assert_eq!(rest, ["-c", "3"]);
        assert_eq!(res.int("count"), Some(1));
    }

    #[test]
    fn bool_forms() {
        let flags = sample();
        let mut res = FlagMap::new();
        flags.parse(&words("--verbose=false"), &mut res).unwrap();
        assert_eq!(res.bool("verbose"), Some(false));
        let mut res = FlagMap::new();
        let rest = flags.parse(&words("-v false"), &mut res).unwrap();
        assert_eq!(res.bool("verbose"), Some(true));
        assert_eq!(rest, ["false"]);
        assert!(matches!(
            flags.parse(&words("--verbose=nope"), &mut FlagMap::new()),
            Err(ParseError::InvalidFlagValue { .. })
        ));
    }

    #[test]
    fn list_values_accumulate() {
        let flags = sample();
        let mut res = FlagMap::new();
        flags.parse(&words("--tags=a,b --tags c"), &mut res).unwrap();
        assert_eq!(res.string_list("tags").unwrap(), ["a", "b", "c"]);
        // the default is replaced, not extended
        let mut res = FlagMap::new();
        flags.parse(&[], &mut res).unwrap();
        flags.parse(&words("--tags=y"), &mut res).unwrap();
        assert_eq!(res.string_list("tags").unwrap(), ["y"]);
    }

    #[test]
    fn string_values_lose_wrapping_quotes() {
        let flags = sample();
        let mut res = FlagMap::new();
        let args = lex::split_line(r#"--name="a b""#).unwrap();
        flags.parse(&args, &mut res).unwrap();
        assert_eq!(res.string("name"), Some("a b"));

        let mut res = FlagMap::new();
        flags.parse(&["--name='a b'".to_string()], &mut res).unwrap();
        assert_eq!(res.string("name"), Some("'a b'"));
    }

    #[test]
    fn parse_errors() {
        let flags = sample();
        assert_eq!(
            flags.parse(&words("--nope"), &mut FlagMap::new()),
            Err(ParseError::InvalidFlag("--nope".into()))
        );
        assert_eq!(
            flags.parse(&words("--name"), &mut FlagMap::new()),
            Err(ParseError::MissingFlagValue("--name".into()))
        );
        assert!(matches!(
            flags.parse(&words("-c x"), &mut FlagMap::new()),
            Err(ParseError::InvalidFlagValue { .. })
        ));
    }

    #[test]
    fn reset_restores_defaults() {
        let flags = sample();
        let mut res = FlagMap::new();
        flags.parse(&words("-c 7 -n bob"), &mut res).unwrap();
        assert!(flags.reset("count", &mut res));
        assert_eq!(res.int("count"), Some(1));
        assert!(res.is_default("count"));
        assert!(!flags.reset("missing", &mut res));
        flags.reset_all(&mut res);
        assert_eq!(res.string("name"), Some("anon"));
    }
}
