//! Error types shared by the parser, the dispatcher and the shell session.

use thiserror;

use crate::value::ValueError;

/// Error when building the application or registering commands, flags and args.
///
/// These indicate a programming mistake and are reported before anything runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    /// The application configuration is not usable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Two flags, args, commands or aliases share a name.
    #[error("{kind} '{name}' registered twice")]
    DuplicateRegistration { kind: &'static str, name: String },
    /// Given name cannot be typed on a command line.
    #[error("invalid {kind} name '{name}': {reason}")]
    MalformedName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },
    /// Command name is one of the built-in command names.
    #[error("'{0}' is a reserved command name")]
    ReservedName(String),
    /// List argument with `max < min`.
    #[error("argument '{name}': max ({max}) must not be less than min ({min})")]
    InvalidListBounds { name: String, min: usize, max: usize },
    /// Default value does not have the type of the flag or argument.
    #[error("default value of '{name}' must be of type {expected}")]
    MismatchedDefault { name: String, expected: String },
}

/// Error while splitting a line into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("no closing quotation")]
    NoClosingQuote,
    #[error("no escaped character")]
    NoEscapedCharacter,
}

/// Error while matching user input against the command tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),
    #[error("invalid flag: {0}")]
    InvalidFlag(String),
    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),
    #[error("invalid value for flag {flag}")]
    InvalidFlagValue {
        flag: String,
        #[source]
        source: ValueError,
    },
    #[error("invalid value for argument '{arg}'")]
    InvalidArgValue {
        arg: String,
        #[source]
        source: ValueError,
    },
    #[error("missing argument '{0}'")]
    MissingArgument(String),
    #[error("invalid usage of command '{command}' (unconsumed input '{input}'), try 'help'")]
    UnconsumedInput { command: String, input: String },
    #[error("argument '{name}' requires {bound} {count} element(s), got {got}")]
    ListBounds {
        name: String,
        bound: &'static str,
        count: usize,
        got: usize,
    },
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Error raised by the modal shell verbs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("command '{0}' not found")]
    CommandNotFound(String),
    #[error("no command selected, please use 'use <command>' first")]
    NoSelection,
    #[error("all arguments must be set before 'run' (missing: {})", .0.join(", "))]
    UnsetArguments(Vec<String>),
}
