//! Command tree framework for one-shot command line tools and modal shells.
//!
//! An [`App`] holds a tree of [`Command`]s with typed [`Flag`]s and [`Arg`]s.
//! Started with arguments it runs a single command; started without, it opens
//! an interactive shell where a command can be selected with `use`, configured
//! with `setf`/`seta` and executed with `run`.

pub mod app;
pub mod args;
mod builtins;
pub mod command;
pub mod completion;
mod dispatch;
pub mod editor;
pub mod error;
pub mod flags;
mod help;
pub mod lex;
pub mod repl;
#[cfg(test)]
mod testing;
pub mod value;

pub use app::{App, AppBuilder, Config};
pub use args::{Arg, Args};
pub use command::{Command, CommandPath, CommandStatus, Commands, Context};
pub use completion::{Completions, TreeCompleter};
pub use editor::{LineEditor, RustylineEditor};
pub use error::{BuilderError, LexError, ParseError, SessionError};
pub use flags::{Flag, Flags};
pub use help::CORE_COMMANDS;
pub use repl::{LoopStatus, Session};
pub use value::{ArgMap, FlagMap, Value, ValueEntry, ValueError, ValueKind, ValueMap};

pub use colored::Color;
pub use rustyline::error::ReadlineError;
