//! Command tree: commands, their children and the handler context.

use std::io::Write;

use anyhow;

use crate::args::{Arg, Args};
use crate::builtins::Builtin;
use crate::error::{BuilderError, ParseError};
use crate::flags::{Flag, Flags};
use crate::value::{ArgMap, FlagMap};

/// Names of the commands from the root to a command (the command itself included).
pub type CommandPath = Vec<String>;

/// Command handler.
pub type Handler<'a> = Box<dyn FnMut(&mut Context<'_, 'a>) -> anyhow::Result<CommandStatus> + 'a>;

/// Custom completion hook, called with the word being completed and the words
/// following the command. Returns full words, not only the missing suffixes.
pub type CompleterHook<'a> = Box<dyn Fn(&str, &[String]) -> Vec<String> + 'a>;

/// Result of a successful command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Done,
    Quit,
}

/// Everything a handler gets to see.
pub struct Context<'c, 'a> {
    /// Name of the executed command.
    pub name: String,
    /// Flag values merged along the command path, including global flags.
    pub flags: FlagMap,
    pub args: ArgMap,
    /// Whether the application runs as an interactive shell.
    pub shell: bool,
    /// The whole command tree. Changes become visible from the next shell turn.
    pub commands: &'c mut Commands<'a>,
    pub out: &'c mut dyn Write,
    pub(crate) prompt: Option<String>,
}

impl<'c, 'a> Context<'c, 'a> {
    /// Replace the shell prompt until the selection changes.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = Some(prompt.into());
    }
}

/// A node of the command tree.
///
/// Commands are built with chained calls; registration errors are kept and
/// reported when the command is added to the application.
///
/// ```rust
/// # use modal_shell::{Arg, Command, CommandStatus, Flag};
/// let cmd = Command::new("cdnChkD")
///     .help("check whether a domain is behind a CDN")
///     .flag(Flag::bool("boolf", true).short('b'))
///     .arg(Arg::string("host"))
///     .run(|ctx| {
///         writeln!(ctx.out, "host: {}", ctx.args.string("host").unwrap_or_default())?;
///         Ok(CommandStatus::Done)
///     });
/// ```
pub struct Command<'a> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) help: String,
    pub(crate) long_help: String,
    pub(crate) usage: String,
    pub(crate) help_group: String,
    pub(crate) flags: Flags,
    pub(crate) args: Args,
    pub(crate) commands: Commands<'a>,
    pub(crate) handler: Option<Handler<'a>>,
    pub(crate) completer: Option<CompleterHook<'a>>,
    pub(crate) parent_path: String,
    pub(crate) builtin: Option<Builtin>,
    invalid: Option<BuilderError>,
    // shell state, initialised on first selection
    pub(crate) flag_values: Option<FlagMap>,
    pub(crate) arg_values: Option<ArgMap>,
    /// Selection active before this command was selected, `None` being the root.
    pub(crate) previous: Option<CommandPath>,
}

impl<'a> Command<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Command {
            name: name.into(),
            aliases: Vec::new(),
            help: String::new(),
            long_help: String::new(),
            usage: String::new(),
            help_group: String::new(),
            flags: Flags::new(),
            args: Args::new(),
            commands: Commands::new(),
            handler: None,
            completer: None,
            parent_path: "/".into(),
            builtin: None,
            invalid: None,
            flag_values: None,
            arg_values: None,
            previous: None,
        }
    }

    fn keep_error(&mut self, result: Result<(), BuilderError>) {
        if let Err(err) = result {
            self.invalid.get_or_insert(err);
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// One line description shown in command listings.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Description shown in the help of this command, defaults to [`Command::help`].
    pub fn long_help(mut self, long_help: impl Into<String>) -> Self {
        self.long_help = long_help.into();
        self
    }

    /// Usage line, generated from flags and arguments when empty.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Heading under which the command is listed in help.
    pub fn help_group(mut self, group: impl Into<String>) -> Self {
        self.help_group = group.into();
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        let result = self.flags.register(flag);
        self.keep_error(result);
        self
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        let result = self.args.register(arg);
        self.keep_error(result);
        self
    }

    pub fn subcommand(mut self, cmd: Command<'a>) -> Self {
        let result = self.commands.add(cmd);
        self.keep_error(result);
        self
    }

    pub fn run<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut Context<'_, 'a>) -> anyhow::Result<CommandStatus> + 'a,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn completer<F>(mut self, completer: F) -> Self
    where
        F: Fn(&str, &[String]) -> Vec<String> + 'a,
    {
        self.completer = Some(Box::new(completer));
        self
    }

    pub(crate) fn builtin(name: &str, builtin: Builtin) -> Self {
        let mut cmd = Command::new(name);
        cmd.builtin = Some(builtin);
        cmd
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn commands(&self) -> &Commands<'a> {
        &self.commands
    }

    /// Slash separated names of the ancestors, `/` for top level commands.
    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin.is_some()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Flag values collected in the shell with `setf`, if the command was ever selected.
    pub fn flag_values(&self) -> Option<&FlagMap> {
        self.flag_values.as_ref()
    }

    /// Argument values collected in the shell with `seta`, if the command was ever selected.
    pub fn arg_values(&self) -> Option<&ArgMap> {
        self.arg_values.as_ref()
    }

    /// Path of this command's own children, e.g. `/s1` for the children of `s1`.
    pub(crate) fn path_string(&self) -> String {
        if self.parent_path.ends_with('/') {
            format!("{}{}", self.parent_path, self.name)
        } else {
            format!("{}/{}", self.parent_path, self.name)
        }
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    fn validate(&self) -> Result<(), BuilderError> {
        if let Some(err) = &self.invalid {
            return Err(err.clone());
        }
        for name in std::iter::once(&self.name).chain(&self.aliases) {
            let reason = if name.is_empty() {
                Some("must not be empty")
            } else if name.starts_with('-') {
                Some("must not start with a '-'")
            } else if name.contains(|c: char| c.is_whitespace() || c == '/') {
                Some("must not contain whitespace or '/'")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(BuilderError::MalformedName {
                    kind: "command",
                    name: name.clone(),
                    reason,
                });
            }
            if self.builtin.is_none() && Builtin::from_name(name).is_some() {
                return Err(BuilderError::ReservedName(name.clone()));
            }
        }
        Ok(())
    }

    /// Fix the parent path of this command and its descendants and give all of
    /// them the `-h/--help` flag (the `help` command itself excluded).
    fn attach(&mut self, parent_path: &str) -> Result<(), BuilderError> {
        self.parent_path = parent_path.to_string();
        if self.builtin != Some(Builtin::Help) && self.flags.get("help").is_none() {
            self.flags
                .register(Flag::bool("help", false).short('h').help("display help"))?;
        }
        let own_path = self.path_string();
        for child in &mut self.commands.list {
            child.attach(&own_path)?;
        }
        Ok(())
    }

    /// Initialise the shell state: defaults for all flags, no arguments.
    pub(crate) fn init_values(&mut self) -> Result<(), ParseError> {
        if self.flag_values.is_none() {
            let mut values = FlagMap::new();
            self.flags.parse(&[], &mut values)?;
            self.flag_values = Some(values);
        }
        self.arg_values.get_or_insert_with(ArgMap::new);
        Ok(())
    }
}

impl<'a> std::fmt::Debug for Command<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("parent_path", &self.parent_path)
            .field("commands", &self.commands)
            .finish()
    }
}

/// Ordered set of sibling commands.
#[derive(Debug, Default)]
pub struct Commands<'a> {
    list: Vec<Command<'a>>,
    changed: bool,
}

impl<'a> Commands<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top level command. Names and aliases must be unique among siblings.
    pub fn add(&mut self, mut cmd: Command<'a>) -> Result<(), BuilderError> {
        cmd.validate()?;
        for name in std::iter::once(&cmd.name).chain(&cmd.aliases) {
            if self.get(name).is_some() {
                return Err(BuilderError::DuplicateRegistration {
                    kind: "command",
                    name: name.clone(),
                });
            }
        }
        cmd.attach("/")?;
        self.list.push(cmd);
        self.changed = true;
        Ok(())
    }

    /// Add a child below the command at `path`.
    pub fn add_at(&mut self, path: &[String], cmd: Command<'a>) -> Result<(), BuilderError> {
        let parent = self
            .resolve_mut(path)
            .ok_or_else(|| BuilderError::InvalidConfiguration(format!("no command at /{}", path.join("/"))))?;
        let parent_path = parent.path_string();
        parent.commands.add(cmd)?;
        if let Some(child) = parent.commands.list.last_mut() {
            child.attach(&parent_path)?;
        }
        self.changed = true;
        Ok(())
    }

    /// Remove the command with the given name (or alias).
    pub fn remove(&mut self, name: &str) -> Option<Command<'a>> {
        let pos = self.list.iter().position(|c| c.name == name)
            .or_else(|| self.list.iter().position(|c| c.matches(name)))?;
        self.changed = true;
        Some(self.list.remove(pos))
    }

    /// Look up by exact name first, then by alias.
    pub fn get(&self, name: &str) -> Option<&Command<'a>> {
        self.list
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.list.iter().find(|c| c.aliases.iter().any(|a| a == name)))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Command<'a>> {
        let pos = self.list.iter().position(|c| c.name == name)
            .or_else(|| self.list.iter().position(|c| c.matches(name)))?;
        self.list.get_mut(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command<'a>> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Walk down the tree as long as the words name commands.
    ///
    /// Returns the deepest command found (if any) and the words left over.
    pub fn find_command<'w>(&self, words: &'w [String]) -> (Option<&Command<'a>>, &'w [String]) {
        let mut found = None;
        let mut level = self;
        let mut rest = words;
        while let Some((word, tail)) = rest.split_first() {
            match level.get(word) {
                Some(cmd) => {
                    found = Some(cmd);
                    level = &cmd.commands;
                    rest = tail;
                }
                None => break,
            }
        }
        (found, rest)
    }

    /// Command at the given path of canonical names.
    pub fn resolve(&self, path: &[String]) -> Option<&Command<'a>> {
        let (first, rest) = path.split_first()?;
        let mut cmd = self.list.iter().find(|c| &c.name == first)?;
        for name in rest {
            cmd = cmd.commands.list.iter().find(|c| &c.name == name)?;
        }
        Some(cmd)
    }

    pub fn resolve_mut(&mut self, path: &[String]) -> Option<&mut Command<'a>> {
        let (first, rest) = path.split_first()?;
        let mut cmd = self.list.iter_mut().find(|c| &c.name == first)?;
        for name in rest {
            cmd = cmd.commands.list.iter_mut().find(|c| &c.name == name)?;
        }
        Some(cmd)
    }

    /// Sort every level by name and mark the tree as unchanged.
    pub fn sort_recursive(&mut self) {
        self.list.sort_by(|a, b| a.name.cmp(&b.name));
        for cmd in &mut self.list {
            cmd.commands.sort_recursive();
        }
        self.changed = false;
    }

    /// Whether a command was added or removed anywhere since the last sort.
    pub fn has_changed(&self) -> bool {
        self.changed || self.list.iter().any(|c| c.commands.has_changed())
    }
}
