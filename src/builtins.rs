//! Built-in commands and the modal verbs of the shell.

use std::io::Write;

use prettytable::{row, Table};
use tracing::debug;

use crate::args::Arg;
use crate::command::{Command, CommandPath, CommandStatus, Commands};
use crate::completion::TreeCompleter;
use crate::dispatch;
use crate::editor::LineEditor;
use crate::error::{BuilderError, ParseError, SessionError};
use crate::help::CORE_COMMANDS;
use crate::lex;
use crate::repl::Session;
use crate::value::{ArgMap, FlagMap};

/// Framework provided commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Help,
    Exit,
    Clear,
    Use,
    Back,
    Show,
    Setf,
    Seta,
    Unsetf,
    Unseta,
    Run,
}

/// Commands only registered when running as a shell.
const SHELL_ONLY: [Builtin; 10] = [
    Builtin::Exit,
    Builtin::Clear,
    Builtin::Use,
    Builtin::Back,
    Builtin::Show,
    Builtin::Setf,
    Builtin::Seta,
    Builtin::Unsetf,
    Builtin::Unseta,
    Builtin::Run,
];

impl Builtin {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Builtin::Help => "help",
            Builtin::Exit => "exit",
            Builtin::Clear => "clear",
            Builtin::Use => "use",
            Builtin::Back => "back",
            Builtin::Show => "show",
            Builtin::Setf => "setf",
            Builtin::Seta => "seta",
            Builtin::Unsetf => "unsetf",
            Builtin::Unseta => "unseta",
            Builtin::Run => "run",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Builtin> {
        std::iter::once(Builtin::Help)
            .chain(SHELL_ONLY)
            .find(|b| b.name() == name)
    }

    /// Names of the positional words, `help` takes any number of them.
    fn params(self) -> &'static [&'static str] {
        match self {
            Builtin::Use => &["command"],
            Builtin::Setf => &["flag", "value"],
            Builtin::Seta => &["arg", "value"],
            Builtin::Unsetf => &["flag"],
            Builtin::Unseta => &["arg"],
            _ => &[],
        }
    }

    fn command<'a>(self) -> Command<'a> {
        let cmd = Command::builtin(self.name(), self).help_group(CORE_COMMANDS);
        match self {
            Builtin::Help => cmd
                .help("use 'help [command]' for command help")
                .arg(Arg::string_list("command").help("path of the command")),
            Builtin::Exit => cmd.help("exit the shell"),
            Builtin::Clear => cmd.help("clear the screen"),
            Builtin::Use => cmd
                .help("select a command")
                .usage("use <command|alias|path>")
                .arg(Arg::string("command").help("name, alias or path of the command")),
            Builtin::Back => cmd.help("go back to the previous selection"),
            Builtin::Show => cmd.help("show flag and argument values of the selected command"),
            Builtin::Setf => cmd
                .help("set a flag of the selected command")
                .usage("setf <flag> <value>")
                .arg(Arg::string("flag").help("long flag name"))
                .arg(Arg::string("value")),
            Builtin::Seta => cmd
                .help("set an argument of the selected command")
                .usage("seta <arg> <value>")
                .arg(Arg::string("arg").help("argument name"))
                .arg(Arg::string("value")),
            Builtin::Unsetf => cmd
                .help("restore the default of a flag")
                .usage("unsetf <flag|all>")
                .arg(Arg::string("flag").help("long flag name or 'all'")),
            Builtin::Unseta => cmd
                .help("clear an argument")
                .usage("unseta <arg|all>")
                .arg(Arg::string("arg").help("argument name or 'all'")),
            Builtin::Run => cmd.help("run the selected command"),
        }
    }

    /// Check the number of words given to the verb.
    fn check_words(self, words: &[String]) -> Result<(), ParseError> {
        let params = self.params();
        if self == Builtin::Help {
            return Ok(());
        }
        if let Some(missing) = params.get(words.len()) {
            return Err(ParseError::MissingArgument(missing.to_string()));
        }
        if words.len() > params.len() {
            return Err(ParseError::UnconsumedInput {
                command: self.name().to_string(),
                input: lex::join(&words[params.len()..]),
            });
        }
        Ok(())
    }
}

/// Add `help`, and in shell mode all the other built-in commands.
pub(crate) fn register(commands: &mut Commands<'_>, shell: bool) -> Result<(), BuilderError> {
    commands.add(Builtin::Help.command())?;
    if shell {
        for builtin in SHELL_ONLY {
            commands.add(builtin.command())?;
        }
    }
    Ok(())
}

fn walk(mut level: &Commands<'_>, mut path: CommandPath, segments: &[String]) -> Option<CommandPath> {
    for segment in segments {
        let cmd = level.get(segment)?;
        path.push(cmd.name.clone());
        level = &cmd.commands;
    }
    Some(path)
}

impl<'a, E: LineEditor<'a>> Session<'a, E> {
    pub(crate) fn run_builtin(&mut self, builtin: Builtin, words: &[String]) -> anyhow::Result<CommandStatus> {
        builtin.check_words(words)?;
        debug!(verb = builtin.name(), ?words, "built-in command");
        match builtin {
            Builtin::Help => {
                let scope = self.current.clone();
                self.app.print_help(scope.as_deref(), words)?;
            }
            Builtin::Exit => return Ok(CommandStatus::Quit),
            Builtin::Clear => self.editor.clear_screen()?,
            Builtin::Use => self.select(&words[0])?,
            Builtin::Back => self.back()?,
            Builtin::Show => self.show()?,
            Builtin::Setf => self.set_flag(&words[0], &words[1])?,
            Builtin::Seta => self.set_arg(&words[0], &words[1])?,
            Builtin::Unsetf => self.unset_flag(&words[0])?,
            Builtin::Unseta => self.unset_arg(&words[0])?,
            Builtin::Run => return self.run_selected(),
        }
        Ok(CommandStatus::Done)
    }

    fn selection(&self) -> Result<CommandPath, SessionError> {
        let path = self.current.clone().ok_or(SessionError::NoSelection)?;
        if self.app.commands.borrow().resolve(&path).is_none() {
            return Err(SessionError::NoSelection);
        }
        Ok(path)
    }

    /// Resolve a name, alias or path. Relative targets are looked up below the
    /// selection first and from the root second.
    fn lookup(&self, target: &str) -> Option<CommandPath> {
        let root = self.app.commands.borrow();
        let segments: Vec<String> = target
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if segments.is_empty() {
            return None;
        }
        let relative = match (&self.current, target.starts_with('/')) {
            (Some(current), false) => root
                .resolve(current)
                .and_then(|cmd| walk(&cmd.commands, current.clone(), &segments)),
            _ => None,
        };
        let path = relative.or_else(|| walk(&root, Vec::new(), &segments))?;
        match root.resolve(&path) {
            Some(cmd) if !cmd.is_builtin() => Some(path),
            _ => None,
        }
    }

    /// Whether `path` can be reached from the selection by going back.
    fn on_back_chain(&self, path: &[String]) -> bool {
        let root = self.app.commands.borrow();
        let mut visited: Vec<CommandPath> = Vec::new();
        let mut cursor = self.current.clone();
        while let Some(step) = cursor {
            if step == path {
                return true;
            }
            if visited.contains(&step) {
                break;
            }
            cursor = root.resolve(&step).and_then(|cmd| cmd.previous.clone());
            visited.push(step);
        }
        false
    }

    fn select(&mut self, target: &str) -> anyhow::Result<()> {
        let target = lex::unquote(target)?;
        let path = self
            .lookup(&target)
            .ok_or_else(|| SessionError::CommandNotFound(target.clone()))?;
        let on_chain = self.on_back_chain(&path);
        {
            let mut root = self.app.commands.borrow_mut();
            let cmd = root
                .resolve_mut(&path)
                .ok_or_else(|| SessionError::CommandNotFound(target.clone()))?;
            if !on_chain {
                cmd.previous = self.current.clone();
            }
            cmd.init_values()?;
        }
        debug!(path = %path.join("/"), "selected command");
        self.enter(Some(path));
        Ok(())
    }

    fn back(&mut self) -> anyhow::Result<()> {
        let current = match &self.current {
            Some(current) => current.clone(),
            None => return Ok(()),
        };
        let previous = {
            let mut root = self.app.commands.borrow_mut();
            // a previous selection that was removed meanwhile means the root
            let previous = root
                .resolve(&current)
                .and_then(|cmd| cmd.previous.clone())
                .filter(|p| root.resolve(p).is_some());
            if let Some(cmd) = previous.as_ref().and_then(|p| root.resolve_mut(p)) {
                cmd.init_values()?;
            }
            previous
        };
        debug!(from = %current.join("/"), "going back");
        self.enter(previous);
        Ok(())
    }

    /// Make `path` the selection, updating the prompt and the completion scope.
    fn enter(&mut self, path: Option<CommandPath>) {
        self.prompt = {
            let root = self.app.commands.borrow();
            let prompt = match path.as_deref().and_then(|p| root.resolve(p)) {
                Some(cmd) => format!("{} {}({}) >> ", self.app.config.name, cmd.name, cmd.parent_path),
                None => self.app.config.prompt.clone(),
            };
            prompt
        };
        self.editor
            .set_completer(TreeCompleter::new(self.app.commands.clone(), path.clone()));
        self.current = path;
    }

    fn set_flag(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let path = self.selection()?;
        let name = lex::unquote(name)?;
        let value = lex::unquote(value)?;
        let mut root = self.app.commands.borrow_mut();
        let cmd = root.resolve_mut(&path).ok_or(SessionError::NoSelection)?;
        if cmd.flags.get(&name).is_none() {
            debug!(flag = %name, "setf ignored, no such flag");
            return Ok(());
        }
        let mut values = cmd.flag_values.clone().unwrap_or_default();
        cmd.flags.parse(&[format!("--{}={}", name, value)], &mut values)?;
        cmd.flag_values = Some(values);
        Ok(())
    }

    fn set_arg(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let path = self.selection()?;
        let name = lex::unquote(name)?;
        let mut root = self.app.commands.borrow_mut();
        let cmd = root.resolve_mut(&path).ok_or(SessionError::NoSelection)?;
        let arg = match cmd.args.get(&name) {
            Some(arg) => arg,
            None => {
                debug!(arg = %name, "seta ignored, no such argument");
                return Ok(());
            }
        };
        // list values are split on commas by the argument itself
        let text = if arg.is_list() {
            value.to_string()
        } else {
            lex::unquote(value)?
        };
        let parsed = arg.parse_token(&text)?;
        cmd.arg_values
            .get_or_insert_with(ArgMap::new)
            .insert(name, parsed, false);
        Ok(())
    }

    fn unset_flag(&mut self, target: &str) -> anyhow::Result<()> {
        let path = self.selection()?;
        let target = lex::unquote(target)?;
        let mut root = self.app.commands.borrow_mut();
        let cmd = root.resolve_mut(&path).ok_or(SessionError::NoSelection)?;
        let values = cmd.flag_values.get_or_insert_with(FlagMap::new);
        if target == "all" {
            cmd.flags.reset_all(values);
        } else if !cmd.flags.reset(&target, values) {
            debug!(flag = %target, "unsetf ignored, no such flag");
        }
        Ok(())
    }

    fn unset_arg(&mut self, target: &str) -> anyhow::Result<()> {
        let path = self.selection()?;
        let target = lex::unquote(target)?;
        let mut root = self.app.commands.borrow_mut();
        let cmd = root.resolve_mut(&path).ok_or(SessionError::NoSelection)?;
        let values = cmd.arg_values.get_or_insert_with(ArgMap::new);
        for arg in cmd.args.iter() {
            if target == "all" || arg.name() == target {
                values.remove(arg.name());
            }
        }
        Ok(())
    }

    fn show(&mut self) -> anyhow::Result<()> {
        let path = self.selection()?;
        let table = {
            let root = self.app.commands.borrow();
            let cmd = root.resolve(&path).ok_or(SessionError::NoSelection)?;
            let mut table = Table::new();
            table.set_titles(row!["Name", "Value", "Kind", "Type", "Description"]);
            let flag_values = cmd.flag_values.as_ref();
            for flag in cmd.flags.iter().filter(|f| f.long_name() != "help") {
                let value = flag_values
                    .and_then(|values| values.value(flag.long_name()))
                    .map(ToString::to_string)
                    .unwrap_or_default();
                table.add_row(row![flag.long_name(), value, "flag", flag.kind(), flag.help_text()]);
            }
            let arg_values = cmd.arg_values.as_ref();
            for arg in cmd.args.iter() {
                let value = arg_values
                    .and_then(|values| values.value(arg.name()))
                    .map(ToString::to_string)
                    .unwrap_or_default();
                table.add_row(row![arg.name(), value, "arg", arg.kind(), arg.help_text()]);
            }
            table
        };
        write!(self.app.out, "{}", table)?;
        Ok(())
    }

    fn run_selected(&mut self) -> anyhow::Result<CommandStatus> {
        let path = self.selection()?;
        let (flags, args) = {
            let root = self.app.commands.borrow();
            let cmd = root.resolve(&path).ok_or(SessionError::NoSelection)?;
            let flags = cmd.flag_values.clone().unwrap_or_default();
            if flags.bool("help") == Some(true) || !cmd.has_handler() {
                (self.app.command_help_printer)(&mut *self.app.out, &self.app.config, cmd, true)?;
                return Ok(CommandStatus::Done);
            }
            let args = cmd.arg_values.clone().unwrap_or_default();
            // defaults do not count, every argument needs a 'seta'
            let missing: Vec<String> = cmd
                .args
                .iter()
                .filter(|a| !args.contains(a.name()))
                .map(|a| a.name().to_string())
                .collect();
            if !missing.is_empty() {
                return Err(SessionError::UnsetArguments(missing).into());
            }
            (dispatch::merge(&[flags], &self.app.flag_values), args)
        };
        self.app.invoke(&path, flags, args)
    }
}
