//! Application: configuration, global flags and the entry points.

use std::cell::{Ref, RefCell, RefMut};
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{self, Context as _};
use colored::{Color, Colorize};
use tracing::debug;

use crate::builtins::{self, Builtin};
use crate::command::{Command, CommandStatus, Commands, Context};
use crate::completion::TreeCompleter;
use crate::dispatch;
use crate::editor::{LineEditor, RustylineEditor};
use crate::error::{BuilderError, ParseError, SessionError};
use crate::flags::{Flag, Flags};
use crate::help;
use crate::lex;
use crate::repl::{LoopStatus, Session};
use crate::value::{ArgMap, FlagMap};

/// Called once the global flags are parsed, before anything runs.
pub type InitHook<'a> = Box<dyn FnOnce(&mut App<'a>, &FlagMap) -> anyhow::Result<()> + 'a>;
/// Called right before the shell starts reading input.
pub type ShellHook<'a> = Box<dyn FnOnce(&mut App<'a>) -> anyhow::Result<()> + 'a>;
/// Called on every Ctrl-C with the number of consecutive interrupts.
pub type InterruptHandler<'a> = Box<dyn FnMut(&mut dyn Write, usize) -> anyhow::Result<LoopStatus> + 'a>;
/// Renders the application help, the last argument tells whether the shell runs.
pub type HelpPrinter<'a> =
    Box<dyn Fn(&mut dyn Write, &Config, &Commands<'a>, &Flags, bool) -> anyhow::Result<()> + 'a>;
/// Renders the help of a single command.
pub type CommandHelpPrinter<'a> = Box<dyn Fn(&mut dyn Write, &Config, &Command<'a>, bool) -> anyhow::Result<()> + 'a>;
/// Prints the banner when the shell starts.
pub type LogoPrinter<'a> = Box<dyn Fn(&mut dyn Write, &Config) -> anyhow::Result<()> + 'a>;

/// Application settings, see [`AppBuilder`] for their meaning and defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub multiline_prompt: String,
    pub text_width: usize,
    pub history_file: Option<PathBuf>,
    pub history_limit: usize,
    pub no_color: bool,
    pub prompt_color: Color,
    pub multiline_prompt_color: Color,
    pub error_color: Color,
    pub logo_color: Color,
    pub vim_mode: bool,
    pub with_hints: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: String::new(),
            description: String::new(),
            prompt: String::new(),
            multiline_prompt: "... ".into(),
            text_width: 80,
            history_file: None,
            history_limit: 500,
            no_color: false,
            prompt_color: Color::Yellow,
            multiline_prompt_color: Color::Yellow,
            error_color: Color::Red,
            logo_color: Color::Yellow,
            vim_mode: false,
            with_hints: true,
        }
    }
}

pub(crate) fn paint(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        text.color(color).to_string()
    } else {
        text.to_string()
    }
}

fn default_help(
    out: &mut dyn Write,
    config: &Config,
    commands: &Commands<'_>,
    flags: &Flags,
    shell: bool,
) -> anyhow::Result<()> {
    let text = help::app_help(&config.description, commands, flags, shell, config.text_width);
    writeln!(out, "{}", text)?;
    Ok(())
}

fn default_command_help(out: &mut dyn Write, config: &Config, cmd: &Command<'_>, shell: bool) -> anyhow::Result<()> {
    let prefix = (!shell).then(|| config.name.as_str());
    writeln!(out, "{}", help::command_help(cmd, prefix, config.text_width))?;
    Ok(())
}

fn default_interrupt_handler(out: &mut dyn Write, count: usize) -> anyhow::Result<LoopStatus> {
    if count >= 2 {
        writeln!(out, "interrupted")?;
        Ok(LoopStatus::Break)
    } else {
        writeln!(out, "input Ctrl-c once more to exit")?;
        Ok(LoopStatus::Continue)
    }
}

/// Builder for [`App`].
///
/// All setter methods take owned `self` so the calls can be chained, for example:
/// ```rust
/// # use modal_shell::App;
/// let app = App::builder()
///     .name("checktest")
///     .description("Check things")
///     .build()
///     .expect("Failed to build the application");
/// ```
pub struct AppBuilder<'a> {
    config: Config,
    flags: Vec<Flag>,
    commands: Vec<Command<'a>>,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    ascii_logo: Option<String>,
    on_init: Option<InitHook<'a>>,
    on_shell: Option<ShellHook<'a>>,
    interrupt_handler: InterruptHandler<'a>,
    help_printer: HelpPrinter<'a>,
    command_help_printer: CommandHelpPrinter<'a>,
    logo_printer: Option<LogoPrinter<'a>>,
}

impl<'a> Default for AppBuilder<'a> {
    fn default() -> Self {
        AppBuilder {
            config: Config::default(),
            flags: Vec::new(),
            commands: Vec::new(),
            out: Box::new(std::io::stdout()),
            err: Box::new(std::io::stderr()),
            ascii_logo: None,
            on_init: None,
            on_shell: None,
            interrupt_handler: Box::new(default_interrupt_handler),
            help_printer: Box::new(default_help),
            command_help_printer: Box::new(default_command_help),
            logo_printer: None,
        }
    }
}

macro_rules! setters {
    ($( $(#[$meta:meta])* $name:ident: $type:ty )+) => {
        $(
            $(#[$meta])*
            pub fn $name<T: Into<$type>>(mut self, v: T) -> Self {
                self.config.$name = v.into();
                self
            }
        )+
    };
}

impl<'a> AppBuilder<'a> {
    setters! {
        /// Application name, a single word. Required.
        name: String
        /// Shown at the top of the application help.
        description: String
        /// Prompt of the shell. Defaults to `"<name> >> "`.
        prompt: String
        /// Prompt used while a line is continued with a trailing `\`. Defaults to `"... "`.
        multiline_prompt: String
        /// Width used when wrapping help messages. Defaults to 80.
        text_width: usize
        /// Maximum number of history entries. Defaults to 500.
        history_limit: usize
        /// Disable colored output. Can also be requested with the global `--nocolor` flag.
        no_color: bool
        prompt_color: Color
        multiline_prompt_color: Color
        error_color: Color
        logo_color: Color
        /// Use vi key bindings instead of emacs ones.
        vim_mode: bool
        /// Show the rest of a command name when only one completion is possible.
        /// Defaults to `true`.
        with_hints: bool
    }

    /// File to load the history from and to save it to. No history is kept on
    /// disk by default.
    pub fn history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.history_file = Some(path.into());
        self
    }

    /// Where command output and help go. Defaults to [`std::io::Stdout`].
    ///
    /// Note that [`rustyline`] always draws the prompt on [`std::io::Stderr`].
    pub fn out(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    /// Where errors go. Defaults to [`std::io::Stderr`].
    pub fn err(mut self, err: impl Write + 'static) -> Self {
        self.err = Box::new(err);
        self
    }

    /// Banner printed when the shell starts.
    pub fn ascii_logo(mut self, logo: impl Into<String>) -> Self {
        self.ascii_logo = Some(logo.into());
        self
    }

    /// Add a global flag.
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Add a top level command.
    pub fn add(mut self, cmd: Command<'a>) -> Self {
        self.commands.push(cmd);
        self
    }

    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut App<'a>, &FlagMap) -> anyhow::Result<()> + 'a,
    {
        self.on_init = Some(Box::new(hook));
        self
    }

    pub fn on_shell<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut App<'a>) -> anyhow::Result<()> + 'a,
    {
        self.on_shell = Some(Box::new(hook));
        self
    }

    /// Replace the Ctrl-C handling. The default asks for a second Ctrl-C and
    /// leaves the shell on it.
    pub fn interrupt_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut dyn Write, usize) -> anyhow::Result<LoopStatus> + 'a,
    {
        self.interrupt_handler = Box::new(handler);
        self
    }

    /// Replace the rendering of the application help.
    pub fn print_help<F>(mut self, printer: F) -> Self
    where
        F: Fn(&mut dyn Write, &Config, &Commands<'a>, &Flags, bool) -> anyhow::Result<()> + 'a,
    {
        self.help_printer = Box::new(printer);
        self
    }

    /// Replace the rendering of command help, used by `help <command>`, `-h`
    /// and by commands without a handler.
    pub fn print_command_help<F>(mut self, printer: F) -> Self
    where
        F: Fn(&mut dyn Write, &Config, &Command<'a>, bool) -> anyhow::Result<()> + 'a,
    {
        self.command_help_printer = Box::new(printer);
        self
    }

    /// Replace the banner printing. Takes precedence over [`AppBuilder::ascii_logo`].
    pub fn print_logo<F>(mut self, printer: F) -> Self
    where
        F: Fn(&mut dyn Write, &Config) -> anyhow::Result<()> + 'a,
    {
        self.logo_printer = Some(Box::new(printer));
        self
    }

    /// Finalize the configuration and return the application or error.
    pub fn build(self) -> Result<App<'a>, BuilderError> {
        let mut config = self.config;
        if config.name.is_empty() || config.name.contains(char::is_whitespace) {
            return Err(BuilderError::InvalidConfiguration(
                "application name must be a single non-empty word".into(),
            ));
        }
        if config.history_limit == 0 {
            return Err(BuilderError::InvalidConfiguration(
                "history limit must be greater than zero".into(),
            ));
        }
        if config.text_width == 0 {
            return Err(BuilderError::InvalidConfiguration(
                "text width must be greater than zero".into(),
            ));
        }
        if config.prompt.is_empty() {
            config.prompt = format!("{} >> ", config.name);
        }

        let mut flags = Flags::new();
        flags.register(Flag::bool("help", false).short('h').help("display help"))?;
        flags.register(Flag::bool("nocolor", false).help("disable colored output"))?;
        for flag in self.flags {
            flags.register(flag)?;
        }
        let mut commands = Commands::new();
        for cmd in self.commands {
            commands.add(cmd)?;
        }

        Ok(App {
            config,
            flags,
            flag_values: FlagMap::new(),
            commands: Rc::new(RefCell::new(commands)),
            out: self.out,
            err: self.err,
            shell: false,
            ascii_logo: self.ascii_logo,
            on_init: self.on_init,
            on_shell: self.on_shell,
            interrupt_handler: self.interrupt_handler,
            help_printer: self.help_printer,
            command_help_printer: self.command_help_printer,
            logo_printer: self.logo_printer,
            next_prompt: None,
        })
    }
}

/// What a dispatched line turned out to be.
pub(crate) enum Outcome {
    Status(CommandStatus),
    /// A built-in command with its raw words.
    Builtin(Builtin, Vec<String>),
}

/// A command line application that runs either one command from the process
/// arguments or an interactive shell.
///
/// [`App`] is constructed using the builder pattern via [`App::builder()`].
pub struct App<'a> {
    pub(crate) config: Config,
    pub(crate) flags: Flags,
    pub(crate) flag_values: FlagMap,
    pub(crate) commands: Rc<RefCell<Commands<'a>>>,
    pub(crate) out: Box<dyn Write>,
    err: Box<dyn Write>,
    pub(crate) shell: bool,
    ascii_logo: Option<String>,
    on_init: Option<InitHook<'a>>,
    on_shell: Option<ShellHook<'a>>,
    pub(crate) interrupt_handler: InterruptHandler<'a>,
    help_printer: HelpPrinter<'a>,
    pub(crate) command_help_printer: CommandHelpPrinter<'a>,
    logo_printer: Option<LogoPrinter<'a>>,
    /// Prompt to show from the next shell turn on.
    pub(crate) next_prompt: Option<String>,
}

impl<'a> App<'a> {
    /// Start [`AppBuilder`] with default values.
    pub fn builder() -> AppBuilder<'a> {
        AppBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Values of the global flags, available once the application runs.
    pub fn flag_values(&self) -> &FlagMap {
        &self.flag_values
    }

    /// Whether the application runs as an interactive shell.
    pub fn is_shell(&self) -> bool {
        self.shell
    }

    pub fn commands(&self) -> Ref<'_, Commands<'a>> {
        self.commands.borrow()
    }

    pub fn commands_mut(&self) -> RefMut<'_, Commands<'a>> {
        self.commands.borrow_mut()
    }

    /// Add a top level command, for example from the init hook.
    pub fn add_command(&mut self, cmd: Command<'a>) -> Result<(), BuilderError> {
        self.commands.borrow_mut().add(cmd)
    }

    /// Change the prompt shown while no command is selected.
    pub fn set_default_prompt(&mut self, prompt: impl Into<String>) {
        self.config.prompt = prompt.into();
    }

    /// Change the shell prompt from the next line on, until the selection changes.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.next_prompt = Some(prompt.into());
    }

    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    /// Print an error with its causes to the error stream.
    pub fn print_error(&mut self, err: &anyhow::Error) -> std::io::Result<()> {
        let label = paint("error:", self.config.error_color, !self.config.no_color);
        writeln!(self.err, "{} {:#}", label, err)
    }

    /// Run with the arguments of the process.
    pub fn run(self) -> anyhow::Result<()> {
        self.run_with_args(std::env::args().skip(1))
    }

    /// Run one command if `args` names one, otherwise start the shell on the terminal.
    pub fn run_with_args<I, S>(self, args: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.launch(args, |app| {
            RustylineEditor::new(&app.config, TreeCompleter::new(app.commands.clone(), None))
        })
    }

    /// Like [`App::run_with_args`], reading shell input from `editor`.
    pub fn run_with_editor<I, S, E>(self, args: I, editor: E) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: LineEditor<'a>,
    {
        self.launch(args, move |_| Ok(editor))
    }

    /// Start a shell session without reading any process arguments.
    pub fn shell<E: LineEditor<'a>>(mut self, editor: E) -> anyhow::Result<Session<'a, E>> {
        self.prepare(&[])?;
        self.open_shell(editor)
    }

    fn launch<I, S, E, F>(mut self, args: I, make_editor: F) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: LineEditor<'a>,
        F: FnOnce(&App<'a>) -> anyhow::Result<E>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let rest = self.prepare(&args)?;
        if self.flag_values.bool("help") == Some(true) {
            let root = self.commands.borrow();
            return (self.help_printer)(&mut *self.out, &self.config, &*root, &self.flags, false);
        }
        if !self.shell {
            self.run_command(&rest)?;
            return Ok(());
        }
        let editor = make_editor(&self)?;
        self.open_shell(editor)?.run()
    }

    /// Parse the global flags, register the built-in commands and run the init hook.
    fn prepare(&mut self, args: &[String]) -> anyhow::Result<Vec<String>> {
        self.commands.borrow_mut().sort_recursive();
        let mut values = FlagMap::new();
        let rest = self
            .flags
            .parse(args, &mut values)
            .context("invalid global flags")?;
        self.flag_values = values;
        if self.flag_values.bool("nocolor") == Some(true) {
            self.config.no_color = true;
        }
        self.shell = rest.is_empty();
        builtins::register(&mut self.commands.borrow_mut(), self.shell)?;
        debug!(shell = self.shell, "application prepared");

        if let Some(hook) = self.on_init.take() {
            let flags = self.flag_values.clone();
            hook(self, &flags)?;
        }
        self.commands.borrow_mut().sort_recursive();
        Ok(rest)
    }

    fn open_shell<E: LineEditor<'a>>(mut self, mut editor: E) -> anyhow::Result<Session<'a, E>> {
        if let Some(hook) = self.on_shell.take() {
            hook(&mut self)?;
        }
        if let Some(printer) = &self.logo_printer {
            printer(&mut *self.out, &self.config)?;
        } else if let Some(logo) = &self.ascii_logo {
            let logo = paint(logo, self.config.logo_color, !self.config.no_color);
            writeln!(self.out, "{}", logo)?;
        }
        editor.set_completer(TreeCompleter::new(self.commands.clone(), None));
        Ok(Session::new(self, editor))
    }

    /// Execute a single command line outside the shell.
    fn run_command(&mut self, args: &[String]) -> anyhow::Result<CommandStatus> {
        match self.dispatch(None, args)? {
            Outcome::Status(status) => Ok(status),
            Outcome::Builtin(Builtin::Help, words) => {
                self.print_help(None, &words)?;
                Ok(CommandStatus::Done)
            }
            Outcome::Builtin(builtin, _) => {
                anyhow::bail!("'{}' is only available in the shell", builtin.name())
            }
        }
    }

    /// Match `args` against the tree and run the command, unless it is a
    /// built-in one, which is handed back to the caller.
    pub(crate) fn dispatch(&mut self, scope: Option<&[String]>, args: &[String]) -> anyhow::Result<Outcome> {
        let parsed = dispatch::parse(&self.commands.borrow(), scope, args, &self.flag_values)?;
        let arg_values = {
            let root = self.commands.borrow();
            let cmd = root
                .resolve(&parsed.path)
                .ok_or_else(|| SessionError::CommandNotFound(parsed.path.join(" ")))?;
            if parsed.flags.bool("help") == Some(true) || (!cmd.has_handler() && !cmd.is_builtin()) {
                (self.command_help_printer)(&mut *self.out, &self.config, cmd, self.shell)?;
                return Ok(Outcome::Status(CommandStatus::Done));
            }
            if let Some(builtin) = cmd.builtin {
                return Ok(Outcome::Builtin(builtin, parsed.rest));
            }
            let mut values = ArgMap::new();
            let rest = cmd.args.parse(&parsed.rest, &mut values)?;
            if !rest.is_empty() {
                return Err(ParseError::UnconsumedInput {
                    command: cmd.name.clone(),
                    input: lex::join(&rest),
                }
                .into());
            }
            values
        };
        let status = self.invoke(&parsed.path, parsed.flags, arg_values)?;
        Ok(Outcome::Status(status))
    }

    /// Call the handler of the command at `path`.
    ///
    /// The handler is taken out of the tree for the duration of the call so
    /// that it can modify the tree through its [`Context`].
    pub(crate) fn invoke(&mut self, path: &[String], flags: FlagMap, args: ArgMap) -> anyhow::Result<CommandStatus> {
        let handler = self
            .commands
            .borrow_mut()
            .resolve_mut(path)
            .and_then(|cmd| cmd.handler.take());
        let mut handler = match handler {
            Some(handler) => handler,
            None => return Ok(CommandStatus::Done),
        };
        debug!(path = %path.join("/"), "running command");
        let (result, prompt) = {
            let mut root = self.commands.borrow_mut();
            let mut ctx = Context {
                name: path.last().cloned().unwrap_or_default(),
                flags,
                args,
                shell: self.shell,
                commands: &mut *root,
                out: &mut *self.out,
                prompt: None,
            };
            let result = handler(&mut ctx);
            (result, ctx.prompt)
        };
        if prompt.is_some() {
            self.next_prompt = prompt;
        }
        // the command may have been removed or replaced by its own handler
        if let Some(cmd) = self.commands.borrow_mut().resolve_mut(path) {
            if cmd.handler.is_none() {
                cmd.handler = Some(handler);
            }
        }
        result
    }

    /// Help of the application, of the selected command or of the command named by `words`.
    pub(crate) fn print_help(&mut self, scope: Option<&[String]>, words: &[String]) -> anyhow::Result<()> {
        let root = self.commands.borrow();
        let selected = scope.and_then(|path| root.resolve(path));
        let found = if words.is_empty() {
            selected
        } else {
            let below = selected.and_then(|cmd| match cmd.commands.find_command(words) {
                (Some(found), []) => Some(found),
                _ => None,
            });
            let found = below.or_else(|| match root.find_command(words) {
                (Some(found), []) => Some(found),
                _ => None,
            });
            match found {
                Some(cmd) => Some(cmd),
                None => return Err(SessionError::CommandNotFound(lex::join(words)).into()),
            }
        };
        match found {
            Some(cmd) => (self.command_help_printer)(&mut *self.out, &self.config, cmd, self.shell),
            None => (self.help_printer)(&mut *self.out, &self.config, &*root, &self.flags, self.shell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_app, ScriptedEditor, SharedBuf};

    #[test]
    fn builder_requires_name() {
        assert!(matches!(
            App::builder().build(),
            Err(BuilderError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            App::builder().name("two words").build(),
            Err(BuilderError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn builder_defaults() {
        let app = App::builder().name("checktest").build().unwrap();
        assert_eq!(app.config().prompt, "checktest >> ");
        assert_eq!(app.config().multiline_prompt, "... ");
        assert_eq!(app.config().history_limit, 500);
        assert!(app.flags.get("nocolor").is_some());
    }

    #[test]
    fn builder_rejects_zero_history() {
        assert!(matches!(
            App::builder().name("x").history_limit(0usize).build(),
            Err(BuilderError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn builder_duplicate_global_flag() {
        let result = App::builder()
            .name("x")
            .flag(Flag::bool("verbose", false))
            .flag(Flag::string("verbose", ""))
            .build();
        assert!(matches!(result, Err(BuilderError::DuplicateRegistration { .. })));
    }

    #[test]
    fn builder_reserved_command() {
        let result = App::builder().name("x").add(Command::new("exit")).build();
        assert!(matches!(result, Err(BuilderError::ReservedName(_))));
    }

    #[test]
    fn interrupts_need_confirmation() {
        let mut out = Vec::new();
        assert_eq!(default_interrupt_handler(&mut out, 1).unwrap(), LoopStatus::Continue);
        assert_eq!(default_interrupt_handler(&mut out, 2).unwrap(), LoopStatus::Break);
        assert!(String::from_utf8(out).unwrap().starts_with("input Ctrl-c once more to exit\n"));
    }

    fn one_shot(args: &[&str]) -> (anyhow::Result<()>, String, String) {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        let res = sample_app(&out, &err).build().unwrap().run_with_args(args.iter().copied());
        (res, out.take(), err.take())
    }

    #[test]
    fn runs_a_single_command() {
        let (res, out, _) = one_shot(&["cdnChkD", "www.test.com", "true"]);
        res.unwrap();
        assert_eq!(out, "host=www.test.com verbose=true boolf=true\n");

        let (res, out, _) = one_shot(&["--nocolor", "cdnChkD", "-b=false", "h", "0"]);
        res.unwrap();
        assert_eq!(out, "host=h verbose=false boolf=false\n");
    }

    #[test]
    fn single_command_errors() {
        let (res, _, _) = one_shot(&["cdnChkD", "h", "true", "extra"]);
        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::UnconsumedInput { input, .. }) if input == "extra"
        ));
        let (res, _, _) = one_shot(&["cdnChkD", "h", "maybe"]);
        assert!(format!("{:#}", res.unwrap_err()).contains("'maybe' is not a valid bool value"));
        // shell verbs do not exist outside the shell
        let (res, _, _) = one_shot(&["use", "s1"]);
        assert!(matches!(
            res.unwrap_err().downcast_ref::<ParseError>(),
            Some(ParseError::UnknownCommand(name)) if name == "use"
        ));
        let (res, _, _) = one_shot(&["--bogus", "cdnChkD"]);
        assert!(res.is_err());
    }

    #[test]
    fn help_outside_the_shell() {
        let (res, out, _) = one_shot(&["--help"]);
        res.unwrap();
        assert!(out.contains("Flags:"));
        assert!(out.contains("--nocolor bool"));
        assert!(out.contains("--verbose bool"));

        // a command without handler shows its help
        let (res, out, _) = one_shot(&["s1"]);
        res.unwrap();
        assert!(out.contains("Usage:\n  CheckTest s1 [flags] [command] <a1> [al]"));

        let (res, out, _) = one_shot(&["cdnChkD", "--help"]);
        res.unwrap();
        assert!(out.contains("Usage:\n  CheckTest cdnChkD [flags] <host> <verbose>"));

        let (res, out, _) = one_shot(&["help", "s1", "s2"]);
        res.unwrap();
        assert!(out.starts_with("step two\n"));
    }

    #[test]
    fn global_flags_reach_handlers() {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        sample_app(&out, &err)
            .add(Command::new("probe").run(|ctx| {
                writeln!(ctx.out, "verbose={:?} shell={}", ctx.flags.bool("verbose"), ctx.shell)?;
                Ok(CommandStatus::Done)
            }))
            .build()
            .unwrap()
            .run_with_args(["--verbose", "probe"])
            .unwrap();
        assert_eq!(out.take(), "verbose=Some(true) shell=false\n");
    }

    #[test]
    fn hooks() {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        let app = sample_app(&out, &err)
            .ascii_logo("LOGO")
            .on_init(|app, flags| {
                assert_eq!(flags.bool("verbose"), Some(false));
                app.add_command(Command::new("added").run(|ctx| {
                    writeln!(ctx.out, "added ran")?;
                    Ok(CommandStatus::Done)
                }))?;
                Ok(())
            })
            .on_shell(|app| {
                writeln!(app.out(), "shell starting")?;
                Ok(())
            })
            .build()
            .unwrap();
        app.run_with_editor(Vec::<String>::new(), ScriptedEditor::new(&["added"]))
            .unwrap();
        assert_eq!(out.take(), "shell starting\nLOGO\nadded ran\n");
        assert_eq!(err.take(), "");
    }

    #[test]
    fn custom_printers() {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        let app = || {
            sample_app(&out, &err)
                .ascii_logo("unused")
                .print_logo(|out, config| {
                    writeln!(out, "== {} ==", config.name)?;
                    Ok(())
                })
                .print_help(|out, _config, _commands, _flags, shell| {
                    writeln!(out, "app help shell={}", shell)?;
                    Ok(())
                })
                .print_command_help(|out, _config, cmd, shell| {
                    writeln!(out, "help for {} shell={}", cmd.name(), shell)?;
                    Ok(())
                })
                .build()
                .unwrap()
        };
        let lines = ["help", "help cdnChkD", "s1", "cdnChkD -h", "use s1", "run"];
        app().run_with_editor(Vec::<String>::new(), ScriptedEditor::new(&lines)).unwrap();
        assert_eq!(
            out.take(),
            "== CheckTest ==\n\
             app help shell=true\n\
             help for cdnChkD shell=true\n\
             help for s1 shell=true\n\
             help for cdnChkD shell=true\n\
             help for s1 shell=true\n"
        );
        assert_eq!(err.take(), "");

        app().run_with_args(["--help"]).unwrap();
        assert_eq!(out.take(), "app help shell=false\n");
        app().run_with_args(["help", "s1", "s2"]).unwrap();
        assert_eq!(out.take(), "help for s2 shell=false\n");
    }

    #[test]
    fn prompts_can_be_changed() {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        let mut session = sample_app(&out, &err)
            .on_shell(|app| {
                app.set_default_prompt("root> ");
                Ok(())
            })
            .add(Command::new("mood").run(|ctx| {
                ctx.set_prompt("happy >> ");
                Ok(CommandStatus::Done)
            }))
            .build()
            .unwrap()
            .shell(ScriptedEditor::new(&["mood", "use cdnChkD", "back"]))
            .unwrap();
        session.run().unwrap();
        assert_eq!(
            session.editor().prompts,
            ["root> ", "happy >> ", "CheckTest cdnChkD(/) >> ", "root> "]
        );
        assert_eq!(err.take(), "");
    }

    #[test]
    fn custom_interrupt_handler() {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        let mut session = sample_app(&out, &err)
            .interrupt_handler(|out, count| {
                writeln!(out, "interrupt {}", count)?;
                Ok(LoopStatus::Break)
            })
            .build()
            .unwrap()
            .shell(ScriptedEditor::new(&["^C", "cdnChkD h true"]))
            .unwrap();
        session.run().unwrap();
        assert_eq!(out.take(), "interrupt 1\n");
    }
}
