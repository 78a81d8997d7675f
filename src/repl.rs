//! Main shell loop.

use rustyline::error::ReadlineError;
use tracing::{debug, trace};

use crate::app::{paint, App, Outcome};
use crate::command::{CommandPath, CommandStatus};
use crate::editor::LineEditor;
use crate::lex;

/// State of the shell after a loop step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopStatus {
    /// Keep reading input.
    Continue,
    /// Leave the loop (exit command, end of input or interrupt handler).
    Break,
}

/// An interactive session over an [`App`].
///
/// Created by [`App::shell`]. Use [`Session::run`] to loop until the user
/// exits, or [`Session::next`] to get back control between lines.
pub struct Session<'a, E: LineEditor<'a>> {
    pub(crate) app: App<'a>,
    pub(crate) editor: E,
    /// Path of the selected command, `None` at the root.
    pub(crate) current: Option<CommandPath>,
    pub(crate) prompt: String,
    interrupts: usize,
    lines: Vec<String>,
}

impl<'a, E: LineEditor<'a>> Session<'a, E> {
    pub(crate) fn new(mut app: App<'a>, editor: E) -> Self {
        let prompt = app.next_prompt.take().unwrap_or_else(|| app.config.prompt.clone());
        Session {
            app,
            editor,
            current: None,
            prompt,
            interrupts: 0,
            lines: Vec::new(),
        }
    }

    /// Path of the selected command.
    pub fn current(&self) -> Option<&[String]> {
        self.current.as_deref()
    }

    /// Prompt shown for the next line, without colors.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn app(&self) -> &App<'a> {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App<'a> {
        &mut self.app
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Read and execute one line of input.
    pub fn next(&mut self) -> anyhow::Result<LoopStatus> {
        let colored = !self.app.config.no_color;
        let prompt = if self.lines.is_empty() {
            paint(&self.prompt, self.app.config.prompt_color, colored)
        } else {
            paint(
                &self.app.config.multiline_prompt,
                self.app.config.multiline_prompt_color,
                colored,
            )
        };
        match self.editor.readline(&prompt) {
            Ok(line) => {
                self.interrupts = 0;
                self.handle_line(line)
            }
            Err(ReadlineError::Interrupted) => {
                self.interrupts += 1;
                self.lines.clear();
                debug!(count = self.interrupts, "interrupted");
                (self.app.interrupt_handler)(&mut *self.app.out, self.interrupts)
            }
            Err(ReadlineError::Eof) => Ok(LoopStatus::Break),
            Err(err) => Err(err.into()),
        }
    }

    fn handle_line(&mut self, line: String) -> anyhow::Result<LoopStatus> {
        // a trailing backslash continues the input on the next line
        if let Some(head) = line.strip_suffix('\\') {
            self.lines.push(head.trim().to_string());
            return Ok(LoopStatus::Continue);
        }
        self.lines.push(line.trim().to_string());
        let joined = self.lines.concat();
        self.lines.clear();
        let line = joined.trim();
        if line.is_empty() {
            return Ok(LoopStatus::Continue);
        }
        trace!(line, "read line");

        if let Err(err) = self.editor.add_history(line) {
            self.app.print_error(&err)?;
        }
        let result = match lex::split_line(line) {
            Ok(args) => self.execute(&args),
            Err(err) => Err(anyhow::Error::new(err).context("invalid args")),
        };
        let status = match result {
            Ok(status) => status,
            Err(err) => {
                self.app.print_error(&err)?;
                CommandStatus::Done
            }
        };
        if let Some(prompt) = self.app.next_prompt.take() {
            self.prompt = prompt;
        }
        if self.app.commands.borrow().has_changed() {
            self.app.commands.borrow_mut().sort_recursive();
        }
        Ok(match status {
            CommandStatus::Done => LoopStatus::Continue,
            CommandStatus::Quit => LoopStatus::Break,
        })
    }

    /// Dispatch already split words, as if typed at the prompt.
    pub fn execute(&mut self, args: &[String]) -> anyhow::Result<CommandStatus> {
        let scope = self.current.clone();
        match self.app.dispatch(scope.as_deref(), args)? {
            Outcome::Status(status) => Ok(status),
            Outcome::Builtin(builtin, words) => self.run_builtin(builtin, &words),
        }
    }

    /// Run the loop until [`LoopStatus::Break`].
    pub fn run(&mut self) -> anyhow::Result<()> {
        while let LoopStatus::Continue = self.next()? {}
        Ok(())
    }
}

impl<'a, E: LineEditor<'a>> Drop for Session<'a, E> {
    fn drop(&mut self) {
        self.editor.close();
    }
}
