//! Line editing: the seam between the shell loop and the terminal.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context as _;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::{CompletionType, EditMode, Editor, OutputStreamType};
use rustyline_derive::{Helper, Highlighter, Validator};

use crate::app::Config;
use crate::completion::TreeCompleter;

/// What the shell loop needs from a line editor.
///
/// [`RustylineEditor`] is the terminal implementation; tests drive the shell
/// with scripted input through the same trait.
pub trait LineEditor<'a> {
    /// Read one line. Ctrl-C maps to [`ReadlineError::Interrupted`] and end of
    /// input to [`ReadlineError::Eof`].
    fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError>;

    /// Replace the completion source, done whenever the selection changes.
    fn set_completer(&mut self, completer: TreeCompleter<'a>);

    fn add_history(&mut self, line: &str) -> anyhow::Result<()>;

    fn clear_screen(&mut self) -> anyhow::Result<()>;

    /// Called once when the shell session ends.
    fn close(&mut self) {}
}

#[derive(Helper, Validator, Highlighter)]
pub(crate) struct ShellHelper<'a> {
    completer: TreeCompleter<'a>,
    with_hints: bool,
}

impl<'a> Hinter for ShellHelper<'a> {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if !self.with_hints || pos < line.len() {
            return None;
        }
        let completions = self.completer.complete(line, pos);
        if completions.prefix.is_empty() || completions.candidates.len() != 1 {
            return None;
        }
        let hint = completions.suffixes().next().map(String::from);
        hint
    }
}

impl<'a> Completer for ShellHelper<'a> {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let completions = self.completer.complete(line, pos);
        let candidates = completions
            .candidates
            .iter()
            .zip(completions.suffixes())
            .map(|(full, suffix)| Pair {
                display: full.clone(),
                replacement: suffix.to_string(),
            })
            .collect();
        Ok((pos, candidates))
    }
}

/// Terminal line editor backed by [`rustyline`].
pub struct RustylineEditor<'a> {
    editor: Editor<ShellHelper<'a>>,
    history_file: Option<PathBuf>,
}

impl<'a> RustylineEditor<'a> {
    pub fn new(config: &Config, completer: TreeCompleter<'a>) -> anyhow::Result<Self> {
        let edit_mode = if config.vim_mode {
            EditMode::Vi
        } else {
            EditMode::Emacs
        };
        let mut editor = Editor::with_config(
            rustyline::Config::builder()
                .output_stream(OutputStreamType::Stderr) // NOTE: cannot specify `out`
                .completion_type(CompletionType::List)
                .max_history_size(config.history_limit)
                .edit_mode(edit_mode)
                .build(),
        );
        editor.set_helper(Some(ShellHelper {
            completer,
            with_hints: config.with_hints,
        }));
        if let Some(path) = &config.history_file {
            if path.exists() {
                editor
                    .load_history(path)
                    .with_context(|| format!("failed to load history from {}", path.display()))?;
            }
        }
        Ok(RustylineEditor {
            editor,
            history_file: config.history_file.clone(),
        })
    }
}

impl<'a> LineEditor<'a> for RustylineEditor<'a> {
    fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.editor.readline(prompt)
    }

    fn set_completer(&mut self, completer: TreeCompleter<'a>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completer = completer;
        }
    }

    fn add_history(&mut self, line: &str) -> anyhow::Result<()> {
        self.editor.add_history_entry(line);
        if let Some(path) = &self.history_file {
            self.editor
                .save_history(path)
                .with_context(|| format!("failed to save history to {}", path.display()))?;
        }
        Ok(())
    }

    fn clear_screen(&mut self) -> anyhow::Result<()> {
        let mut stderr = std::io::stderr();
        write!(stderr, "\x1b[2J\x1b[1;1H")?;
        stderr.flush()?;
        Ok(())
    }
}
