//! Helpers shared by the unit tests: scripted input, captured output and a
//! small application.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;

use crate::app::{App, AppBuilder};
use crate::args::Arg;
use crate::command::{Command, CommandStatus};
use crate::completion::TreeCompleter;
use crate::editor::LineEditor;
use crate::flags::Flag;
use crate::ReadlineError;

/// Output sink that can be inspected after being handed to the application.
#[derive(Clone, Default)]
pub(crate) struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    /// Everything written so far, emptying the buffer.
    pub(crate) fn take(&self) -> String {
        String::from_utf8(std::mem::take(&mut *self.0.borrow_mut())).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Feeds prepared lines to the shell. `^C` stands for an interrupt and the
/// end of the script for end of input.
#[derive(Default)]
pub(crate) struct ScriptedEditor<'a> {
    input: VecDeque<String>,
    pub(crate) prompts: Vec<String>,
    pub(crate) history: Vec<String>,
    pub(crate) completer: Option<TreeCompleter<'a>>,
    pub(crate) cleared: usize,
}

impl<'a> ScriptedEditor<'a> {
    pub(crate) fn new(lines: &[&str]) -> Self {
        ScriptedEditor {
            input: lines.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl<'a> LineEditor<'a> for ScriptedEditor<'a> {
    fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.prompts.push(prompt.to_string());
        match self.input.pop_front() {
            Some(line) if line == "^C" => Err(ReadlineError::Interrupted),
            Some(line) => Ok(line),
            None => Err(ReadlineError::Eof),
        }
    }

    fn set_completer(&mut self, completer: TreeCompleter<'a>) {
        self.completer = Some(completer);
    }

    fn add_history(&mut self, line: &str) -> anyhow::Result<()> {
        self.history.push(line.to_string());
        Ok(())
    }

    fn clear_screen(&mut self) -> anyhow::Result<()> {
        self.cleared += 1;
        Ok(())
    }
}

/// The CDN checking application, writing to the given buffers without colors.
pub(crate) fn sample_app(out: &SharedBuf, err: &SharedBuf) -> AppBuilder<'static> {
    App::builder()
        .name("CheckTest")
        .description("Checks things")
        .no_color(true)
        .out(out.clone())
        .err(err.clone())
        .flag(Flag::bool("verbose", false).help("verbose output"))
        .add(
            Command::new("cdnChkD")
                .help("check whether a domain is behind a CDN")
                .help_group("CDN Check")
                .flag(Flag::bool("boolf", true).short('b'))
                .arg(Arg::string("host").help("hostname, e.g. www.test.com"))
                .arg(Arg::bool("verbose"))
                .run(|ctx| {
                    writeln!(
                        ctx.out,
                        "host={} verbose={} boolf={}",
                        ctx.args.string("host").unwrap_or_default(),
                        ctx.args.bool("verbose").unwrap_or_default(),
                        ctx.flags.bool("boolf").unwrap_or_default(),
                    )?;
                    Ok(CommandStatus::Done)
                }),
        )
        .add(
            Command::new("s1")
                .help("step one")
                .flag(Flag::string("f1", ""))
                .flag(Flag::string_list("fl2", Vec::<String>::new()).short('f'))
                .flag(Flag::int("il", 1))
                .arg(Arg::string("a1"))
                .arg(Arg::string_list("al"))
                .subcommand(Command::new("s2").help("step two").run(|ctx| {
                    writeln!(ctx.out, "s2 ran")?;
                    Ok(CommandStatus::Done)
                })),
        )
        .add(Command::new("quitter").run(|_| Ok(CommandStatus::Quit)))
}
