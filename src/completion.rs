//! Context aware completion of shell input.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;
use trie_rs::{Trie, TrieBuilder};

use crate::builtins::Builtin;
use crate::command::{Command, CommandPath, Commands};
use crate::lex;

/// Words that may complete the word under the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completions {
    /// The partial word being completed.
    pub prefix: String,
    /// Full candidate words, sorted.
    pub candidates: Vec<String>,
}

impl Completions {
    /// The candidates without the part already typed.
    pub fn suffixes(&self) -> impl Iterator<Item = &str> + '_ {
        self.candidates.iter().map(move |c| &c[self.prefix.len()..])
    }
}

/// Completes against a shared command tree, seen from a selection.
pub struct TreeCompleter<'a> {
    commands: Rc<RefCell<Commands<'a>>>,
    scope: Option<CommandPath>,
}

impl<'a> TreeCompleter<'a> {
    pub fn new(commands: Rc<RefCell<Commands<'a>>>, scope: Option<CommandPath>) -> Self {
        TreeCompleter { commands, scope }
    }

    pub fn complete(&self, line: &str, pos: usize) -> Completions {
        match self.commands.try_borrow() {
            Ok(root) => complete(&root, self.scope.as_deref(), line, pos),
            Err(_) => Completions::default(),
        }
    }
}

/// Complete `line` with the cursor at byte offset `pos`.
pub fn complete(root: &Commands<'_>, scope: Option<&[String]>, line: &str, pos: usize) -> Completions {
    let head = match line.get(..pos) {
        Some(head) => head,
        None => return Completions::default(),
    };
    let mut words = match lex::split(head) {
        Ok(words) => words,
        Err(_) => return Completions::default(),
    };
    let prefix = if head.is_empty() || head.ends_with(char::is_whitespace) {
        String::new()
    } else {
        words.pop().unwrap_or_default()
    };
    let selected = scope.and_then(|path| root.resolve(path));
    let candidates = matching(candidates(root, selected, &words, &prefix), &prefix);
    trace!(line = head, found = candidates.len(), "completion");
    Completions { candidates, prefix }
}

fn names(commands: &Commands<'_>, builtins: bool) -> Vec<String> {
    commands
        .iter()
        .filter(|cmd| builtins || !cmd.is_builtin())
        .flat_map(|cmd| std::iter::once(&cmd.name).chain(&cmd.aliases))
        .cloned()
        .collect()
}

fn visible_names<'a>(root: &Commands<'a>, selected: Option<&Command<'a>>, builtins: bool) -> Vec<String> {
    let mut out = names(root, builtins);
    if let Some(cmd) = selected {
        out.extend(names(&cmd.commands, builtins));
    }
    out
}

fn lookup_first<'r, 'a>(
    root: &'r Commands<'a>,
    selected: Option<&'r Command<'a>>,
    word: &str,
) -> Option<&'r Command<'a>> {
    root.get(word)
        .or_else(|| selected.and_then(|cmd| cmd.commands.get(word)))
}

fn candidates<'a>(root: &Commands<'a>, selected: Option<&Command<'a>>, words: &[String], prefix: &str) -> Vec<String> {
    let (first, rest) = match words.split_first() {
        Some(split) => split,
        None => return visible_names(root, selected, true),
    };
    match root.get(first).and_then(|cmd| cmd.builtin) {
        Some(Builtin::Help) => help_candidates(root, selected, rest),
        Some(Builtin::Use) if rest.is_empty() => use_candidates(root, selected, prefix),
        Some(builtin @ (Builtin::Setf | Builtin::Unsetf)) if rest.is_empty() => {
            let mut out: Vec<String> = selected
                .map(|cmd| cmd.flags.iter().map(|f| f.long_name().to_string()).collect())
                .unwrap_or_default();
            if builtin == Builtin::Unsetf {
                out.push("all".into());
            }
            out
        }
        Some(builtin @ (Builtin::Seta | Builtin::Unseta)) if rest.is_empty() => {
            let mut out: Vec<String> = selected
                .map(|cmd| cmd.args.iter().map(|a| a.name().to_string()).collect())
                .unwrap_or_default();
            if builtin == Builtin::Unseta {
                out.push("all".into());
            }
            out
        }
        Some(_) => Vec::new(),
        None => command_candidates(root, selected, first, rest, prefix),
    }
}

fn help_candidates<'a>(root: &Commands<'a>, selected: Option<&Command<'a>>, words: &[String]) -> Vec<String> {
    let (first, rest) = match words.split_first() {
        Some(split) => split,
        None => return visible_names(root, selected, false),
    };
    let mut cmd = match lookup_first(root, selected, first) {
        Some(cmd) => cmd,
        None => return Vec::new(),
    };
    for word in rest {
        match cmd.commands.get(word) {
            Some(child) => cmd = child,
            None => return Vec::new(),
        }
    }
    names(&cmd.commands, false)
}

fn collect_paths(commands: &Commands<'_>, out: &mut Vec<String>) {
    for cmd in commands.iter().filter(|c| !c.is_builtin()) {
        out.push(cmd.path_string());
        collect_paths(&cmd.commands, out);
    }
}

fn use_candidates<'a>(root: &Commands<'a>, selected: Option<&Command<'a>>, prefix: &str) -> Vec<String> {
    let mut out = Vec::new();
    collect_paths(root, &mut out);
    if !prefix.is_empty() && !prefix.starts_with('/') {
        if let Some(cmd) = selected {
            out.extend(names(&cmd.commands, false));
        }
        for cmd in root.iter().filter(|c| !c.is_builtin()) {
            out.push(cmd.name.clone());
            out.extend(cmd.aliases.iter().cloned());
        }
    }
    out
}

fn command_candidates<'a>(
    root: &Commands<'a>,
    selected: Option<&Command<'a>>,
    first: &str,
    rest: &[String],
    prefix: &str,
) -> Vec<String> {
    let mut cmd = match lookup_first(root, selected, first) {
        Some(cmd) => cmd,
        None => return Vec::new(),
    };
    let mut positional: Vec<String> = Vec::new();
    for word in rest.iter().filter(|w| !w.starts_with('-')) {
        match cmd.commands.get(word) {
            Some(child) if positional.is_empty() => cmd = child,
            _ => positional.push(word.clone()),
        }
    }
    if let Some(hook) = &cmd.completer {
        return hook(prefix, &positional);
    }
    if !positional.is_empty() {
        return Vec::new();
    }
    let mut out = names(&cmd.commands, false);
    for flag in cmd.flags.iter() {
        out.push(format!("--{}", flag.long_name()));
        if let Some(short) = flag.short_name().filter(|_| prefix.starts_with('-')) {
            out.push(format!("-{}", short));
        }
    }
    out
}

/// Candidates starting with `prefix`, sorted and without duplicates.
fn matching(mut candidates: Vec<String>, prefix: &str) -> Vec<String> {
    // the trie loses a word pushed after a longer word it is a prefix of
    candidates.sort();
    candidates.dedup();
    let mut found = if prefix.is_empty() || candidates.is_empty() {
        candidates
    } else {
        let mut builder = TrieBuilder::new();
        for candidate in &candidates {
            builder.push(candidate);
        }
        let trie: Trie<u8> = builder.build();
        trie.predictive_search(prefix)
            .into_iter()
            .filter_map(|bytes| String::from_utf8(bytes).ok())
            .collect()
    };
    found.sort();
    found.dedup();
    found
}
