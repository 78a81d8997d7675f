//! Matching a line of input against the command tree.

use tracing::debug;

use crate::command::{Command, CommandPath, Commands};
use crate::error::ParseError;
use crate::value::FlagMap;

/// Outcome of walking the command tree.
#[derive(Debug)]
pub(crate) struct Parsed {
    /// Canonical names from the root to the matched command.
    pub path: CommandPath,
    /// Flags of the whole path merged with the global flags.
    pub flags: FlagMap,
    /// Tokens left for the arguments of the matched command.
    pub rest: Vec<String>,
}

/// Look up the first word. With a selection active, the top level commands are
/// searched first and the children of the selected command second.
fn lookup_first<'r, 'a>(
    root: &'r Commands<'a>,
    scope: Option<&[String]>,
    word: &str,
) -> Option<(CommandPath, &'r Command<'a>)> {
    if let Some(cmd) = root.get(word) {
        return Some((vec![cmd.name.clone()], cmd));
    }
    let scope = scope?;
    let selected = root.resolve(scope)?;
    let cmd = selected.commands.get(word)?;
    let mut path = scope.to_vec();
    path.push(cmd.name.clone());
    Some((path, cmd))
}

/// Walk `args` down the tree, parsing the flags of every command on the way.
pub(crate) fn parse(
    root: &Commands<'_>,
    scope: Option<&[String]>,
    args: &[String],
    globals: &FlagMap,
) -> Result<Parsed, ParseError> {
    let (first, mut rest) = match args.split_first() {
        Some((first, rest)) => (first, rest.to_vec()),
        None => return Err(ParseError::UnknownCommand(String::new())),
    };
    let (mut path, mut cmd) = lookup_first(root, scope, first)
        .ok_or_else(|| ParseError::UnknownCommand(first.clone()))?;

    let mut flag_maps = Vec::new();
    loop {
        let mut values = FlagMap::new();
        rest = cmd.flags.parse(&rest, &mut values)?;
        flag_maps.push(values);
        let child = match rest.first() {
            Some(word) => cmd.commands.get(word),
            None => None,
        };
        match child {
            Some(child) => {
                path.push(child.name.clone());
                cmd = child;
                rest.remove(0);
            }
            None => break,
        }
    }
    debug!(path = %path.join("/"), rest = ?rest, "matched command");

    Ok(Parsed {
        path,
        flags: merge(&flag_maps, globals),
        rest,
    })
}

/// Explicit values of deeper commands win over those of their ancestors, defaults
/// come next, and global flags last.
pub(crate) fn merge(maps: &[FlagMap], globals: &FlagMap) -> FlagMap {
    let mut merged = FlagMap::new();
    for explicit in [true, false] {
        for map in maps.iter().rev() {
            for (name, entry) in map.iter() {
                if entry.is_default != explicit && !merged.contains(name) {
                    merged.insert(name, entry.value.clone(), entry.is_default);
                }
            }
        }
    }
    for (name, entry) in globals.iter() {
        if !merged.contains(name) {
            merged.insert(name, entry.value.clone(), entry.is_default);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandStatus, Context};
    use crate::flags::Flag;
    use crate::lex;
    use pretty_assertions::assert_eq;

    fn done(_ctx: &mut Context<'_, '_>) -> anyhow::Result<CommandStatus> {
        Ok(CommandStatus::Done)
    }

    fn tree() -> Commands<'static> {
        let mut commands = Commands::new();
        commands
            .add(
                Command::new("s1")
                    .flag(Flag::string("mode", "fast").short('m'))
                    .flag(Flag::bool("verbose", false))
                    .subcommand(
                        Command::new("s2")
                            .alias("two")
                            .flag(Flag::string("mode", "slow"))
                            .run(done),
                    ),
            )
            .unwrap();
        commands.add(Command::new("cdn").run(done)).unwrap();
        commands
    }

    fn globals() -> FlagMap {
        let mut globals = FlagMap::new();
        globals.insert("nocolor", crate::Value::Bool(true), false);
        globals
    }

    fn parse_line(root: &Commands<'_>, scope: Option<&[String]>, line: &str) -> Result<Parsed, ParseError> {
        parse(root, scope, &lex::split_line(line).unwrap(), &globals())
    }

    #[test]
    fn walks_with_flags_between_commands() {
        let root = tree();
        let parsed = parse_line(&root, None, "s1 -m quick --verbose two a b").unwrap();
        assert_eq!(parsed.path, ["s1", "s2"]);
        assert_eq!(parsed.rest, ["a", "b"]);
        // explicit value of the parent beats the default of the child
        assert_eq!(parsed.flags.string("mode"), Some("quick"));
        assert_eq!(parsed.flags.bool("verbose"), Some(true));
        assert_eq!(parsed.flags.bool("nocolor"), Some(true));
        assert_eq!(parsed.flags.bool("help"), Some(false));
    }

    #[test]
    fn deeper_explicit_value_wins() {
        let root = tree();
        let parsed = parse_line(&root, None, "s1 -m quick s2 --mode=careful").unwrap();
        assert_eq!(parsed.flags.string("mode"), Some("careful"));
        let parsed = parse_line(&root, None, "s1 s2").unwrap();
        assert_eq!(parsed.flags.string("mode"), Some("slow"));
    }

    #[test]
    fn unknown_command() {
        let root = tree();
        assert_eq!(
            parse_line(&root, None, "nope").unwrap_err(),
            ParseError::UnknownCommand("nope".into())
        );
        assert!(matches!(
            parse_line(&root, None, "s1 --bad"),
            Err(ParseError::InvalidFlag(_))
        ));
    }

    #[test]
    fn union_view_with_selection() {
        let root = tree();
        let scope = vec!["s1".to_string()];
        let parsed = parse_line(&root, Some(&scope), "s2").unwrap();
        assert_eq!(parsed.path, ["s1", "s2"]);
        // top level commands stay reachable
        let parsed = parse_line(&root, Some(&scope), "cdn").unwrap();
        assert_eq!(parsed.path, ["cdn"]);
        assert!(parse_line(&root, None, "s2").is_err());
    }
}
