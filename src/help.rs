//! Help messages of the application and of single commands.

use std::collections::BTreeMap;

use textwrap;

use crate::args::Arg;
use crate::command::{Command, Commands};
use crate::flags::{Flag, Flags};

/// Group under which the built-in commands are listed.
pub const CORE_COMMANDS: &str = "Core Commands";

/// Two column listing, the second column wrapped to `text_width`.
pub(crate) fn format_help_entries(entries: &[(String, String)], text_width: usize) -> String {
    let width = match entries.iter().map(|(sig, _)| sig.len()).max() {
        Some(width) => width,
        None => return String::new(),
    };
    let indent = " ".repeat(width + 2 + 2);
    entries
        .iter()
        .map(|(sig, desc)| {
            let opts = textwrap::Options::new(text_width)
                .initial_indent("")
                .subsequent_indent(&indent);
            let line = format!("  {:width$}  {}", sig, desc, width = width);
            textwrap::fill(line.trim_end(), &opts)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn section(title: &str, body: String) -> Option<String> {
    if body.is_empty() {
        None
    } else {
        Some(format!("{}:\n{}", title, body))
    }
}

/// Listing of `commands`, split into help groups.
fn command_sections(commands: &Commands<'_>, text_width: usize) -> Vec<String> {
    let mut ungrouped = Vec::new();
    let mut groups: BTreeMap<&str, Vec<(String, String)>> = BTreeMap::new();
    let mut core = Vec::new();
    for cmd in commands.iter() {
        let mut sig = cmd.name.clone();
        for alias in &cmd.aliases {
            sig.push_str(", ");
            sig.push_str(alias);
        }
        let entry = (sig, cmd.help.clone());
        if cmd.is_builtin() {
            core.push(entry);
        } else if cmd.help_group.is_empty() {
            ungrouped.push(entry);
        } else {
            groups.entry(cmd.help_group.as_str()).or_default().push(entry);
        }
    }
    let mut sections = Vec::new();
    sections.extend(section("Commands", format_help_entries(&ungrouped, text_width)));
    for (title, entries) in &groups {
        sections.extend(section(title, format_help_entries(entries, text_width)));
    }
    sections.extend(section(CORE_COMMANDS, format_help_entries(&core, text_width)));
    sections
}

fn flag_entry(flag: &Flag) -> (String, String) {
    let short = match flag.short_name() {
        Some(c) => format!("-{}, ", c),
        None => "    ".into(),
    };
    let sig = format!("{}--{} {}", short, flag.long_name(), flag.kind());
    let desc = if flag.shows_default() {
        format!("{} (default: {})", flag.help_text(), flag.default_value())
    } else {
        flag.help_text().to_string()
    };
    (sig, desc.trim().to_string())
}

fn flag_section(flags: &Flags, text_width: usize) -> Option<String> {
    let entries: Vec<_> = flags.iter().map(flag_entry).collect();
    section("Flags", format_help_entries(&entries, text_width))
}

fn arg_entry(arg: &Arg) -> (String, String) {
    let sig = format!("{} {}", arg.name(), arg.kind());
    let desc = match arg.default_value() {
        Some(default) => format!("{} (default: {})", arg.help_text(), default),
        None => arg.help_text().to_string(),
    };
    (sig, desc.trim().to_string())
}

fn usage(cmd: &Command<'_>, prefix: Option<&str>) -> String {
    if !cmd.usage.is_empty() {
        return cmd.usage.clone();
    }
    let mut words: Vec<String> = prefix.map(String::from).into_iter().collect();
    words.extend(cmd.parent_path.split('/').filter(|s| !s.is_empty()).map(String::from));
    words.push(cmd.name.clone());
    if !cmd.flags.is_empty() {
        words.push("[flags]".into());
    }
    if !cmd.commands.is_empty() {
        words.push("[command]".into());
    }
    for arg in cmd.args.iter() {
        if arg.is_optional() {
            words.push(format!("[{}]", arg.name()));
        } else {
            words.push(format!("<{}>", arg.name()));
        }
    }
    words.join(" ")
}

/// Help of the whole application. Global flags are only listed outside the shell.
pub(crate) fn app_help(
    description: &str,
    commands: &Commands<'_>,
    globals: &Flags,
    shell: bool,
    text_width: usize,
) -> String {
    let mut sections = Vec::new();
    if !description.is_empty() {
        sections.push(textwrap::fill(description, text_width));
    }
    sections.extend(command_sections(commands, text_width));
    if !shell {
        sections.extend(flag_section(globals, text_width));
    }
    sections.join("\n\n")
}

/// Help of a single command. `app_name` prefixes the usage line outside the shell.
pub(crate) fn command_help(cmd: &Command<'_>, app_name: Option<&str>, text_width: usize) -> String {
    let mut sections = Vec::new();
    let description = if cmd.long_help.is_empty() {
        &cmd.help
    } else {
        &cmd.long_help
    };
    if !description.is_empty() {
        sections.push(textwrap::fill(description, text_width));
    }
    sections.push(format!("Usage:\n  {}", usage(cmd, app_name)));
    let args: Vec<_> = cmd.args.iter().map(arg_entry).collect();
    sections.extend(section("Args", format_help_entries(&args, text_width)));
    sections.extend(flag_section(&cmd.flags, text_width));
    if !cmd.commands.is_empty() {
        sections.push(format!(
            "Sub Commands:\n{}",
            command_sections(&cmd.commands, text_width).join("\n\n")
        ));
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Arg;
    use crate::builtins::Builtin;
    use crate::command::{CommandStatus, Context};
    use crate::flags::Flag;
    use pretty_assertions::assert_eq;

    fn done(_ctx: &mut Context<'_, '_>) -> anyhow::Result<CommandStatus> {
        Ok(CommandStatus::Done)
    }

    fn tree() -> Commands<'static> {
        let mut commands = Commands::new();
        commands
            .add(
                Command::new("cdnChkD")
                    .help("check a domain")
                    .help_group("CDN Check")
                    .flag(Flag::bool("boolf", true).short('b').help("toggle"))
                    .flag(Flag::int("retries", 3))
                    .arg(Arg::string("host").help("hostname"))
                    .arg(Arg::string_list("tags"))
                    .run(done),
            )
            .unwrap();
        commands.add(Command::new("s1").alias("first").help("first step")).unwrap();
        commands.add(Command::builtin("exit", Builtin::Exit).help("exit the shell")).unwrap();
        commands.sort_recursive();
        commands
    }

    #[test]
    fn entries_are_aligned() {
        let entries = vec![
            ("a".to_string(), "first".to_string()),
            ("long".to_string(), "second".to_string()),
        ];
        assert_eq!(format_help_entries(&entries, 80), "  a     first\n  long  second");
        assert_eq!(format_help_entries(&[], 80), "");
    }

    #[test]
    fn app_help_groups_commands() {
        let commands = tree();
        let mut globals = Flags::new();
        globals.register(Flag::bool("nocolor", false).help("disable colors")).unwrap();
        let help = app_help("Checks things", &commands, &globals, false, 80);
        let expected = "\
Checks things

Commands:
  s1, first  first step

CDN Check:
  cdnChkD  check a domain

Core Commands:
  exit  exit the shell

Flags:
      --nocolor bool  disable colors";
        assert_eq!(help, expected);
        // no global flags inside the shell
        assert!(!app_help("", &commands, &globals, true, 80).contains("Flags:"));
    }

    #[test]
    fn command_help_lists_flags_and_args() {
        let commands = tree();
        let help = command_help(commands.get("cdnChkD").unwrap(), None, 80);
        assert!(help.starts_with("check a domain\n\nUsage:\n  cdnChkD [flags] <host> [tags]"));
        assert!(help.contains("  host string       hostname"));
        assert!(help.contains("-b, --boolf bool"));
        assert!(help.contains("--retries int  (default: 3)") || help.contains("--retries int    (default: 3)"));
        assert!(help.contains("-h, --help bool"));
    }
}
