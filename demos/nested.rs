//! A deeper command tree: nested selections, aliases, list bounds and a
//! custom completer.
//!
//! ```text
//! netkit >> use net
//! netkit net(/) >> use scan
//! netkit scan(/net) >> seta host localhost
//! netkit scan(/net) >> seta ports 22,80,443
//! netkit scan(/net) >> setf timeout 2s
//! netkit scan(/net) >> run
//! netkit scan(/net) >> back
//! netkit net(/) >> ping -c 2 example.org
//! ```

use std::io::Write;
use std::time::Duration;

use modal_shell::{App, Arg, Command, CommandStatus, Flag, LoopStatus, Value};
use tracing_subscriber::EnvFilter;

const KNOWN_HOSTS: &[&str] = &["example.org", "example.com", "localhost"];

fn hosts(prefix: &str, args: &[String]) -> Vec<String> {
    if !args.is_empty() {
        return Vec::new();
    }
    KNOWN_HOSTS
        .iter()
        .filter(|h| h.starts_with(prefix))
        .map(|h| h.to_string())
        .collect()
}

fn net() -> Command<'static> {
    Command::new("net")
        .help("network tools")
        .long_help("Network tools. Select them with 'use net' and run them from there.")
        .subcommand(
            Command::new("ping")
                .alias("p")
                .help("ping a host")
                .flag(Flag::int("count", 4).short('c').help("number of probes"))
                .flag(Flag::duration("interval", Duration::from_secs(1)).short('i'))
                .arg(Arg::string("host"))
                .completer(hosts)
                .run(|ctx| {
                    let count = ctx.flags.int("count").unwrap_or_default();
                    let interval = ctx.flags.duration("interval").unwrap_or_default();
                    let host = ctx.args.string("host").unwrap_or_default();
                    for seq in 0..count {
                        writeln!(ctx.out, "probe {} to {} (every {:?})", seq + 1, host, interval)?;
                    }
                    Ok(CommandStatus::Done)
                }),
        )
        .subcommand(
            Command::new("scan")
                .help("scan ports of a host")
                .flag(Flag::duration("timeout", Duration::from_millis(500)).show_default(true))
                .arg(Arg::string("host").default(Value::String("localhost".into())))
                .arg(Arg::uint_list("ports").min(1).max(4).help("up to four ports"))
                .run(|ctx| {
                    let host = ctx.args.string("host").unwrap_or_default();
                    let ports = ctx.args.uint_list("ports").unwrap_or_default();
                    if ports.is_empty() {
                        anyhow::bail!("no ports given");
                    }
                    for port in ports {
                        writeln!(ctx.out, "{}:{} closed", host, port)?;
                    }
                    Ok(CommandStatus::Done)
                }),
        )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .with_env_var("MODAL_SHELL_LOG")
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    App::builder()
        .name("netkit")
        .description("A few network tools in a modal shell.")
        .multiline_prompt("netkit ... ")
        .vim_mode(std::env::var_os("NETKIT_VI").is_some())
        .add(net())
        .add(
            Command::new("forget")
                .help("remove the network tools")
                .run(|ctx| {
                    ctx.commands.remove("net");
                    writeln!(ctx.out, "network tools removed")?;
                    Ok(CommandStatus::Done)
                }),
        )
        .interrupt_handler(|out, count| {
            writeln!(out, "^C ({}), use 'exit' to leave", count)?;
            Ok(if count >= 3 {
                LoopStatus::Break
            } else {
                LoopStatus::Continue
            })
        })
        .build()?
        .run()
}
