//! CDN check tool, usable as a one-shot command or as a modal shell.
//!
//! ```text
//! cargo run --example cdn_check -- cdnChkD www.test.com true
//! cargo run --example cdn_check
//! CheckTest >> use cdnChkD
//! CheckTest cdnChkD(/) >> seta host www.test.com
//! CheckTest cdnChkD(/) >> seta verbose true
//! CheckTest cdnChkD(/) >> run
//! ```
//!
//! Set `MODAL_SHELL_LOG=debug` to see what the framework does.

use std::io::Write;

use anyhow::Context as _;
use modal_shell::{App, Arg, Color, Command, CommandStatus, Flag};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cdn_check_domain() -> Command<'static> {
    Command::new("cdnChkD")
        .help("check whether a domain is served through a CDN")
        .help_group("CDN Check")
        .flag(Flag::bool("boolf", true).short('b').help("example toggle"))
        .arg(Arg::string("host").help("hostname, e.g. www.test.com"))
        .arg(Arg::bool("verbose"))
        .run(|ctx| {
            let host = ctx.args.string("host").unwrap_or_default();
            info!(host, "checking domain");
            writeln!(
                ctx.out,
                "checking {} (verbose: {}, boolf: {})",
                host,
                ctx.args.bool("verbose").unwrap_or_default(),
                ctx.flags.bool("boolf").unwrap_or_default(),
            )?;
            Ok(CommandStatus::Done)
        })
}

fn cdn_check_ip() -> Command<'static> {
    Command::new("cdn")
        .help("check whether addresses belong to a CDN")
        .help_group("CDN Check")
        .flag(Flag::string_list("sl", Vec::<String>::new()).short('k'))
        .arg(Arg::string_list("t").help("targets"))
        .arg(Arg::int_list("i"))
        .arg(Arg::duration_list("d").help("timeouts, e.g. 1s,500ms"))
        .run(|ctx| {
            writeln!(ctx.out, "sl: {:?}", ctx.flags.string_list("sl").unwrap_or_default())?;
            writeln!(ctx.out, "targets: {:?}", ctx.args.string_list("t").unwrap_or_default())?;
            writeln!(ctx.out, "ints: {:?}", ctx.args.int_list("i").unwrap_or_default())?;
            writeln!(ctx.out, "timeouts: {:?}", ctx.args.duration_list("d").unwrap_or_default())?;
            Ok(CommandStatus::Done)
        })
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

    let history = std::env::temp_dir().join("cdn_check.history");
    let app = App::builder()
        .name("CheckTest")
        .description("Check whether domains and addresses are behind a CDN.")
        .history_file(history)
        .logo_color(Color::Cyan)
        .ascii_logo(
            "=============================\n         CDN Check\n=============================",
        )
        .flag(Flag::bool("verbose", false).help("verbose output"))
        .on_init(|app, flags| {
            if flags.bool("verbose") == Some(true) {
                info!("verbose output enabled");
            }
            app.add_command(cdn_check_domain())?;
            app.add_command(cdn_check_ip())?;
            Ok(())
        })
        .build()
        .context("failed to build the application")?;
    app.run()
}
