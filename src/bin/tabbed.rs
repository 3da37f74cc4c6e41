use std::io::{self, Write};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use nix::unistd::{ForkResult, fork};
use tabbed::actor::reactor::{Options, Reactor, VERSION};
use tabbed::actor::reaper::Reaper;
use tabbed::common::config::Config;
use tabbed::common::log;
use tabbed::sys::process::Launcher;
use tabbed::sys::window_server::WindowServer;
use tabbed::sys::x11::{self, INITIAL_SIZE};
use tracing::warn;

/// Hosts XEmbed-capable clients as tabs of a single frame window.
#[derive(Parser)]
#[command(name = "tabbed", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Detach from the terminal after printing the frame id.
    #[arg(short = 'd')]
    detach: bool,

    /// Launch the command again whenever the last tab closes.
    #[arg(short = 'f')]
    fill: bool,

    /// Instance name of the frame's WM_CLASS.
    #[arg(short = 'n', value_name = "name", default_value = "tabbed")]
    name: String,

    /// Position in the command's arguments to put the frame id at, instead of
    /// appending it.
    #[arg(short = 'r', value_name = "narg", default_value_t = 0)]
    replace: usize,

    /// Do not launch the command at startup.
    #[arg(short = 's')]
    no_spawn: bool,

    /// Print the version and exit.
    #[arg(short = 'v')]
    version: bool,

    /// Print usage and exit.
    #[arg(short = 'h')]
    help: bool,

    /// Command to launch for every new tab; it receives the frame id.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "command")]
    command: Vec<String>,
}

fn main() {
    let opt = match Cli::try_parse() {
        Ok(opt) => opt,
        Err(e) => {
            _ = e.print();
            process::exit(1);
        }
    };
    if opt.version {
        eprintln!("tabbed-{VERSION}");
        process::exit(1);
    }
    if opt.help {
        eprintln!("{}", Cli::command().render_usage());
        process::exit(1);
    }

    log::init_logging();
    install_panic_hook();

    if let Err(e) = run(opt) {
        eprintln!("tabbed: {e:#}");
        process::exit(1);
    }
}

fn run(opt: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    for issue in config.validate() {
        warn!("config: {issue}");
    }
    let fixes = config.auto_fix_values();
    if fixes > 0 {
        warn!("replaced {fixes} invalid config values with defaults");
    }

    let launcher = Launcher::new(opt.command, opt.replace);
    let options = Options {
        fill_again: opt.fill && !launcher.is_empty(),
        initial_spawn: !opt.no_spawn && !launcher.is_empty(),
    };

    let (server, renderer) = x11::connect(&config.settings, &opt.name)?;
    let frame = server.frame();
    {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{frame:#x}")?;
        stdout.flush()?;
    }

    if opt.detach {
        detach()?;
    }
    Reaper::spawn().context("cannot start the child reaper")?;

    let mut reactor =
        Reactor::new(config, options, launcher, Box::new(server), Box::new(renderer), INITIAL_SIZE);
    reactor.run()?;
    Ok(())
}

/// Keeps running in a forked child; the parent exits right away.
fn detach() -> anyhow::Result<()> {
    // SAFETY: no other threads have been started yet.
    match unsafe { fork() }.context("fork failed")? {
        ForkResult::Parent { .. } => process::exit(0),
        ForkResult::Child => {
            // SAFETY: nothing else refers to stdout after this point.
            unsafe { nix::libc::close(nix::libc::STDOUT_FILENO) };
            Ok(())
        }
    }
}

#[cfg(panic = "unwind")]
fn install_panic_hook() {
    // Abort on panic instead of unwinding through the event loop.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        original_hook(info);
        std::process::abort();
    }));
}

#[cfg(not(panic = "unwind"))]
fn install_panic_hook() {}
