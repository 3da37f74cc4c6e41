use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no command to launch")]
    NoCommand,
    #[error("execvp {program} failed: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Launches new instances of the embedded application, handing each one the
/// frame's window id on its command line.
#[derive(Debug, Clone, Default)]
pub struct Launcher {
    command: Vec<String>,
    replace: Option<usize>,
}

impl Launcher {
    /// `replace` is the argv index the window id overwrites; `0` appends it.
    pub fn new(command: Vec<String>, replace: usize) -> Self {
        Self {
            command,
            replace: (replace > 0).then_some(replace),
        }
    }

    pub fn is_empty(&self) -> bool { self.command.is_empty() }

    pub fn command(&self) -> &[String] { &self.command }

    pub fn argv(&self, window_id: &str) -> Vec<String> {
        let mut argv = self.command.clone();
        match self.replace {
            Some(index) if index < argv.len() => argv[index] = window_id.to_string(),
            _ => argv.push(window_id.to_string()),
        }
        argv
    }

    pub fn spawn(&self, window_id: &str) -> Result<u32, LaunchError> {
        if self.is_empty() {
            return Err(LaunchError::NoCommand);
        }
        let argv = self.argv(window_id);
        let (program, args) = argv.split_first().ok_or(LaunchError::NoCommand)?;

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        // SAFETY: setsid is async-signal-safe.
        unsafe {
            command.pre_exec(|| nix::unistd::setsid().map(drop).map_err(io::Error::from));
        }

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;
        debug!(pid = child.id(), ?argv, "spawned client");
        // The reaper collects the exit status.
        Ok(child.id())
    }

    /// Spawns and logs failures; the frame keeps running either way.
    pub fn spawn_or_log(&self, window_id: &str) {
        if let Err(err) = self.spawn(window_id) {
            error!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher(args: &[&str], replace: usize) -> Launcher {
        Launcher::new(args.iter().map(|s| s.to_string()).collect(), replace)
    }

    #[test]
    fn window_id_is_appended_by_default() {
        assert_eq!(launcher(&["surf", "-e"], 0).argv("123"), ["surf", "-e", "123"]);
    }

    #[test]
    fn window_id_replaces_the_requested_argument() {
        let l = launcher(&["st", "-w", "''", "-e", "tmux"], 2);
        assert_eq!(l.argv("4194305"), ["st", "-w", "4194305", "-e", "tmux"]);
    }

    #[test]
    fn out_of_range_replacement_falls_back_to_appending() {
        assert_eq!(launcher(&["xterm", "-into"], 7).argv("9"), ["xterm", "-into", "9"]);
    }

    #[test]
    fn empty_launcher_refuses_to_spawn() {
        assert!(matches!(Launcher::default().spawn("1"), Err(LaunchError::NoCommand)));
    }

    #[test]
    fn missing_program_reports_spawn_failure() {
        let l = launcher(&["/nonexistent/definitely-not-a-program"], 0);
        assert!(matches!(l.spawn("1"), Err(LaunchError::Spawn { .. })));
    }
}
