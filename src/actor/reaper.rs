//! Collects exited children so launched clients never linger as zombies.

use std::io;
use std::thread::{self, JoinHandle};

use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, warn};

pub struct Reaper;

impl Reaper {
    pub fn spawn() -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name("reaper".to_string()).spawn(|| {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("reaper: cannot start runtime: {e}");
                    return;
                }
            };
            runtime.block_on(async {
                if let Err(e) = Self::run().await {
                    warn!("reaper: error: {e:?}");
                }
            })
        })
    }

    async fn run() -> io::Result<()> {
        let mut sigchld = signal(SignalKind::child())?;
        // Children may have exited before the handler was installed.
        reap_children();
        while sigchld.recv().await.is_some() {
            reap_children();
        }
        Ok(())
    }
}

/// Collects every child that has exited so far without blocking.
pub fn reap_children() -> usize {
    let mut reaped = 0;
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Ok(status) => {
                debug!(?status, "reaped child");
                reaped += 1;
            }
            Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!("waitpid failed: {e}");
                break;
            }
        }
    }
    reaped
}
