use tracing::{debug, info};

use crate::actor::reactor::{Command, Reactor, Result};

pub struct CommandEventHandler;

impl CommandEventHandler {
    pub fn handle_key_press(reactor: &mut Reactor, keycode: u8, state: u16) -> Result<()> {
        let keysym = reactor.server.keysym(keycode);
        let commands: Vec<Command> = reactor
            .config
            .keys
            .iter()
            .filter(|(hotkey, _)| hotkey.matches(keysym, state, reactor.numlock))
            .map(|(_, command)| *command)
            .collect();
        if commands.is_empty() {
            debug!(keycode, keysym, state, "unbound key");
        }
        for command in commands {
            Self::handle_command(reactor, command)?;
        }
        Ok(())
    }

    pub fn handle_command(reactor: &mut Reactor, cmd: Command) -> Result<()> {
        info!(?cmd);
        match cmd {
            Command::Spawn => {
                reactor.spawn();
                Ok(())
            }
            Command::Rotate(step) => reactor.rotate(step),
            Command::MoveTab(step) => reactor.move_tab(step),
            Command::Select(index) => reactor.select(index),
            Command::KillClient => reactor.close_selected(),
            Command::FocusOnce => {
                reactor.next_focus = true;
                Ok(())
            }
        }
    }
}
