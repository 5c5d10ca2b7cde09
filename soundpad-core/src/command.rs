use std::time::Duration;

use crossbeam_channel::Receiver;

pub enum Command {
    /// Silence the outputs and halt processing.
    Stop,
}

/// Sends commands to a running [`crate::SoundpadCore`] from outside the
/// real-time thread.
pub struct Controller {
    commands: ringbuf::Producer<Command>,
    halted: Receiver<()>,
}

impl Controller {
    pub(crate) fn new(commands: ringbuf::Producer<Command>, halted: Receiver<()>) -> Controller {
        Controller { commands, halted }
    }

    /// Asks the processor to stop and waits until it has silenced its
    /// outputs. Returns `false` if it did not acknowledge within `timeout`.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        if self.commands.push(Command::Stop).is_err() {
            return false;
        }
        self.halted.recv_timeout(timeout).is_ok()
    }
}
