use std::io::{self, IsTerminal};

use nix::sys::termios::{self, SetArg, Termios};
use nix::unistd::{self, Pid};

use crate::error::ShellError;

/// The controlling terminal as seen from the shell: which group owns it and
/// the modes to put back when the shell takes it again.
pub struct Terminal {
    shell_pgid: Pid,
    modes: Termios,
}

impl Terminal {
    /// Returns `None` when standard input is not a terminal.
    pub fn acquire(shell_pgid: Pid) -> Option<Self> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return None;
        }
        match termios::tcgetattr(&stdin) {
            Ok(modes) => Some(Self { shell_pgid, modes }),
            Err(e) => {
                tracing::warn!("tcgetattr failed, job control without a terminal: {e}");
                None
            }
        }
    }

    pub fn give_to(&self, pgid: Pid) -> Result<(), ShellError> {
        tracing::debug!(%pgid, "terminal handed over");
        unistd::tcsetpgrp(io::stdin(), pgid).map_err(ShellError::os("tcsetpgrp"))
    }

    /// Hands the terminal back to the shell's group and restores its modes.
    pub fn reclaim(&self) -> Result<(), ShellError> {
        let stdin = io::stdin();
        unistd::tcsetpgrp(&stdin, self.shell_pgid).map_err(ShellError::os("tcsetpgrp"))?;
        termios::tcsetattr(&stdin, SetArg::TCSADRAIN, &self.modes)
            .map_err(ShellError::os("tcsetattr"))
    }
}
