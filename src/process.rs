use std::ffi::CString;
use std::io::{self, Write};

use nix::errno::Errno;
use nix::libc;
use nix::unistd::{self, ForkResult, Pid};

use crate::error::ShellError;
use crate::job::JobId;
use crate::redirection::{self, ParsedCommand};
use crate::report::{Event, Report};
use crate::signals;

/// Exit status of a child whose exec failed. Legacy shells used 0 here,
/// which looked like a silent success.
pub const EXEC_FAILURE_STATUS: i32 = 127;

/// Exit status of a child whose redirection could not be set up.
pub const REDIRECT_FAILURE_STATUS: i32 = 1;

/// Where a freshly launched job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Takes the terminal if the shell has one.
    Foreground { take_terminal: bool },
    /// Announces itself under the job id it is about to be given.
    Background(JobId),
}

/// Forks a child that leads its own process group and execs `program`.
///
/// Returns the child's pid in the parent; the child never returns.
pub fn launch(
    program: &str,
    command: &ParsedCommand,
    placement: Placement,
) -> Result<Pid, ShellError> {
    let path = CString::new(program).map_err(|e| ShellError::Io {
        context: program.to_string(),
        source: e.into(),
    })?;
    let argv = command
        .argv()
        .into_iter()
        .map(CString::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ShellError::Io {
            context: program.to_string(),
            source: e.into(),
        })?;

    // Anything buffered now would be written twice, once by each process.
    let _ = io::stdout().flush();

    // SAFETY: the shell is single threaded, so the child may allocate.
    match unsafe { unistd::fork() }.map_err(ShellError::os("fork"))? {
        ForkResult::Child => exec_child(&path, &argv, command, placement),
        ForkResult::Parent { child } => {
            // Also done in the child; whichever runs first wins the race.
            if let Err(e) = unistd::setpgid(child, child)
                && e != Errno::EACCES
            {
                tracing::warn!(%child, "setpgid from parent failed: {e}");
            }
            tracing::debug!(%child, program, ?placement, "launched");
            Ok(child)
        }
    }
}

fn exec_child(
    path: &CString,
    argv: &[CString],
    command: &ParsedCommand,
    placement: Placement,
) -> ! {
    let pid = unistd::getpid();
    let _ = unistd::setpgid(pid, pid);

    match placement {
        Placement::Foreground { take_terminal: true } => {
            let _ = unistd::tcsetpgrp(io::stdin(), pid);
        }
        Placement::Foreground { take_terminal: false } => {}
        Placement::Background(id) => {
            let line = format!("{}\n", Report::new(Some(id), pid, Event::Launched));
            let _ = unistd::write(io::stdout(), line.as_bytes());
        }
    }

    if let Err(e) = signals::restore_defaults() {
        eprintln!("Warning: could not restore signal dispositions: {e}");
    }

    if let Err(e) = redirection::apply(command) {
        eprintln!("{e}");
        exit_now(REDIRECT_FAILURE_STATUS);
    }

    let err = match unistd::execv(path, argv) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    eprintln!("execv: {}: {err}", path.to_string_lossy());
    exit_now(EXEC_FAILURE_STATUS)
}

/// Leaves the child without running the parent's exit hooks or flushing
/// buffers copied across the fork.
fn exit_now(status: i32) -> ! {
    // SAFETY: _exit is always safe to call; it never returns.
    unsafe { libc::_exit(status) }
}
