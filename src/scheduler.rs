//! Synchronous waiting on the job that owns the terminal.

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::error::ShellError;
use crate::job::{JobId, JobStatus};
use crate::report::{Event, Report};
use crate::session::Session;

/// The first state change of a foreground process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Exited(i32),
    Signaled(Signal),
    Stopped(Signal),
}

/// Blocks until `pid` exits, dies from a signal, or stops. Continuations
/// are not reported.
pub fn wait_for_change(pid: Pid) -> Result<Change, ShellError> {
    loop {
        match wait::waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(Change::Exited(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(Change::Signaled(sig)),
            Ok(WaitStatus::Stopped(_, sig)) => return Ok(Change::Stopped(sig)),
            Ok(other) => tracing::debug!(?other, "ignoring wait status"),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ShellError::os("waitpid")(e)),
        }
    }
}

/// Waits for a process that currently owns the terminal, updates the job
/// table to match, and takes the terminal back.
///
/// `job` is `None` for a fresh launch that has no table entry yet, and the
/// job's id when it was brought back with `fg`.
pub fn run_foreground(session: &mut Session, pid: Pid, label: &str, job: Option<JobId>) {
    match wait_for_change(pid) {
        Ok(change) => {
            if let Some(report) = settle(session, pid, label, job, change) {
                println!("{report}");
            }
        }
        Err(e) => eprintln!("{e}"),
    }
    session.reclaim_terminal();
}

/// Applies a foreground state change to the job table and returns the
/// line to report, if any.
///
/// A normal exit is silent. Death by signal is reported and leaves no entry
/// behind. A stop records the job as stopped, registering it under the next
/// id if it was not tracked yet.
pub fn settle(
    session: &mut Session,
    pid: Pid,
    label: &str,
    job: Option<JobId>,
    change: Change,
) -> Option<Report> {
    tracing::debug!(%pid, ?job, ?change, "foreground job changed state");
    match (change, job) {
        (Change::Exited(_), Some(id)) => {
            session.jobs_mut().remove_by_id(id);
            None
        }
        (Change::Exited(_), None) => None,
        (Change::Signaled(sig), Some(id)) => {
            session.jobs_mut().remove_by_id(id);
            Some(Report::new(Some(id), pid, Event::Signaled(sig)))
        }
        (Change::Signaled(sig), None) => {
            Some(Report::new(Some(session.peek_job_id()), pid, Event::Signaled(sig)))
        }
        (Change::Stopped(sig), Some(id)) => {
            session.jobs_mut().update_status(id, JobStatus::Stopped);
            Some(Report::new(Some(id), pid, Event::Stopped(sig)))
        }
        (Change::Stopped(sig), None) => {
            let id = match session.register(pid, JobStatus::Stopped, label) {
                Ok(id) => Some(id),
                Err(e) => {
                    eprintln!("{e}");
                    None
                }
            };
            Some(Report::new(id, pid, Event::Stopped(sig)))
        }
    }
}
