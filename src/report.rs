use std::fmt;

use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::job::JobId;

/// What happened to a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Launched,
    Exited(i32),
    Signaled(Signal),
    Stopped(Signal),
    Resumed,
}

/// One status line written to standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub job: Option<JobId>,
    pub pid: Pid,
    pub event: Event,
}

impl Report {
    pub fn new(job: Option<JobId>, pid: Pid, event: Event) -> Self {
        Self { job, pid, event }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = self.job {
            write!(f, "[{id}] ")?;
        }
        write!(f, "({})", self.pid)?;
        match self.event {
            Event::Launched => Ok(()),
            Event::Exited(code) => write!(f, " terminated with exit status {code}"),
            Event::Signaled(sig) => write!(f, " terminated by signal {}", sig as i32),
            Event::Stopped(sig) => write!(f, " suspended by signal {}", sig as i32),
            Event::Resumed => write!(f, " resumed"),
        }
    }
}
