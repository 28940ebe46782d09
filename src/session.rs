use nix::unistd::{self, Pid};

use crate::commands::{self, Builtin};
use crate::config::Config;
use crate::error::ShellError;
use crate::job::{JobId, JobStatus, JobTable};
use crate::process::{self, Placement};
use crate::redirection;
use crate::scheduler;
use crate::terminal::Terminal;
use crate::tokenize::tokenize;

/// What the read loop does after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Process-wide shell state, owned by the read loop and lent to every
/// component that touches jobs or the terminal.
pub struct Session {
    jobs: JobTable,
    shell_pgid: Pid,
    next_job_id: JobId,
    terminal: Option<Terminal>,
}

impl Session {
    pub fn start(config: &Config) -> Self {
        let shell_pgid = unistd::getpgrp();
        let terminal = Terminal::acquire(shell_pgid);
        tracing::debug!(%shell_pgid, interactive = terminal.is_some(), "session started");
        Self::new(config, shell_pgid, terminal)
    }

    pub fn new(config: &Config, shell_pgid: Pid, terminal: Option<Terminal>) -> Self {
        Self {
            jobs: JobTable::new(config.max_jobs),
            shell_pgid,
            next_job_id: 1,
            terminal,
        }
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut JobTable {
        &mut self.jobs
    }

    pub fn has_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// The id the next registered job will get.
    pub fn peek_job_id(&self) -> JobId {
        self.next_job_id
    }

    /// True once any job has been registered; before that there is nothing
    /// for the reaper to find.
    pub fn has_registered_jobs(&self) -> bool {
        self.next_job_id > 1
    }

    /// Records `pid` under the next job id. Ids are never handed out twice.
    pub fn register(
        &mut self,
        pid: Pid,
        status: JobStatus,
        label: &str,
    ) -> Result<JobId, ShellError> {
        let id = self.next_job_id;
        let next = id.checked_add(1).ok_or(ShellError::JobTableFull)?;
        self.jobs.add(id, pid, status, label)?;
        self.next_job_id = next;
        Ok(id)
    }

    pub fn give_terminal_to(&self, pgid: Pid) -> Result<(), ShellError> {
        match self.terminal {
            Some(ref terminal) => terminal.give_to(pgid),
            None => Ok(()),
        }
    }

    /// Puts the shell's group back in the foreground. Failures are reported
    /// and otherwise ignored.
    pub fn reclaim_terminal(&self) {
        if let Some(ref terminal) = self.terminal
            && let Err(e) = terminal.reclaim()
        {
            eprintln!("{e}");
        }
    }

    /// Runs one input line through parsing, builtin dispatch and, failing
    /// that, process creation.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }
        let command = redirection::parse_command(tokens)?;

        if let Some(builtin) = Builtin::lookup(command.program()) {
            return commands::execute_builtin(self, builtin, &command.args);
        }

        let program = commands::resolve_program(command.program())?;
        if command.background {
            // The child announces its id before the parent can register it.
            if self.jobs.is_full() {
                return Err(ShellError::JobTableFull);
            }
            let id = self.peek_job_id();
            let pid = process::launch(&program, &command, Placement::Background(id))?;
            if let Err(e) = self.register(pid, JobStatus::Running, command.label()) {
                eprintln!("{e}");
            }
        } else {
            let placement = Placement::Foreground {
                take_terminal: self.has_terminal(),
            };
            let pid = process::launch(&program, &command, placement)?;
            if let Err(e) = self.give_terminal_to(pid) {
                eprintln!("{e}");
            }
            scheduler::run_foreground(self, pid, command.label(), None);
        }
        Ok(Flow::Continue)
    }

    /// A session with no terminal, for exercising job bookkeeping in tests.
    #[cfg(test)]
    pub(crate) fn detached(max_jobs: usize) -> Self {
        let config = Config {
            max_jobs,
            ..Config::default()
        };
        Self::new(&config, Pid::from_raw(1), None)
    }

    /// Forgets every tracked job. Running jobs are neither signalled nor
    /// waited for.
    pub fn teardown(mut self) {
        if !self.jobs.is_empty() {
            tracing::debug!(pgid = %self.shell_pgid, "leaving jobs behind");
        }
        self.jobs.teardown();
    }
}
