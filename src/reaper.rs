//! Non-blocking collection of background state changes between prompts.

use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::job::{JobStatus, JobTable};
use crate::report::{Event, Report};

/// Drains every pending child status change, reporting each one and
/// reconciling the job table. Returns once no child has anything to report.
pub fn reap(jobs: &mut JobTable) {
    let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
    loop {
        let status = match wait::waitpid(Pid::from_raw(-1), Some(flags)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Ok(status) => status,
            Err(Errno::EINTR) => continue,
            Err(e) => {
                eprintln!("waitpid: {e}");
                break;
            }
        };
        if let Some(report) = reconcile(jobs, status) {
            println!("{report}");
        }
    }
}

/// Applies one wait status to the table.
pub fn reconcile(jobs: &mut JobTable, status: WaitStatus) -> Option<Report> {
    let (pid, event) = match status {
        WaitStatus::Exited(pid, code) => (pid, Event::Exited(code)),
        WaitStatus::Signaled(pid, sig, _) => (pid, Event::Signaled(sig)),
        WaitStatus::Stopped(pid, sig) => (pid, Event::Stopped(sig)),
        WaitStatus::Continued(pid) => (pid, Event::Resumed),
        other => {
            tracing::debug!(?other, "ignoring wait status");
            return None;
        }
    };

    let id = jobs.find_id_by_pid(pid);
    tracing::debug!(%pid, ?id, ?event, "reaped");
    if let Some(id) = id {
        match event {
            Event::Exited(_) | Event::Signaled(_) => {
                jobs.remove_by_id(id);
            }
            Event::Stopped(_) => {
                jobs.update_status(id, JobStatus::Stopped);
            }
            Event::Resumed => {
                jobs.update_status(id, JobStatus::Running);
            }
            Event::Launched => {}
        }
    }
    Some(Report::new(id, pid, event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    fn table_with(pid: i32, status: JobStatus) -> JobTable {
        let mut jobs = JobTable::new(4);
        jobs.add(1, Pid::from_raw(pid), status, "sleep").unwrap();
        jobs
    }

    #[test]
    fn test_exit_removes_job() {
        let mut jobs = table_with(100, JobStatus::Running);
        let report = reconcile(&mut jobs, WaitStatus::Exited(Pid::from_raw(100), 0)).unwrap();
        assert_eq!(report.to_string(), "[1] (100) terminated with exit status 0");
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_signal_removes_job() {
        let mut jobs = table_with(100, JobStatus::Stopped);
        let status = WaitStatus::Signaled(Pid::from_raw(100), Signal::SIGTERM, false);
        let report = reconcile(&mut jobs, status).unwrap();
        assert_eq!(report.to_string(), "[1] (100) terminated by signal 15");
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_stop_and_continue_update_in_place() {
        let mut jobs = table_with(100, JobStatus::Running);
        let stopped = WaitStatus::Stopped(Pid::from_raw(100), Signal::SIGSTOP);
        assert!(reconcile(&mut jobs, stopped).is_some());
        assert_eq!(jobs.get(1).unwrap().status, JobStatus::Stopped);

        let report = reconcile(&mut jobs, WaitStatus::Continued(Pid::from_raw(100))).unwrap();
        assert_eq!(report.to_string(), "[1] (100) resumed");
        assert_eq!(jobs.get(1).unwrap().status, JobStatus::Running);
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_untracked_pid_reported_without_id() {
        let mut jobs = table_with(100, JobStatus::Running);
        let report = reconcile(&mut jobs, WaitStatus::Exited(Pid::from_raw(999), 3)).unwrap();
        assert_eq!(report.to_string(), "(999) terminated with exit status 3");
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_still_alive_is_ignored() {
        let mut jobs = table_with(100, JobStatus::Running);
        assert!(reconcile(&mut jobs, WaitStatus::StillAlive).is_none());
    }
}
