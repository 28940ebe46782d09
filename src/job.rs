use std::fmt;

use nix::unistd::Pid;

use crate::error::ShellError;

/// Shell-assigned job number, starting at 1.
pub type JobId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Running => "Running",
            JobStatus::Stopped => "Stopped",
        })
    }
}

/// A background or stopped process group tracked by the shell.
///
/// `pid` is both the leader's process id and the group id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub pid: Pid,
    pub status: JobStatus,
    pub label: String,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ({}) {} {}", self.id, self.pid, self.status, self.label)
    }
}

/// Bounded, insertion-ordered record of live jobs.
#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<Job>,
    capacity: usize,
}

impl JobTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: Vec::new(),
            capacity,
        }
    }

    /// Inserts a job. A second entry for a pid already present replaces the
    /// old one so each pid maps to at most one job.
    pub fn add(
        &mut self,
        id: JobId,
        pid: Pid,
        status: JobStatus,
        label: impl Into<String>,
    ) -> Result<(), ShellError> {
        if let Some(stale) = self.jobs.iter().position(|j| j.pid == pid) {
            tracing::warn!(%pid, "replacing stale job entry");
            self.jobs.remove(stale);
        } else if self.is_full() {
            return Err(ShellError::JobTableFull);
        }
        self.jobs.push(Job {
            id,
            pid,
            status,
            label: label.into(),
        });
        tracing::debug!(id, %pid, ?status, "job added");
        Ok(())
    }

    pub fn remove_by_id(&mut self, id: JobId) -> Option<Job> {
        let index = self.jobs.iter().position(|j| j.id == id)?;
        tracing::debug!(id, "job removed");
        Some(self.jobs.remove(index))
    }

    /// Returns false when no job has this id.
    pub fn update_status(&mut self, id: JobId, status: JobStatus) -> bool {
        match self.jobs.iter_mut().find(|j| j.id == id) {
            Some(job) => {
                job.status = status;
                true
            }
            None => false,
        }
    }

    pub fn find_id_by_pid(&self, pid: Pid) -> Option<JobId> {
        self.jobs.iter().find(|j| j.pid == pid).map(|j| j.id)
    }

    pub fn find_pid_by_id(&self, id: JobId) -> Option<Pid> {
        self.jobs.iter().find(|j| j.id == id).map(|j| j.pid)
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn list(&self) -> &[Job] {
        &self.jobs
    }

    /// The `jobs` builtin output, one line per job.
    pub fn listing(&self) -> String {
        self.list().iter().map(|job| format!("{job}\n")).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.capacity
    }

    /// Drops all bookkeeping. The processes themselves are left alone.
    pub fn teardown(&mut self) {
        tracing::debug!(remaining = self.len(), "job table torn down");
        self.jobs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn test_lookups_are_inverse() {
        let mut table = JobTable::new(8);
        table.add(1, pid(100), JobStatus::Running, "sleep").unwrap();
        table.add(2, pid(200), JobStatus::Stopped, "vim").unwrap();
        table.add(5, pid(300), JobStatus::Running, "cat").unwrap();

        for job in table.list() {
            assert_eq!(table.find_pid_by_id(job.id), Some(job.pid));
            assert_eq!(table.find_id_by_pid(job.pid), Some(job.id));
        }
        assert_eq!(table.find_pid_by_id(3), None);
        assert_eq!(table.find_id_by_pid(pid(400)), None);
    }

    #[test]
    fn test_full_table_rejects() {
        let mut table = JobTable::new(1);
        table.add(1, pid(100), JobStatus::Running, "a").unwrap();
        assert!(table.is_full());
        assert!(matches!(
            table.add(2, pid(101), JobStatus::Running, "b"),
            Err(ShellError::JobTableFull)
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_one_entry_per_pid() {
        let mut table = JobTable::new(1);
        table.add(1, pid(100), JobStatus::Running, "a").unwrap();
        table.add(2, pid(100), JobStatus::Stopped, "a").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_id_by_pid(pid(100)), Some(2));
    }

    #[test]
    fn test_remove_and_update_missing_are_noops() {
        let mut table = JobTable::new(4);
        table.add(1, pid(100), JobStatus::Running, "sleep").unwrap();
        assert!(table.remove_by_id(9).is_none());
        assert!(!table.update_status(9, JobStatus::Stopped));
        assert_eq!(table.len(), 1);

        assert!(table.remove_by_id(1).is_some());
        assert!(table.remove_by_id(1).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_listing_keeps_insertion_order() {
        let mut table = JobTable::new(4);
        table.add(3, pid(30), JobStatus::Stopped, "vim").unwrap();
        table.add(1, pid(10), JobStatus::Running, "sleep").unwrap();
        assert!(table.update_status(1, JobStatus::Stopped));
        assert_eq!(
            table.listing(),
            "[3] (30) Stopped vim\n[1] (10) Stopped sleep\n"
        );

        table.teardown();
        assert_eq!(table.listing(), "");
    }
}
