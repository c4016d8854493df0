//! Bookkeeping for processes the interpreter does not wait on at launch time.
//!
//! [`JobTable`] holds background jobs until they are reaped after some later line.
//! [`StageRegistry`] holds the stages of the pipeline being run right now and is
//! drained before the pipeline returns.

use crate::error::ShellError;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::process::Child;
use std::time::Duration;

/// Job ids start at 0 and are never reused within a session.
pub type JobId = u64;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A tracked background process.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    pid: u32,
    name: String,
    child: Child,
}

impl Job {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Command line as shown by `jobs`, with a trailing space.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    fn interrupt(&self) -> nix::Result<()> {
        kill(Pid::from_raw(self.pid as i32), Signal::SIGINT)
    }
}

/// Background jobs ordered by job id, which is also insertion order.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: BTreeMap<JobId, Job>,
    next_id: JobId,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly spawned child under the next job id.
    pub fn insert(&mut self, child: Child, display_name: String) -> &Job {
        let id = self.next_id;
        self.next_id += 1;
        let pid = child.id();
        debug_assert!(!self.contains_pid(pid), "pid {pid} tracked twice");
        log::debug!("job [{id}] pid {pid} started: {display_name}");
        self.jobs.entry(id).or_insert(Job {
            id,
            pid,
            name: display_name,
            child,
        })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn contains_pid(&self, pid: u32) -> bool {
        self.jobs.values().any(|job| job.pid == pid)
    }

    /// Jobs in job-id order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Write one `[id] name pid` line per job. The table is not modified.
    pub fn list(&self, out: &mut dyn Write) -> io::Result<()> {
        for job in self.iter() {
            writeln!(out, "[{}] {}{}", job.id, job.name, job.pid)?;
        }
        Ok(())
    }

    /// Send SIGINT to one job. The entry stays until the job is reaped.
    pub fn interrupt(&self, id: JobId) -> Result<(), ShellError> {
        let job = self.jobs.get(&id).ok_or(ShellError::NoSuchJob)?;
        if let Err(e) = job.interrupt() {
            log::warn!("kill [{}] pid {}: {}", job.id, job.pid, e);
        }
        Ok(())
    }

    /// Send SIGINT to every job, best effort.
    pub fn interrupt_all(&self) {
        for job in self.iter() {
            log::debug!("interrupting job [{}] pid {}", job.id, job.pid);
            if let Err(e) = job.interrupt() {
                log::warn!("kill [{}] pid {}: {}", job.id, job.pid, e);
            }
        }
    }

    /// Reap every job that has exited, without blocking.
    ///
    /// Each reaped job is removed and reported once as `[id]: finished name`.
    pub fn poll_finished(&mut self, out: &mut dyn Write) -> io::Result<Vec<Job>> {
        let mut finished = Vec::new();
        for (id, job) in self.jobs.iter_mut() {
            match job.child.try_wait() {
                Ok(Some(status)) => {
                    log::debug!("job [{id}] pid {} exited: {status}", job.pid);
                    finished.push(*id);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("wait on job [{id}] pid {}: {e}", job.pid);
                    finished.push(*id);
                }
            }
        }

        let mut reaped = Vec::with_capacity(finished.len());
        for id in finished {
            if let Some(job) = self.jobs.remove(&id) {
                writeln!(out, "[{}]: finished {}", job.id, job.name)?;
                reaped.push(job);
            }
        }
        Ok(reaped)
    }
}

/// Processes of the pipeline currently being run.
#[derive(Debug, Default)]
pub struct StageRegistry {
    stages: Vec<Child>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, child: Child) {
        log::trace!("pipeline stage pid {} registered", child.id());
        self.stages.push(child);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// One non-blocking pass; returns how many stages were reaped.
    pub fn reap(&mut self) -> usize {
        let before = self.stages.len();
        self.stages.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                log::trace!("pipeline stage pid {} exited: {status}", child.id());
                false
            }
            Ok(None) => true,
            Err(e) => {
                log::warn!("wait on pipeline stage pid {}: {e}", child.id());
                false
            }
        });
        before - self.stages.len()
    }

    /// Block until every registered stage has been reaped.
    pub fn drain(&mut self) {
        while !self.stages.is_empty() {
            if self.reap() == 0 {
                std::thread::sleep(DRAIN_POLL_INTERVAL);
            }
        }
    }
}
