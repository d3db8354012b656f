//! Bounded background workers, one lane per operation kind.
//!
//! Tool invocations and gallery fetches must never run on the UI-affine
//! context. Rather than a thread per call, each logical operation kind gets
//! one long-lived worker thread draining a bounded queue; a full queue
//! rejects the job so rapid repeated invocations cannot pile up unbounded
//! work. Jobs run to completion once started; there is no cancellation.

use std::io;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::thread;
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Logical operation kinds, each with its own lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Catalog refresh (list + gallery search).
    Refresh,
    /// Snippet detail fetch.
    Fetch,
    /// Snippet run invocation.
    Run,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("background queue is full")]
    QueueFull,
    #[error("background worker has stopped")]
    Stopped,
}

/// Pending jobs allowed per lane before submissions are rejected.
const LANE_DEPTH: usize = 8;

struct Lane {
    tx: SyncSender<Job>,
}

impl Lane {
    fn start(name: &str) -> io::Result<Self> {
        let (tx, rx): (SyncSender<Job>, Receiver<Job>) = sync_channel(LANE_DEPTH);
        thread::Builder::new()
            .name(format!("sniprunner-{name}"))
            .spawn(move || {
                for job in rx {
                    job();
                }
            })?;
        Ok(Self { tx })
    }

    fn submit(&self, job: Job) -> Result<(), SubmitError> {
        self.tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => SubmitError::QueueFull,
            TrySendError::Disconnected(_) => SubmitError::Stopped,
        })
    }
}

pub struct Workers {
    refresh: Lane,
    fetch: Lane,
    run: Lane,
}

impl Workers {
    pub fn start() -> io::Result<Self> {
        Ok(Self {
            refresh: Lane::start("refresh")?,
            fetch: Lane::start("fetch")?,
            run: Lane::start("run")?,
        })
    }

    pub fn submit(
        &self,
        kind: OpKind,
        job: impl FnOnce() + Send + 'static,
    ) -> Result<(), SubmitError> {
        let lane = match kind {
            OpKind::Refresh => &self.refresh,
            OpKind::Fetch => &self.fetch,
            OpKind::Run => &self.run,
        };
        lane.submit(Box::new(job))
    }
}
