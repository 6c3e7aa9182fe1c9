//! Maintenance pipeline plumbing
//!
//! Every structural mutation of the ordering list travels through a bounded
//! `mpsc` queue owned by exactly one worker task. Producers never panic on a
//! closed queue: they get an [`EnqueueError`] back and decide what to do.
//! Each queue also carries barrier tasks so callers can wait for everything
//! queued before them to be applied.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::core::EnqueueError;

/// Caller-supplied cancellation window for an enqueue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline
    pub fn none() -> Self {
        Self(None)
    }

    /// Expire `timeout` from now
    pub fn after(timeout: std::time::Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// Expire at a fixed instant
    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

/// Unit of work on a maintenance queue
pub(crate) enum Task<T> {
    Work(T),
    Barrier(oneshot::Sender<()>),
}

/// Producer side of a maintenance queue
pub(crate) struct Producer<T> {
    name: &'static str,
    tx: mpsc::Sender<Task<T>>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

/// Create a bounded queue; `capacity` must be positive
pub(crate) fn queue<T>(name: &'static str, capacity: usize) -> (Producer<T>, mpsc::Receiver<Task<T>>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Producer { name, tx }, rx)
}

impl<T> Producer<T> {
    /// Enqueue without waiting
    pub fn try_push(&self, item: T) -> Result<(), EnqueueError> {
        self.tx.try_send(Task::Work(item)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full(self.name),
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed(self.name),
        })
    }

    /// Enqueue, waiting for capacity until the deadline expires
    ///
    /// Capacity is reserved before the item is handed over, so an abandoned
    /// enqueue never leaves a job behind.
    pub async fn push(&self, item: T, deadline: Deadline) -> Result<(), EnqueueError> {
        let permit = match deadline.instant() {
            Some(at) => {
                tokio::select! {
                    permit = self.tx.reserve() => permit,
                    _ = tokio::time::sleep_until(at) => {
                        return Err(EnqueueError::DeadlineExceeded(self.name));
                    }
                }
            }
            None => self.tx.reserve().await,
        }
        .map_err(|_| EnqueueError::Closed(self.name))?;

        permit.send(Task::Work(item));
        Ok(())
    }

    /// Enqueue within the caller's window: with no deadline this is a single
    /// attempt that never waits, otherwise it waits for capacity until the
    /// deadline expires
    pub async fn offer(&self, item: T, deadline: Deadline) -> Result<(), EnqueueError> {
        match deadline.instant() {
            Some(_) => self.push(item, deadline).await,
            None => self.try_push(item),
        }
    }

    /// Wait until every task queued before this call has been handled
    pub async fn barrier(&self) -> Result<(), EnqueueError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Task::Barrier(ack_tx))
            .await
            .map_err(|_| EnqueueError::Closed(self.name))?;
        ack_rx.await.map_err(|_| EnqueueError::Closed(self.name))
    }
}

/// Next work item for a worker, answering barriers along the way
///
/// Returns `None` once the stop signal fires or every producer is gone.
pub(crate) async fn next_task<T>(
    rx: &mut mpsc::Receiver<Task<T>>,
    stop: &mut watch::Receiver<bool>,
) -> Option<T> {
    loop {
        if *stop.borrow() {
            return None;
        }

        tokio::select! {
            biased;

            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return None;
                }
            }

            task = rx.recv() => match task {
                Some(Task::Work(item)) => return Some(item),
                Some(Task::Barrier(ack)) => {
                    let _ = ack.send(());
                }
                None => return None,
            },
        }
    }
}
