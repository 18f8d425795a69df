//! Dedicated writer threads for orchestrator mutations.
//!
//! Callers hand a closure to [`WritePool::submit`] and get a
//! [`PendingWrite`] back. It can be awaited from async code or waited on
//! from a plain thread. Jobs are not cancellable once queued.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::JoinHandle;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, trace, warn};

use super::{StickerService, UpdateStatus};
use crate::error::{Result, StickerError};
use crate::outcome::Outcome;
use crate::pack::{PackLinks, Sticker, StickerPack};

/// Upper bound on writer threads; SQLite has a single writer anyway.
pub const MAX_WRITE_THREADS: usize = 2;

type Job = Box<dyn FnOnce(&StickerService) + Send + 'static>;

/// Completion handle of a submitted write.
#[derive(Debug)]
pub struct PendingWrite<T> {
    rx: oneshot::Receiver<Outcome<T>>,
}

fn dropped<T>() -> Outcome<T> {
    Outcome::Failure(StickerError::WorkerUnavailable(
        "writer stopped before completing the job".to_string(),
    ))
}

impl<T> PendingWrite<T> {
    /// Block the current thread until the write finishes. Must not be
    /// called from inside an async runtime.
    pub fn wait(self) -> Outcome<T> {
        self.rx.blocking_recv().unwrap_or_else(|_| dropped())
    }
}

impl<T> Future for PendingWrite<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or_else(|_| dropped()))
    }
}

/// A small pool of threads executing [`StickerService`] mutations.
pub struct WritePool {
    service: Arc<StickerService>,
    sender: Option<mpsc::UnboundedSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for WritePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritePool")
            .field("workers", &self.workers.len())
            .field("open", &self.sender.is_some())
            .finish_non_exhaustive()
    }
}

impl WritePool {
    /// Start `threads` writers, clamped to `1..=MAX_WRITE_THREADS`.
    pub fn new(service: Arc<StickerService>, threads: usize) -> Result<Self> {
        let threads = threads.clamp(1, MAX_WRITE_THREADS);
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let receiver = Arc::clone(&receiver);
            let service = Arc::clone(&service);
            let handle = std::thread::Builder::new()
                .name(format!("sticker-writer-{index}"))
                .spawn(move || {
                    debug!(index, "Writer thread started");
                    loop {
                        let job = receiver.blocking_lock().blocking_recv();
                        let Some(job) = job else { break };
                        trace!(index, "Running write job");
                        job(&service);
                    }
                    debug!(index, "Writer thread stopped");
                })
                .map_err(|e| StickerError::WorkerUnavailable(format!("failed to spawn writer: {e}")))?;
            workers.push(handle);
        }

        Ok(Self {
            service,
            sender: Some(sender),
            workers,
        })
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// The service the writers run against. Reads may use it directly.
    pub fn service(&self) -> &Arc<StickerService> {
        &self.service
    }

    /// Queue `f` to run on a writer thread.
    pub fn submit<T, F>(&self, f: F) -> PendingWrite<T>
    where
        T: Send + 'static,
        F: FnOnce(&StickerService) -> Outcome<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |service: &StickerService| {
            // Receiver may have been dropped; the write still happened.
            let _ = tx.send(f(service));
        });
        if let Some(sender) = &self.sender {
            if sender.send(job).is_err() {
                warn!("Write pool closed, job dropped");
            }
        }
        PendingWrite { rx }
    }

    pub fn save_pack(&self, pack: StickerPack) -> PendingWrite<StickerPack> {
        self.submit(move |s| s.save_pack(pack))
    }

    pub fn add_stickers(&self, identifier: impl Into<String>, stickers: Vec<Sticker>) -> PendingWrite<StickerPack> {
        let identifier = identifier.into();
        self.submit(move |s| s.add_stickers(&identifier, stickers))
    }

    pub fn update_pack_name(&self, identifier: impl Into<String>, name: impl Into<String>) -> PendingWrite<UpdateStatus> {
        let (identifier, name) = (identifier.into(), name.into());
        self.submit(move |s| s.update_pack_name(&identifier, &name))
    }

    pub fn update_pack_links(&self, identifier: impl Into<String>, links: PackLinks) -> PendingWrite<UpdateStatus> {
        let identifier = identifier.into();
        self.submit(move |s| s.update_pack_links(&identifier, &links))
    }

    pub fn rename_sticker(
        &self,
        identifier: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> PendingWrite<UpdateStatus> {
        let (identifier, old_name, new_name) = (identifier.into(), old_name.into(), new_name.into());
        self.submit(move |s| s.rename_sticker(&identifier, &old_name, &new_name))
    }

    pub fn delete_pack(&self, identifier: impl Into<String>) -> PendingWrite<usize> {
        let identifier = identifier.into();
        self.submit(move |s| s.delete_pack(&identifier))
    }

    pub fn delete_sticker(&self, identifier: impl Into<String>, file_name: impl Into<String>) -> PendingWrite<usize> {
        let (identifier, file_name) = (identifier.into(), file_name.into());
        self.submit(move |s| s.delete_sticker(&identifier, &file_name))
    }

    /// Stop accepting jobs and wait for queued ones to finish.
    pub fn shutdown(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("Writer thread panicked");
            }
        }
    }
}

impl Drop for WritePool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
