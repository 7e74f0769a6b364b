use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the single UI-affine task queue. Anything that mutates
/// displayed-page state must be posted here; jobs run strictly in post
/// order on one dedicated task.
#[derive(Clone)]
pub struct MainQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl MainQueue {
    /// Enqueue a job. Returns false when the queue has shut down (the job
    /// is dropped).
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        if self.tx.send(Box::new(job)).is_err() {
            warn!("main queue closed, job dropped");
            return false;
        }
        true
    }
}

/// Drains the queue on one task until cancellation or until every handle
/// is dropped.
pub struct MainQueueRunner {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl MainQueueRunner {
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("main queue stopped");
                    break;
                }
                job = self.rx.recv() => match job {
                    Some(job) => job(),
                    None => break,
                }
            }
        }
    }
}

/// Create the queue handle and its runner.
pub fn main_queue() -> (MainQueue, MainQueueRunner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MainQueue { tx }, MainQueueRunner { rx })
}
