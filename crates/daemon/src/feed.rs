use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Latest value published by a background poller, plus the poller's task.
///
/// The poller exits when the shutdown channel it was spawned with flips (or
/// its sender is dropped); [`Feed::join`] waits for that.
#[derive(Debug)]
pub struct Feed<T> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T: Clone> Feed<T> {
    pub(crate) fn new(rx: watch::Receiver<T>, task: JoinHandle<()>) -> Self {
        Self { rx, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }

    pub fn latest(&self) -> T {
        self.rx.borrow().clone()
    }

    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "poller task ended abnormally");
        }
    }
}
