use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cycle::{Control, PollCycle, StreamShared, StreamStatus};
use super::streams::StreamSource;
use super::subscribers::Subscription;

pub struct StreamHandle<S: StreamSource> {
    shared: Arc<StreamShared<S>>,
    control: mpsc::UnboundedSender<Control>,
}

impl<S: StreamSource> Clone for StreamHandle<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            control: self.control.clone(),
        }
    }
}

impl<S: StreamSource> StreamHandle<S> {
    /// Registers a change callback. The stream leaves `Disabled` as soon as it
    /// has a subscriber and goes back once the last [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&S::Snapshot, &S::Change) + Send + Sync + 'static,
    {
        self.shared.subscribers.add(Arc::new(callback))
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    pub fn latest(&self) -> Option<Arc<S::Snapshot>> {
        self.shared.latest.borrow().clone()
    }

    pub fn status(&self) -> StreamStatus {
        *self.shared.status.borrow()
    }

    pub fn status_watch(&self) -> watch::Receiver<StreamStatus> {
        self.shared.status.subscribe()
    }

    pub fn completed_cycles(&self) -> u64 {
        self.shared.completed.load(Ordering::Relaxed)
    }

    /// Restarts the stream's timer with `period`, clamped to [`super::MIN_PERIOD`].
    pub fn set_period(&self, period: Duration) {
        self.send(Control::Period(period));
    }

    pub fn reset(&self) {
        self.send(Control::Reset);
    }

    pub fn pause(&self) {
        self.send(Control::Pause);
    }

    pub fn resume(&self) {
        self.send(Control::Resume);
    }

    fn send(&self, control: Control) {
        if self.control.send(control).is_err() {
            debug!(control = ?control, "stream already stopped");
        }
    }
}

pub struct Scheduler {
    cancel: CancellationToken,
    fetch_timeout: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(fetch_timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            fetch_timeout,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Starts polling `source` every `period`. A stream spawned `paused`
    /// waits for [`StreamHandle::resume`] before its first fetch.
    pub fn spawn<S: StreamSource>(&self, source: S, period: Duration, paused: bool) -> StreamHandle<S> {
        let initial = if paused {
            StreamStatus::Paused
        } else {
            StreamStatus::Disabled
        };
        let shared = Arc::new(StreamShared::new(initial));
        let (control, receiver) = mpsc::unbounded_channel();
        let cycle = PollCycle::new(
            source,
            shared.clone(),
            receiver,
            period,
            paused,
            self.fetch_timeout,
            self.cancel.child_token(),
        );

        let task = tokio::spawn(cycle.run());
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);

        StreamHandle { shared, control }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let count = tasks.len();
        join_all(tasks).await;
        info!(streams = count, "scheduler shut down");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
