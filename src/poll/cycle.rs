use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::diff::ChangeDescriptor;
use super::streams::{Disposition, StreamSource};
use super::subscribers::Subscribers;
use crate::error::ApiError;

/// Shortest period a stream accepts.
pub const MIN_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamStatus {
    Disabled,
    Idle,
    Fetching,
    Diffing,
    Notifying,
    Paused,
    Stopped,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Period(Duration),
    Reset,
    Pause,
    Resume,
}

/// State of one stream visible outside its task.
pub(crate) struct StreamShared<S: StreamSource> {
    pub(crate) subscribers: Arc<Subscribers<S::Snapshot, S::Change>>,
    pub(crate) latest: watch::Sender<Option<Arc<S::Snapshot>>>,
    pub(crate) status: watch::Sender<StreamStatus>,
    pub(crate) completed: AtomicU64,
}

impl<S: StreamSource> StreamShared<S> {
    pub(crate) fn new(initial: StreamStatus) -> Self {
        Self {
            subscribers: Arc::new(Subscribers::new()),
            latest: watch::channel(None).0,
            status: watch::channel(initial).0,
            completed: AtomicU64::new(0),
        }
    }

    fn set_status(&self, status: StreamStatus) {
        self.status.send_if_modified(|current| {
            let modified = *current != status;
            *current = status;
            modified
        });
    }
}

/// Fetch → diff → notify loop of a single stream.
///
/// The cycle is one task and sleeps only after the previous iteration has
/// fully finished, so a stream never overlaps itself. The last snapshot lives
/// in the task and is only touched here.
pub(crate) struct PollCycle<S: StreamSource> {
    source: Arc<S>,
    shared: Arc<StreamShared<S>>,
    control: mpsc::UnboundedReceiver<Control>,
    period: Duration,
    paused: bool,
    fetch_timeout: Duration,
    cancel: CancellationToken,
    last: Option<Arc<S::Snapshot>>,
}

impl<S: StreamSource> PollCycle<S> {
    pub(crate) fn new(
        source: S,
        shared: Arc<StreamShared<S>>,
        control: mpsc::UnboundedReceiver<Control>,
        period: Duration,
        paused: bool,
        fetch_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source: Arc::new(source),
            shared,
            control,
            period: period.max(MIN_PERIOD),
            paused,
            fetch_timeout,
            cancel,
            last: None,
        }
    }

    pub(crate) async fn run(mut self) {
        let kind = self.source.kind();
        info!(stream = %kind, period = ?self.period, paused = self.paused, "poll cycle started");
        let mut fire_now = true;

        'cycle: loop {
            if !fire_now {
                self.shared.set_status(self.resting_status());
                tokio::select! {
                    _ = self.cancel.cancelled() => break 'cycle,
                    Some(control) = self.control.recv() => {
                        fire_now = self.apply(control);
                        continue 'cycle;
                    }
                    _ = tokio::time::sleep(self.period) => {}
                }
            }
            fire_now = false;

            if self.paused {
                self.shared.set_status(StreamStatus::Paused);
                tokio::select! {
                    _ = self.cancel.cancelled() => break 'cycle,
                    Some(control) = self.control.recv() => {
                        fire_now = self.apply(control);
                        continue 'cycle;
                    }
                }
            }

            if self.shared.subscribers.is_empty() {
                self.shared.set_status(StreamStatus::Disabled);
                let subscribers = self.shared.subscribers.clone();
                tokio::select! {
                    _ = self.cancel.cancelled() => break 'cycle,
                    _ = subscribers.subscribed() => {
                        fire_now = true;
                        continue 'cycle;
                    }
                    Some(control) = self.control.recv() => {
                        fire_now = self.apply(control);
                        continue 'cycle;
                    }
                }
            }

            self.shared.set_status(StreamStatus::Fetching);
            let source = self.source.clone();
            let fetch = tokio::time::timeout(self.fetch_timeout, source.fetch());
            tokio::pin!(fetch);

            let outcome = loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => break 'cycle,
                    Some(control) = self.control.recv() => {
                        if self.apply(control) {
                            debug!(stream = %kind, "in-flight fetch abandoned");
                            fire_now = true;
                            continue 'cycle;
                        }
                    }
                    outcome = &mut fetch => break outcome,
                }
            };

            match outcome {
                Ok(Ok(snapshot)) => self.process(snapshot),
                Ok(Err(err)) => self.handle_failure(err).await,
                Err(_) => self.handle_failure(ApiError::Timeout(self.fetch_timeout)).await,
            }
            self.shared.completed.fetch_add(1, Ordering::Relaxed);
        }

        self.shared.set_status(StreamStatus::Stopped);
        info!(stream = %kind, "poll cycle stopped");
    }

    fn resting_status(&self) -> StreamStatus {
        if self.paused {
            StreamStatus::Paused
        } else if self.shared.subscribers.is_empty() {
            StreamStatus::Disabled
        } else {
            StreamStatus::Idle
        }
    }

    fn process(&mut self, snapshot: S::Snapshot) {
        self.shared.set_status(StreamStatus::Diffing);
        let change = self.source.diff(self.last.as_deref(), &snapshot);

        let snapshot = Arc::new(snapshot);
        self.last = Some(snapshot.clone());
        self.shared.latest.send_replace(Some(snapshot.clone()));

        if change.changed() {
            self.shared.set_status(StreamStatus::Notifying);
            let delivered = self.shared.subscribers.notify(&snapshot, &change);
            debug!(stream = %self.source.kind(), subscribers = delivered, "change notified");
        }
    }

    async fn handle_failure(&mut self, err: ApiError) {
        let kind = self.source.kind();
        match self.source.on_error(&err).await {
            Disposition::Retry => {
                warn!(stream = %kind, error = %err, "poll failed, retrying next period");
            }
            Disposition::Pause => {
                error!(stream = %kind, error = %err, "poll failed, stream paused");
                self.paused = true;
            }
        }
    }

    /// Applies a control message; returns true when the stream must start a
    /// new cycle immediately, abandoning any fetch in flight.
    fn apply(&mut self, control: Control) -> bool {
        debug!(stream = %self.source.kind(), control = ?control, "control received");
        match control {
            Control::Period(period) => {
                self.period = period.max(MIN_PERIOD);
                false
            }
            Control::Reset => {
                self.clear_baseline();
                true
            }
            Control::Pause => {
                self.paused = true;
                true
            }
            Control::Resume => {
                self.paused = false;
                self.clear_baseline();
                true
            }
        }
    }

    fn clear_baseline(&mut self) {
        self.last = None;
        self.shared.latest.send_replace(None);
    }
}
