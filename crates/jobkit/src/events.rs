//! Event channels between a running job and its consumer
//!
//! A job reports on five bounded channels. Sends wait when a channel is full,
//! so nothing is ever dropped. The consumer loop ends only once every sender
//! is gone and every channel is empty.

use crate::context::EventSink;
use crate::error::JobError;
use log::debug;
use tokio::sync::mpsc::{Receiver, Sender, channel};

/// Sending halves, owned by the job
#[derive(Debug)]
pub struct JobEvents {
    deltas: Sender<String>,
    notices: Sender<String>,
    responses: Sender<String>,
    information: Sender<String>,
    errors: Sender<JobError>,
}

/// Receiving halves, owned by the consumer
#[derive(Debug)]
pub struct JobReceivers {
    deltas: Receiver<String>,
    notices: Receiver<String>,
    responses: Receiver<String>,
    information: Receiver<String>,
    errors: Receiver<JobError>,
}

/// Create the five channels with `capacity` slots each
pub fn job_channels(capacity: usize) -> (JobEvents, JobReceivers) {
    let capacity = capacity.max(1);
    let (deltas_tx, deltas_rx) = channel(capacity);
    let (notices_tx, notices_rx) = channel(capacity);
    let (responses_tx, responses_rx) = channel(capacity);
    let (information_tx, information_rx) = channel(capacity);
    let (errors_tx, errors_rx) = channel(capacity);

    (
        JobEvents {
            deltas: deltas_tx,
            notices: notices_tx,
            responses: responses_tx,
            information: information_tx,
            errors: errors_tx,
        },
        JobReceivers {
            deltas: deltas_rx,
            notices: notices_rx,
            responses: responses_rx,
            information: information_rx,
            errors: errors_rx,
        },
    )
}

impl JobEvents {
    pub async fn delta(&self, message: impl Into<String>) {
        if self.deltas.send(message.into()).await.is_err() {
            debug!("delta dropped: consumer gone");
        }
    }

    pub async fn notice(&self, message: impl Into<String>) {
        if self.notices.send(message.into()).await.is_err() {
            debug!("notice dropped: consumer gone");
        }
    }

    pub async fn response(&self, message: impl Into<String>) {
        if self.responses.send(message.into()).await.is_err() {
            debug!("response dropped: consumer gone");
        }
    }

    pub async fn information(&self, message: impl Into<String>) {
        if self.information.send(message.into()).await.is_err() {
            debug!("information dropped: consumer gone");
        }
    }

    pub async fn error(&self, error: JobError) {
        if self.errors.send(error).await.is_err() {
            debug!("error dropped: consumer gone");
        }
    }
}

/// Forward every event to `sink` until all channels are closed and empty.
///
/// Ordering holds within a channel, not across channels.
pub async fn drain(mut receivers: JobReceivers, sink: &dyn EventSink) {
    loop {
        tokio::select! {
            Some(message) = receivers.errors.recv() => sink.error(&message),
            Some(message) = receivers.deltas.recv() => sink.delta(&message),
            Some(message) = receivers.notices.recv() => sink.notice(&message),
            Some(message) = receivers.responses.recv() => sink.response(&message),
            Some(message) = receivers.information.recv() => sink.information(&message),
            else => break,
        }
    }
}
