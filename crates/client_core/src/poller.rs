use std::time::Duration;

use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, warn};

use crate::{adapter::RecordList, cancel::CancelSignal, http::BackendClient};

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Sent for the first fetch and whenever the collection changes.
    Updated(RecordList),
    Failed(String),
}

/// Periodically refetches a list endpoint (chat threads, activity feeds)
/// until its cancel signal fires.
pub struct ListPoller {
    task: JoinHandle<()>,
}

impl ListPoller {
    pub fn spawn(
        client: BackendClient,
        path: impl Into<String>,
        interval: Duration,
        cancel: CancelSignal,
    ) -> (Self, broadcast::Receiver<PollEvent>) {
        let path = path.into();
        let (events, receiver) = broadcast::channel(64);
        let mut cancel = cancel;

        let task = tokio::spawn(async move {
            let mut last: Option<RecordList> = None;
            loop {
                let event = match client.fetch_records(&path).await {
                    Ok(list) if last.as_ref() == Some(&list) => None,
                    Ok(list) => {
                        last = Some(list.clone());
                        Some(PollEvent::Updated(list))
                    }
                    Err(err) => {
                        warn!(path = %path, error = %err, "list poll failed");
                        Some(PollEvent::Failed(err.user_message()))
                    }
                };

                if cancel.is_cancelled() {
                    break;
                }
                if let Some(event) = event {
                    let _ = events.send(event);
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!(path = %path, "list poller stopped");
        });

        (Self { task }, receiver)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    pub async fn join(self) {
        let _ = self.task.await;
    }
}
