// ── Issue update channel ──
//
// Saved issues are published here by the dialog controller and consumed by
// whichever detail/list controllers are mounted. The channel is owned by
// the application root; dropping a subscription unsubscribes it.

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::model::Issue;

const CHANNEL_CAPACITY: usize = 32;

/// Publisher side of the update channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IssueUpdates {
    sender: broadcast::Sender<Issue>,
}

impl Default for IssueUpdates {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueUpdates {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a saved issue. Returns how many subscribers received it.
    pub fn publish(&self, issue: Issue) -> usize {
        let id = issue.id;
        let delivered = self.sender.send(issue).unwrap_or(0);
        debug!(?id, delivered, "issue update published");
        delivered
    }

    pub fn subscribe(&self) -> IssueSubscription {
        IssueSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving side held by a mounted controller.
#[derive(Debug)]
pub struct IssueSubscription {
    receiver: broadcast::Receiver<Issue>,
}

impl IssueSubscription {
    /// Next queued update without waiting.
    pub fn try_next(&mut self) -> Option<Issue> {
        loop {
            match self.receiver.try_recv() {
                Ok(issue) => return Some(issue),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "issue subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Wait for the next update. `None` once every publisher is gone.
    pub async fn next(&mut self) -> Option<Issue> {
        loop {
            match self.receiver.recv().await {
                Ok(issue) => return Some(issue),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "issue subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Convert into a stream, dropping lag notifications.
    pub fn into_stream(self) -> impl Stream<Item = Issue> + Send + 'static {
        BroadcastStream::new(self.receiver).filter_map(Result::ok)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::IssueId;

    fn issue(id: i64) -> Issue {
        Issue {
            id: Some(IssueId::new(id)),
            ..Issue::default()
        }
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let updates = IssueUpdates::new();
        assert_eq!(updates.publish(issue(1)), 0);
    }

    #[test]
    fn subscriber_receives_published_issue() {
        let updates = IssueUpdates::new();
        let mut sub = updates.subscribe();
        assert_eq!(updates.publish(issue(3)), 1);
        assert_eq!(sub.try_next().unwrap().id, Some(IssueId::new(3)));
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let updates = IssueUpdates::new();
        let sub = updates.subscribe();
        assert_eq!(updates.subscriber_count(), 1);
        drop(sub);
        assert_eq!(updates.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_yields_updates() {
        let updates = IssueUpdates::new();
        let mut stream = Box::pin(updates.subscribe().into_stream());
        updates.publish(issue(5));
        assert_eq!(stream.next().await.unwrap().id, Some(IssueId::new(5)));
    }
}
