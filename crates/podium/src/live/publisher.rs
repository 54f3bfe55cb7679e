use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, warn};

use crate::model::{StandingsVersion, TournamentId};

/// Default number of buffered events per tournament channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// "Something changed" notification for one tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChanged {
    pub tournament_id: TournamentId,
    pub version: StandingsVersion,
}

/// What a subscriber learned while waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A change was published
    Changed(StandingsVersion),
    /// Events were dropped because the subscriber fell behind
    Missed(u64),
}

/// Per-tournament broadcast of standings changes.
#[derive(Debug)]
pub struct LivePublisher {
    capacity: usize,
    channels: Mutex<HashMap<TournamentId, broadcast::Sender<VersionChanged>>>,
}

impl Default for LivePublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl LivePublisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, tournament_id: TournamentId) -> Subscription {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = channels
            .entry(tournament_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Subscription {
            tournament_id,
            receiver: sender.subscribe(),
        }
    }

    /// Notify subscribers of a tournament. Never blocks and never fails.
    pub fn publish(&self, tournament_id: TournamentId, version: StandingsVersion) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = channels.get(&tournament_id) else {
            debug!(
                "No subscribers for tournament {}, dropping {}",
                tournament_id, version
            );
            return;
        };

        match sender.send(VersionChanged {
            tournament_id,
            version,
        }) {
            Ok(receivers) => debug!(
                "Published {} for tournament {} to {} subscribers",
                version, tournament_id, receivers
            ),
            Err(_) => {
                warn!(
                    "Publish of {} for tournament {} reached no subscriber",
                    version, tournament_id
                );
                channels.remove(&tournament_id);
            }
        }
    }

    pub fn subscriber_count(&self, tournament_id: TournamentId) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tournament_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// Receiving end for one tournament's changes.
#[derive(Debug)]
pub struct Subscription {
    tournament_id: TournamentId,
    receiver: broadcast::Receiver<VersionChanged>,
}

impl Subscription {
    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    /// Wait for the next change. Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<Signal> {
        match self.receiver.recv().await {
            Ok(event) => Some(Signal::Changed(event.version)),
            Err(RecvError::Lagged(missed)) => {
                warn!(
                    "Subscriber for tournament {} missed {} events",
                    self.tournament_id, missed
                );
                Some(Signal::Missed(missed))
            }
            Err(RecvError::Closed) => None,
        }
    }

    /// Discard events that are already queued; returns how many were dropped.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => drained += 1,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: TournamentId = TournamentId(1);

    #[tokio::test]
    async fn test_subscriber_receives_published_version() {
        let publisher = LivePublisher::default();
        let mut sub = publisher.subscribe(T);
        publisher.publish(T, StandingsVersion(3));
        assert_eq!(sub.changed().await, Some(Signal::Changed(StandingsVersion(3))));
    }

    #[tokio::test]
    async fn test_tournaments_are_isolated() {
        let publisher = LivePublisher::default();
        let mut one = publisher.subscribe(T);
        let mut two = publisher.subscribe(TournamentId(2));
        publisher.publish(TournamentId(2), StandingsVersion(1));

        assert_eq!(two.changed().await, Some(Signal::Changed(StandingsVersion(1))));
        assert_eq!(one.drain(), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_swallowed() {
        let publisher = LivePublisher::default();
        publisher.publish(T, StandingsVersion(1));

        let sub = publisher.subscribe(T);
        drop(sub);
        // Receiver is gone: the send fails, is logged and the channel is pruned
        publisher.publish(T, StandingsVersion(2));
        assert_eq!(publisher.subscriber_count(T), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_told_to_repull() {
        let publisher = LivePublisher::new(2);
        let mut sub = publisher.subscribe(T);
        for v in 1..=5 {
            publisher.publish(T, StandingsVersion(v));
        }
        assert_eq!(sub.changed().await, Some(Signal::Missed(3)));
        assert_eq!(sub.drain(), 2);
    }

    #[tokio::test]
    async fn test_closed_publisher_ends_subscription() {
        let publisher = LivePublisher::default();
        let mut sub = publisher.subscribe(T);
        drop(publisher);
        assert_eq!(sub.changed().await, None);
    }
}
