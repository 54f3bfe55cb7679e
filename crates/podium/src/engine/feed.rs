use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use super::Engine;
use crate::error::Result;
use crate::live::{Signal, Subscription};
use crate::model::{Standings, TournamentId};

/// Live standings for one tournament.
///
/// The first call to [`next`](Self::next) returns the current standings.
/// Later calls wait for a change notification, fold any queued
/// notifications into one, and pull fresh standings. The feed ends after
/// `idle` passes without a change; reconnecting means subscribing again.
pub struct StandingsFeed {
    engine: Engine,
    subscription: Subscription,
    idle: Duration,
    primed: bool,
}

impl StandingsFeed {
    pub(crate) fn new(engine: Engine, subscription: Subscription, idle: Duration) -> Self {
        Self {
            engine,
            subscription,
            idle,
            primed: false,
        }
    }

    /// Close after `idle` without a change instead of the configured timeout.
    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.subscription.tournament_id()
    }

    fn pull(&self) -> Result<Standings> {
        self.engine.get_standings(self.tournament_id(), None)
    }

    /// Next standings update, or `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<Result<Standings>> {
        if !self.primed {
            self.primed = true;
            return Some(self.pull());
        }

        match timeout(self.idle, self.subscription.changed()).await {
            Ok(Some(signal)) => {
                let coalesced = self.subscription.drain();
                if let Signal::Missed(missed) = signal {
                    debug!(
                        "Feed for tournament {} re-pulling after {} missed events",
                        self.tournament_id(),
                        missed
                    );
                }
                if coalesced > 0 {
                    debug!("Coalesced {} queued changes", coalesced);
                }
                Some(self.pull())
            }
            Ok(None) => None,
            Err(_) => {
                debug!(
                    "Feed for tournament {} idle for {:?}, closing",
                    self.tournament_id(),
                    self.idle
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LiveConfig;
    use crate::engine::tests::{OWNER, engine};
    use crate::model::{MatchId, StandingsVersion, TeamId};
    use crate::roster::RequestContext;

    #[tokio::test]
    async fn test_late_subscriber_sees_current_standings() {
        let engine = engine(3, &LiveConfig::default());
        let ctx = RequestContext::organiser(OWNER);

        // A subscriber that went away: the next publish reaches nobody
        drop(engine.subscribe_standings(TournamentId(1)).unwrap());

        engine.submit_score(&ctx, MatchId(1), TeamId(1), 1, 2, false).unwrap();
        engine.submit_score(&ctx, MatchId(1), TeamId(2), 4, 1, false).unwrap();
        engine.submit_score(&ctx, MatchId(1), TeamId(3), 0, 7, false).unwrap();

        let mut feed = engine.subscribe_standings(TournamentId(1)).unwrap();
        let standings = feed.next().await.unwrap().unwrap();
        assert_eq!(standings.version, StandingsVersion(3));
        let totals: Vec<(TeamId, i64)> = standings
            .rows
            .iter()
            .map(|r| (r.team_id, r.total_points))
            .collect();
        assert_eq!(
            totals,
            vec![(TeamId(2), 14), (TeamId(1), 7), (TeamId(3), 1)]
        );
    }

    #[tokio::test]
    async fn test_feed_coalesces_and_closes_when_idle() {
        let engine = engine(3, &LiveConfig::default());
        let ctx = RequestContext::organiser(OWNER);
        let mut feed = engine
            .subscribe_standings(TournamentId(1))
            .unwrap()
            .with_idle_timeout(Duration::from_millis(100));
        assert_eq!(
            feed.next().await.unwrap().unwrap().version,
            StandingsVersion(0)
        );

        engine.submit_score(&ctx, MatchId(1), TeamId(1), 1, 1, false).unwrap();
        engine.submit_score(&ctx, MatchId(2), TeamId(1), 2, 2, false).unwrap();

        let update = feed.next().await.unwrap().unwrap();
        assert_eq!(update.version, StandingsVersion(2));

        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_tournament_cannot_subscribe() {
        let engine = engine(1, &LiveConfig::default());
        assert!(engine.subscribe_standings(TournamentId(9)).is_err());
    }
}
