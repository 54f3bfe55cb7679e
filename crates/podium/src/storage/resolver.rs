use std::sync::Arc;

use tracing::info;

use super::store::{ScoreStore, Submission};
use crate::error::{Error, Result};
use crate::live::LivePublisher;
use crate::model::{MatchId, ScoreEntry, ScoreInput, StandingsVersion, TeamId, TournamentId};
use crate::roster::{Directory, RequestContext};

/// The single write path into the [`ScoreStore`].
///
/// Checks references and identity before touching the store, lets the store
/// decide conflicts atomically, and notifies subscribers only after the write
/// guard is released.
#[derive(Clone)]
pub struct ConflictResolver {
    store: Arc<ScoreStore>,
    directory: Arc<dyn Directory>,
    publisher: Arc<LivePublisher>,
}

impl ConflictResolver {
    pub fn new(
        store: Arc<ScoreStore>,
        directory: Arc<dyn Directory>,
        publisher: Arc<LivePublisher>,
    ) -> Self {
        Self {
            store,
            directory,
            publisher,
        }
    }

    /// Resolve the tournament a (match, team) pair belongs to.
    fn tournament_of(&self, match_id: MatchId, team_id: TeamId) -> Result<TournamentId> {
        let record = self.directory.match_record(match_id)?;
        let team = self.directory.team(team_id)?;
        if team.tournament_id != record.tournament_id {
            return Err(Error::Validation(format!(
                "team {} is not registered in the tournament of match {}",
                team_id, match_id
            )));
        }
        Ok(record.tournament_id)
    }

    pub fn submit(
        &self,
        ctx: &RequestContext,
        input: ScoreInput,
        allow_override: bool,
    ) -> Result<Submission> {
        let entry = input.into_entry()?;
        let tournament_id = self.tournament_of(entry.match_id, entry.team_id)?;
        ctx.ensure_can_manage(&self.directory.tournament(tournament_id)?)?;

        let submission = self.store.apply(tournament_id, entry, allow_override)?;
        if let Some(evicted) = &submission.evicted {
            info!(
                "User {} overrode placement {} in match {}: removed team {}",
                ctx.actor.user_id, evicted.placement, evicted.match_id, evicted.team_id
            );
        }
        self.publisher.publish(tournament_id, submission.version);
        Ok(submission)
    }

    pub fn remove(
        &self,
        ctx: &RequestContext,
        match_id: MatchId,
        team_id: TeamId,
    ) -> Result<(StandingsVersion, ScoreEntry)> {
        let tournament_id = self.tournament_of(match_id, team_id)?;
        ctx.ensure_can_manage(&self.directory.tournament(tournament_id)?)?;

        let (version, removed) = self.store.remove(tournament_id, match_id, team_id)?;
        info!(
            "User {} removed score of team {} in match {}",
            ctx.actor.user_id, team_id, match_id
        );
        self.publisher.publish(tournament_id, version);
        Ok((version, removed))
    }
}
