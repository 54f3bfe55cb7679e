use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{TeamId, TournamentId};

/// Per-tournament counter bumped by every score mutation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StandingsVersion(pub u64);

impl StandingsVersion {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StandingsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Aggregated leaderboard row for one team.
///
/// Regenerated from score entries on every read; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: TeamId,
    pub team_name: String,
    /// Asset reference of the team logo, if the team has one
    pub team_logo: Option<String>,
    /// Number of distinct matches the team has an entry in
    pub matches_played: u32,
    pub total_kills: u64,
    /// Matches won (placement == 1)
    pub total_wwcd: u32,
    pub total_position_points: i64,
    pub total_points: i64,
}

impl TeamStanding {
    pub fn empty(team_id: TeamId, team_name: impl Into<String>, team_logo: Option<String>) -> Self {
        Self {
            team_id,
            team_name: team_name.into(),
            team_logo,
            matches_played: 0,
            total_kills: 0,
            total_wwcd: 0,
            total_position_points: 0,
            total_points: 0,
        }
    }

    /// Points earned from kills ("finishes"), shown in the `fin_pts` column.
    pub fn finish_points(&self) -> i64 {
        self.total_points - self.total_position_points
    }
}

/// Ordered leaderboard of a tournament at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standings {
    pub tournament_id: TournamentId,
    pub version: StandingsVersion,
    pub rows: Vec<TeamStanding>,
}
