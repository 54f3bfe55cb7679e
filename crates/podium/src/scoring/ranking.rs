use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::table::ScoringTable;
use crate::model::{MatchId, ScoreEntry, TeamId, TeamStanding};
use crate::roster::Team;

#[derive(Default)]
struct Tally {
    matches: BTreeSet<MatchId>,
    kills: u64,
    wins: u32,
    position_points: i64,
}

/// Aggregate score entries into ordered standings.
///
/// Every team in `teams` gets a row, including teams without entries. Entries
/// for teams not on the roster are ignored. When `match_filter` is set only
/// that match is counted.
pub fn compute_standings(
    teams: &[Team],
    entries: &[ScoreEntry],
    table: &ScoringTable,
    match_filter: Option<MatchId>,
) -> Vec<TeamStanding> {
    let mut tallies: BTreeMap<TeamId, Tally> =
        teams.iter().map(|t| (t.id, Tally::default())).collect();

    for entry in entries {
        if match_filter.is_some_and(|m| m != entry.match_id) {
            continue;
        }
        let Some(tally) = tallies.get_mut(&entry.team_id) else {
            debug!(
                "Skipping entry for team {} not on the roster (match {})",
                entry.team_id, entry.match_id
            );
            continue;
        };
        tally.matches.insert(entry.match_id);
        tally.kills += u64::from(entry.kills);
        if entry.is_win() {
            tally.wins += 1;
        }
        tally.position_points += table.points_for(entry.placement);
    }

    let kill_rate = table.kill_rate();
    let mut standings: Vec<TeamStanding> = teams
        .iter()
        .map(|team| {
            let tally = tallies.remove(&team.id).unwrap_or_default();
            let kill_points = i64::try_from(tally.kills)
                .unwrap_or(i64::MAX)
                .saturating_mul(kill_rate);
            TeamStanding {
                team_id: team.id,
                team_name: team.name.clone(),
                team_logo: team.logo.clone(),
                matches_played: tally.matches.len() as u32,
                total_kills: tally.kills,
                total_wwcd: tally.wins,
                total_position_points: tally.position_points,
                total_points: tally.position_points.saturating_add(kill_points),
            }
        })
        .collect();

    standings.sort_by(rank_order);
    standings
}

/// Leaderboard order: points desc, then kills desc, then team id asc.
pub fn rank_order(a: &TeamStanding, b: &TeamStanding) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| b.total_kills.cmp(&a.total_kills))
        .then_with(|| a.team_id.cmp(&b.team_id))
}
