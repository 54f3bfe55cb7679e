//! Standings output.

use std::fmt::Write;

use anyhow::Result;
use podium::{Engine, MatchId, Standings, TournamentId};

pub fn run(
    engine: &Engine,
    tournament_id: TournamentId,
    match_id: Option<MatchId>,
    json: bool,
) -> Result<()> {
    let standings = engine.get_standings(tournament_id, match_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&standings)?);
    } else {
        print!("{}", format_table(&standings));
    }
    Ok(())
}

/// Render standings as a fixed-width table
pub fn format_table(standings: &Standings) -> String {
    let name_width = standings
        .rows
        .iter()
        .map(|r| r.team_name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Tournament {} ({})",
        standings.tournament_id, standings.version
    );
    let _ = writeln!(
        out,
        "{:>4}  {:<name_width$}  {:>4}  {:>7}  {:>6}  {:>6}  {:>5}  {:>5}",
        "#", "Team", "WWCD", "Matches", "PosPts", "FinPts", "Kills", "Total"
    );
    for (i, row) in standings.rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<name_width$}  {:>4}  {:>7}  {:>6}  {:>6}  {:>5}  {:>5}",
            i + 1,
            row.team_name,
            row.total_wwcd,
            row.matches_played,
            row.total_position_points,
            row.finish_points(),
            row.total_kills,
            row.total_points
        );
    }
    out
}
