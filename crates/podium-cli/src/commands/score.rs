//! Score submission and removal.

use anyhow::{Result, bail};
use podium::{Engine, MatchId, RequestContext, TeamId};
use tracing::info;

pub fn submit(
    engine: &Engine,
    ctx: &RequestContext,
    match_id: MatchId,
    team_id: TeamId,
    kills: i64,
    placement: i64,
    force: bool,
) -> Result<()> {
    let submission = match engine.submit_score(ctx, match_id, team_id, kills, placement, force) {
        Ok(s) => s,
        Err(e) if e.is_conflict() => bail!("{}. Rerun with --force to replace it", e),
        Err(e) => return Err(e.into()),
    };

    if let Some(evicted) = &submission.evicted {
        println!(
            "Replaced team {} at placement {}",
            evicted.team_id, evicted.placement
        );
    }
    let action = if submission.replaced.is_some() {
        "Updated"
    } else {
        "Recorded"
    };
    println!(
        "{} team {} in match {}: {} kills, placement {} ({})",
        action,
        submission.entry.team_id,
        submission.entry.match_id,
        submission.entry.kills,
        submission.entry.placement,
        submission.version
    );
    info!("Submission stored at {}", submission.version);
    Ok(())
}

pub fn remove(
    engine: &Engine,
    ctx: &RequestContext,
    match_id: MatchId,
    team_id: TeamId,
) -> Result<()> {
    let (version, removed) = engine.remove_score(ctx, match_id, team_id)?;
    println!(
        "Removed team {} from match {} (had {} kills, placement {}) ({})",
        removed.team_id, removed.match_id, removed.kills, removed.placement, version
    );
    Ok(())
}
