//! Theme management.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use podium::{Engine, RequestContext, ThemeDraft, ThemeId, TournamentId};

fn read_draft(path: &Path) -> Result<ThemeDraft> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read theme draft {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid theme draft {}", path.display()))
}

pub fn create(engine: &Engine, ctx: &RequestContext, file: &Path) -> Result<()> {
    let theme = engine.create_or_update_theme(ctx, None, read_draft(file)?)?;
    println!("Created theme {} '{}'", theme.id, theme.name);
    Ok(())
}

pub fn update(engine: &Engine, ctx: &RequestContext, id: ThemeId, file: &Path) -> Result<()> {
    let theme = engine.create_or_update_theme(ctx, Some(id), read_draft(file)?)?;
    println!(
        "Updated theme {} '{}' to version {}",
        theme.id, theme.name, theme.version
    );
    Ok(())
}

pub fn list(engine: &Engine, tournament_id: TournamentId, json: bool) -> Result<()> {
    let themes = engine.themes(tournament_id);
    if json {
        println!("{}", serde_json::to_string_pretty(&themes)?);
        return Ok(());
    }
    if themes.is_empty() {
        println!("No themes for tournament {}", tournament_id);
    }
    for theme in themes {
        println!(
            "{:>4}  {}  ({} per page, v{}, updated {})",
            theme.id,
            theme.name,
            theme.teams_per_page,
            theme.version,
            theme.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub fn show(engine: &Engine, id: ThemeId) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&engine.theme(id)?)?);
    Ok(())
}

pub fn delete(engine: &Engine, ctx: &RequestContext, id: ThemeId) -> Result<()> {
    let theme = engine.delete_theme(ctx, id)?;
    println!("Deleted theme {} '{}'", theme.id, theme.name);
    Ok(())
}
