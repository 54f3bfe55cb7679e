//! Leaderboard image export.

use std::path::Path;

use anyhow::{Context, Result};
use podium::storage::write_bytes_atomic;
use podium::{Engine, ExportCancel, ThemeId, TournamentId};
use tracing::{info, warn};

pub fn run(
    engine: &Engine,
    tournament_id: TournamentId,
    theme_id: ThemeId,
    page: Option<usize>,
    archive: bool,
    output: &Path,
) -> Result<()> {
    let cancel = ExportCancel::new();
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || on_interrupt.cancel()) {
        warn!("Export cannot be interrupted: {}", e);
    }

    let file = match page {
        Some(n) => engine.export_page(tournament_id, theme_id, n)?,
        None if archive => engine.export_archive_with(tournament_id, theme_id, &cancel)?,
        None => engine.export_all(tournament_id, theme_id, &cancel)?,
    };

    let path = output.join(&file.file_name);
    write_bytes_atomic(&path, &file.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} ({} bytes)", path.display(), file.bytes.len());
    println!("{}", path.display());
    Ok(())
}
