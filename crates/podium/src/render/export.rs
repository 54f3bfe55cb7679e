use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::canvas::PreparedTheme;
use super::layout::Page;
use crate::error::{Error, Result};
use crate::model::TournamentId;

/// A rendered file ready to be written or served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn page(number: usize, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("leaderboard_p{}.png", number),
            content_type: "image/png",
            bytes,
        }
    }
}

/// Cancellation flag for a running export.
///
/// Clones share the flag; pages check it before they start drawing.
#[derive(Debug, Clone, Default)]
pub struct ExportCancel {
    cancelled: Arc<AtomicBool>,
}

impl ExportCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Render pages in parallel. Fails as a whole if any page fails.
pub fn render_pages(
    prepared: &PreparedTheme,
    pages: &[Page<'_>],
    cancel: &ExportCancel,
) -> Result<Vec<ExportFile>> {
    let files = pages
        .par_iter()
        .map(|page| {
            cancel.check()?;
            let bytes = prepared.render_png(page)?;
            debug!("Rendered page {} ({} bytes)", page.number, bytes.len());
            Ok(ExportFile::page(page.number, bytes))
        })
        .collect::<Result<Vec<_>>>()?;
    cancel.check()?;
    Ok(files)
}

/// Bundle rendered pages into one zip archive.
pub fn build_archive(tournament_id: TournamentId, pages: &[ExportFile]) -> Result<ExportFile> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for page in pages {
        writer.start_file(page.file_name.as_str(), options)?;
        writer.write_all(&page.bytes)?;
    }
    let bytes = writer.finish()?.into_inner();
    info!(
        "Built archive for tournament {} with {} pages",
        tournament_id,
        pages.len()
    );

    Ok(ExportFile {
        file_name: format!("leaderboard_{}_all.zip", tournament_id),
        content_type: "application/zip",
        bytes,
    })
}
