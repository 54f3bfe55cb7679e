//! The engine facade.
//!
//! [`Engine`] wires the stores, ranking, live publisher and renderer together
//! behind the operations callers use. It is cheap to clone and safe to share
//! between request threads.

mod feed;

pub use feed::*;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{Config, LiveConfig, StorageConfig};
use crate::error::{Error, Result};
use crate::live::LivePublisher;
use crate::model::{
    MatchId, ScoreEntry, ScoreInput, Standings, StandingsVersion, TeamId, ThemeId, TournamentId,
};
use crate::render::{
    ExportCancel, ExportFile, FsAssets, Renderer, build_archive, paginate, render_pages,
};
use crate::roster::{Directory, RequestContext, Roster};
use crate::scoring::compute_standings;
use crate::storage::{ConflictResolver, DataDirLock, ScoreSnapshot, ScoreStore, Submission};
use crate::theme::{Theme, ThemeDraft, ThemeSnapshot, ThemeStore};

struct Inner {
    directory: Arc<dyn Directory>,
    store: Arc<ScoreStore>,
    publisher: Arc<LivePublisher>,
    resolver: ConflictResolver,
    themes: ThemeStore,
    renderer: Renderer,
    idle_timeout: Duration,
    storage: Option<StorageConfig>,
    /// Released when the last engine clone is dropped
    _lock: Option<DataDirLock>,
}

#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    /// Build an in-memory engine.
    pub fn new(directory: Arc<dyn Directory>, renderer: Renderer, live: &LiveConfig) -> Self {
        Self::build(directory, renderer, live, None, None)
    }

    fn build(
        directory: Arc<dyn Directory>,
        renderer: Renderer,
        live: &LiveConfig,
        storage: Option<StorageConfig>,
        lock: Option<DataDirLock>,
    ) -> Self {
        let store = Arc::new(ScoreStore::new());
        let publisher = Arc::new(LivePublisher::new(live.channel_capacity));
        let resolver = ConflictResolver::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&publisher),
        );
        let themes = ThemeStore::new(Arc::clone(&directory));
        Self {
            inner: Arc::new(Inner {
                directory,
                store,
                publisher,
                resolver,
                themes,
                renderer,
                idle_timeout: live.idle_timeout(),
                storage,
                _lock: lock,
            }),
        }
    }

    /// Open an engine over a data directory.
    ///
    /// The roster must exist; scores and themes start empty when their files
    /// are missing.
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_with(config, None)
    }

    /// Open an engine that holds the data directory's lock until it is
    /// dropped. Blocks while another process holds it, so the snapshots read
    /// here are the ones the previous holder saved.
    pub fn open_exclusive(config: &Config) -> Result<Self> {
        let lock = DataDirLock::acquire(config.storage.lock_path())?;
        Self::open_with(config, Some(lock))
    }

    fn open_with(config: &Config, lock: Option<DataDirLock>) -> Result<Self> {
        let storage = &config.storage;
        let roster = Roster::load(storage.roster_path())?;

        let mut renderer = Renderer::new(Arc::new(FsAssets::new(&config.render.media_root)));
        match config.render.resolve_default_font() {
            Some(path) => {
                renderer = renderer.with_default_font(fs::read(&path)?)?;
                info!("Using default font {}", path.display());
            }
            None => warn!("No default font found; themes without a font cannot draw text"),
        }

        let engine = Self::build(
            Arc::new(roster),
            renderer,
            &config.live,
            Some(storage.clone()),
            lock,
        );
        engine
            .inner
            .store
            .restore(&ScoreSnapshot::load(storage.scores_path())?)?;
        engine
            .inner
            .themes
            .restore(ThemeSnapshot::load(storage.themes_path())?)?;
        Ok(engine)
    }

    /// Write scores and themes back to the data directory, if there is one.
    pub fn save(&self) -> Result<()> {
        let Some(storage) = &self.inner.storage else {
            return Ok(());
        };
        self.inner.store.snapshot().save(storage.scores_path())?;
        self.inner.themes.snapshot().save(storage.themes_path())?;
        Ok(())
    }

    /// Re-read `scores.json` and notify subscribers of every tournament whose
    /// version or entries changed on disk. Returns the changed tournaments.
    pub fn reload_scores(&self) -> Result<Vec<TournamentId>> {
        let Some(storage) = &self.inner.storage else {
            return Ok(Vec::new());
        };
        let snapshot = ScoreSnapshot::load(storage.scores_path())?;
        let mut changed = Vec::new();
        for scores in &snapshot.tournaments {
            if self.inner.store.restore_tournament(scores)? {
                self.inner.publisher.publish(scores.tournament_id, scores.version);
                changed.push(scores.tournament_id);
            }
        }
        Ok(changed)
    }

    pub fn directory(&self) -> &dyn Directory {
        self.inner.directory.as_ref()
    }

    pub fn submit_score(
        &self,
        ctx: &RequestContext,
        match_id: MatchId,
        team_id: TeamId,
        kills: i64,
        placement: i64,
        allow_override: bool,
    ) -> Result<Submission> {
        self.inner.resolver.submit(
            ctx,
            ScoreInput::new(match_id, team_id, kills, placement),
            allow_override,
        )
    }

    pub fn remove_score(
        &self,
        ctx: &RequestContext,
        match_id: MatchId,
        team_id: TeamId,
    ) -> Result<(StandingsVersion, ScoreEntry)> {
        self.inner.resolver.remove(ctx, match_id, team_id)
    }

    /// Ranked standings of a tournament, optionally restricted to one match.
    pub fn get_standings(
        &self,
        tournament_id: TournamentId,
        match_filter: Option<MatchId>,
    ) -> Result<Standings> {
        let directory = self.directory();
        directory.tournament(tournament_id)?;
        if let Some(match_id) = match_filter {
            let record = directory.match_record(match_id)?;
            if record.tournament_id != tournament_id {
                return Err(Error::Validation(format!(
                    "match {} is not part of tournament {}",
                    match_id, tournament_id
                )));
            }
        }
        let table = directory.scoring_table(tournament_id)?;
        let teams = directory.teams(tournament_id);
        let scores = self.inner.store.read(tournament_id);

        Ok(Standings {
            tournament_id,
            version: scores.version,
            rows: compute_standings(&teams, &scores.entries, &table, match_filter),
        })
    }

    /// Follow a tournament's standings. The first pull happens immediately.
    pub fn subscribe_standings(&self, tournament_id: TournamentId) -> Result<StandingsFeed> {
        self.directory().tournament(tournament_id)?;
        let subscription = self.inner.publisher.subscribe(tournament_id);
        Ok(StandingsFeed::new(
            self.clone(),
            subscription,
            self.inner.idle_timeout,
        ))
    }

    pub fn create_or_update_theme(
        &self,
        ctx: &RequestContext,
        id: Option<ThemeId>,
        draft: ThemeDraft,
    ) -> Result<Theme> {
        match id {
            Some(id) => self.inner.themes.update(ctx, id, draft),
            None => self.inner.themes.create(ctx, draft),
        }
    }

    pub fn theme(&self, id: ThemeId) -> Result<Theme> {
        self.inner.themes.get(id)
    }

    pub fn themes(&self, tournament_id: TournamentId) -> Vec<Theme> {
        self.inner.themes.list(tournament_id)
    }

    pub fn delete_theme(&self, ctx: &RequestContext, id: ThemeId) -> Result<Theme> {
        self.inner.themes.delete(ctx, id)
    }

    fn export_theme(&self, tournament_id: TournamentId, theme_id: ThemeId) -> Result<Theme> {
        let theme = self.theme(theme_id)?;
        if theme.tournament_id != tournament_id {
            return Err(Error::Validation(format!(
                "theme {} does not belong to tournament {}",
                theme_id, tournament_id
            )));
        }
        Ok(theme)
    }

    /// Render one page (1-based) of the current standings.
    pub fn export_page(
        &self,
        tournament_id: TournamentId,
        theme_id: ThemeId,
        page_number: usize,
    ) -> Result<ExportFile> {
        let theme = self.export_theme(tournament_id, theme_id)?;
        let standings = self.get_standings(tournament_id, None)?;
        let pages = paginate(&standings.rows, theme.page_size());
        let page = page_number
            .checked_sub(1)
            .and_then(|i| pages.get(i))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "page {} out of range (1-{})",
                    page_number,
                    pages.len()
                ))
            })?;

        let prepared = self.inner.renderer.prepare(&theme, page.rows)?;
        let bytes = prepared.render_png(page)?;
        info!(
            "Exported page {} of tournament {} with theme {}",
            page.number, tournament_id, theme_id
        );
        Ok(ExportFile::page(page.number, bytes))
    }

    pub fn export_image(
        &self,
        tournament_id: TournamentId,
        theme_id: ThemeId,
    ) -> Result<ExportFile> {
        self.export_page(tournament_id, theme_id, 1)
    }

    pub fn export_archive(
        &self,
        tournament_id: TournamentId,
        theme_id: ThemeId,
    ) -> Result<ExportFile> {
        self.export_archive_with(tournament_id, theme_id, &ExportCancel::new())
    }

    /// Render every page and bundle them once all have succeeded.
    pub fn export_archive_with(
        &self,
        tournament_id: TournamentId,
        theme_id: ThemeId,
        cancel: &ExportCancel,
    ) -> Result<ExportFile> {
        let files = self.render_all(tournament_id, theme_id, cancel)?;
        build_archive(tournament_id, &files)
    }

    /// A single page as a direct image, otherwise the archive.
    pub fn export_all(
        &self,
        tournament_id: TournamentId,
        theme_id: ThemeId,
        cancel: &ExportCancel,
    ) -> Result<ExportFile> {
        let mut files = self.render_all(tournament_id, theme_id, cancel)?;
        if files.len() == 1 {
            if let Some(file) = files.pop() {
                return Ok(file);
            }
        }
        build_archive(tournament_id, &files)
    }

    fn render_all(
        &self,
        tournament_id: TournamentId,
        theme_id: ThemeId,
        cancel: &ExportCancel,
    ) -> Result<Vec<ExportFile>> {
        let theme = self.export_theme(tournament_id, theme_id)?;
        let standings = self.get_standings(tournament_id, None)?;
        let pages = paginate(&standings.rows, theme.page_size());
        cancel.check()?;

        let prepared = self.inner.renderer.prepare(&theme, &standings.rows)?;
        let files = render_pages(&prepared, &pages, cancel)?;
        info!(
            "Rendered {} pages of tournament {} ({}) with theme {}",
            files.len(),
            tournament_id,
            standings.version,
            theme_id
        );
        Ok(files)
    }
}
