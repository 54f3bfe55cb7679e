//! # podium
//!
//! Core library for the Podium tournament results engine.
//!
//! This crate provides:
//! - Score entry storage with per-match placement uniqueness and explicit override
//! - Standings aggregation from organiser-defined scoring tables
//! - Live "standings changed" notifications with pull-on-change feeds
//! - Themed leaderboard export to paginated PNG images and zip archives

pub mod config;
pub mod engine;
pub mod error;
pub mod live;
pub mod model;
pub mod render;
pub mod roster;
pub mod scoring;
pub mod storage;
pub mod theme;

pub use config::{Config, ConfigBuilder, LiveConfig, RenderConfig, StorageConfig};
pub use engine::{Engine, StandingsFeed};
pub use error::{Error, Result};
pub use live::{LivePublisher, Signal, Subscription, VersionChanged};
pub use model::{
    MatchId, ScoreEntry, ScoreInput, Standings, StandingsVersion, TeamId, TeamStanding, ThemeId,
    TournamentId, UserId,
};
pub use render::{
    AssetSource, ExportCancel, ExportFile, FieldContent, FsAssets, MemoryAssets, Page,
    PlacedField, Renderer, layout_page, logo_top, paginate,
};
pub use roster::{
    Actor, Directory, Match, RequestContext, Role, Roster, RosterFile, Team, Tournament,
};
pub use scoring::{ScoringKey, ScoringTable, compute_standings};
pub use storage::{ConflictResolver, DataDirLock, ScoreSnapshot, ScoreStore, Submission};
pub use theme::{
    ColumnKey, FontColor, Layout, Point, Size, Theme, ThemeDraft, ThemeStore, calibrate,
    to_display,
};
