use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::types::{Theme, ThemeDraft};
use crate::error::{Error, Result};
use crate::model::{ThemeId, TournamentId};
use crate::roster::{Directory, RequestContext};
use crate::storage::{read_json, write_json_atomic};

const SNAPSHOT_FORMAT: u32 = 1;

/// Serialized shape of `themes.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSnapshot {
    pub format: u32,
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub themes: Vec<Theme>,
}

impl Default for ThemeSnapshot {
    fn default() -> Self {
        Self {
            format: SNAPSHOT_FORMAT,
            next_id: 1,
            themes: Vec::new(),
        }
    }
}

impl ThemeSnapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let snapshot: Self = read_json(path)?.unwrap_or_default();
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(Error::Validation(format!(
                "unsupported theme snapshot format: {}",
                snapshot.format
            )));
        }
        Ok(snapshot)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json_atomic(path, self)
    }
}

#[derive(Debug)]
struct ThemeBook {
    /// Ids are never reused, even after a delete
    next_id: u64,
    themes: BTreeMap<ThemeId, Theme>,
}

/// Versioned export themes, keyed by id.
pub struct ThemeStore {
    directory: Arc<dyn Directory>,
    book: RwLock<ThemeBook>,
}

impl ThemeStore {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            directory,
            book: RwLock::new(ThemeBook {
                next_id: 1,
                themes: BTreeMap::new(),
            }),
        }
    }

    fn authorize(&self, ctx: &RequestContext, tournament_id: TournamentId) -> Result<()> {
        let tournament = self.directory.tournament(tournament_id)?;
        ctx.ensure_can_manage(&tournament)
    }

    pub fn create(&self, ctx: &RequestContext, draft: ThemeDraft) -> Result<Theme> {
        draft.validate()?;
        self.authorize(ctx, draft.tournament_id)?;

        let mut book = self.book.write().unwrap_or_else(PoisonError::into_inner);
        let id = ThemeId(book.next_id);
        book.next_id += 1;
        let theme = Theme {
            id,
            tournament_id: draft.tournament_id,
            name: draft.name,
            background_image: draft.background_image,
            font: draft.font,
            teams_per_page: draft.teams_per_page,
            layout: draft.layout,
            version: 1,
            updated_at: Utc::now(),
        };
        book.themes.insert(id, theme.clone());
        info!(
            "Created theme {} '{}' for tournament {}",
            id, theme.name, theme.tournament_id
        );
        Ok(theme)
    }

    /// Replace a theme's content, bumping its version.
    ///
    /// A theme cannot move to another tournament.
    pub fn update(&self, ctx: &RequestContext, id: ThemeId, draft: ThemeDraft) -> Result<Theme> {
        draft.validate()?;
        let current = self.get(id)?;
        if current.tournament_id != draft.tournament_id {
            return Err(Error::Validation(format!(
                "theme {} belongs to tournament {}, not {}",
                id, current.tournament_id, draft.tournament_id
            )));
        }
        self.authorize(ctx, current.tournament_id)?;

        let mut book = self.book.write().unwrap_or_else(PoisonError::into_inner);
        let theme = book
            .themes
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("Theme", id))?;
        theme.name = draft.name;
        theme.background_image = draft.background_image;
        theme.font = draft.font;
        theme.teams_per_page = draft.teams_per_page;
        theme.layout = draft.layout;
        theme.version += 1;
        theme.updated_at = Utc::now();
        info!("Updated theme {} to version {}", id, theme.version);
        Ok(theme.clone())
    }

    pub fn get(&self, id: ThemeId) -> Result<Theme> {
        self.book
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .themes
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("Theme", id))
    }

    /// Themes of a tournament, ordered by id.
    pub fn list(&self, tournament_id: TournamentId) -> Vec<Theme> {
        self.book
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .themes
            .values()
            .filter(|t| t.tournament_id == tournament_id)
            .cloned()
            .collect()
    }

    pub fn delete(&self, ctx: &RequestContext, id: ThemeId) -> Result<Theme> {
        let current = self.get(id)?;
        self.authorize(ctx, current.tournament_id)?;

        let removed = self
            .book
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .themes
            .remove(&id)
            .ok_or_else(|| Error::not_found("Theme", id))?;
        info!("Deleted theme {} '{}'", id, removed.name);
        Ok(removed)
    }

    pub fn snapshot(&self) -> ThemeSnapshot {
        let book = self.book.read().unwrap_or_else(PoisonError::into_inner);
        ThemeSnapshot {
            format: SNAPSHOT_FORMAT,
            next_id: book.next_id,
            themes: book.themes.values().cloned().collect(),
        }
    }

    pub fn restore(&self, snapshot: ThemeSnapshot) -> Result<()> {
        let mut restored = BTreeMap::new();
        let next_id = snapshot.next_id;
        for theme in snapshot.themes {
            theme.validate()?;
            if restored.insert(theme.id, theme).is_some() {
                return Err(Error::Validation(
                    "theme snapshot repeats an id".to_string(),
                ));
            }
        }
        let highest = restored.keys().next_back().map_or(0, |id| id.0);
        *self.book.write().unwrap_or_else(PoisonError::into_inner) = ThemeBook {
            next_id: next_id.max(highest + 1),
            themes: restored,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;
    use crate::roster::{Roster, Tournament};
    use tempfile::TempDir;

    fn store() -> ThemeStore {
        let mut roster = Roster::new();
        for t in 1..=2 {
            roster.add_tournament(Tournament {
                id: TournamentId(t),
                name: format!("Cup {t}"),
                owner: UserId(10),
                points_config: None,
            });
        }
        ThemeStore::new(Arc::new(roster))
    }

    fn owner() -> RequestContext {
        RequestContext::organiser(UserId(10))
    }

    #[test]
    fn test_create_assigns_ids_and_version() {
        let store = store();
        let a = store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap();
        let b = store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Alt", "bg2.png"))
            .unwrap();
        assert_eq!(a.id, ThemeId(1));
        assert_eq!(b.id, ThemeId(2));
        assert_eq!(a.version, 1);
        assert_eq!(store.list(TournamentId(1)).len(), 2);
        assert!(store.list(TournamentId(2)).is_empty());
    }

    #[test]
    fn test_update_bumps_version() {
        let store = store();
        let theme = store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap();

        let mut draft = ThemeDraft::new(TournamentId(1), "Main", "bg.png");
        draft.teams_per_page = 12;
        let updated = store.update(&owner(), theme.id, draft).unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(store.get(theme.id).unwrap().teams_per_page, 12);
    }

    #[test]
    fn test_update_cannot_move_tournament() {
        let store = store();
        let theme = store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap();
        let err = store
            .update(&owner(), theme.id, ThemeDraft::new(TournamentId(2), "Main", "bg.png"))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_invalid_draft_is_not_stored() {
        let store = store();
        let mut draft = ThemeDraft::new(TournamentId(1), "Main", "bg.png");
        draft.teams_per_page = 0;
        assert!(store.create(&owner(), draft).is_err());
        assert!(store.list(TournamentId(1)).is_empty());
    }

    #[test]
    fn test_foreign_organiser_is_forbidden() {
        let store = store();
        let stranger = RequestContext::organiser(UserId(99));
        let err = store
            .create(&stranger, ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let theme = store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap();
        assert!(store.delete(&stranger, theme.id).is_err());
        assert!(store.delete(&RequestContext::admin(UserId(1)), theme.id).is_ok());
        assert!(store.get(theme.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        let store = store();
        let first = store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap();
        store.delete(&owner(), first.id).unwrap();
        let second = store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap();
        assert_eq!(second.id, ThemeId(2));
    }

    #[test]
    fn test_unknown_tournament_is_not_found() {
        let store = store();
        let err = store
            .create(&owner(), ThemeDraft::new(TournamentId(9), "Main", "bg.png"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("themes.json");
        let store = store();
        store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap();
        store.snapshot().save(&path).unwrap();

        let reloaded = self::store();
        reloaded.restore(ThemeSnapshot::load(&path).unwrap()).unwrap();
        assert_eq!(reloaded.snapshot(), store.snapshot());

        let next = reloaded
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Alt", "bg.png"))
            .unwrap();
        assert_eq!(next.id, ThemeId(2));
    }

    #[test]
    fn test_restore_rejects_hand_edited_layouts() {
        let store = store();
        store
            .create(&owner(), ThemeDraft::new(TournamentId(1), "Main", "bg.png"))
            .unwrap();
        let good = store.snapshot();

        let mut huge_stroke = good.clone();
        huge_stroke.themes[0].layout.stroke_width = 50_000;
        let mut no_background = good.clone();
        no_background.themes[0].background_image = String::new();
        let mut zero_logo = good.clone();
        zero_logo.themes[0].layout.logo_size = 0;

        for broken in [huge_stroke, no_background, zero_logo] {
            let target = self::store();
            assert!(matches!(target.restore(broken), Err(Error::Validation(_))));
            assert!(target.snapshot().themes.is_empty());
        }
    }
}
