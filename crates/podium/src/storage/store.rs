use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::file::{read_json, write_json_atomic};
use crate::error::{Error, Result};
use crate::model::{MatchId, ScoreEntry, StandingsVersion, TeamId, TournamentId};

const SNAPSHOT_FORMAT: u32 = 1;

/// Entries of one match, indexed by team and by placement.
#[derive(Debug, Default)]
struct MatchSheet {
    by_team: BTreeMap<TeamId, ScoreEntry>,
    by_placement: HashMap<u32, TeamId>,
}

impl MatchSheet {
    fn holder(&self, placement: u32) -> Option<TeamId> {
        self.by_placement.get(&placement).copied()
    }

    /// Insert or replace the team's entry. The caller has already cleared
    /// any other holder of the placement.
    fn insert(&mut self, entry: ScoreEntry) -> Option<ScoreEntry> {
        let previous = self.remove(entry.team_id);
        if entry.is_placed() {
            self.by_placement.insert(entry.placement, entry.team_id);
        }
        self.by_team.insert(entry.team_id, entry);
        previous
    }

    fn remove(&mut self, team_id: TeamId) -> Option<ScoreEntry> {
        let removed = self.by_team.remove(&team_id)?;
        if removed.is_placed() {
            self.by_placement.remove(&removed.placement);
        }
        Some(removed)
    }

    fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }
}

#[derive(Debug, Default)]
struct ScoreBook {
    version: StandingsVersion,
    sheets: BTreeMap<MatchId, MatchSheet>,
}

/// Compare two books entry by entry, ignoring their versions.
fn same_entries(a: &ScoreBook, b: &ScoreBook) -> bool {
    a.sheets.len() == b.sheets.len()
        && a.sheets.iter().zip(&b.sheets).all(|((ma, sa), (mb, sb))| {
            ma == mb && sa.by_team == sb.by_team
        })
}

impl ScoreBook {
    fn entries(&self) -> Vec<ScoreEntry> {
        self.sheets
            .values()
            .flat_map(|sheet| sheet.by_team.values().cloned())
            .collect()
    }
}

/// Result of a successful score submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub version: StandingsVersion,
    pub entry: ScoreEntry,
    /// Previous entry of the same team in the same match, if any
    pub replaced: Option<ScoreEntry>,
    /// Entry of another team deleted by an explicit override, if any
    pub evicted: Option<ScoreEntry>,
}

/// Consistent copy of one tournament's entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentScores {
    pub tournament_id: TournamentId,
    pub version: StandingsVersion,
    pub entries: Vec<ScoreEntry>,
}

/// Serialized shape of `scores.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub format: u32,
    #[serde(default)]
    pub tournaments: Vec<TournamentScores>,
}

impl Default for ScoreSnapshot {
    fn default() -> Self {
        Self {
            format: SNAPSHOT_FORMAT,
            tournaments: Vec::new(),
        }
    }
}

impl ScoreSnapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let snapshot: Self = read_json(path)?.unwrap_or_default();
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(Error::Validation(format!(
                "unsupported score snapshot format: {}",
                snapshot.format
            )));
        }
        Ok(snapshot)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json_atomic(path, self)
    }
}

/// Per-tournament score books.
///
/// All writes for a tournament run under that tournament's write guard, so
/// the placement check and the insert (plus any override eviction) happen as
/// one step. Reads copy entries and version under the read guard.
#[derive(Debug, Default)]
pub struct ScoreStore {
    books: RwLock<HashMap<TournamentId, Arc<RwLock<ScoreBook>>>>,
}

impl ScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, tournament: TournamentId) -> Arc<RwLock<ScoreBook>> {
        if let Some(book) = self
            .books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tournament)
        {
            return Arc::clone(book);
        }
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(books.entry(tournament).or_default())
    }

    fn existing_book(&self, tournament: TournamentId) -> Option<Arc<RwLock<ScoreBook>>> {
        self.books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tournament)
            .map(Arc::clone)
    }

    /// Store an entry, enforcing placement uniqueness within its match.
    ///
    /// Without `allow_override`, a placement held by another team fails with
    /// [`Error::PlacementConflict`] and nothing changes. With it, the holder's
    /// entry is deleted and the new entry inserted under the same guard.
    pub fn apply(
        &self,
        tournament: TournamentId,
        entry: ScoreEntry,
        allow_override: bool,
    ) -> Result<Submission> {
        let book = self.book(tournament);
        let mut book = book.write().unwrap_or_else(PoisonError::into_inner);
        let sheet = book.sheets.entry(entry.match_id).or_default();

        let mut evicted = None;
        if entry.is_placed() {
            if let Some(holder) = sheet
                .holder(entry.placement)
                .filter(|holder| *holder != entry.team_id)
            {
                if !allow_override {
                    return Err(Error::PlacementConflict {
                        held_by: holder,
                        placement: entry.placement,
                    });
                }
                evicted = sheet.remove(holder);
            }
        }

        let mut entry = entry;
        if let Some(existing) = sheet.by_team.get(&entry.team_id) {
            entry.created_at = existing.created_at;
        }
        let replaced = sheet.insert(entry.clone());

        book.version = book.version.next();
        debug!(
            "Stored score for team {} in match {} (tournament {}, {})",
            entry.team_id, entry.match_id, tournament, book.version
        );

        Ok(Submission {
            version: book.version,
            entry,
            replaced,
            evicted,
        })
    }

    /// Delete one team's entry for a match.
    pub fn remove(
        &self,
        tournament: TournamentId,
        match_id: MatchId,
        team_id: TeamId,
    ) -> Result<(StandingsVersion, ScoreEntry)> {
        let missing = || {
            Error::Validation(format!(
                "no score recorded for team {} in match {}",
                team_id, match_id
            ))
        };
        let book = self.existing_book(tournament).ok_or_else(missing)?;
        let mut book = book.write().unwrap_or_else(PoisonError::into_inner);
        let sheet = book.sheets.get_mut(&match_id).ok_or_else(missing)?;
        let removed = sheet.remove(team_id).ok_or_else(missing)?;
        if sheet.is_empty() {
            book.sheets.remove(&match_id);
        }
        book.version = book.version.next();
        Ok((book.version, removed))
    }

    /// Copy a tournament's entries and version in one read.
    pub fn read(&self, tournament: TournamentId) -> TournamentScores {
        match self.existing_book(tournament) {
            Some(book) => {
                let book = book.read().unwrap_or_else(PoisonError::into_inner);
                TournamentScores {
                    tournament_id: tournament,
                    version: book.version,
                    entries: book.entries(),
                }
            }
            None => TournamentScores {
                tournament_id: tournament,
                ..Default::default()
            },
        }
    }

    pub fn version(&self, tournament: TournamentId) -> StandingsVersion {
        match self.existing_book(tournament) {
            Some(book) => {
                let book = book.read().unwrap_or_else(PoisonError::into_inner);
                book.version
            }
            None => StandingsVersion::default(),
        }
    }

    pub fn entry(
        &self,
        tournament: TournamentId,
        match_id: MatchId,
        team_id: TeamId,
    ) -> Option<ScoreEntry> {
        let book = self.existing_book(tournament)?;
        let book = book.read().unwrap_or_else(PoisonError::into_inner);
        book.sheets.get(&match_id)?.by_team.get(&team_id).cloned()
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        let books: Vec<(TournamentId, Arc<RwLock<ScoreBook>>)> = self
            .books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, book)| (*id, Arc::clone(book)))
            .collect();

        let mut tournaments: Vec<TournamentScores> = books
            .into_iter()
            .map(|(id, book)| {
                let book = book.read().unwrap_or_else(PoisonError::into_inner);
                TournamentScores {
                    tournament_id: id,
                    version: book.version,
                    entries: book.entries(),
                }
            })
            .collect();
        tournaments.sort_by_key(|t| t.tournament_id);

        ScoreSnapshot {
            format: SNAPSHOT_FORMAT,
            tournaments,
        }
    }

    /// Replace a tournament's book with snapshot content.
    ///
    /// Returns `true` when the stored version or entries changed. The snapshot is
    /// checked against both uniqueness rules before anything is replaced.
    pub fn restore_tournament(&self, scores: &TournamentScores) -> Result<bool> {
        let mut fresh = ScoreBook {
            version: scores.version,
            sheets: BTreeMap::new(),
        };
        for entry in &scores.entries {
            let sheet = fresh.sheets.entry(entry.match_id).or_default();
            if sheet.by_team.contains_key(&entry.team_id) {
                return Err(Error::Validation(format!(
                    "snapshot has two entries for team {} in match {}",
                    entry.team_id, entry.match_id
                )));
            }
            if entry.is_placed() && sheet.holder(entry.placement).is_some() {
                return Err(Error::Validation(format!(
                    "snapshot has placement {} twice in match {}",
                    entry.placement, entry.match_id
                )));
            }
            sheet.insert(entry.clone());
        }

        let book = self.book(scores.tournament_id);
        let mut book = book.write().unwrap_or_else(PoisonError::into_inner);
        let changed = book.version != fresh.version || !same_entries(&book, &fresh);
        *book = fresh;
        Ok(changed)
    }

    pub fn restore(&self, snapshot: &ScoreSnapshot) -> Result<()> {
        for scores in &snapshot.tournaments {
            self.restore_tournament(scores)?;
        }
        info!(
            "Restored scores for {} tournaments",
            snapshot.tournaments.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    const T: TournamentId = TournamentId(1);

    fn entry(match_id: u64, team_id: u64, kills: u32, placement: u32) -> ScoreEntry {
        ScoreEntry::new(MatchId(match_id), TeamId(team_id), kills, placement)
    }

    #[test]
    fn test_conflict_without_override_keeps_first_entry() {
        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 3, 1), false).unwrap();

        let err = store.apply(T, entry(1, 20, 5, 1), false).unwrap_err();
        assert!(matches!(
            err,
            Error::PlacementConflict { held_by: TeamId(10), placement: 1 }
        ));

        let scores = store.read(T);
        assert_eq!(scores.entries.len(), 1);
        assert_eq!(scores.entries[0].team_id, TeamId(10));
        assert_eq!(scores.version, StandingsVersion(1));
    }

    #[test]
    fn test_override_replaces_conflicting_entry() {
        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 3, 1), false).unwrap();

        let submission = store.apply(T, entry(1, 20, 5, 1), true).unwrap();
        assert_eq!(submission.evicted.unwrap().team_id, TeamId(10));
        assert!(submission.replaced.is_none());

        let scores = store.read(T);
        assert_eq!(scores.entries.len(), 1);
        assert_eq!(scores.entries[0].team_id, TeamId(20));
        assert!(store.entry(T, MatchId(1), TeamId(10)).is_none());
    }

    #[test]
    fn test_resubmission_replaces_in_place() {
        let store = ScoreStore::new();
        let first = store.apply(T, entry(1, 10, 3, 2), false).unwrap();
        let second = store.apply(T, entry(1, 10, 7, 2), false).unwrap();

        assert_eq!(second.replaced.unwrap().kills, 3);
        assert_eq!(second.entry.created_at, first.entry.created_at);
        let scores = store.read(T);
        assert_eq!(scores.entries.len(), 1);
        assert_eq!(scores.entries[0].kills, 7);
        assert_eq!(scores.version, StandingsVersion(2));
    }

    #[test]
    fn test_moving_placement_frees_the_old_one() {
        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 0, 3), false).unwrap();
        store.apply(T, entry(1, 10, 0, 4), false).unwrap();
        store.apply(T, entry(1, 20, 0, 3), false).unwrap();
        assert_eq!(store.read(T).entries.len(), 2);
    }

    #[test]
    fn test_unplaced_entries_never_conflict() {
        let store = ScoreStore::new();
        for team in 1..=5 {
            store.apply(T, entry(1, team, 1, 0), false).unwrap();
        }
        assert_eq!(store.read(T).entries.len(), 5);
    }

    #[test]
    fn test_same_placement_in_other_match_is_fine() {
        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 0, 1), false).unwrap();
        store.apply(T, entry(2, 20, 0, 1), false).unwrap();
        store.apply(T, entry(2, 10, 0, 2), false).unwrap();
        assert_eq!(store.read(T).entries.len(), 3);
    }

    #[test]
    fn test_remove_entry() {
        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 0, 1), false).unwrap();
        let (version, removed) = store.remove(T, MatchId(1), TeamId(10)).unwrap();
        assert_eq!(version, StandingsVersion(2));
        assert_eq!(removed.placement, 1);
        assert!(store.read(T).entries.is_empty());
        assert!(store.remove(T, MatchId(1), TeamId(10)).is_err());

        // Placement 1 is free again
        store.apply(T, entry(1, 20, 0, 1), false).unwrap();
    }

    #[test]
    fn test_concurrent_claims_exactly_one_wins() {
        let store = Arc::new(ScoreStore::new());
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads as u64)
            .map(|team| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.apply(T, entry(1, team, 0, 1), false)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_conflict()))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, threads - 1);
        assert_eq!(store.read(T).entries.len(), 1);
    }

    #[test]
    fn test_snapshot_roundtrip_and_validation() {
        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 2, 1), false).unwrap();
        store.apply(TournamentId(2), entry(5, 30, 1, 0), false).unwrap();
        let snapshot = store.snapshot();

        let restored = ScoreStore::new();
        restored.restore(&snapshot).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.version(T), StandingsVersion(1));

        let mut broken = snapshot.clone();
        broken.tournaments[0].entries.push(entry(1, 11, 0, 1));
        assert!(matches!(
            ScoreStore::new().restore(&broken),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_read_unknown_tournament_is_empty() {
        let scores = ScoreStore::new().read(TournamentId(9));
        assert_eq!(scores.tournament_id, TournamentId(9));
        assert_eq!(scores.version, StandingsVersion::default());
        assert!(scores.entries.is_empty());
    }

    #[test]
    fn test_conflict_leaves_no_empty_sheet_behind() {
        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 0, 1), false).unwrap();
        store.apply(T, entry(1, 20, 0, 1), false).unwrap_err();
        assert_eq!(store.snapshot().tournaments[0].entries.len(), 1);
    }

    #[test]
    fn test_restore_detects_changed_entries_at_same_version() {
        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 3, 1), false).unwrap();
        let current = store.read(T);
        assert!(!store.restore_tournament(&current).unwrap());

        // Another writer produced different content under the same version
        let diverged = TournamentScores {
            entries: vec![entry(1, 20, 5, 1)],
            ..current.clone()
        };
        assert_eq!(diverged.version, current.version);
        assert!(store.restore_tournament(&diverged).unwrap());
        assert_eq!(store.read(T).entries[0].team_id, TeamId(20));
    }

    #[test]
    fn test_snapshot_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        assert_eq!(ScoreSnapshot::load(&path).unwrap(), ScoreSnapshot::default());

        let store = ScoreStore::new();
        store.apply(T, entry(1, 10, 2, 1), false).unwrap();
        store.snapshot().save(&path).unwrap();
        assert_eq!(ScoreSnapshot::load(&path).unwrap(), store.snapshot());
    }
}
