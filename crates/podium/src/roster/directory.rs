use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{MatchId, TeamId, TournamentId, UserId};
use crate::scoring::ScoringTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    /// User who created the tournament
    pub owner: UserId,
    /// Raw scoring table; `None` selects [`ScoringTable::default`]
    #[serde(default)]
    pub points_config: Option<BTreeMap<String, i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tournament_id: TournamentId,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub match_number: u32,
    #[serde(default = "default_map_name")]
    pub map_name: String,
}

fn default_map_name() -> String {
    "Erangel".to_string()
}

/// Lookup of records owned outside the engine.
pub trait Directory: Send + Sync {
    fn tournament(&self, id: TournamentId) -> Result<Tournament>;

    fn match_record(&self, id: MatchId) -> Result<Match>;

    fn team(&self, id: TeamId) -> Result<Team>;

    /// Every team registered in a tournament, in id order
    fn teams(&self, tournament: TournamentId) -> Vec<Team>;

    /// Parsed scoring table; a malformed table yields [`Error::Configuration`]
    fn scoring_table(&self, tournament: TournamentId) -> Result<ScoringTable>;
}

/// Serialized shape of `roster.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterFile {
    #[serde(default)]
    pub tournaments: Vec<Tournament>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

/// In-memory [`Directory`].
///
/// Scoring tables are parsed once when the roster is built. A tournament
/// whose table fails to parse stays listed, but aggregation for it is refused
/// until the table is fixed.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    tournaments: HashMap<TournamentId, Tournament>,
    scoring: HashMap<TournamentId, std::result::Result<ScoringTable, Vec<String>>>,
    teams: BTreeMap<TeamId, Team>,
    matches: HashMap<MatchId, Match>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: RosterFile) -> Result<Self> {
        let mut roster = Self::new();
        for tournament in file.tournaments {
            roster.add_tournament(tournament);
        }
        for team in file.teams {
            roster.add_team(team)?;
        }
        for record in file.matches {
            roster.add_match(record)?;
        }
        Ok(roster)
    }

    /// Load a roster from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let file: RosterFile = serde_json::from_str(&content)?;
        let roster = Self::from_file(file)?;
        info!(
            "Loaded roster from {}: {} tournaments, {} teams, {} matches",
            path.display(),
            roster.tournaments.len(),
            roster.teams.len(),
            roster.matches.len()
        );
        Ok(roster)
    }

    pub fn to_file(&self) -> RosterFile {
        let mut tournaments: Vec<_> = self.tournaments.values().cloned().collect();
        tournaments.sort_by_key(|t| t.id);
        let mut matches: Vec<_> = self.matches.values().cloned().collect();
        matches.sort_by_key(|m| m.id);
        RosterFile {
            tournaments,
            teams: self.teams.values().cloned().collect(),
            matches,
        }
    }

    pub fn add_tournament(&mut self, tournament: Tournament) {
        let parsed = match &tournament.points_config {
            None => Ok(ScoringTable::default()),
            Some(raw) => match ScoringTable::try_from(raw.clone()) {
                Ok(table) => Ok(table),
                Err(Error::Configuration(errors)) => {
                    warn!(
                        "Tournament {} has an invalid scoring table: {}",
                        tournament.id,
                        errors.join("; ")
                    );
                    Err(errors)
                }
                Err(other) => Err(vec![other.to_string()]),
            },
        };
        self.scoring.insert(tournament.id, parsed);
        self.tournaments.insert(tournament.id, tournament);
    }

    pub fn add_team(&mut self, team: Team) -> Result<()> {
        if !self.tournaments.contains_key(&team.tournament_id) {
            return Err(Error::not_found("Tournament", team.tournament_id));
        }
        self.teams.insert(team.id, team);
        Ok(())
    }

    pub fn add_match(&mut self, record: Match) -> Result<()> {
        if !self.tournaments.contains_key(&record.tournament_id) {
            return Err(Error::not_found("Tournament", record.tournament_id));
        }
        self.matches.insert(record.id, record);
        Ok(())
    }
}

impl Directory for Roster {
    fn tournament(&self, id: TournamentId) -> Result<Tournament> {
        self.tournaments
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("Tournament", id))
    }

    fn match_record(&self, id: MatchId) -> Result<Match> {
        self.matches
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("Match", id))
    }

    fn team(&self, id: TeamId) -> Result<Team> {
        self.teams
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("Team", id))
    }

    fn teams(&self, tournament: TournamentId) -> Vec<Team> {
        self.teams
            .values()
            .filter(|t| t.tournament_id == tournament)
            .cloned()
            .collect()
    }

    fn scoring_table(&self, tournament: TournamentId) -> Result<ScoringTable> {
        match self.scoring.get(&tournament) {
            Some(Ok(table)) => Ok(table.clone()),
            Some(Err(errors)) => Err(Error::Configuration(errors.clone())),
            None => Err(Error::not_found("Tournament", tournament)),
        }
    }
}
