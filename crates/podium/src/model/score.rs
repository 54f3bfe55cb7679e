use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{MatchId, TeamId};
use crate::error::{Error, Result};

/// Placement value meaning "still alive / no placement assigned yet".
pub const UNPLACED: u32 = 0;

/// One team's result in one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub match_id: MatchId,
    pub team_id: TeamId,
    pub kills: u32,
    /// Finishing rank; [`UNPLACED`] is exempt from uniqueness
    pub placement: u32,
    pub created_at: DateTime<Utc>,
}

impl ScoreEntry {
    pub fn new(match_id: MatchId, team_id: TeamId, kills: u32, placement: u32) -> Self {
        Self {
            match_id,
            team_id,
            kills,
            placement,
            created_at: Utc::now(),
        }
    }

    pub fn is_placed(&self) -> bool {
        self.placement != UNPLACED
    }

    pub fn is_win(&self) -> bool {
        self.placement == 1
    }
}

/// Raw score submission as it arrives from a caller, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInput {
    pub match_id: MatchId,
    pub team_id: TeamId,
    pub kills: i64,
    pub placement: i64,
}

impl ScoreInput {
    pub fn new(match_id: MatchId, team_id: TeamId, kills: i64, placement: i64) -> Self {
        Self {
            match_id,
            team_id,
            kills,
            placement,
        }
    }

    /// Check numeric bounds and build the entry to store.
    pub fn into_entry(self) -> Result<ScoreEntry> {
        let kills = u32::try_from(self.kills).map_err(|_| {
            Error::Validation(format!("kills must be a non-negative integer, got {}", self.kills))
        })?;
        let placement = u32::try_from(self.placement).map_err(|_| {
            Error::Validation(format!(
                "placement must be a non-negative integer, got {}",
                self.placement
            ))
        })?;
        Ok(ScoreEntry::new(self.match_id, self.team_id, kills, placement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_entry_accepts_unplaced() {
        let entry = ScoreInput::new(MatchId(1), TeamId(2), 3, 0).into_entry().unwrap();
        assert_eq!(entry.kills, 3);
        assert!(!entry.is_placed());
        assert!(!entry.is_win());
    }

    #[test]
    fn test_into_entry_rejects_negative_values() {
        let err = ScoreInput::new(MatchId(1), TeamId(2), -1, 4).into_entry().unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("kills")));

        let err = ScoreInput::new(MatchId(1), TeamId(2), 0, -4).into_entry().unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("placement")));
    }

    #[test]
    fn test_into_entry_rejects_overflow() {
        let err = ScoreInput::new(MatchId(1), TeamId(2), i64::MAX, 1)
            .into_entry()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
