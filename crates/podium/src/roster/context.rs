use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::Tournament;
use crate::error::{Error, Result};
use crate::model::UserId;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Organiser,
    Player,
}

/// Who is performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

/// Per-request identity passed into every mutating engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub actor: Actor,
}

impl RequestContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            actor: Actor { user_id, role },
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn organiser(user_id: UserId) -> Self {
        Self::new(user_id, Role::Organiser)
    }

    /// Admins manage every tournament; organisers manage the ones they created.
    pub fn can_manage(&self, tournament: &Tournament) -> bool {
        match self.actor.role {
            Role::Admin => true,
            Role::Organiser => tournament.owner == self.actor.user_id,
            Role::Player => false,
        }
    }

    pub fn ensure_can_manage(&self, tournament: &Tournament) -> Result<()> {
        if self.can_manage(tournament) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "user {} ({}) cannot manage tournament {}",
                self.actor.user_id, self.actor.role, tournament.id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TournamentId;

    fn tournament(owner: u64) -> Tournament {
        Tournament {
            id: TournamentId(1),
            name: "Weekly Cup".to_string(),
            owner: UserId(owner),
            points_config: None,
        }
    }

    #[test]
    fn test_owner_and_admin_can_manage() {
        let t = tournament(7);
        assert!(RequestContext::organiser(UserId(7)).can_manage(&t));
        assert!(RequestContext::admin(UserId(99)).can_manage(&t));
    }

    #[test]
    fn test_other_users_are_forbidden() {
        let t = tournament(7);
        assert!(!RequestContext::organiser(UserId(8)).can_manage(&t));
        let err = RequestContext::new(UserId(7), Role::Player)
            .ensure_can_manage(&t)
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn test_role_parses_case_insensitively() {
        assert_eq!("organiser".parse::<Role>().unwrap(), Role::Organiser);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }
}
