use thiserror::Error;

use crate::model::TeamId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Placement {placement} is already taken by team {held_by}")]
    PlacementConflict { held_by: TeamId, placement: u32 },

    #[error("Invalid scoring table: {}", .0.join("; "))]
    Configuration(Vec<String>),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Export cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<u64>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Check if this error is a placement collision the caller may override
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::PlacementConflict { .. })
    }

    /// Check if this error is a missing record or a "file not found" error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        assert!(Error::Io(io_err).is_not_found());
        assert!(Error::not_found("Theme", 7u64).is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!Error::Io(other_io_err).is_not_found());
    }

    #[test]
    fn test_conflict_message_names_holder() {
        let err = Error::PlacementConflict {
            held_by: TeamId(4),
            placement: 2,
        };
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "Placement 2 is already taken by team 4");
    }

    #[test]
    fn test_configuration_lists_every_problem() {
        let err = Error::Configuration(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Invalid scoring table: a; b");
    }
}
