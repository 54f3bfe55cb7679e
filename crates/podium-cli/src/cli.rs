use std::path::PathBuf;

use clap::{Parser, Subcommand};
use podium::{MatchId, Role, Size, TeamId, ThemeId, TournamentId, UserId};

#[derive(Parser)]
#[command(name = "podium")]
#[command(about = "Tournament results engine: scores, standings and leaderboard exports")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "podium.toml", global = true)]
    pub config: PathBuf,

    /// Data directory (overrides the configuration file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Acting user id
    #[arg(long, env = "PODIUM_USER", default_value_t = UserId(0), global = true)]
    pub user: UserId,

    /// Acting user role (admin, organiser, player)
    #[arg(long, env = "PODIUM_ROLE", default_value_t = Role::Organiser, global = true)]
    pub role: Role,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a team's kills and placement for a match
    Submit {
        #[arg(long = "match")]
        match_id: MatchId,
        #[arg(long)]
        team: TeamId,
        #[arg(long, allow_hyphen_values = true)]
        kills: i64,
        /// Finishing position, 0 while the team is still alive
        #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
        placement: i64,
        /// Replace another team holding the same placement
        #[arg(long)]
        force: bool,
    },
    /// Delete a team's entry for a match
    Remove {
        #[arg(long = "match")]
        match_id: MatchId,
        #[arg(long)]
        team: TeamId,
    },
    /// Print a tournament's standings
    Standings {
        #[arg(long)]
        tournament: TournamentId,
        /// Only count one match
        #[arg(long = "match")]
        match_id: Option<MatchId>,
        #[arg(long)]
        json: bool,
    },
    /// Manage export themes
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
    /// Convert an editor click to template pixels
    Calibrate {
        #[arg(allow_hyphen_values = true)]
        x: i64,
        #[arg(allow_hyphen_values = true)]
        y: i64,
        /// Displayed image size, e.g. 960x540
        #[arg(long, value_parser = parse_size)]
        display: Size,
        /// Template size, e.g. 1920x1080
        #[arg(long, value_parser = parse_size)]
        native: Size,
        /// Map template pixels to display coordinates instead
        #[arg(long)]
        inverse: bool,
    },
    /// Render leaderboard images
    Export {
        #[arg(long)]
        tournament: TournamentId,
        #[arg(long)]
        theme: ThemeId,
        /// Render only this page (1-based)
        #[arg(long, conflicts_with = "archive")]
        page: Option<usize>,
        /// Always bundle pages into a zip archive
        #[arg(long)]
        archive: bool,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Print standings whenever they change
    Watch {
        #[arg(long)]
        tournament: TournamentId,
        /// How often to check the data directory for changes
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

#[derive(Subcommand)]
pub enum ThemeCommand {
    /// Create a theme from a JSON draft
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    /// Replace a theme with a JSON draft
    Update {
        #[arg(long)]
        id: ThemeId,
        #[arg(long)]
        file: PathBuf,
    },
    /// List a tournament's themes
    List {
        #[arg(long)]
        tournament: TournamentId,
        #[arg(long)]
        json: bool,
    },
    /// Print a theme as JSON
    Show {
        #[arg(long)]
        id: ThemeId,
    },
    /// Delete a theme
    Delete {
        #[arg(long)]
        id: ThemeId,
    },
}

impl Command {
    /// Whether the command changes stored scores or themes
    pub fn mutates(&self) -> bool {
        match self {
            Command::Submit { .. } | Command::Remove { .. } => true,
            Command::Theme { command } => matches!(
                command,
                ThemeCommand::Create { .. }
                    | ThemeCommand::Update { .. }
                    | ThemeCommand::Delete { .. }
            ),
            _ => false,
        }
    }
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    Ok(Size::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("960x540").unwrap(), Size::new(960, 540));
        assert_eq!(parse_size("1920X1080").unwrap(), Size::new(1920, 1080));
        assert!(parse_size("960").is_err());
        assert!(parse_size("ax540").is_err());
    }

    #[test]
    fn test_submit_arguments() {
        let cli = Cli::try_parse_from([
            "podium", "--user", "10", "submit", "--match", "3", "--team", "7", "--kills", "4",
            "--placement", "1", "--force",
        ])
        .unwrap();
        assert_eq!(cli.user, UserId(10));
        assert!(cli.command.mutates());
        match cli.command {
            Command::Submit {
                match_id,
                team,
                kills,
                placement,
                force,
            } => {
                assert_eq!(
                    (match_id, team, kills, placement, force),
                    (MatchId(3), TeamId(7), 4, 1, true)
                );
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn test_role_is_case_insensitive() {
        let cli = Cli::try_parse_from([
            "podium", "--role", "admin", "standings", "--tournament", "1",
        ])
        .unwrap();
        assert_eq!(cli.role, Role::Admin);
        assert!(!cli.command.mutates());
    }

    #[test]
    fn test_page_conflicts_with_archive() {
        assert!(Cli::try_parse_from([
            "podium", "export", "--tournament", "1", "--theme", "1", "--page", "2", "--archive",
        ])
        .is_err());
    }
}
