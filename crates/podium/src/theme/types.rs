use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Error, Result};
use crate::model::{ThemeId, TournamentId};

/// Teams per exported page when a draft does not say otherwise
pub const DEFAULT_TEAMS_PER_PAGE: u32 = 20;
/// Upper bound on rows per page
pub const MAX_TEAMS_PER_PAGE: u32 = 500;
/// Upper bound on `row_height`, `font_size` and `logo_size`, in pixels
pub const MAX_LAYOUT_SIZE: u32 = 2048;
/// Upper bound on the text outline width, in pixels
pub const MAX_STROKE_WIDTH: u32 = 32;

/// Leaderboard field that can be placed on a template.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColumnKey {
    Rank,
    Logo,
    Team,
    Wwcd,
    Matches,
    PosPts,
    FinPts,
    Total,
}

impl ColumnKey {
    pub fn is_text(&self) -> bool {
        !matches!(self, ColumnKey::Logo)
    }
}

/// Text colour, kept in the organiser's original notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FontColor {
    text: String,
    rgba: [u8; 4],
}

impl FontColor {
    /// Parse `#RRGGBB` or `#RRGGBBAA`
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.trim();
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let invalid = || {
            Error::Validation(format!("font_color '{}' is not #RRGGBB or #RRGGBBAA", s))
        };
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(invalid());
        }

        let mut rgba = [0, 0, 0, 255];
        for (i, slot) in rgba.iter_mut().enumerate().take(digits.len() / 2) {
            *slot = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self {
            text: hex.to_string(),
            rgba,
        })
    }

    pub fn rgba(&self) -> [u8; 4] {
        self.rgba
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Default for FontColor {
    fn default() -> Self {
        Self {
            text: "#FFFFFF".to_string(),
            rgba: [255, 255, 255, 255],
        }
    }
}

impl TryFrom<String> for FontColor {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<FontColor> for String {
    fn from(color: FontColor) -> Self {
        color.text
    }
}

pub fn default_columns() -> BTreeMap<ColumnKey, i32> {
    [
        (ColumnKey::Rank, 0),
        (ColumnKey::Team, 100),
        (ColumnKey::Wwcd, 500),
        (ColumnKey::Matches, 650),
        (ColumnKey::PosPts, 800),
        (ColumnKey::FinPts, 950),
        (ColumnKey::Total, 1100),
    ]
    .into_iter()
    .collect()
}

/// Pixel layout of a theme, in the template's native resolution.
///
/// Missing fields take their defaults. A missing `columns` object selects
/// [`default_columns`]; an empty one hides every column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub start_x: i32,
    pub start_y: i32,
    pub row_height: u32,
    pub font_size: u32,
    pub font_color: FontColor,
    /// Outline width in pixels, 0 for none
    #[serde(alias = "font_weight")]
    pub stroke_width: u32,
    pub logo_size: u32,
    pub logo_y_offset: i32,
    /// x offset from `start_x` per visible column
    pub columns: BTreeMap<ColumnKey, i32>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            start_x: 100,
            start_y: 300,
            row_height: 50,
            font_size: 40,
            font_color: FontColor::default(),
            stroke_width: 0,
            logo_size: 40,
            logo_y_offset: 0,
            columns: default_columns(),
        }
    }
}

impl Layout {
    pub fn offset(&self, column: ColumnKey) -> Option<i32> {
        self.columns.get(&column).copied()
    }

    pub fn has_text_columns(&self) -> bool {
        self.columns.keys().any(ColumnKey::is_text)
    }

    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        for (field, value) in [
            ("row_height", self.row_height),
            ("font_size", self.font_size),
            ("logo_size", self.logo_size),
        ] {
            if !(1..=MAX_LAYOUT_SIZE).contains(&value) {
                problems.push(format!(
                    "{} must be between 1 and {}, got {}",
                    field, MAX_LAYOUT_SIZE, value
                ));
            }
        }
        if self.stroke_width > MAX_STROKE_WIDTH {
            problems.push(format!(
                "stroke_width must be at most {}, got {}",
                MAX_STROKE_WIDTH, self.stroke_width
            ));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(problems.join(", ")))
        }
    }
}

/// Organiser input for creating or updating a theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDraft {
    pub tournament_id: TournamentId,
    pub name: String,
    /// Asset reference of the background template
    pub background_image: String,
    /// Asset reference of a TTF/OTF font; the default font is used when absent
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default = "default_teams_per_page")]
    pub teams_per_page: u32,
    #[serde(default)]
    pub layout: Layout,
}

fn default_teams_per_page() -> u32 {
    DEFAULT_TEAMS_PER_PAGE
}

impl ThemeDraft {
    pub fn new(
        tournament_id: TournamentId,
        name: impl Into<String>,
        background_image: impl Into<String>,
    ) -> Self {
        Self {
            tournament_id,
            name: name.into(),
            background_image: background_image.into(),
            font: None,
            teams_per_page: DEFAULT_TEAMS_PER_PAGE,
            layout: Layout::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            &self.background_image,
            self.font.as_deref(),
            self.teams_per_page,
            &self.layout,
        )
    }
}

fn validate_fields(
    name: &str,
    background_image: &str,
    font: Option<&str>,
    teams_per_page: u32,
    layout: &Layout,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("theme name must not be empty".to_string()));
    }
    if background_image.trim().is_empty() {
        return Err(Error::Validation(
            "theme needs a background image".to_string(),
        ));
    }
    if !(1..=MAX_TEAMS_PER_PAGE).contains(&teams_per_page) {
        return Err(Error::Validation(format!(
            "teams_per_page must be between 1 and {}, got {}",
            MAX_TEAMS_PER_PAGE, teams_per_page
        )));
    }
    if font.is_some_and(|f| f.trim().is_empty()) {
        return Err(Error::Validation("font reference must not be empty".to_string()));
    }
    layout.validate()
}

/// Stored export template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: ThemeId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub background_image: String,
    pub font: Option<String>,
    pub teams_per_page: u32,
    pub layout: Layout,
    /// Bumped on every update, starting at 1
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

impl Theme {
    /// Apply the draft rules to a stored theme, e.g. one read from disk.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            &self.background_image,
            self.font.as_deref(),
            self.teams_per_page,
            &self.layout,
        )
        .map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("theme {}: {}", self.id, msg)),
            other => other,
        })
    }

    pub fn page_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.teams_per_page as usize).unwrap_or(NonZeroUsize::MIN)
    }
}
