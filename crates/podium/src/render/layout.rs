use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::model::TeamStanding;
use crate::theme::{ColumnKey, Layout};

/// One page worth of standings rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a> {
    /// 1-based page number
    pub number: usize,
    /// Number of rows on earlier pages
    pub start_rank: usize,
    pub rows: &'a [TeamStanding],
}

/// Split ranked rows into pages. Empty input yields a single empty page.
pub fn paginate(rows: &[TeamStanding], teams_per_page: NonZeroUsize) -> Vec<Page<'_>> {
    if rows.is_empty() {
        return vec![Page {
            number: 1,
            start_rank: 0,
            rows,
        }];
    }
    rows.chunks(teams_per_page.get())
        .enumerate()
        .map(|(i, chunk)| Page {
            number: i + 1,
            start_rank: i * teams_per_page.get(),
            rows: chunk,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldContent {
    Text { text: String },
    Logo { asset: String, size: u32 },
}

/// A field positioned in template pixels. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedField {
    pub column: ColumnKey,
    /// Row index within the page
    pub row: usize,
    pub x: i64,
    pub y: i64,
    pub content: FieldContent,
}

/// Top edge of a logo centred in a row starting at `row_y`.
pub fn logo_top(layout: &Layout, row_y: i64) -> i64 {
    let slack = i64::from(layout.row_height) - i64::from(layout.logo_size);
    row_y + slack.div_euclid(2) + i64::from(layout.logo_y_offset)
}

pub fn row_top(layout: &Layout, row: usize) -> i64 {
    i64::from(layout.start_y) + row as i64 * i64::from(layout.row_height)
}

fn cell_text(column: ColumnKey, rank: usize, standing: &TeamStanding) -> String {
    match column {
        ColumnKey::Rank => rank.to_string(),
        ColumnKey::Team => standing.team_name.clone(),
        ColumnKey::Wwcd => standing.total_wwcd.to_string(),
        ColumnKey::Matches => standing.matches_played.to_string(),
        ColumnKey::PosPts => standing.total_position_points.to_string(),
        ColumnKey::FinPts => standing.finish_points().to_string(),
        ColumnKey::Total => standing.total_points.to_string(),
        ColumnKey::Logo => String::new(),
    }
}

/// Absolute placement of every visible field on a page.
///
/// Fields come out row by row, columns in [`ColumnKey`] order, so identical
/// input always gives identical output.
pub fn layout_page(layout: &Layout, page: &Page<'_>) -> Vec<PlacedField> {
    let mut fields = Vec::with_capacity(page.rows.len() * layout.columns.len());
    for (row, standing) in page.rows.iter().enumerate() {
        let y = row_top(layout, row);
        let rank = page.start_rank + row + 1;

        for (&column, &offset) in &layout.columns {
            let x = i64::from(layout.start_x) + i64::from(offset);
            let field = match column {
                ColumnKey::Logo => {
                    let Some(asset) = &standing.team_logo else {
                        continue;
                    };
                    PlacedField {
                        column,
                        row,
                        x,
                        y: logo_top(layout, y),
                        content: FieldContent::Logo {
                            asset: asset.clone(),
                            size: layout.logo_size,
                        },
                    }
                }
                _ => PlacedField {
                    column,
                    row,
                    x,
                    y,
                    content: FieldContent::Text {
                        text: cell_text(column, rank, standing),
                    },
                },
            };
            fields.push(field);
        }
    }
    fields
}
