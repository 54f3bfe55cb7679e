use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use ab_glyph::{Font, FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tracing::{debug, warn};

use super::assets::AssetSource;
use super::layout::{FieldContent, Page, layout_page};
use crate::error::{Error, Result};
use crate::model::TeamStanding;
use crate::theme::{ColumnKey, Layout, Theme};

/// Draws leaderboard pages onto theme backgrounds.
pub struct Renderer {
    assets: Arc<dyn AssetSource>,
    default_font: Option<FontArc>,
}

impl Renderer {
    pub fn new(assets: Arc<dyn AssetSource>) -> Self {
        Self {
            assets,
            default_font: None,
        }
    }

    /// Font used by themes that do not carry their own.
    pub fn with_default_font(mut self, bytes: Vec<u8>) -> Result<Self> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| Error::Render(format!("default font: {}", e)))?;
        self.default_font = Some(font);
        Ok(self)
    }

    fn load_font(&self, asset: &str) -> Result<FontArc> {
        let bytes = self
            .assets
            .load(asset)
            .map_err(|e| Error::Render(format!("font '{}': {}", asset, e)))?;
        FontArc::try_from_vec(bytes).map_err(|e| Error::Render(format!("font '{}': {}", asset, e)))
    }

    fn load_background(&self, asset: &str) -> Result<RgbaImage> {
        let bytes = self
            .assets
            .load(asset)
            .map_err(|e| Error::Render(format!("background '{}': {}", asset, e)))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| Error::Render(format!("background '{}': {}", asset, e)))?;
        Ok(image.to_rgba8())
    }

    /// Logos are decorative: failures are logged and the logo is left out.
    fn load_logo(&self, asset: &str, size: u32) -> Option<RgbaImage> {
        let decoded = self
            .assets
            .load(asset)
            .and_then(|bytes| image::load_from_memory(&bytes).map_err(Error::from));
        match decoded {
            Ok(image) => Some(imageops::resize(
                &image.to_rgba8(),
                size,
                size,
                FilterType::Lanczos3,
            )),
            Err(e) => {
                warn!("Skipping logo '{}': {}", asset, e);
                None
            }
        }
    }

    /// Load everything a theme needs to draw the given rows.
    ///
    /// The background and, when text is drawn, the font must load; logos are
    /// loaded once per distinct reference.
    pub fn prepare(&self, theme: &Theme, rows: &[TeamStanding]) -> Result<PreparedTheme> {
        let layout = theme.layout.clone();
        let background = self.load_background(&theme.background_image)?;

        let font = if layout.has_text_columns() && !rows.is_empty() {
            let font = match &theme.font {
                Some(asset) => self.load_font(asset)?,
                None => self.default_font.clone().ok_or_else(|| {
                    Error::Render(format!(
                        "theme {} has no font and no default font is configured",
                        theme.id
                    ))
                })?,
            };
            Some(font)
        } else {
            None
        };

        let mut logos = HashMap::new();
        if layout.offset(ColumnKey::Logo).is_some() {
            for asset in rows.iter().filter_map(|r| r.team_logo.as_deref()) {
                if logos.contains_key(asset) {
                    continue;
                }
                if let Some(logo) = self.load_logo(asset, layout.logo_size) {
                    logos.insert(asset.to_string(), logo);
                }
            }
        }
        debug!(
            "Prepared theme {} ({}x{}, {} logos)",
            theme.id,
            background.width(),
            background.height(),
            logos.len()
        );

        Ok(PreparedTheme {
            layout,
            background,
            font,
            logos,
        })
    }
}

/// A theme with its assets decoded, shareable across render threads.
pub struct PreparedTheme {
    layout: Layout,
    background: RgbaImage,
    font: Option<FontArc>,
    logos: HashMap<String, RgbaImage>,
}

/// Scale at which the font's em square is `font_size` pixels tall.
fn font_scale(font: &FontArc, font_size: u32) -> PxScale {
    let size = font_size as f32;
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(size * font.height_unscaled() / units),
        _ => PxScale::from(size),
    }
}

fn to_px(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl PreparedTheme {
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Composite one page onto a copy of the background.
    pub fn draw(&self, page: &Page<'_>) -> Result<RgbaImage> {
        let mut canvas = self.background.clone();
        let color = Rgba(self.layout.font_color.rgba());
        let stroke = i64::from(self.layout.stroke_width);
        let scale = self
            .font
            .as_ref()
            .map(|font| font_scale(font, self.layout.font_size));

        for field in layout_page(&self.layout, page) {
            match &field.content {
                FieldContent::Logo { asset, .. } => {
                    if let Some(logo) = self.logos.get(asset) {
                        imageops::overlay(&mut canvas, logo, field.x, field.y);
                    }
                }
                FieldContent::Text { text } => {
                    let (Some(font), Some(scale)) = (&self.font, scale) else {
                        return Err(Error::Render("text field without a font".to_string()));
                    };
                    for dx in -stroke..=stroke {
                        for dy in -stroke..=stroke {
                            if (dx, dy) != (0, 0) && dx * dx + dy * dy <= stroke * stroke {
                                let (x, y) = (to_px(field.x + dx), to_px(field.y + dy));
                                draw_text_mut(&mut canvas, color, x, y, scale, font, text);
                            }
                        }
                    }
                    let (x, y) = (to_px(field.x), to_px(field.y));
                    draw_text_mut(&mut canvas, color, x, y, scale, font, text);
                }
            }
        }
        Ok(canvas)
    }

    /// Draw a page and encode it as PNG.
    pub fn render_png(&self, page: &Page<'_>) -> Result<Vec<u8>> {
        let canvas = self.draw(page)?;
        let mut bytes = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SYSTEM_FONTS;
    use crate::model::{TeamId, ThemeId, TournamentId};
    use crate::render::{MemoryAssets, paginate};
    use crate::theme::FontColor;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::num::NonZeroUsize;

    pub(crate) fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    pub(crate) fn logo_theme() -> Theme {
        Theme {
            id: ThemeId(1),
            tournament_id: TournamentId(1),
            name: "Logos".to_string(),
            background_image: "bg.png".to_string(),
            font: None,
            teams_per_page: 2,
            layout: Layout {
                start_x: 10,
                start_y: 10,
                row_height: 30,
                logo_size: 20,
                columns: BTreeMap::from([(ColumnKey::Logo, 0)]),
                ..Layout::default()
            },
            version: 1,
            updated_at: Utc::now(),
        }
    }

    fn rows() -> Vec<TeamStanding> {
        vec![
            TeamStanding::empty(TeamId(1), "Red", Some("logos/red.png".to_string())),
            TeamStanding::empty(TeamId(2), "Blue", Some("logos/missing.png".to_string())),
        ]
    }

    fn renderer() -> Renderer {
        let mut assets = MemoryAssets::new();
        assets.insert("bg.png", png(200, 100, [0, 0, 0, 255]));
        assets.insert("broken.png", b"not an image".to_vec());
        assets.insert("logos/red.png", png(10, 10, [255, 0, 0, 255]));
        Renderer::new(Arc::new(assets))
    }

    #[test]
    fn test_logo_is_scaled_and_placed() {
        let rows = rows();
        let theme = logo_theme();
        let prepared = renderer().prepare(&theme, &rows).unwrap();
        let pages = paginate(&rows, NonZeroUsize::new(2).unwrap());
        let canvas = prepared.draw(&pages[0]).unwrap();

        assert_eq!(canvas.dimensions(), (200, 100));
        // Row 0 logo spans x 10..30, y 15..35
        let inside = canvas.get_pixel(20, 25);
        assert!(inside[0] > 200 && inside[1] < 50);
        assert_eq!(canvas.get_pixel(5, 25), &Rgba([0, 0, 0, 255]));
        // Row 1 logo failed to load and is skipped
        assert_eq!(canvas.get_pixel(20, 55), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_missing_background_is_render_error() {
        let mut theme = logo_theme();
        theme.background_image = "nope.png".to_string();
        let err = renderer().prepare(&theme, &rows()).err().unwrap();
        assert!(matches!(err, Error::Render(_)));

        theme.background_image = "broken.png".to_string();
        let err = renderer().prepare(&theme, &rows()).err().unwrap();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_text_without_font_is_render_error() {
        let mut theme = logo_theme();
        theme.layout.columns.insert(ColumnKey::Team, 40);
        let err = renderer().prepare(&theme, &rows()).err().unwrap();
        assert!(matches!(err, Error::Render(_)));

        // No rows means no text, so no font is needed
        assert!(renderer().prepare(&theme, &[]).is_ok());
    }

    #[test]
    fn test_bad_default_font_is_rejected() {
        assert!(renderer().with_default_font(b"not a font".to_vec()).is_err());
    }

    fn system_font() -> Option<Vec<u8>> {
        SYSTEM_FONTS.iter().find_map(|path| std::fs::read(path).ok())
    }

    fn text_theme(stroke_width: u32) -> Theme {
        Theme {
            name: "Text".to_string(),
            font: Some("fonts/team.ttf".to_string()),
            layout: Layout {
                start_x: 20,
                start_y: 20,
                row_height: 40,
                font_size: 24,
                font_color: FontColor::parse("#ff0000").unwrap(),
                stroke_width,
                columns: BTreeMap::from([(ColumnKey::Team, 0)]),
                ..Layout::default()
            },
            ..logo_theme()
        }
    }

    /// Bounding box and count of pixels drawn in pure red.
    fn inked(canvas: &RgbaImage) -> (usize, (u32, u32, u32, u32)) {
        let mut count = 0;
        let mut bounds = (u32::MAX, u32::MAX, 0, 0);
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if pixel[0] > 128 {
                assert!(pixel[1] == 0 && pixel[2] == 0, "off-colour pixel {pixel:?}");
                count += 1;
                bounds = (bounds.0.min(x), bounds.1.min(y), bounds.2.max(x), bounds.3.max(y));
            }
        }
        (count, bounds)
    }

    #[test]
    fn test_text_is_drawn_in_font_color_at_its_field() {
        let Some(font) = system_font() else {
            eprintln!("no system font available, skipping");
            return;
        };
        let mut assets = MemoryAssets::new();
        assets.insert("bg.png", png(300, 100, [0, 0, 0, 255]));
        assets.insert("fonts/team.ttf", font);
        let renderer = Renderer::new(Arc::new(assets));

        let rows = vec![TeamStanding::empty(TeamId(1), "HHHH", None)];
        let pages = paginate(&rows, NonZeroUsize::new(2).unwrap());

        let plain = renderer.prepare(&text_theme(0), &rows).unwrap();
        let (plain_count, (min_x, min_y, max_x, max_y)) = inked(&plain.draw(&pages[0]).unwrap());
        assert!(plain_count > 0);
        // Text starts at (20, 20) and stays inside its row
        assert!(min_x >= 20 && min_x < 30, "min_x {min_x}");
        assert!(min_y >= 20 && max_y < 60, "y range {min_y}..{max_y}");
        assert!(max_x > min_x + 20);

        let outlined = renderer.prepare(&text_theme(3), &rows).unwrap();
        let (outlined_count, (outlined_min_x, ..)) = inked(&outlined.draw(&pages[0]).unwrap());
        assert!(outlined_count > plain_count);
        assert!(outlined_min_x < min_x);
    }

    #[test]
    fn test_theme_without_font_uses_default_font() {
        let Some(font) = system_font() else {
            eprintln!("no system font available, skipping");
            return;
        };
        let renderer = renderer().with_default_font(font).unwrap();
        let mut theme = text_theme(0);
        theme.font = None;
        theme.background_image = "bg.png".to_string();

        let rows = vec![TeamStanding::empty(TeamId(1), "HHHH", None)];
        let pages = paginate(&rows, NonZeroUsize::new(1).unwrap());
        let canvas = renderer.prepare(&theme, &rows).unwrap().draw(&pages[0]).unwrap();
        assert!(inked(&canvas).0 > 0);

        // A theme font that is missing is an error, not a silent fallback
        theme.font = Some("fonts/missing.ttf".to_string());
        assert!(matches!(renderer.prepare(&theme, &rows), Err(Error::Render(_))));
    }

    #[test]
    fn test_render_png_encodes_page() {
        let rows = rows();
        let prepared = renderer().prepare(&logo_theme(), &rows).unwrap();
        let pages = paginate(&rows, NonZeroUsize::new(2).unwrap());
        let bytes = prepared.render_png(&pages[0]).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 100));
    }
}
