use std::path::Path;

use rusttype::{point, Font, PositionedGlyph, Scale};
use unicode_normalization::UnicodeNormalization as _;

use crate::configuration::FontPaths;
use crate::error::{ContextError, ErrorKind};

/// The fonts the reports are laid out and rasterized with, one for the regular text
/// and one for the bold text.
#[derive(Clone)]
pub struct FontSet {
    regular_font: Font<'static>,
    bold_font: Font<'static>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FontSet")
            .field("regular_glyphs", &self.regular_font.glyph_count())
            .field("bold_glyphs", &self.bold_font.glyph_count())
            .finish()
    }
}

impl FontSet {
    /// Load the DejaVu Sans fonts embedded in the binary.
    pub fn embedded() -> Result<Self, ContextError> {
        let regular_font = Font::try_from_bytes(include_bytes!("../fonts/DejaVuSans.ttf") as &[u8])
            .ok_or(missing_font("Unable to load the embedded regular font"))?;
        let bold_font =
            Font::try_from_bytes(include_bytes!("../fonts/DejaVuSans-Bold.ttf") as &[u8])
                .ok_or(missing_font("Unable to load the embedded bold font"))?;

        Ok(FontSet {
            regular_font,
            bold_font,
        })
    }

    /// Load the fonts from the given TTF files.
    pub fn from_paths(font_paths: &FontPaths) -> Result<Self, ContextError> {
        Ok(FontSet {
            regular_font: load_font(&font_paths.regular_font_path)?,
            bold_font: load_font(&font_paths.bold_font_path)?,
        })
    }

    /// Load the configured fonts, or the embedded ones when none are configured.
    pub fn from_configuration(font_paths: Option<&FontPaths>) -> Result<Self, ContextError> {
        match font_paths {
            Some(font_paths) => FontSet::from_paths(font_paths),
            None => FontSet::embedded(),
        }
    }

    pub fn font(&self, bold: bool) -> &Font<'static> {
        if bold {
            &self.bold_font
        } else {
            &self.regular_font
        }
    }

    /// The distance between the top of a line box and the baseline, for text of the given size.
    pub fn ascent(&self, font_size: f32, bold: bool) -> f32 {
        self.font(bold).v_metrics(Scale::uniform(font_size)).ascent
    }

    /// The advance width of the text, kerning included.
    pub fn text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let font = self.font(bold);
        let scale = Scale::uniform(font_size);
        let mut width = 0.0;
        let mut last_glyph_id = None;

        for character in text.nfc() {
            let glyph = font.glyph(character);
            if let Some(id) = last_glyph_id.take() {
                width += font.pair_kerning(scale, id, glyph.id());
            }
            last_glyph_id = Some(glyph.id());
            width += glyph.scaled(scale).h_metrics().advance_width;
        }

        width
    }

    /// Position the glyphs of the text with its baseline starting at the given point.
    pub fn positioned_glyphs(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        origin: (f32, f32),
    ) -> Vec<PositionedGlyph<'static>> {
        let font = self.font(bold);
        let scale = Scale::uniform(font_size);
        let mut caret = point(origin.0, origin.1);
        let mut last_glyph_id = None;
        let mut positioned_glyphs = Vec::new();

        for character in text.nfc() {
            let base_glyph = font.glyph(character);
            if base_glyph.id().0 == 0 && !character.is_whitespace() {
                log::warn!("Unable to find the character {:?} in the font", character)
            }
            if let Some(id) = last_glyph_id.take() {
                caret.x += font.pair_kerning(scale, id, base_glyph.id());
            }
            last_glyph_id = Some(base_glyph.id());
            let glyph = base_glyph.scaled(scale).positioned(caret);
            caret.x += glyph.unpositioned().h_metrics().advance_width;
            positioned_glyphs.push(glyph);
        }

        positioned_glyphs
    }
}

fn missing_font(context: &str) -> ContextError {
    ContextError::with_context(context).of_kind(ErrorKind::MissingRenderingCapability)
}

fn load_font(font_path: &Path) -> Result<Font<'static>, ContextError> {
    let font_bytes = std::fs::read(font_path).map_err(|error| {
        ContextError::with_error(format!("Unable to read the font {:?}", font_path), &error)
            .of_kind(ErrorKind::MissingRenderingCapability)
    })?;
    Font::try_from_vec(font_bytes).ok_or(missing_font(&format!(
        "Unable to parse the font {:?}",
        font_path
    )))
}
