use image::{Rgba, RgbaImage};

use crate::error::{ContextError, ErrorKind};
use crate::fonts::FontSet;
use crate::layout::{DrawCommand, LaidOutFragment};
use crate::stylesheet::{Color, WHITE};

/// The bitmap of a whole laid out fragment, in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub bitmap: RgbaImage,
}

/// Draws laid out fragments into bitmaps, `oversampling_factor` device pixels per CSS pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rasterizer {
    pub oversampling_factor: u32,
    /// Bitmaps larger than this on either side are refused.
    pub maximum_dimension: u32,
}

impl Rasterizer {
    pub fn new(oversampling_factor: u32, maximum_dimension: u32) -> Self {
        Rasterizer {
            oversampling_factor,
            maximum_dimension,
        }
    }

    /// The size in device pixels of a fragment of the given size in CSS pixels.
    pub fn pixel_dimensions(&self, width: f32, height: f32) -> (u32, u32) {
        let scale = self.oversampling_factor as f32;
        ((width * scale).ceil() as u32, (height * scale).ceil() as u32)
    }

    /// Rasterize the fragment on an opaque white background.
    pub fn rasterize(
        &self,
        fragment: &LaidOutFragment,
        fonts: &FontSet,
    ) -> Result<RasterImage, ContextError> {
        let measurement = &fragment.measurement;
        if self.oversampling_factor == 0 {
            return Err(ContextError::with_context("The oversampling factor must be positive")
                .of_kind(ErrorKind::RasterizationFailure));
        }
        if !(measurement.width > 0.0 && measurement.height > 0.0) {
            return Err(ContextError::with_context(format!(
                "Unable to rasterize empty content ({}x{})",
                measurement.width, measurement.height
            ))
            .of_kind(ErrorKind::RasterizationFailure));
        }
        let (pixel_width, pixel_height) = self.pixel_dimensions(measurement.width, measurement.height);
        if pixel_width > self.maximum_dimension || pixel_height > self.maximum_dimension {
            return Err(ContextError::with_context(format!(
                "The content is too large to be rasterized ({}x{} pixels, at most {} per side)",
                pixel_width, pixel_height, self.maximum_dimension
            ))
            .of_kind(ErrorKind::RasterizationFailure));
        }

        let mut canvas = Canvas {
            bitmap: RgbaImage::from_pixel(pixel_width, pixel_height, opaque(WHITE)),
            scale: self.oversampling_factor as f32,
        };
        for command in &fragment.commands {
            canvas.draw(command, fonts);
        }
        log::debug!(
            "Rasterized {} commands into {}x{} pixels",
            fragment.commands.len(),
            pixel_width,
            pixel_height
        );

        Ok(RasterImage {
            pixel_width,
            pixel_height,
            bitmap: canvas.bitmap,
        })
    }
}

fn opaque(color: Color) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}

struct Canvas {
    bitmap: RgbaImage,
    scale: f32,
}

impl Canvas {
    fn draw(&mut self, command: &DrawCommand, fonts: &FontSet) {
        match command {
            DrawCommand::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => self.fill_rect(*x, *y, *width, *height, *color),
            DrawCommand::StrokeRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                // One CSS pixel wide, the four sides drawn as thin rectangles
                self.fill_rect(*x, *y, *width, 1.0, *color);
                self.fill_rect(*x, y + height - 1.0, *width, 1.0, *color);
                self.fill_rect(*x, *y, 1.0, *height, *color);
                self.fill_rect(x + width - 1.0, *y, 1.0, *height, *color);
            }
            DrawCommand::Text {
                x,
                baseline,
                text,
                font_size,
                bold,
                color,
            } => self.draw_text(fonts, *x, *baseline, text, *font_size, *bold, *color),
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let clamp_x = |value: f32| (value * self.scale).round().clamp(0.0, self.bitmap.width() as f32) as u32;
        let clamp_y = |value: f32| (value * self.scale).round().clamp(0.0, self.bitmap.height() as f32) as u32;
        let (left, right) = (clamp_x(x), clamp_x(x + width));
        let (top, bottom) = (clamp_y(y), clamp_y(y + height));

        for pixel_y in top..bottom {
            for pixel_x in left..right {
                self.bitmap.put_pixel(pixel_x, pixel_y, opaque(color));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        fonts: &FontSet,
        x: f32,
        baseline: f32,
        text: &str,
        font_size: f32,
        bold: bool,
        color: Color,
    ) {
        let positioned_glyphs = fonts.positioned_glyphs(
            text,
            font_size * self.scale,
            bold,
            (x * self.scale, baseline * self.scale),
        );
        let (width, height) = self.bitmap.dimensions();

        for glyph in positioned_glyphs {
            if let Some(bounding_box) = glyph.pixel_bounding_box() {
                // The coverage blends the text color over what is already drawn
                glyph.draw(|glyph_x, glyph_y, coverage| {
                    let pixel_x = glyph_x as i32 + bounding_box.min.x;
                    let pixel_y = glyph_y as i32 + bounding_box.min.y;
                    if pixel_x < 0 || pixel_y < 0 || pixel_x >= width as i32 || pixel_y >= height as i32 {
                        return;
                    }
                    let pixel = self.bitmap.get_pixel_mut(pixel_x as u32, pixel_y as u32);
                    let coverage = coverage.clamp(0.0, 1.0);
                    for channel in 0..3 {
                        let background = pixel.0[channel] as f32;
                        let foreground = color[channel] as f32;
                        pixel.0[channel] =
                            (background + (foreground - background) * coverage).round() as u8;
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Measurement;

    fn fragment(width: f32, height: f32, commands: Vec<DrawCommand>) -> LaidOutFragment {
        LaidOutFragment {
            measurement: Measurement {
                width,
                height,
                row_boundaries: Vec::new(),
            },
            commands,
        }
    }

    #[test]
    fn bitmaps_are_oversampled_and_opaque() {
        let fonts = FontSet::embedded().unwrap();
        let image = Rasterizer::new(2, 60_000)
            .rasterize(&fragment(100.0, 50.5, Vec::new()), &fonts)
            .unwrap();

        assert_eq!((image.pixel_width, image.pixel_height), (200, 101));
        assert_eq!(image.bitmap.dimensions(), (200, 101));
        assert!(image.bitmap.pixels().all(|pixel| pixel.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn rectangles_and_text_are_drawn() {
        let fonts = FontSet::embedded().unwrap();
        let commands = vec![
            DrawCommand::FillRect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
                color: [255, 0, 0],
            },
            DrawCommand::Text {
                x: 20.0,
                baseline: 30.0,
                text: "Hello".into(),
                font_size: 16.0,
                bold: true,
                color: [0, 0, 0],
            },
        ];
        let image = Rasterizer::new(2, 60_000)
            .rasterize(&fragment(100.0, 40.0, commands), &fonts)
            .unwrap();

        assert_eq!(image.bitmap.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(image.bitmap.get_pixel(25, 5).0, [255, 255, 255, 255]);
        let inked = image
            .bitmap
            .pixels()
            .filter(|pixel| pixel.0[0] < 128 && pixel.0[1] < 128)
            .count();
        assert!(inked > 50);
    }

    #[test]
    fn empty_or_oversized_content_is_refused() {
        let fonts = FontSet::embedded().unwrap();
        let rasterizer = Rasterizer::new(2, 1_000);

        let empty = rasterizer.rasterize(&fragment(100.0, 0.0, Vec::new()), &fonts);
        let oversized = rasterizer.rasterize(&fragment(100.0, 600.0, Vec::new()), &fonts);

        assert_eq!(empty.unwrap_err().kind, ErrorKind::RasterizationFailure);
        assert_eq!(oversized.unwrap_err().kind, ErrorKind::RasterizationFailure);
    }
}
