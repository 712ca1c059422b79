//! The slicing of a rasterized report into pages.
//!
//! The content is scaled so that its width fills exactly the usable width of the page,
//! then cut into horizontal bands no taller than the usable height of the page. A band
//! which does not reach the end of the content ends on the last table row boundary it
//! contains, so that no row is split across two pages unless the row itself is taller
//! than a page.

use image::imageops;
use image::RgbaImage;

use crate::configuration::PageGeometry;
use crate::layout::RowBoundary;
use crate::raster::RasterImage;

/// Tolerance in millimeters when testing whether the end of the content is reached.
pub const END_EPSILON: f32 = 0.5;
/// Boundaries closer than this to the start of a slice are not worth ending a page on.
pub const MINIMUM_SLICE_ADVANCE: f32 = 5.0;
/// A boundary must end at least this far before the bottom of the page window.
pub const BOUNDARY_WINDOW_MARGIN: f32 = 1.0;

/// A band of the content, in millimeters from the top of the content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceRange {
    pub position: f32,
    pub height: f32,
}

/// Where a band of the raster image comes from, in raster pixels, and where it lands
/// on its page, in millimeters from the top left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice {
    pub source_y_start: u32,
    pub source_height: u32,
    pub dest_x: f32,
    pub dest_y: f32,
    pub dest_width: f32,
    pub dest_height: f32,
}

/// One physical page: the band of the raster image and its placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub slice: PageSlice,
    pub image: RgbaImage,
}

/// Plan the bands of content of the given total height, all the values being in the
/// same unit. The bands are returned in increasing position and cover the content
/// exactly once.
///
/// # Arguments
///
/// * `total_height` - The height of the whole content.
/// * `row_boundaries` - The bottom edges of the table rows, in any order.
/// * `usable_height` - The height available for content on one page.
pub fn plan_slices(total_height: f32, row_boundaries: &[f32], usable_height: f32) -> Vec<SliceRange> {
    let mut slices = Vec::new();
    if !(usable_height > 0.0) || !total_height.is_finite() || !(total_height > 0.0) {
        return slices;
    }
    let mut boundaries: Vec<f32> = row_boundaries
        .iter()
        .copied()
        .filter(|boundary| boundary.is_finite() && *boundary > 0.0)
        .collect();
    boundaries.sort_by(|a, b| a.total_cmp(b));

    // Any content, however short, gets its page
    let mut position = 0.0;
    loop {
        let remaining_height = total_height - position;
        let candidate_height = usable_height.min(remaining_height);
        let is_final = candidate_height >= remaining_height;

        let mut slice_height = candidate_height;
        if !is_final {
            let last_qualifying_boundary = boundaries
                .iter()
                .copied()
                .filter(|boundary| {
                    *boundary > position + MINIMUM_SLICE_ADVANCE
                        && *boundary <= position + candidate_height - BOUNDARY_WINDOW_MARGIN
                })
                .last();
            if let Some(boundary) = last_qualifying_boundary {
                slice_height = boundary - position;
            }
        }

        slices.push(SliceRange {
            position,
            height: slice_height,
        });
        position += slice_height;
        if position >= total_height - END_EPSILON {
            break;
        }
    }

    slices
}

/// Cuts raster images into pages of a fixed geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paginator {
    pub page_geometry: PageGeometry,
    pub oversampling_factor: u32,
}

impl Paginator {
    pub fn new(page_geometry: PageGeometry, oversampling_factor: u32) -> Self {
        Paginator {
            page_geometry,
            oversampling_factor,
        }
    }

    /// The millimeters covered by one CSS pixel of content whose raster is this wide.
    pub fn units_per_pixel(&self, raster_pixel_width: u32) -> f32 {
        let css_width = raster_pixel_width as f32 / self.oversampling_factor.max(1) as f32;
        self.page_geometry.usable_width() / css_width
    }

    /// Plan the pages of the raster image, without extracting the bands.
    pub fn plan(&self, raster_image: &RasterImage, row_boundaries: &[RowBoundary]) -> Vec<PageSlice> {
        if raster_image.pixel_width == 0 || raster_image.pixel_height == 0 {
            return Vec::new();
        }
        let oversampling_factor = self.oversampling_factor.max(1) as f32;
        let units_per_pixel = self.units_per_pixel(raster_image.pixel_width);
        let total_height = raster_image.pixel_height as f32 / oversampling_factor * units_per_pixel;
        let boundaries: Vec<f32> = row_boundaries
            .iter()
            .map(|boundary| boundary.offset_from_top * units_per_pixel)
            .collect();
        // Millimeters back to raster pixels
        let to_pixels = |length: f32| length / units_per_pixel * oversampling_factor;

        let slices = plan_slices(total_height, &boundaries, self.page_geometry.usable_height());
        log::debug!(
            "Planned {} pages for {:.1}mm of content and {} row boundaries",
            slices.len(),
            total_height,
            boundaries.len()
        );

        slices
            .into_iter()
            .map(|slice| {
                let source_y_start = (to_pixels(slice.position).round() as u32)
                    .min(raster_image.pixel_height.saturating_sub(1));
                let source_y_end = (to_pixels(slice.position + slice.height).round() as u32)
                    .min(raster_image.pixel_height);
                let source_height = source_y_end.saturating_sub(source_y_start).max(1);

                PageSlice {
                    source_y_start,
                    source_height,
                    dest_x: self.page_geometry.margin_left,
                    dest_y: self.page_geometry.margin_top,
                    dest_width: self.page_geometry.usable_width(),
                    dest_height: slice.height,
                }
            })
            .collect()
    }

    /// Cut the raster image into its pages, the first band being the first page.
    pub fn paginate(&self, raster_image: &RasterImage, row_boundaries: &[RowBoundary]) -> Vec<PageImage> {
        self.plan(raster_image, row_boundaries)
            .into_iter()
            .map(|slice| {
                let image = imageops::crop_imm(
                    &raster_image.bitmap,
                    0,
                    slice.source_y_start,
                    raster_image.pixel_width,
                    slice.source_height,
                )
                .to_image();
                PageImage { slice, image }
            })
            .collect()
    }
}
