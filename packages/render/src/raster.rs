//! In-process grid map renderer.

use std::io::ErrorKind;
use std::path::Path;

use geo::Point;
use image::{ImageError, Rgba, RgbaImage, imageops};

use crate::{MapRenderer, RenderError, RenderRequest};

const BACKGROUND: Rgba<u8> = Rgba([242, 239, 233, 255]);
const GRID: Rgba<u8> = Rgba([214, 208, 196, 255]);
const BORDER: Rgba<u8> = Rgba([120, 120, 120, 255]);

/// Spacing of the grid lines in projected meters.
pub const GRID_STEP_M: f64 = 500.0;

/// Marker drawn when the configured icon does not exist.
pub const EMBEDDED_MARKER: &[u8] = include_bytes!("../resources/marker-icon.png");

/// Draws a background with a metric grid and the marker icon, with the
/// icon's bottom-center tip on the location.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterRenderer;

impl RasterRenderer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MapRenderer for RasterRenderer {
    #[allow(clippy::cast_possible_truncation)]
    fn render(&self, request: &RenderRequest<'_>) -> Result<(), RenderError> {
        request.validate()?;

        let marker = load_marker(request.marker_icon)?;

        let mut canvas = RgbaImage::from_pixel(request.width, request.height, BACKGROUND);
        draw_grid(&mut canvas, request);
        draw_border(&mut canvas);

        let (px, py) = request.to_pixel(request.center);
        let x = px.round() as i64 - i64::from(marker.width() / 2);
        let y = py.round() as i64 - i64::from(marker.height());
        imageops::overlay(&mut canvas, &marker, x, y);

        canvas.save(request.output)?;

        log::debug!(
            "Rendered {}x{} map to {}",
            request.width,
            request.height,
            request.output.display()
        );

        Ok(())
    }
}

/// Reads the marker icon at `path`, or the embedded one if `path` does
/// not exist.
fn load_marker(path: &Path) -> Result<RgbaImage, RenderError> {
    let marker_error = |source| RenderError::Marker {
        path: path.to_path_buf(),
        source,
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!(
                "Marker icon {} not found, using the embedded marker",
                path.display()
            );
            return Ok(image::load_from_memory(EMBEDDED_MARKER)?.to_rgba8());
        }
        Err(e) => return Err(marker_error(ImageError::IoError(e))),
    };

    Ok(image::load_from_memory(&bytes)
        .map_err(marker_error)?
        .to_rgba8())
}

#[allow(clippy::cast_possible_truncation)]
fn draw_grid(canvas: &mut RgbaImage, request: &RenderRequest<'_>) {
    let bounds = request.viewport();
    let (width, height) = canvas.dimensions();

    let mut x = (bounds.min().x / GRID_STEP_M).ceil() * GRID_STEP_M;
    while x <= bounds.max().x {
        let (px, _) = request.to_pixel(Point::new(x, bounds.min().y));
        if let Ok(column) = u32::try_from(px.floor() as i64) {
            for row in 0..height {
                if column < width {
                    canvas.put_pixel(column, row, GRID);
                }
            }
        }
        x += GRID_STEP_M;
    }

    let mut y = (bounds.min().y / GRID_STEP_M).ceil() * GRID_STEP_M;
    while y <= bounds.max().y {
        let (_, py) = request.to_pixel(Point::new(bounds.min().x, y));
        if let Ok(row) = u32::try_from(py.floor() as i64) {
            for column in 0..width {
                if row < height {
                    canvas.put_pixel(column, row, GRID);
                }
            }
        }
        y += GRID_STEP_M;
    }
}

fn draw_border(canvas: &mut RgbaImage) {
    let (width, height) = canvas.dimensions();
    for x in 0..width {
        canvas.put_pixel(x, 0, BORDER);
        canvas.put_pixel(x, height - 1, BORDER);
    }
    for y in 0..height {
        canvas.put_pixel(0, y, BORDER);
        canvas.put_pixel(width - 1, y, BORDER);
    }
}
