#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map images for ranked locations.
//!
//! Every top location gets one square image of the area around it in Web
//! Mercator meters, with a marker icon at the location itself. The
//! drawing engine sits behind [`MapRenderer`] so the pipeline only builds
//! the [`RenderRequest`] (point, bounding box, size, marker, output path)
//! and does not care who rasterizes it:
//!
//! - [`RasterRenderer`] draws a plain grid map in-process.
//! - [`CommandRenderer`] hands the request to an external program, e.g. a
//!   wrapper around a tile server.

pub mod command;
pub mod raster;

use std::path::{Path, PathBuf};

use geo::{Point, Rect, coord};

pub use command::CommandRenderer;
pub use raster::RasterRenderer;

/// Errors that can occur while rendering one map image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The marker icon could not be loaded.
    #[error("failed to load marker icon {path}: {source}")]
    Marker {
        path: PathBuf,
        source: image::ImageError,
    },

    /// Encoding or writing the output image failed.
    #[error("failed to write map image: {0}")]
    Image(#[from] image::ImageError),

    /// The external renderer could not be started.
    #[error("failed to start renderer '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The external renderer exited unsuccessfully.
    #[error("renderer '{program}' failed with {status}")]
    Command {
        program: String,
        status: std::process::ExitStatus,
    },

    /// The request cannot be drawn.
    #[error("invalid render request: {0}")]
    InvalidRequest(String),
}

/// Everything a renderer needs to draw one map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest<'a> {
    /// Location in projected meters.
    pub center: Point<f64>,
    /// Half the side of the square viewport, in meters.
    pub half_width_m: f64,
    pub width: u32,
    pub height: u32,
    pub marker_icon: &'a Path,
    pub output: &'a Path,
}

impl RenderRequest<'_> {
    /// The square bounding box centered on [`Self::center`].
    #[must_use]
    pub fn viewport(&self) -> Rect<f64> {
        let (x, y) = self.center.x_y();
        let half = self.half_width_m;
        Rect::new(
            coord! { x: x - half, y: y - half },
            coord! { x: x + half, y: y + half },
        )
    }

    /// Pixel position of a projected point. `y` grows downwards.
    #[must_use]
    pub fn to_pixel(&self, point: Point<f64>) -> (f64, f64) {
        let bounds = self.viewport();
        let px = (point.x() - bounds.min().x) / bounds.width() * f64::from(self.width);
        let py = (bounds.max().y - point.y()) / bounds.height() * f64::from(self.height);
        (px, py)
    }

    pub(crate) fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidRequest(format!(
                "image size {}x{} is empty",
                self.width, self.height
            )));
        }
        if !self.half_width_m.is_finite() || self.half_width_m <= 0.0 {
            return Err(RenderError::InvalidRequest(format!(
                "half width {} must be a positive number of meters",
                self.half_width_m
            )));
        }
        Ok(())
    }
}

/// Draws a map for a [`RenderRequest`] into `request.output`, replacing
/// any existing file.
pub trait MapRenderer {
    /// # Errors
    ///
    /// Returns a [`RenderError`] when the image cannot be produced. A failed
    /// render only affects this one image.
    fn render(&self, request: &RenderRequest<'_>) -> Result<(), RenderError>;
}

impl<T: MapRenderer + ?Sized> MapRenderer for Box<T> {
    fn render(&self, request: &RenderRequest<'_>) -> Result<(), RenderError> {
        (**self).render(request)
    }
}

/// File name of the map for the `index`-th ranked location of `base`.
///
/// ```
/// assert_eq!(
///     loc_analyze_render::image_file_name("100", 0, 2000.0, "png"),
///     "100_0_2000.png"
/// );
/// ```
#[must_use]
pub fn image_file_name(base: &str, index: usize, half_width_m: f64, extension: &str) -> String {
    format!("{base}_{index}_{half_width_m:.0}.{extension}")
}
