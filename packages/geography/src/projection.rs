//! Geographic (EPSG:4326) to Web Mercator (EPSG:3857) projection.
//!
//! The transform is delegated to [`proj4rs`]. Web Mercator treats WGS84
//! latitude/longitude as if they were on a sphere of radius 6 378 137 m,
//! so both ends are declared on that sphere; this keeps `proj4rs` from
//! applying an ellipsoid-to-sphere datum shift.

use geo::Point;
use proj4rs::proj::Proj;

const GEOGRAPHIC: &str = "+proj=longlat +a=6378137 +b=6378137 +no_defs";

const WEB_MERCATOR: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 \
                            +x_0=0 +y_0=0 +k=1 +units=m +no_defs";

/// Errors from building or applying a projection.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// A projection definition was rejected.
    #[error("invalid projection definition '{definition}': {message}")]
    Definition { definition: String, message: String },

    /// The point could not be transformed (e.g. a pole in Mercator).
    #[error("failed to project ({x}, {y}): {message}")]
    Transform { x: f64, y: f64, message: String },
}

/// A reusable EPSG:4326 ⇄ EPSG:3857 transformer.
pub struct WebMercator {
    geographic: Proj,
    mercator: Proj,
}

impl std::fmt::Debug for WebMercator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebMercator").finish_non_exhaustive()
    }
}

impl WebMercator {
    /// Builds the transformer.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Definition`] if `proj4rs` rejects either
    /// projection string.
    pub fn new() -> Result<Self, ProjectionError> {
        Ok(Self {
            geographic: parse_definition(GEOGRAPHIC)?,
            mercator: parse_definition(WEB_MERCATOR)?,
        })
    }

    /// Projects decimal degrees into easting/northing meters, rounded to
    /// two decimals. The returned point has `x = easting`, `y = northing`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Transform`] if the point cannot be
    /// projected.
    pub fn project(&self, latitude: f64, longitude: f64) -> Result<Point<f64>, ProjectionError> {
        let mut point = (longitude.to_radians(), latitude.to_radians(), 0.0);
        proj4rs::transform::transform(&self.geographic, &self.mercator, &mut point).map_err(
            |e| ProjectionError::Transform {
                x: longitude,
                y: latitude,
                message: format!("{e:?}"),
            },
        )?;

        Ok(Point::new(round_cm(point.0), round_cm(point.1)))
    }

    /// Inverse of [`Self::project`]: returns `(latitude, longitude)` in
    /// decimal degrees.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Transform`] if the point cannot be
    /// unprojected.
    pub fn unproject(&self, point: Point<f64>) -> Result<(f64, f64), ProjectionError> {
        let mut coords = (point.x(), point.y(), 0.0);
        proj4rs::transform::transform(&self.mercator, &self.geographic, &mut coords).map_err(
            |e| ProjectionError::Transform {
                x: point.x(),
                y: point.y(),
                message: format!("{e:?}"),
            },
        )?;

        Ok((coords.1.to_degrees(), coords.0.to_degrees()))
    }
}

fn parse_definition(definition: &str) -> Result<Proj, ProjectionError> {
    Proj::from_proj_string(definition).map_err(|e| ProjectionError::Definition {
        definition: definition.to_string(),
        message: format!("{e:?}"),
    })
}

fn round_cm(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_moscow_center() {
        let mercator = WebMercator::new().unwrap();
        let point = mercator.project(55.75, 37.62).unwrap();
        assert!((point.x() - 4_187_839.24).abs() < 0.05, "easting {}", point.x());
        assert!((point.y() - 7_508_807.85).abs() < 0.05, "northing {}", point.y());
    }

    #[test]
    fn projection_is_deterministic() {
        let mercator = WebMercator::new().unwrap();
        let a = mercator.project(55.75, 37.62).unwrap();
        let b = WebMercator::new().unwrap().project(55.75, 37.62).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn origin_maps_to_origin() {
        let point = WebMercator::new().unwrap().project(0.0, 0.0).unwrap();
        assert!(point.x().abs() < 0.01);
        assert!(point.y().abs() < 0.01);
    }

    #[test]
    fn round_trips_through_inverse() {
        let mercator = WebMercator::new().unwrap();
        for (lat, lon) in [(55.75, 37.62), (59.9386, 30.3141), (43.1155, 131.8855)] {
            let projected = mercator.project(lat, lon).unwrap();
            let (back_lat, back_lon) = mercator.unproject(projected).unwrap();
            assert!((back_lat - lat).abs() < 1e-6, "{lat} -> {back_lat}");
            assert!((back_lon - lon).abs() < 1e-6, "{lon} -> {back_lon}");
        }
    }

    #[test]
    fn rounds_to_centimeters() {
        let point = WebMercator::new().unwrap().project(55.123_456, 37.654_321).unwrap();
        assert!(((point.x() * 100.0).round() - point.x() * 100.0).abs() < 1e-6);
        assert!(((point.y() * 100.0).round() - point.y() * 100.0).abs() < 1e-6);
    }
}
