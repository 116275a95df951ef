// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Point;

/// Projection flattens lat-lon positions into a local euclidean frame,
/// where [KDTree](crate::KDTree) searches are meaningful.
///
/// Implemented for any `Fn(lon, lat) -> Point` closure.
pub trait Projection {
    fn project(&self, lon: f64, lat: f64) -> Point;
}

impl<F: Fn(f64, f64) -> Point> Projection for F {
    #[inline]
    fn project(&self, lon: f64, lat: f64) -> Point {
        self(lon, lat)
    }
}

/// [Transverse Mercator projection](https://en.wikipedia.org/wiki/Transverse_Mercator_projection)
/// centered at a specific position. Distortion grows with the distance from the center,
/// which is negligible at the scale of a single city.
///
/// Coordinates of the projected points are expressed in Earth radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub center_lat: f64,
    pub center_lon: f64,

    /// Scale factor at the center. UTM uses 0.9996, but for local maps 1 works better.
    pub k0: f64,
}

impl TransverseMercator {
    /// Projection centered on Berkeley, California.
    pub const BERKELEY: Self = Self::centered_on(
        (37.892195547244356 + 37.82280243352756) / 2.0,
        (-122.2998046875 + -122.2119140625) / 2.0,
    );

    pub const fn centered_on(lat: f64, lon: f64) -> Self {
        Self {
            center_lat: lat,
            center_lon: lon,
            k0: 1.0,
        }
    }

    /// Creates a projection centered on the middle of the bounding box of
    /// the provided `(lat, lon)` positions. Returns `None` if there are no positions.
    pub fn centered_on_bbox<I: IntoIterator<Item = (f64, f64)>>(positions: I) -> Option<Self> {
        let mut bbox: Option<[f64; 4]> = None;
        for (lat, lon) in positions {
            let [min_lat, min_lon, max_lat, max_lon] =
                bbox.get_or_insert([lat, lon, lat, lon]);
            *min_lat = min_lat.min(lat);
            *min_lon = min_lon.min(lon);
            *max_lat = max_lat.max(lat);
            *max_lon = max_lon.max(lon);
        }

        bbox.map(|[min_lat, min_lon, max_lat, max_lon]| {
            Self::centered_on((min_lat + max_lat) * 0.5, (min_lon + max_lon) * 0.5)
        })
    }
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self::BERKELEY
    }
}

impl Projection for TransverseMercator {
    fn project(&self, lon: f64, lat: f64) -> Point {
        let dlon = (lon - self.center_lon).to_radians();
        let phi = lat.to_radians();

        let b = dlon.sin() * phi.cos();
        let x = (self.k0 * 0.5) * ((1.0 + b) / (1.0 - b)).ln();

        let con = (phi.tan() / dlon.cos()).atan();
        let y = self.k0 * (con - self.center_lat.to_radians());

        Point::new(x, y)
    }
}
