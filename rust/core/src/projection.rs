// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local tangent-plane projection
//!
//! Equirectangular approximation around a fixed origin: longitude differences are
//! scaled by `cos(origin latitude)`, latitude differences are not scaled. Good to a
//! few centimetres over the tens of km² areas extracted by the prototypes; not
//! suitable for regional or global extents.
//!
//! All functions are pure. Non-finite input propagates as NaN.

use crate::geo::BBox;
use geo_types::Coord;

/// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Point in the local metric frame: `x` east, `y` north, metres from the origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

impl LocalPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Convert degree offsets to metre offsets at a reference latitude
#[inline]
pub fn degrees_to_meters(dlng: f64, dlat: f64, ref_lat: f64) -> (f64, f64) {
    let lat_rad = ref_lat * DEG_TO_RAD;
    let dx = dlng * DEG_TO_RAD * EARTH_RADIUS_M * lat_rad.cos();
    let dy = dlat * DEG_TO_RAD * EARTH_RADIUS_M;
    (dx, dy)
}

/// Project a WGS84 coordinate into the local frame of `(origin_lng, origin_lat)`
#[inline]
pub fn wgs84_to_local(lng: f64, lat: f64, origin_lng: f64, origin_lat: f64) -> LocalPoint {
    let (dx, dy) = degrees_to_meters(lng - origin_lng, lat - origin_lat, origin_lat);
    LocalPoint::new(dx, dy)
}

/// Metric width (east-west) and height (north-south) of a bbox, linearised at its
/// mid-latitude. Signs follow the corner deltas.
#[inline]
pub fn bbox_size_m(bbox: &BBox) -> (f64, f64) {
    let mid_lat = (bbox.south + bbox.north) / 2.0;
    let (dx, _) = degrees_to_meters(bbox.east - bbox.west, 0.0, mid_lat);
    let (_, dy) = degrees_to_meters(0.0, bbox.north - bbox.south, mid_lat);
    (dx, dy)
}

/// Approximate bbox area in square metres
#[inline]
pub fn bbox_area_m2(bbox: &BBox) -> f64 {
    let (dx, dy) = bbox_size_m(bbox);
    (dx * dy).abs()
}

/// Center of a bbox as `(lng, lat)`
#[inline]
pub fn bbox_center(bbox: &BBox) -> (f64, f64) {
    ((bbox.west + bbox.east) / 2.0, (bbox.south + bbox.north) / 2.0)
}

/// Projector bound to a fixed origin
///
/// The origin cannot change after construction; moving it means building a new
/// projector and rebuilding everything that was projected with the old one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateProjector {
    origin_lng: f64,
    origin_lat: f64,
}

impl CoordinateProjector {
    pub fn new(origin_lng: f64, origin_lat: f64) -> Self {
        Self {
            origin_lng,
            origin_lat,
        }
    }

    /// Projector centered on a bbox
    pub fn centered_on(bbox: &BBox) -> Self {
        let (lng, lat) = bbox_center(bbox);
        Self::new(lng, lat)
    }

    /// Origin as `(lng, lat)`
    #[inline]
    pub fn origin(&self) -> (f64, f64) {
        (self.origin_lng, self.origin_lat)
    }

    #[inline]
    pub fn project(&self, lng: f64, lat: f64) -> LocalPoint {
        wgs84_to_local(lng, lat, self.origin_lng, self.origin_lat)
    }

    #[inline]
    pub fn project_coord(&self, coord: Coord<f64>) -> LocalPoint {
        self.project(coord.x, coord.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_origin_projects_to_zero() {
        let p = wgs84_to_local(13.4, 52.5, 13.4, 52.5);
        assert_eq!(p, LocalPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_one_degree_latitude() {
        let p = wgs84_to_local(0.0, 1.0, 0.0, 0.0);
        assert_relative_eq!(p.y, EARTH_RADIUS_M * DEG_TO_RAD, max_relative = 1e-12);
        assert_relative_eq!(p.x, 0.0);
    }

    #[test]
    fn test_x_scales_with_cos_origin_latitude() {
        let dlng = 0.01;
        let at_equator = wgs84_to_local(dlng, 0.0, 0.0, 0.0);
        let at_60 = wgs84_to_local(10.0 + dlng, 60.0, 10.0, 60.0);
        assert_relative_eq!(at_60.x / at_equator.x, 0.5, max_relative = 1e-9);
    }

    #[test]
    fn test_y_independent_of_longitude() {
        let a = wgs84_to_local(-120.0, 40.01, -120.0, 40.0);
        let b = wgs84_to_local(8.0, 40.01, 8.0, 40.0);
        assert_relative_eq!(a.y, b.y, max_relative = 1e-12);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
    }

    #[test]
    fn test_area_matches_linearised_deltas() {
        let bbox = BBox::new(2.30, 48.85, 2.32, 48.86);
        let mid = (48.85 + 48.86) / 2.0;
        let (dx, _) = degrees_to_meters(0.02, 0.0, mid);
        let (_, dy) = degrees_to_meters(0.0, 0.01, mid);
        assert_relative_eq!(bbox_area_m2(&bbox), (dx * dy).abs(), max_relative = 1e-12);
    }

    #[test]
    fn test_area_doubles_with_east_west_span() {
        let narrow = BBox::new(2.30, 48.85, 2.31, 48.86);
        let wide = BBox::new(2.30, 48.85, 2.32, 48.86);
        assert_relative_eq!(bbox_area_m2(&wide), 2.0 * bbox_area_m2(&narrow), max_relative = 1e-9);
    }

    #[test]
    fn test_inverted_bbox_area_is_positive() {
        let bbox = BBox::new(2.32, 48.86, 2.30, 48.85);
        assert!(bbox_area_m2(&bbox) > 0.0);
    }

    #[test]
    fn test_bbox_center() {
        let bbox = BBox::new(-1.0, 10.0, 3.0, 20.0);
        assert_eq!(bbox_center(&bbox), (1.0, 15.0));
        assert_eq!(CoordinateProjector::centered_on(&bbox).origin(), (1.0, 15.0));
    }

    #[test]
    fn test_nan_propagates() {
        let p = wgs84_to_local(f64::NAN, 0.0, 0.0, 0.0);
        assert!(p.x.is_nan());
        assert_eq!(p.y, 0.0);
    }
}
