// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extracted urban geometry: building footprints, bounding boxes and scalar grids.
//!
//! Coordinates are WGS84 `[longitude, latitude]`. The first ring of a polygon is
//! the outer boundary, any further rings are holes.

use crate::error::{Error, Result};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single footprint polygon with optional holes
pub type GeoPolygon = Polygon<f64>;

/// Several disjoint footprint polygons belonging to one building
pub type GeoMultiPolygon = MultiPolygon<f64>;

/// Building footprint geometry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "GeometryJson", into = "GeometryJson")
)]
pub enum Footprint {
    Polygon(GeoPolygon),
    MultiPolygon(GeoMultiPolygon),
}

impl Footprint {
    /// Build a polygon footprint from `[lng, lat]` rings (outer first, then holes)
    pub fn from_rings(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Self::Polygon(polygon_from_rings(rings))
    }

    /// All polygons making up this footprint
    pub fn polygons(&self) -> &[GeoPolygon] {
        match self {
            Self::Polygon(polygon) => std::slice::from_ref(polygon),
            Self::MultiPolygon(multi) => &multi.0,
        }
    }

    /// Outer ring of the first polygon, if there is one
    pub fn outer_ring(&self) -> Option<&LineString<f64>> {
        self.polygons().first().map(|p| p.exterior())
    }
}

/// Ring vertices without the closing coordinate that repeats the first one
#[inline]
pub fn open_ring(ring: &LineString<f64>) -> &[Coord<f64>] {
    let coords = ring.0.as_slice();
    match (coords.first(), coords.last()) {
        (Some(first), Some(last)) if coords.len() > 1 && first == last => {
            &coords[..coords.len() - 1]
        }
        _ => coords,
    }
}

fn ring_from_pairs(ring: Vec<[f64; 2]>) -> LineString<f64> {
    LineString::from(
        ring.into_iter()
            .map(|[x, y]| Coord { x, y })
            .collect::<Vec<_>>(),
    )
}

fn polygon_from_rings(rings: Vec<Vec<[f64; 2]>>) -> GeoPolygon {
    let mut rings = rings.into_iter();
    let exterior = rings.next().map(ring_from_pairs).unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.map(ring_from_pairs).collect())
}

fn polygon_to_rings(polygon: &GeoPolygon) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.0.iter().map(|c| [c.x, c.y]).collect())
        .collect()
}

/// GeoJSON geometry object as produced by the extraction layer
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "coordinates"))]
#[derive(Debug, Clone)]
pub enum GeometryJson {
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

impl From<GeometryJson> for Footprint {
    fn from(json: GeometryJson) -> Self {
        match json {
            GeometryJson::Polygon(rings) => Self::from_rings(rings),
            GeometryJson::MultiPolygon(parts) => Self::MultiPolygon(MultiPolygon(
                parts.into_iter().map(polygon_from_rings).collect(),
            )),
        }
    }
}

impl From<Footprint> for GeometryJson {
    fn from(footprint: Footprint) -> Self {
        match footprint {
            Footprint::Polygon(polygon) => Self::Polygon(polygon_to_rings(&polygon)),
            Footprint::MultiPolygon(multi) => {
                Self::MultiPolygon(multi.0.iter().map(polygon_to_rings).collect())
            }
        }
    }
}

/// Where a building's height value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum HeightSource {
    /// Explicit `height` tag
    OsmTag,
    /// Derived from `building:levels`
    OsmLevels,
    /// Sampled from a global building-height raster
    GbaRaster,
    /// Fallback assumption
    TypeDefault,
}

/// A building as delivered by the extraction layer
///
/// `id` is unique within a batch and is the join key for metric values and picking.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildingEntity {
    pub id: String,
    pub footprint: Footprint,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height_m: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub floor_count: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default, rename = "use"))]
    pub building_use: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height_source: Option<HeightSource>,
}

impl BuildingEntity {
    /// Create an entity with only geometry and an optional height
    pub fn new(id: impl Into<String>, footprint: Footprint, height_m: Option<f64>) -> Self {
        Self {
            id: id.into(),
            footprint,
            height_m,
            floor_count: None,
            building_use: None,
            height_source: None,
        }
    }

    /// Height if known and finite
    #[inline]
    pub fn known_height(&self) -> Option<f64> {
        self.height_m.filter(|h| h.is_finite())
    }
}

/// Feature properties in the extraction layer's GeoJSON output
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildingProperties {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height_m: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub floor_count: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default, rename = "use"))]
    pub building_use: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height_source: Option<HeightSource>,
}

/// GeoJSON building feature (`{ geometry, properties }`)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BuildingFeature {
    pub geometry: Footprint,
    pub properties: BuildingProperties,
}

impl From<BuildingFeature> for BuildingEntity {
    fn from(feature: BuildingFeature) -> Self {
        let BuildingProperties {
            id,
            height_m,
            floor_count,
            building_use,
            height_source,
        } = feature.properties;
        Self {
            id,
            footprint: feature.geometry,
            height_m,
            floor_count,
            building_use,
            height_source,
        }
    }
}

/// Geographic bounding box in `[west, south, east, north]` order
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "[f64; 4]", into = "[f64; 4]")
)]
pub struct BBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

impl From<[f64; 4]> for BBox {
    fn from([west, south, east, north]: [f64; 4]) -> Self {
        Self::new(west, south, east, north)
    }
}

impl From<BBox> for [f64; 4] {
    fn from(bbox: BBox) -> Self {
        bbox.to_array()
    }
}

impl TryFrom<&[f64]> for BBox {
    type Error = Error;

    fn try_from(values: &[f64]) -> Result<Self> {
        match values {
            [west, south, east, north] => Ok(Self::new(*west, *south, *east, *north)),
            _ => Err(Error::InvalidBBox(format!(
                "expected [west, south, east, north], got {} values",
                values.len()
            ))),
        }
    }
}

/// Row-major scalar field covering a geographic extent
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    width: usize,
    height: usize,
    data: Vec<f32>,
    bbox: BBox,
}

impl ScalarGrid {
    /// Wrap existing row-major data; `data.len()` must equal `width * height`
    pub fn new(width: usize, height: usize, data: Vec<f32>, bbox: BBox) -> Result<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(Error::GridSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            bbox,
        })
    }

    /// Grid with every cell set to `value`
    pub fn filled(width: usize, height: usize, value: f32, bbox: BBox) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
            bbox,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at column `x`, row `y`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Minimum and maximum over non-NaN cells
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
