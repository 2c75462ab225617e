// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Collage Core
//!
//! Data model and pure functions shared by the Collage geometry pipeline.
//!
//! ## Overview
//!
//! - **Data model**: building footprints ([`Footprint`], [`BuildingEntity`]),
//!   geographic extents ([`BBox`]) and scalar rasters ([`ScalarGrid`])
//! - **Projection**: WGS84 to a local east/north metric frame ([`CoordinateProjector`])
//! - **Color ramps**: piecewise-linear metric coloring with five built-in palettes
//!   ([`ColorRamp`], [`colorize`])
//! - **Height cascade**: fill missing building heights ([`enrich_heights`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use collage_core::{colorize, CoordinateProjector, ColorRamp, RampName};
//!
//! let projector = CoordinateProjector::new(2.35, 48.85);
//! let p = projector.project(2.351, 48.851);
//! println!("{:.1} m east, {:.1} m north", p.x, p.y);
//!
//! let ramp = ColorRamp::builtin(RampName::Viridis).with_domain(0.0, 120.0);
//! let colors = colorize(&metric_values, &ramp);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: GeoJSON-shaped (de)serialization of entities, ramps and colors

pub mod color;
pub mod error;
pub mod geo;
pub mod height;
pub mod projection;
pub mod ramp;

pub use color::Color;
pub use error::{Error, Result};
pub use geo::{
    open_ring, BBox, BuildingEntity, BuildingFeature, BuildingProperties, Footprint,
    GeoMultiPolygon, GeoPolygon, GeometryJson, HeightSource, ScalarGrid,
};
pub use height::{enrich_heights, floor_height_for, HeightStats, DEFAULT_HEIGHT_M};
pub use projection::{
    bbox_area_m2, bbox_center, bbox_size_m, degrees_to_meters, wgs84_to_local,
    CoordinateProjector, LocalPoint, EARTH_RADIUS_M,
};
pub use ramp::{
    colorize, interpolate, value_range, ColorRamp, ColorStop, MetricValues, RampDefinition,
    RampName, DEFAULT_NULL_COLOR,
};

pub use geo_types;
