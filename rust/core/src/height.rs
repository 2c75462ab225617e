// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building height cascade
//!
//! Fills in heights the extraction layer could not measure:
//! 1. entities whose height came from `building:levels` are re-derived with a
//!    use-specific floor height
//! 2. anything still without a finite height gets [`DEFAULT_HEIGHT_M`]

use crate::geo::{BuildingEntity, HeightSource};

/// Height assumed when nothing better is known (three storeys)
pub const DEFAULT_HEIGHT_M: f64 = 9.0;

/// Floor height used for uses without a specific entry
pub const DEFAULT_FLOOR_HEIGHT_M: f64 = 3.0;

/// Typical storey height in metres for a building use
pub fn floor_height_for(building_use: Option<&str>) -> f64 {
    match building_use.map(str::trim) {
        Some("residential" | "apartments" | "house" | "detached") => 3.0,
        Some("commercial" | "retail") => 4.0,
        Some("office") => 3.5,
        Some("industrial") => 5.0,
        Some("warehouse") => 6.0,
        _ => DEFAULT_FLOOR_HEIGHT_M,
    }
}

/// Summary of an [`enrich_heights`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeightStats {
    /// Heights re-derived from floor counts
    pub from_levels: usize,
    /// Heights set to the default
    pub defaulted: usize,
}

/// Apply the height cascade in place
pub fn enrich_heights(entities: &mut [BuildingEntity]) -> HeightStats {
    let mut stats = HeightStats::default();

    for entity in entities.iter_mut() {
        if entity.height_source == Some(HeightSource::OsmLevels) {
            if let Some(floors) = entity.floor_count.filter(|&n| n > 0) {
                let floor_height = floor_height_for(entity.building_use.as_deref());
                entity.height_m = Some(floors as f64 * floor_height);
                stats.from_levels += 1;
            }
        }

        if entity.known_height().is_none() {
            entity.height_m = Some(DEFAULT_HEIGHT_M);
            entity.height_source = Some(HeightSource::TypeDefault);
            stats.defaulted += 1;
        }
    }

    tracing::debug!(
        total = entities.len(),
        from_levels = stats.from_levels,
        defaulted = stats.defaulted,
        "height cascade applied"
    );

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Footprint;

    fn entity(id: &str, height: Option<f64>) -> BuildingEntity {
        let footprint = Footprint::from_rings(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]);
        BuildingEntity::new(id, footprint, height)
    }

    #[test]
    fn test_floor_heights() {
        assert_eq!(floor_height_for(Some("office")), 3.5);
        assert_eq!(floor_height_for(Some("retail")), 4.0);
        assert_eq!(floor_height_for(Some("warehouse")), 6.0);
        assert_eq!(floor_height_for(Some("church")), 3.0);
        assert_eq!(floor_height_for(None), 3.0);
    }

    #[test]
    fn test_levels_rederived_by_use() {
        let mut office = entity("a", Some(12.0));
        office.floor_count = Some(4);
        office.building_use = Some("office".into());
        office.height_source = Some(HeightSource::OsmLevels);

        let mut entities = vec![office];
        let stats = enrich_heights(&mut entities);
        assert_eq!(entities[0].height_m, Some(14.0));
        assert_eq!(entities[0].height_source, Some(HeightSource::OsmLevels));
        assert_eq!(stats, HeightStats { from_levels: 1, defaulted: 0 });
    }

    #[test]
    fn test_missing_and_nan_heights_default() {
        let mut entities = vec![entity("a", None), entity("b", Some(f64::NAN)), entity("c", Some(20.0))];
        let stats = enrich_heights(&mut entities);
        assert_eq!(entities[0].height_m, Some(DEFAULT_HEIGHT_M));
        assert_eq!(entities[0].height_source, Some(HeightSource::TypeDefault));
        assert_eq!(entities[1].height_m, Some(DEFAULT_HEIGHT_M));
        assert_eq!(entities[2].height_m, Some(20.0));
        assert_eq!(entities[2].height_source, None);
        assert_eq!(stats.defaulted, 2);
    }

    #[test]
    fn test_tagged_heights_untouched() {
        let mut tagged = entity("a", Some(31.5));
        tagged.height_source = Some(HeightSource::OsmTag);
        tagged.floor_count = Some(2);
        let mut entities = vec![tagged];
        enrich_heights(&mut entities);
        assert_eq!(entities[0].height_m, Some(31.5));
    }
}
