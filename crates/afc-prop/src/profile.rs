//! Building-aware elevation profile construction with per-analysis caching.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::trace;

use afc_core::codes::TerrainClass;
use afc_core::result::ElevationProfile;
use afc_geo::greatcircle::GreatCirclePath;
use afc_terrain::TerrainResolver;

use crate::{PropError, Result};

/// Outward scan step when removing endpoint buildings, metres.
const BLDG_DIST_RES_M: f64 = 1.0;
/// Scan cap, metres.
const MAX_BLDG_SCAN_M: usize = 100;

/// Builds ground (or ground+building) profiles along exact great-circle
/// arcs.
pub struct ElevationProfileBuilder<'a> {
    terrain: &'a TerrainResolver,
}

impl<'a> ElevationProfileBuilder<'a> {
    pub fn new(terrain: &'a TerrainResolver) -> Self {
        Self { terrain }
    }

    /// Sample the path from `from` to `to` with `numpts` uniform samples.
    ///
    /// With `include_building`, building heights are folded into every
    /// sample except a leading/trailing window around an endpoint that
    /// itself sits inside a building: the builder walks outward in 1 m
    /// steps (up to 100 m or the path end) to find where the endpoint
    /// building ends, and leaves those samples at bare ground.
    pub fn build(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        numpts: usize,
        include_building: bool,
    ) -> Result<ElevationProfile> {
        if numpts < 2 {
            return Err(PropError::ProfileUndefined(format!(
                "need at least 2 samples, got {numpts}"
            )));
        }

        let path = GreatCirclePath::exact(from, to, numpts);
        let path_m = path.length_km * 1000.0;
        if !(path_m > 0.0) {
            return Err(PropError::ProfileUndefined(
                "degenerate zero-length path".to_string(),
            ));
        }
        let dx = path_m / (numpts - 1) as f64;

        let max_step = MAX_BLDG_SCAN_M.min((path_m / BLDG_DIST_RES_M).floor() as usize);

        let (lead, trail) = if include_building {
            (
                self.endpoint_building_window(&path, dx, numpts, max_step, false),
                self.endpoint_building_window(&path, dx, numpts, max_step, true),
            )
        } else {
            (0, 0)
        };

        let mut heights = Vec::with_capacity(numpts);
        for (i, &(lat, lon)) in path.points.iter().enumerate() {
            let th = self.terrain.terrain_height(lat, lon);
            let in_window = i >= lead && i + trail <= numpts - 1;
            let h = match (include_building, th.class, th.building_height) {
                (true, TerrainClass::Building, Some(b)) if in_window => th.ground_height + b,
                _ => th.ground_height,
            };
            heights.push(h);
        }

        trace!(numpts, dx, lead, trail, "built elevation profile");

        Ok(ElevationProfile {
            dx_metres: dx,
            heights,
            building_window: (lead, trail),
        })
    }

    /// Number of samples at one path end covered by that endpoint's
    /// building. Zero when the endpoint is not inside a building.
    fn endpoint_building_window(
        &self,
        path: &GreatCirclePath,
        dx: f64,
        numpts: usize,
        max_step: usize,
        from_rx_end: bool,
    ) -> usize {
        let path_m = dx * (numpts - 1) as f64;
        let endpoint = if from_rx_end {
            path.points[numpts - 1]
        } else {
            path.points[0]
        };

        let at_end = self.terrain.terrain_height(endpoint.0, endpoint.1);
        if at_end.class != TerrainClass::Building {
            return 0;
        }

        for step in 1..max_step {
            let dist = step as f64 * BLDG_DIST_RES_M;
            let pt_idx = if from_rx_end {
                (path_m - dist) / dx
            } else {
                dist / dx
            };
            let n0 = (pt_idx.floor() as usize).min(numpts - 2);
            let n1 = n0 + 1;
            let f = pt_idx - n0 as f64;
            let lat = path.points[n0].0 * (1.0 - f) + path.points[n1].0 * f;
            let lon = path.points[n0].1 * (1.0 - f) + path.points[n1].1 * f;

            let th = self.terrain.terrain_height(lat, lon);
            if th.class != TerrainClass::Building {
                return if from_rx_end { numpts - n1 } else { n1 };
            }
        }

        (max_step as f64 * BLDG_DIST_RES_M / dx).floor() as usize
    }
}

/// Key for one cached profile: endpoints quantized to 1e-7 degrees, the
/// sample count, and the building flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ProfileKey {
    from: (i64, i64),
    to: (i64, i64),
    numpts: usize,
    include_building: bool,
}

impl ProfileKey {
    fn new(from: (f64, f64), to: (f64, f64), numpts: usize, include_building: bool) -> Self {
        let q = |v: f64| (v * 1.0e7).round() as i64;
        Self {
            from: (q(from.0), q(from.1)),
            to: (q(to.0), q(to.1)),
            numpts,
            include_building,
        }
    }
}

/// Per-analysis profile cache, safe for concurrent readers. A profile is
/// built at most once per key; racing builders are benign (last write
/// wins with an identical value).
pub struct ProfileCache {
    map: RwLock<HashMap<ProfileKey, Arc<ElevationProfile>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_build(
        &self,
        builder: &ElevationProfileBuilder<'_>,
        from: (f64, f64),
        to: (f64, f64),
        numpts: usize,
        include_building: bool,
    ) -> Result<Arc<ElevationProfile>> {
        let key = ProfileKey::new(from, to, numpts, include_building);

        if let Some(hit) = self.map.read().expect("profile cache poisoned").get(&key) {
            return Ok(Arc::clone(hit));
        }

        let profile = Arc::new(builder.build(from, to, numpts, include_building)?);
        self.map
            .write()
            .expect("profile cache poisoned")
            .insert(key, Arc::clone(&profile));
        Ok(profile)
    }

    pub fn len(&self) -> usize {
        self.map.read().expect("profile cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afc_core::codes::HeightSource;
    use afc_terrain::{GeoBounds, InMemoryPolygons, InMemoryRaster};
    use approx::assert_abs_diff_eq;
    use std::sync::Arc as StdArc;

    fn bounds() -> GeoBounds {
        GeoBounds {
            min_lat: 39.0,
            max_lat: 42.0,
            min_lon: -76.0,
            max_lon: -72.0,
        }
    }

    fn flat_world(height: f64) -> TerrainResolver {
        TerrainResolver::builder()
            .dem(
                HeightSource::ThreeDep,
                StdArc::new(InMemoryRaster::flat(bounds(), 32, 32, height)),
            )
            .build()
    }

    #[test]
    fn test_flat_profile() {
        let terrain = flat_world(12.0);
        let b = ElevationProfileBuilder::new(&terrain);
        let p = b.build((40.0, -74.0), (40.1, -74.0), 51, false).unwrap();
        assert_eq!(p.heights.len(), 51);
        assert!(p.heights.iter().all(|&h| h == 12.0));
        // ~11.1 km path, 50 intervals.
        assert_abs_diff_eq!(p.dx_metres, p.path_length_m() / 50.0, epsilon = 1e-9);
        assert!(p.path_length_m() > 11_000.0 && p.path_length_m() < 11_300.0);
    }

    #[test]
    fn test_degenerate_path_rejected() {
        let terrain = flat_world(0.0);
        let b = ElevationProfileBuilder::new(&terrain);
        assert!(b.build((40.0, -74.0), (40.0, -74.0), 11, false).is_err());
        assert!(b.build((40.0, -74.0), (40.1, -74.0), 1, false).is_err());
    }

    #[test]
    fn test_endpoint_building_removed() {
        // A ~60 m-deep building at the TX endpoint, 25 m tall over 10 m
        // ground. Path heads due north for ~1.1 km.
        let building = vec![
            (39.9995, -74.0005),
            (39.9995, -73.9995),
            (40.0005, -73.9995),
            (40.0005, -74.0005),
        ];
        let terrain = TerrainResolver::builder()
            .building_2d(StdArc::new(InMemoryPolygons::new(vec![(building, 25.0)])))
            .dem(
                HeightSource::ThreeDep,
                StdArc::new(InMemoryRaster::flat(bounds(), 32, 32, 10.0)),
            )
            .build();
        let b = ElevationProfileBuilder::new(&terrain);
        let p = b.build((40.0, -74.0), (40.01, -74.0), 112, true).unwrap();

        // Leading samples stay at bare ground even though the resolver
        // reports a building there.
        let (lead, trail) = p.building_window;
        assert!(lead > 0, "TX endpoint building must be excluded");
        assert_eq!(trail, 0);
        for i in 0..lead {
            assert_eq!(p.heights[i], 10.0);
        }

        // Without building inclusion everything is ground.
        let bare = b.build((40.0, -74.0), (40.01, -74.0), 112, false).unwrap();
        assert!(bare.heights.iter().all(|&h| h == 10.0));
    }

    #[test]
    fn test_mid_path_building_included() {
        // Building mid-path, endpoints clear: heights include the roof.
        let building = vec![
            (40.0045, -74.0005),
            (40.0045, -73.9995),
            (40.0055, -73.9995),
            (40.0055, -74.0005),
        ];
        let terrain = TerrainResolver::builder()
            .building_2d(StdArc::new(InMemoryPolygons::new(vec![(building, 30.0)])))
            .dem(
                HeightSource::ThreeDep,
                StdArc::new(InMemoryRaster::flat(bounds(), 32, 32, 5.0)),
            )
            .build();
        let b = ElevationProfileBuilder::new(&terrain);
        let p = b.build((40.0, -74.0), (40.01, -74.0), 112, true).unwrap();
        assert_eq!(p.building_window, (0, 0));
        assert!(p.heights.iter().any(|&h| h == 35.0));
    }

    #[test]
    fn test_cache_single_build() {
        let terrain = flat_world(3.0);
        let builder = ElevationProfileBuilder::new(&terrain);
        let cache = ProfileCache::new();
        let a = cache
            .get_or_build(&builder, (40.0, -74.0), (40.1, -74.0), 21, false)
            .unwrap();
        let b = cache
            .get_or_build(&builder, (40.0, -74.0), (40.1, -74.0), 21, false)
            .unwrap();
        assert!(StdArc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        cache
            .get_or_build(&builder, (40.0, -74.0), (40.1, -74.0), 21, true)
            .unwrap();
        assert_eq!(cache.len(), 2);
    }
}
