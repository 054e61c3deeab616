//! Layered terrain height resolution.

use std::sync::Arc;

use tracing::debug;

use afc_core::codes::{ClutterCategory, HeightSource, TerrainClass};
use afc_core::result::TerrainHeightResult;

use crate::source::{RasterSample, RasterSource, VectorSource};

/// Resolves heights and land cover by walking the configured layers in
/// precedence order. Shared immutable; all lookups are `&self`.
pub struct TerrainResolver {
    /// 3D building footprints carrying top-of-roof AMSL heights.
    building_3d: Option<Arc<dyn VectorSource>>,
    /// LiDAR tiles: band 0 bare ground AMSL, band 1 building top AMSL.
    lidar: Vec<Arc<dyn RasterSource>>,
    /// 2D building footprints carrying height-above-ground.
    building_2d: Option<Arc<dyn VectorSource>>,
    /// DEM tiles in lookup order (e.g. 3DEP before SRTM).
    dem: Vec<(HeightSource, Arc<dyn RasterSource>)>,
    /// NLCD land-cover tiles holding class codes.
    nlcd: Vec<Arc<dyn RasterSource>>,
    /// Ground height used when nothing covers the location.
    fallback_height: f64,
}

/// Builder for [`TerrainResolver`].
#[derive(Default)]
pub struct TerrainResolverBuilder {
    building_3d: Option<Arc<dyn VectorSource>>,
    lidar: Vec<Arc<dyn RasterSource>>,
    building_2d: Option<Arc<dyn VectorSource>>,
    dem: Vec<(HeightSource, Arc<dyn RasterSource>)>,
    nlcd: Vec<Arc<dyn RasterSource>>,
    fallback_height: f64,
}

impl TerrainResolverBuilder {
    pub fn building_3d(mut self, src: Arc<dyn VectorSource>) -> Self {
        self.building_3d = Some(src);
        self
    }

    pub fn lidar(mut self, tile: Arc<dyn RasterSource>) -> Self {
        self.lidar.push(tile);
        self
    }

    pub fn building_2d(mut self, src: Arc<dyn VectorSource>) -> Self {
        self.building_2d = Some(src);
        self
    }

    pub fn dem(mut self, source: HeightSource, tile: Arc<dyn RasterSource>) -> Self {
        self.dem.push((source, tile));
        self
    }

    pub fn nlcd(mut self, tile: Arc<dyn RasterSource>) -> Self {
        self.nlcd.push(tile);
        self
    }

    pub fn fallback_height(mut self, height: f64) -> Self {
        self.fallback_height = height;
        self
    }

    pub fn build(self) -> TerrainResolver {
        TerrainResolver {
            building_3d: self.building_3d,
            lidar: self.lidar,
            building_2d: self.building_2d,
            dem: self.dem,
            nlcd: self.nlcd,
            fallback_height: self.fallback_height,
        }
    }
}

impl TerrainResolver {
    pub fn builder() -> TerrainResolverBuilder {
        TerrainResolverBuilder::default()
    }

    /// Bare-ground height from the DEM layers (or fallback), bypassing
    /// building layers.
    fn ground_height(&self, lat: f64, lon: f64) -> (f64, HeightSource) {
        for tile in &self.lidar {
            if let RasterSample::Value(v) = tile.sample(lat, lon, 0) {
                return (v, HeightSource::Lidar);
            }
        }
        for (source, tile) in &self.dem {
            if let RasterSample::Value(v) = tile.sample(lat, lon, 0) {
                return (v, *source);
            }
        }
        (self.fallback_height, HeightSource::Unknown)
    }

    /// Resolve ground and building heights at a point.
    ///
    /// Layer precedence: 3D buildings, LiDAR, 2D buildings, DEM, fallback.
    /// The first layer with a defined value wins; NoData and
    /// out-of-coverage fall through to the next layer. Never returns NaN.
    pub fn terrain_height(&self, lat: f64, lon: f64) -> TerrainHeightResult {
        // 3D building vectors carry roof AMSL; ground still comes from the
        // raster stack so the building height is the difference.
        if let Some(b3d) = &self.building_3d {
            if let Some(roof_amsl) = b3d.height_at(lat, lon) {
                let (ground, source) = self.ground_height(lat, lon);
                let bldg = (roof_amsl - ground).max(0.0);
                return TerrainHeightResult {
                    ground_height: ground,
                    building_height: Some(bldg),
                    class: TerrainClass::Building,
                    source,
                };
            }
        }

        for tile in &self.lidar {
            match tile.sample(lat, lon, 0) {
                RasterSample::Value(ground) => {
                    let building = if tile.band_count() > 1 {
                        tile.sample(lat, lon, 1).value()
                    } else {
                        None
                    };
                    return match building {
                        Some(roof_amsl) if roof_amsl > ground => TerrainHeightResult {
                            ground_height: ground,
                            building_height: Some(roof_amsl - ground),
                            class: TerrainClass::Building,
                            source: HeightSource::Lidar,
                        },
                        _ => TerrainHeightResult {
                            ground_height: ground,
                            building_height: None,
                            class: TerrainClass::Ground,
                            source: HeightSource::Lidar,
                        },
                    };
                }
                RasterSample::NoData => {
                    debug!(lat, lon, "LiDAR NoData, falling through");
                }
                RasterSample::OutOfCoverage => {}
            }
        }

        if let Some(b2d) = &self.building_2d {
            if let Some(height_agl) = b2d.height_at(lat, lon) {
                let (ground, source) = self.ground_height(lat, lon);
                return TerrainHeightResult {
                    ground_height: ground,
                    building_height: Some(height_agl),
                    class: TerrainClass::Building,
                    source,
                };
            }
        }

        for (source, tile) in &self.dem {
            match tile.sample(lat, lon, 0) {
                RasterSample::Value(ground) => {
                    return TerrainHeightResult {
                        ground_height: ground,
                        building_height: None,
                        class: TerrainClass::Ground,
                        source: *source,
                    };
                }
                RasterSample::NoData | RasterSample::OutOfCoverage => {}
            }
        }

        TerrainHeightResult {
            ground_height: self.fallback_height,
            building_height: None,
            class: TerrainClass::NoData,
            source: HeightSource::Unknown,
        }
    }

    /// NLCD clutter category at a point; open/barren where uncovered.
    pub fn clutter(&self, lat: f64, lon: f64) -> ClutterCategory {
        for tile in &self.nlcd {
            if let RasterSample::Value(code) = tile.sample(lat, lon, 0) {
                return ClutterCategory::from_nlcd(code as u8);
            }
        }
        ClutterCategory::Barren
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{GeoBounds, InMemoryPolygons, InMemoryRaster};

    fn bounds() -> GeoBounds {
        GeoBounds {
            min_lat: 40.0,
            max_lat: 41.0,
            min_lon: -75.0,
            max_lon: -74.0,
        }
    }

    fn dem(height: f64) -> Arc<InMemoryRaster> {
        Arc::new(InMemoryRaster::flat(bounds(), 4, 4, height))
    }

    #[test]
    fn test_dem_only() {
        let r = TerrainResolver::builder()
            .dem(HeightSource::ThreeDep, dem(100.0))
            .build();
        let h = r.terrain_height(40.5, -74.5);
        assert_eq!(h.ground_height, 100.0);
        assert_eq!(h.class, TerrainClass::Ground);
        assert_eq!(h.source, HeightSource::ThreeDep);
        assert!(h.building_height.is_none());
    }

    #[test]
    fn test_fallback_out_of_coverage() {
        let r = TerrainResolver::builder()
            .dem(HeightSource::ThreeDep, dem(100.0))
            .fallback_height(0.0)
            .build();
        let h = r.terrain_height(50.0, -74.5);
        assert_eq!(h.ground_height, 0.0);
        assert_eq!(h.class, TerrainClass::NoData);
        assert_eq!(h.source, HeightSource::Unknown);
        assert!(h.ground_height.is_finite());
    }

    #[test]
    fn test_lidar_building_band() {
        // Two-band tile: ground 10, roof 40 everywhere.
        let mut data = Vec::new();
        for _ in 0..16 {
            data.push(10.0);
            data.push(40.0);
        }
        let lidar =
            Arc::new(InMemoryRaster::new(bounds(), 4, 4, 2, data, Some(-9999.0)).unwrap());
        let r = TerrainResolver::builder().lidar(lidar).build();
        let h = r.terrain_height(40.5, -74.5);
        assert_eq!(h.ground_height, 10.0);
        assert_eq!(h.building_height, Some(30.0));
        assert_eq!(h.class, TerrainClass::Building);
        assert_eq!(h.source, HeightSource::Lidar);
    }

    #[test]
    fn test_lidar_nodata_falls_through_to_dem() {
        let lidar = Arc::new(
            InMemoryRaster::new(bounds(), 2, 2, 1, vec![-9999.0; 4], Some(-9999.0)).unwrap(),
        );
        let r = TerrainResolver::builder()
            .lidar(lidar)
            .dem(HeightSource::Srtm, dem(55.0))
            .build();
        let h = r.terrain_height(40.5, -74.5);
        assert_eq!(h.ground_height, 55.0);
        assert_eq!(h.source, HeightSource::Srtm);
    }

    #[test]
    fn test_building_3d_precedence() {
        let square = vec![
            (40.4, -74.6),
            (40.4, -74.4),
            (40.6, -74.4),
            (40.6, -74.6),
        ];
        // Roof at 150 m AMSL over 100 m ground.
        let b3d = Arc::new(InMemoryPolygons::new(vec![(square, 150.0)]));
        let r = TerrainResolver::builder()
            .building_3d(b3d)
            .dem(HeightSource::ThreeDep, dem(100.0))
            .build();
        let h = r.terrain_height(40.5, -74.5);
        assert_eq!(h.class, TerrainClass::Building);
        assert_eq!(h.building_height, Some(50.0));
        let outside = r.terrain_height(40.7, -74.5);
        assert_eq!(outside.class, TerrainClass::Ground);
    }

    #[test]
    fn test_clutter_lookup() {
        let nlcd = Arc::new(InMemoryRaster::flat(bounds(), 2, 2, 23.0));
        let r = TerrainResolver::builder().nlcd(nlcd).build();
        assert_eq!(r.clutter(40.5, -74.5), ClutterCategory::Urban);
        assert_eq!(r.clutter(50.0, -74.5), ClutterCategory::Barren);
    }
}
