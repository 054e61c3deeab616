//! Raster and vector source interfaces plus in-memory implementations.

use crate::TerrainError;

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat < self.max_lat && lon >= self.min_lon && lon < self.max_lon
    }
}

/// Outcome of sampling a raster band at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterSample {
    Value(f64),
    /// Inside coverage but the cell holds the NoData sentinel.
    NoData,
    /// The point is outside this tile's bounding box.
    OutOfCoverage,
}

impl RasterSample {
    pub fn value(self) -> Option<f64> {
        match self {
            RasterSample::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// A georeferenced multi-band raster tile. Implementations are shared
/// immutable and must be safe for concurrent reads.
pub trait RasterSource: Send + Sync {
    fn bounds(&self) -> GeoBounds;
    fn band_count(&self) -> usize;
    fn sample(&self, lat: f64, lon: f64, band: usize) -> RasterSample;
}

/// A polygon overlay carrying one height value per polygon. Used for 2D
/// and 3D building footprints.
pub trait VectorSource: Send + Sync {
    /// Height attribute of the first polygon containing the point.
    fn height_at(&self, lat: f64, lon: f64) -> Option<f64>;
}

/// Row-major in-memory raster tile.
pub struct InMemoryRaster {
    bounds: GeoBounds,
    rows: usize,
    cols: usize,
    bands: usize,
    /// Band-interleaved by pixel: `data[(row * cols + col) * bands + band]`.
    data: Vec<f64>,
    no_data: Option<f64>,
}

impl InMemoryRaster {
    pub fn new(
        bounds: GeoBounds,
        rows: usize,
        cols: usize,
        bands: usize,
        data: Vec<f64>,
        no_data: Option<f64>,
    ) -> Result<Self, TerrainError> {
        if data.len() != rows * cols * bands {
            return Err(TerrainError::Geometry(format!(
                "expected {} samples, got {}",
                rows * cols * bands,
                data.len()
            )));
        }
        Ok(Self {
            bounds,
            rows,
            cols,
            bands,
            data,
            no_data,
        })
    }

    /// Single-band tile filled with one constant. Handy for synthetic
    /// flat-earth worlds.
    pub fn flat(bounds: GeoBounds, rows: usize, cols: usize, height: f64) -> Self {
        Self {
            bounds,
            rows,
            cols,
            bands: 1,
            data: vec![height; rows * cols],
            no_data: None,
        }
    }
}

impl RasterSource for InMemoryRaster {
    fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    fn band_count(&self) -> usize {
        self.bands
    }

    fn sample(&self, lat: f64, lon: f64, band: usize) -> RasterSample {
        if band >= self.bands || !self.bounds.contains(lat, lon) {
            return RasterSample::OutOfCoverage;
        }
        // North-up: row 0 is max_lat.
        let fy = (self.bounds.max_lat - lat) / (self.bounds.max_lat - self.bounds.min_lat);
        let fx = (lon - self.bounds.min_lon) / (self.bounds.max_lon - self.bounds.min_lon);
        let row = ((fy * self.rows as f64) as usize).min(self.rows - 1);
        let col = ((fx * self.cols as f64) as usize).min(self.cols - 1);
        let v = self.data[(row * self.cols + col) * self.bands + band];
        match self.no_data {
            Some(nd) if v == nd => RasterSample::NoData,
            _ if v.is_nan() => RasterSample::NoData,
            _ => RasterSample::Value(v),
        }
    }
}

/// In-memory polygon overlay. Point-in-polygon is the even-odd ray cast.
pub struct InMemoryPolygons {
    /// (vertices as (lat, lon), height value) per polygon.
    polygons: Vec<(Vec<(f64, f64)>, f64)>,
}

impl InMemoryPolygons {
    pub fn new(polygons: Vec<(Vec<(f64, f64)>, f64)>) -> Self {
        Self { polygons }
    }

    fn point_in_polygon(vertices: &[(f64, f64)], lat: f64, lon: f64) -> bool {
        let mut inside = false;
        let n = vertices.len();
        let mut j = n - 1;
        for i in 0..n {
            let (yi, xi) = vertices[i];
            let (yj, xj) = vertices[j];
            if ((yi > lat) != (yj > lat))
                && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

impl VectorSource for InMemoryPolygons {
    fn height_at(&self, lat: f64, lon: f64) -> Option<f64> {
        self.polygons
            .iter()
            .find(|(verts, _)| verts.len() >= 3 && Self::point_in_polygon(verts, lat, lon))
            .map(|(_, h)| *h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> GeoBounds {
        GeoBounds {
            min_lat: 40.0,
            max_lat: 41.0,
            min_lon: -75.0,
            max_lon: -74.0,
        }
    }

    #[test]
    fn test_raster_sampling() {
        let r = InMemoryRaster::flat(bounds(), 10, 10, 25.0);
        assert_eq!(r.sample(40.5, -74.5, 0), RasterSample::Value(25.0));
        assert_eq!(r.sample(39.5, -74.5, 0), RasterSample::OutOfCoverage);
        assert_eq!(r.sample(40.5, -74.5, 1), RasterSample::OutOfCoverage);
    }

    #[test]
    fn test_raster_no_data() {
        let mut data = vec![5.0; 4];
        data[0] = -9999.0; // NW corner cell
        let r = InMemoryRaster::new(bounds(), 2, 2, 1, data, Some(-9999.0)).unwrap();
        assert_eq!(r.sample(40.9, -74.9, 0), RasterSample::NoData);
        assert_eq!(r.sample(40.1, -74.1, 0), RasterSample::Value(5.0));
    }

    #[test]
    fn test_raster_geometry_check() {
        let err = InMemoryRaster::new(bounds(), 2, 2, 1, vec![0.0; 3], None);
        assert!(err.is_err());
    }

    #[test]
    fn test_polygon_height() {
        let square = vec![
            (40.4, -74.6),
            (40.4, -74.4),
            (40.6, -74.4),
            (40.6, -74.6),
        ];
        let v = InMemoryPolygons::new(vec![(square, 55.0)]);
        assert_eq!(v.height_at(40.5, -74.5), Some(55.0));
        assert_eq!(v.height_at(40.7, -74.5), None);
    }
}
