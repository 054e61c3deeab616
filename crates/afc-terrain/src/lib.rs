//! Layered terrain, building, and land-cover resolver.
//!
//! Height lookups walk a fixed layer precedence: 3D building vectors,
//! LiDAR multiband rasters, 2D building vectors, DEM rasters, then a
//! global fallback. Raster and vector decoding (GeoTIFF, Shapefile) is an
//! external concern; this crate consumes the [`RasterSource`] and
//! [`VectorSource`] traits and ships in-memory implementations for
//! synthetic worlds and tests.

pub mod resolver;
pub mod source;

pub use resolver::{TerrainResolver, TerrainResolverBuilder};
pub use source::{
    GeoBounds, InMemoryPolygons, InMemoryRaster, RasterSample, RasterSource, VectorSource,
};

use thiserror::Error;

/// Terrain layer errors.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// A raster tile declared inconsistent dimensions.
    #[error("raster geometry mismatch: {0}")]
    Geometry(String),

    /// No layer covered the location and no fallback was configured.
    #[error("no terrain coverage at ({lat}, {lon})")]
    NoCoverage { lat: f64, lon: f64 },
}

/// Result type for terrain operations.
pub type Result<T> = std::result::Result<T, TerrainError>;
