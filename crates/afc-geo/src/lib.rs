//! Geodesy and grid-geometry utilities for AFC path analysis.
//!
//! Provides WGS84 ECEF conversions, great-circle samplers (approximate and
//! exact), antenna pointing vectors, and the integer-grid polygon
//! operations used by the RLAN uncertainty-region rasterizer.

pub mod ecef;
pub mod greatcircle;
pub mod polygon;

pub use ecef::{ecef_to_geodetic, geodetic_to_ecef, pointing_vector, unit_sphere_position};
pub use greatcircle::{haversine_km, GreatCirclePath};
pub use polygon::{rasterize_polygon, simplify_vertices, GridCell};
