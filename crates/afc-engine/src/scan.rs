//! RLAN uncertainty-region enumeration into scan points.

use afc_core::band::AVERAGE_EARTH_RADIUS;
use afc_core::result::ScanPoint;
use afc_geo::polygon::{rasterize_polygon, simplify_vertices};
use afc_terrain::TerrainResolver;

use crate::request::{Elevation, HeightType, RequestLocation, RlanRegion};
use crate::{EngineError, Result};

/// Metres per degree of latitude on the spherical earth.
fn metres_per_deg_lat() -> f64 {
    AVERAGE_EARTH_RADIUS * std::f64::consts::PI / 180.0
}

/// Offset a centre point by east/north metres.
fn offset_latlon(center: (f64, f64), east_m: f64, north_m: f64) -> (f64, f64) {
    let lat = center.0 + north_m / metres_per_deg_lat();
    let lon = center.1 + east_m / (metres_per_deg_lat() * center.0.to_radians().cos());
    (lat, lon)
}

/// Horizontal scan positions for a region at the configured step.
///
/// The centre is always the first position; counts are deterministic in
/// the region, step, and simplification tolerance. `simplify_cells`
/// drops interior polygon vertices whose perpendicular deviation stays
/// within that many grid cells (zero keeps every vertex).
pub fn horizontal_positions(
    region: &RlanRegion,
    step_m: f64,
    simplify_cells: f64,
) -> Result<Vec<(f64, f64)>> {
    if step_m <= 0.0 {
        return Err(EngineError::InvalidConfig(
            "horizontal uncertainty step must be positive".to_string(),
        ));
    }
    match region {
        RlanRegion::Ellipse {
            center,
            major_axis_m,
            minor_axis_m,
            orientation_deg,
        } => {
            if *major_axis_m < 0.0 || *minor_axis_m < 0.0 || minor_axis_m > major_axis_m {
                return Err(EngineError::InvalidRequest(format!(
                    "invalid ellipse axes {major_axis_m} / {minor_axis_m}"
                )));
            }
            let c = (center.latitude, center.longitude);
            let mut out = vec![c];
            if *major_axis_m == 0.0 {
                return Ok(out);
            }

            // Concentric rings out to the perimeter.
            let rings = ((major_axis_m / step_m).ceil() as usize).max(1);
            // Orientation rotates the major axis clockwise from north.
            let (so, co) = orientation_deg.to_radians().sin_cos();
            for ring in 1..=rings {
                let scale = ring as f64 / rings as f64;
                let a = major_axis_m * scale;
                let b = minor_axis_m * scale;
                let n_pts = (((2.0 * std::f64::consts::PI * a) / step_m).ceil() as usize).max(6);
                for k in 0..n_pts {
                    let phi = 2.0 * std::f64::consts::PI * k as f64 / n_pts as f64;
                    // Ellipse frame: u along the major axis, v along the minor.
                    let u = a * phi.cos();
                    let v = b * phi.sin();
                    // Major axis points at `orientation` clockwise from north.
                    let north = u * co - v * so;
                    let east = u * so + v * co;
                    out.push(offset_latlon(c, east, north));
                }
            }
            Ok(out)
        }
        RlanRegion::LinearPolygon { outer_boundary } => {
            if outer_boundary.len() < 3 {
                return Err(EngineError::InvalidRequest(
                    "linearPolygon needs at least 3 vertices".to_string(),
                ));
            }
            let c = region.center();
            let mut out = vec![c];

            // Rasterize in a local grid of `step_m` cells about the centre.
            let to_cell = |p: (f64, f64)| -> (i64, i64) {
                let north = (p.0 - c.0) * metres_per_deg_lat();
                let east = (p.1 - c.1) * metres_per_deg_lat() * c.0.to_radians().cos();
                ((east / step_m).round() as i64, (north / step_m).round() as i64)
            };
            let mut vertices: Vec<(i64, i64)> = outer_boundary
                .iter()
                .map(|p| to_cell((p.latitude, p.longitude)))
                .collect();
            if simplify_cells > 0.0 {
                vertices = simplify_vertices(&vertices, simplify_cells);
            }

            for (cx, cy) in rasterize_polygon(&vertices) {
                if cx == 0 && cy == 0 {
                    continue; // centre already present
                }
                out.push(offset_latlon(c, cx as f64 * step_m, cy as f64 * step_m));
            }
            Ok(out)
        }
        RlanRegion::RadialPolygon {
            center,
            outer_boundary,
        } => {
            if outer_boundary.len() < 3 {
                return Err(EngineError::InvalidRequest(
                    "radialPolygon needs at least 3 vertices".to_string(),
                ));
            }
            // Convert to a linear polygon and recurse.
            let c = (center.latitude, center.longitude);
            let points = outer_boundary
                .iter()
                .map(|v| {
                    let (s, co) = v.angle.to_radians().sin_cos();
                    let p = offset_latlon(c, v.length * s, v.length * co);
                    crate::request::Point {
                        latitude: p.0,
                        longitude: p.1,
                    }
                })
                .collect();
            horizontal_positions(
                &RlanRegion::LinearPolygon {
                    outer_boundary: points,
                },
                step_m,
                simplify_cells,
            )
        }
    }
}

/// AGL height samples spanning the vertical uncertainty:
/// `ceil(2 * delta / step) + 1` evenly spaced values in
/// `[h - delta, h + delta]`.
pub fn vertical_heights(nominal: f64, uncertainty_m: f64, step_m: f64) -> Vec<f64> {
    if uncertainty_m <= 0.0 || step_m <= 0.0 {
        return vec![nominal];
    }
    let k = ((2.0 * uncertainty_m) / step_m).ceil() as usize + 1;
    (0..k)
        .map(|i| nominal - uncertainty_m + 2.0 * uncertainty_m * i as f64 / (k - 1) as f64)
        .collect()
}

/// Expand an RLAN location into concrete scan points with resolved
/// terrain, morphology, and clutter.
///
/// AMSL-referenced requests convert to AGL per scan position using the
/// resolved ground height; heights that land below 1 m AGL clamp there.
pub fn enumerate_scan_points(
    location: &RequestLocation,
    elevation: &Elevation,
    terrain: &TerrainResolver,
    horizontal_step_m: f64,
    height_step_m: f64,
    simplify_cells: f64,
) -> Result<Vec<ScanPoint>> {
    let positions = horizontal_positions(&location.region, horizontal_step_m, simplify_cells)?;
    let heights = vertical_heights(
        elevation.height,
        elevation.vertical_uncertainty_m,
        height_step_m,
    );

    let mut out = Vec::with_capacity(positions.len() * heights.len());
    for (lat, lon) in positions {
        let th = terrain.terrain_height(lat, lon);
        let clutter = terrain.clutter(lat, lon);
        for &h in &heights {
            let agl = match elevation.height_type {
                HeightType::Agl => h,
                HeightType::Amsl => h - th.ground_height,
            }
            .max(1.0);
            out.push(ScanPoint {
                latitude_deg: lat,
                longitude_deg: lon,
                height_agl: agl,
                height_amsl: th.ground_height + agl,
                morphology: clutter.morphology(),
                clutter,
            });
        }
    }
    Ok(out)
}
