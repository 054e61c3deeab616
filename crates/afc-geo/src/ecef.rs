//! WGS84 earth-centred earth-fixed conversions and pointing vectors.

use nalgebra::Vector3;

/// WGS84 semi-major axis, metres.
pub const WGS84_A: f64 = 6378137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257223563;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Geodetic (lat deg, lon deg, height m) to ECEF metres.
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, height_m: f64) -> Vector3<f64> {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let (slat, clat) = lat.sin_cos();
    let (slon, clon) = lon.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * slat * slat).sqrt();
    Vector3::new(
        (n + height_m) * clat * clon,
        (n + height_m) * clat * slon,
        (n * (1.0 - WGS84_E2) + height_m) * slat,
    )
}

/// ECEF metres to geodetic (lat deg, lon deg, height m).
///
/// Iterative latitude refinement; converges well below 1 mm for
/// |lat| < 89.9 degrees.
pub fn ecef_to_geodetic(p: Vector3<f64>) -> (f64, f64, f64) {
    let lon = p.y.atan2(p.x);
    let rho = (p.x * p.x + p.y * p.y).sqrt();

    let mut lat = p.z.atan2(rho * (1.0 - WGS84_E2));
    let mut n = WGS84_A;
    for _ in 0..8 {
        let slat = lat.sin();
        n = WGS84_A / (1.0 - WGS84_E2 * slat * slat).sqrt();
        let next = (p.z + WGS84_E2 * n * slat).atan2(rho);
        if (next - lat).abs() < 1.0e-14 {
            lat = next;
            break;
        }
        lat = next;
    }
    let slat = lat.sin();
    n = WGS84_A / (1.0 - WGS84_E2 * slat * slat).sqrt();
    let height = if lat.cos().abs() > 1.0e-8 {
        rho / lat.cos() - n
    } else {
        p.z.abs() - n * (1.0 - WGS84_E2)
    };

    (lat.to_degrees(), lon.to_degrees(), height)
}

/// Position on the unit sphere for (lat deg, lon deg). Used by the exact
/// great-circle sampler, where ellipsoidal height is irrelevant.
pub fn unit_sphere_position(lat_deg: f64, lon_deg: f64) -> Vector3<f64> {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Antenna pointing vector from an ECEF position and (azimuth, elevation)
/// in degrees. Azimuth is clockwise from true north, elevation up from the
/// local horizontal.
pub fn pointing_vector(position: Vector3<f64>, azimuth_deg: f64, elevation_deg: f64) -> Vector3<f64> {
    let up = position.normalize();
    let z = Vector3::new(0.0, 0.0, 1.0);
    let east = z.cross(&up).normalize();
    let north = up.cross(&east);

    let (sa, ca) = azimuth_deg.to_radians().sin_cos();
    let (se, ce) = elevation_deg.to_radians().sin_cos();

    north * ca * ce + east * sa * ce + up * se
}

/// Angle between two vectors, degrees.
pub fn angle_between_deg(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let d = (a.dot(b) / (a.norm() * b.norm())).clamp(-1.0, 1.0);
    d.acos().to_degrees()
}
