//! Great-circle sampling between geographic points.
//!
//! Two constructors: an approximate small-arc form that interpolates
//! latitude/longitude linearly, and an exact form that rotates through the
//! plane spanned by the endpoint unit vectors. The exact form is required
//! for any path of a kilometre or more.

use nalgebra::Vector3;

use afc_core::band::AVERAGE_EARTH_RADIUS;

use crate::ecef::unit_sphere_position;

/// Haversine distance in km over the average earth radius.
pub fn haversine_km(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> f64 {
    let lat1 = lat1_deg.to_radians();
    let lat2 = lat2_deg.to_radians();
    let slat = ((lat2 - lat1) / 2.0).sin();
    let slon = ((lon2_deg - lon1_deg).to_radians() / 2.0).sin();
    2.0 * AVERAGE_EARTH_RADIUS
        * (slat * slat + lat1.cos() * lat2.cos() * slon * slon).sqrt().asin()
        * 1.0e-3
}

/// A sampled great-circle path.
#[derive(Debug, Clone, PartialEq)]
pub struct GreatCirclePath {
    /// (lat deg, lon deg) samples, endpoints included.
    pub points: Vec<(f64, f64)>,
    /// Total path length, km.
    pub length_km: f64,
}

impl GreatCirclePath {
    /// Linear lat/lon interpolation with haversine distance.
    ///
    /// Only valid for short arcs (about 10 km or less); longer paths must
    /// use [`GreatCirclePath::exact`].
    pub fn approximate(from: (f64, f64), to: (f64, f64), numpts: usize) -> Self {
        assert!(numpts >= 2, "a path needs at least two samples");
        let dlat = to.0 - from.0;
        let dlon = to.1 - from.1;

        let mut points = Vec::with_capacity(numpts);
        points.push(from);
        for i in 1..numpts {
            let frac = i as f64 / (numpts - 1) as f64;
            points.push((from.0 + dlat * frac, from.1 + dlon * frac));
        }

        let length_km = haversine_km(from.0, from.1, to.0, to.1);
        Self { points, length_km }
    }

    /// Exact sampling by rotation in the plane of the endpoint unit
    /// vectors: the basis vector `u` bisects the endpoints, so sample `i`
    /// sits at angle `theta_i = gc * (2i - (N-1)) / (2(N-1))` from the
    /// midpoint.
    pub fn exact(from: (f64, f64), to: (f64, f64), numpts: usize) -> Self {
        assert!(numpts >= 2, "a path needs at least two samples");

        let length_km = haversine_km(from.0, from.1, to.0, to.1);

        let p1 = unit_sphere_position(from.0, from.1);
        let p2 = unit_sphere_position(to.0, to.1);

        let dot = p1.dot(&p2).clamp(-1.0, 1.0);
        let gc_angle = dot.acos();

        let u = (p1 + p2).normalize();
        let w = p1.cross(&p2).normalize();
        let v = w.cross(&u);

        let mut points = Vec::with_capacity(numpts);
        for i in 0..numpts {
            let theta = gc_angle * (2 * i as i64 - (numpts as i64 - 1)) as f64
                / (2 * (numpts as i64 - 1)) as f64;
            let p: Vector3<f64> = u * theta.cos() + v * theta.sin();
            let lon = p.y.atan2(p.x);
            let lat = p.z.atan2(p.x * lon.cos() + p.y * lon.sin());
            points.push((lat.to_degrees(), lon.to_degrees()));
        }

        Self { points, length_km }
    }
}
