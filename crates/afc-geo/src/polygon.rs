//! Integer-grid polygon operations for the uncertainty-region rasterizer.
//!
//! Scan conversion works in three passes: Bresenham traversal of every
//! edge marks boundary cells, a BFS from outside the bounding box seeds
//! the exterior, and the complement is the interior. The vertex
//! simplifier is the linear advance-while-within-tolerance variant, not
//! Douglas-Peucker; the two differ on which vertices survive and the scan
//! grid is sensitive to that.

use std::collections::{HashSet, VecDeque};

/// One cell of the scan grid.
pub type GridCell = (i64, i64);

/// Bresenham traversal of the segment from `a` to `b`, inclusive.
fn bresenham(a: GridCell, b: GridCell, out: &mut HashSet<GridCell>) {
    let (mut x0, mut y0) = a;
    let (x1, y1) = b;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        out.insert((x0, y0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Rasterize a closed polygon onto the integer grid.
///
/// Returns every cell inside or on the polygon boundary. Vertices are
/// grid coordinates; the closing edge from the last vertex back to the
/// first is implicit.
pub fn rasterize_polygon(vertices: &[GridCell]) -> Vec<GridCell> {
    if vertices.is_empty() {
        return Vec::new();
    }
    if vertices.len() == 1 {
        return vec![vertices[0]];
    }

    let mut boundary = HashSet::new();
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        bresenham(a, b, &mut boundary);
    }

    let min_x = vertices.iter().map(|c| c.0).min().unwrap() - 1;
    let max_x = vertices.iter().map(|c| c.0).max().unwrap() + 1;
    let min_y = vertices.iter().map(|c| c.1).min().unwrap() - 1;
    let max_y = vertices.iter().map(|c| c.1).max().unwrap() + 1;

    // BFS from the expanded-box corner; everything reachable without
    // crossing the boundary is exterior.
    let mut exterior = HashSet::new();
    let mut queue = VecDeque::new();
    let seed = (min_x, min_y);
    exterior.insert(seed);
    queue.push_back(seed);

    while let Some((x, y)) = queue.pop_front() {
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if nx < min_x || nx > max_x || ny < min_y || ny > max_y {
                continue;
            }
            let cell = (nx, ny);
            if boundary.contains(&cell) || exterior.contains(&cell) {
                continue;
            }
            exterior.insert(cell);
            queue.push_back(cell);
        }
    }

    let mut interior = Vec::new();
    for x in min_x..=max_x {
        for y in min_y..=max_y {
            let cell = (x, y);
            if !exterior.contains(&cell) {
                interior.push(cell);
            }
        }
    }
    interior.sort_unstable();
    interior
}

/// Perpendicular distance from `p` to the infinite line through `a`, `b`,
/// in cell units.
fn line_deviation(p: GridCell, a: GridCell, b: GridCell) -> f64 {
    let (px, py) = (p.0 as f64, p.1 as f64);
    let (ax, ay) = (a.0 as f64, a.1 as f64);
    let (bx, by) = (b.0 as f64, b.1 as f64);
    let len = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
    if len == 0.0 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    ((bx - ax) * (ay - py) - (ax - px) * (by - ay)).abs() / len
}

/// Delete interior vertices while the maximum perpendicular deviation of
/// the dropped vertices stays within `tolerance` cells.
///
/// Linear greedy walk: from the current anchor, advance the candidate
/// endpoint as far as possible while every skipped vertex stays within
/// tolerance of the chord, then commit the endpoint as the next anchor.
pub fn simplify_vertices(vertices: &[GridCell], tolerance: f64) -> Vec<GridCell> {
    if vertices.len() <= 2 {
        return vertices.to_vec();
    }

    let mut kept = vec![vertices[0]];
    let mut anchor = 0usize;

    while anchor < vertices.len() - 1 {
        let mut end = anchor + 1;
        // Advance while the chord (anchor..candidate) covers all skipped
        // vertices within tolerance.
        while end + 1 < vertices.len() {
            let candidate = end + 1;
            let within = (anchor + 1..candidate).all(|k| {
                line_deviation(vertices[k], vertices[anchor], vertices[candidate]) <= tolerance
            });
            if within {
                end = candidate;
            } else {
                break;
            }
        }
        kept.push(vertices[end]);
        anchor = end;
    }

    kept
}
