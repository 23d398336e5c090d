// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dominant orientation of a footprint
//!
//! Buildings tend to line up with their longest wall, so the angle of that
//! edge against the x-axis is used to align roof textures.

use nalgebra::Point3;

/// Longest edge of a closed ring, including the closing edge
///
/// Ties keep the first edge seen. `None` for fewer than two points.
pub fn longest_edge(points: &[Point3<f64>]) -> Option<(Point3<f64>, Point3<f64>)> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len();
    let mut best = None;
    let mut max_len2 = 0.0;

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let len2 = (b - a).norm_squared();
        if len2 > max_len2 {
            max_len2 = len2;
            best = Some((a, b));
        }
    }

    best
}

/// Angle in radians of the longest edge, oriented left to right
pub fn apparent_rotation(points: &[Point3<f64>]) -> f64 {
    let Some((mut p1, mut p2)) = longest_edge(points) else {
        return 0.0;
    };
    if p2.x < p1.x {
        std::mem::swap(&mut p1, &mut p2);
    }
    (p2.y - p1.y).atan2(p2.x - p1.x)
}
