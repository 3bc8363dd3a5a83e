//! Linear delta geometry.
//!
//! Three vertical towers at 210°, 330° and 90° around the bed center, each
//! carrying a carriage joined to the effector by a pair of diagonal rods.

use libm::sqrtf;
use serde::Deserialize;

const SIN_60: f32 = 0.866_025_4;
const COS_60: f32 = 0.5;

/// Tower and rod dimensions of a delta machine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DeltaGeometry {
    /// Length of a diagonal rod, pivot to pivot.
    #[serde(rename = "diagonal_rod_mm")]
    pub diagonal_rod: f32,

    /// Horizontal distance from bed center to each tower's effective pivot.
    #[serde(rename = "radius_mm")]
    pub radius: f32,

    /// Segment density used when splitting Cartesian moves.
    #[serde(default = "default_segments_per_second")]
    pub segments_per_second: f32,
}

fn default_segments_per_second() -> f32 {
    200.0
}

impl DeltaGeometry {
    /// Create a geometry with the default segment density.
    pub fn new(diagonal_rod: f32, radius: f32) -> Self {
        Self {
            diagonal_rod,
            radius,
            segments_per_second: default_segments_per_second(),
        }
    }

    /// Tower positions in the XY plane.
    pub fn towers(&self) -> [(f32, f32); 3] {
        let r = self.radius;
        [(-SIN_60 * r, -COS_60 * r), (SIN_60 * r, -COS_60 * r), (0.0, r)]
    }

    /// Carriage heights for an effector position.
    ///
    /// Positions outside the reachable envelope collapse the rod onto the
    /// carriage instead of producing NaN.
    pub fn inverse(&self, x: f32, y: f32, z: f32) -> [f32; 3] {
        let rod2 = self.diagonal_rod * self.diagonal_rod;
        let mut out = [0.0; 3];
        for (h, (tx, ty)) in out.iter_mut().zip(self.towers()) {
            let dx = tx - x;
            let dy = ty - y;
            *h = sqrtf((rod2 - dx * dx - dy * dy).max(0.0)) + z;
        }
        out
    }

    /// Effector position for three carriage heights (trilateration).
    pub fn forward(&self, heights: [f32; 3]) -> (f32, f32, f32) {
        let [t1, t2, t3] = self.towers();
        let p1 = [t1.0, t1.1, heights[0]];
        let p2 = [t2.0, t2.1, heights[1]];
        let p3 = [t3.0, t3.1, heights[2]];

        let p12 = sub(p2, p1);
        let d = norm(p12);
        let ex = scale(p12, 1.0 / d);

        let p13 = sub(p3, p1);
        let i = dot(ex, p13);
        let ey_raw = sub(p13, scale(ex, i));
        let j = norm(ey_raw);
        let ey = scale(ey_raw, 1.0 / j);
        let ez = cross(ex, ey);

        let x_new = d / 2.0;
        let y_new = ((i * i + j * j) / 2.0 - i * x_new) / j;
        let rod2 = self.diagonal_rod * self.diagonal_rod;
        let z_new = sqrtf((rod2 - x_new * x_new - y_new * y_new).max(0.0));

        let out = [
            p1[0] + ex[0] * x_new + ey[0] * y_new - ez[0] * z_new,
            p1[1] + ex[1] * x_new + ey[1] * y_new - ez[1] * z_new,
            p1[2] + ex[2] * x_new + ey[2] * y_new - ez[2] * z_new,
        ];
        (out[0], out[1], out[2])
    }

    /// True when the rods are long enough to reach the bed center.
    pub fn is_valid(&self) -> bool {
        self.radius > 0.0 && self.diagonal_rod > self.radius && self.segments_per_second > 0.0
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f32; 3], s: f32) -> [f32; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f32; 3]) -> f32 {
    sqrtf(dot(a, a))
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
