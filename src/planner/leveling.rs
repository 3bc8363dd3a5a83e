//! Bed height-map compensation.

use libm::floorf;

use crate::error::{ConfigError, Error, MotionError, Result};

/// Largest supported grid (points_x * points_y).
pub const MAX_MESH_POINTS: usize = 64;

/// Rectangular grid of measured Z offsets.
///
/// Offsets are interpolated bilinearly. Outside the grid the nearest edge
/// value is used.
#[derive(Debug, Clone, PartialEq)]
pub struct BedMesh {
    origin: (f32, f32),
    spacing: (f32, f32),
    points_x: usize,
    points_y: usize,
    /// Row-major, `z[iy * points_x + ix]`.
    z: heapless::Vec<f32, MAX_MESH_POINTS>,
}

impl BedMesh {
    /// Create a mesh from row-major Z offsets (mm).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMeshGrid` for fewer than 2 points per
    /// side, more than [`MAX_MESH_POINTS`] points or a non-positive spacing,
    /// and `MotionError::MeshSizeMismatch` if `z` has the wrong length.
    pub fn new(
        origin: (f32, f32),
        spacing: (f32, f32),
        points_x: usize,
        points_y: usize,
        z: &[f32],
    ) -> Result<Self> {
        let count = points_x.saturating_mul(points_y);
        if points_x < 2
            || points_y < 2
            || count > MAX_MESH_POINTS
            || spacing.0.is_nan()
            || spacing.1.is_nan()
            || spacing.0 <= 0.0
            || spacing.1 <= 0.0
        {
            return Err(Error::Config(ConfigError::InvalidMeshGrid { points_x, points_y }));
        }

        if z.len() != count {
            return Err(Error::Motion(MotionError::MeshSizeMismatch {
                expected: count,
                got: z.len(),
            }));
        }

        let mut values = heapless::Vec::new();
        // Length checked above.
        let _ = values.extend_from_slice(z);

        Ok(Self {
            origin,
            spacing,
            points_x,
            points_y,
            z: values,
        })
    }

    /// Grid size as (points_x, points_y).
    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.points_x, self.points_y)
    }

    #[inline]
    fn at(&self, ix: usize, iy: usize) -> f32 {
        self.z[iy * self.points_x + ix]
    }

    /// Z offset at a bed position.
    pub fn z_offset(&self, x: f32, y: f32) -> f32 {
        let (cell_x, fx) = Self::locate(x, self.origin.0, self.spacing.0, self.points_x);
        let (cell_y, fy) = Self::locate(y, self.origin.1, self.spacing.1, self.points_y);

        let z00 = self.at(cell_x, cell_y);
        let z10 = self.at(cell_x + 1, cell_y);
        let z01 = self.at(cell_x, cell_y + 1);
        let z11 = self.at(cell_x + 1, cell_y + 1);

        let near = z00 + (z10 - z00) * fx;
        let far = z01 + (z11 - z01) * fx;
        near + (far - near) * fy
    }

    /// Cell index and fraction within the cell, clamped to the grid.
    fn locate(value: f32, origin: f32, spacing: f32, points: usize) -> (usize, f32) {
        let t = (value - origin) / spacing;
        let last_cell = (points - 2) as f32;
        if t.is_nan() || t <= 0.0 {
            return (0, 0.0);
        }
        if t >= last_cell + 1.0 {
            return (points - 2, 1.0);
        }
        let cell = floorf(t).min(last_cell);
        (cell as usize, t - cell)
    }
}
