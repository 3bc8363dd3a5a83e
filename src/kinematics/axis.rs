//! Logical axes and per-axis vectors.

use core::ops::{Add, Index, IndexMut, Sub};

use libm::sqrtf;

/// Number of planned axes (X, Y, Z and the active extruder).
pub const NUM_AXES: usize = 4;

/// Largest number of extruders a machine may configure.
pub const MAX_EXTRUDERS: usize = 4;

/// A logical machine axis.
///
/// On coupled geometries the same index names the A/B/C actuator; on a delta
/// it names the tower carriage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X axis (A motor, tower 1).
    X,
    /// Y axis (B motor, tower 2).
    Y,
    /// Z axis (C motor, tower 3).
    Z,
    /// Active extruder.
    E,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; NUM_AXES] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Index into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::E => 3,
        }
    }

    /// Axis for an array index.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Axis::X),
            1 => Some(Axis::Y),
            2 => Some(Axis::Z),
            3 => Some(Axis::E),
            _ => None,
        }
    }

    /// Bit for this axis in a block's direction mask.
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// A value per logical axis, in real units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisVector(pub [f32; NUM_AXES]);

impl AxisVector {
    /// The origin.
    pub const ZERO: Self = Self([0.0; NUM_AXES]);

    /// Create a vector from its components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, e: f32) -> Self {
        Self([x, y, z, e])
    }

    /// X component.
    #[inline]
    pub const fn x(&self) -> f32 {
        self.0[0]
    }

    /// Y component.
    #[inline]
    pub const fn y(&self) -> f32 {
        self.0[1]
    }

    /// Z component.
    #[inline]
    pub const fn z(&self) -> f32 {
        self.0[2]
    }

    /// E component.
    #[inline]
    pub const fn e(&self) -> f32 {
        self.0[3]
    }

    /// Copy with one component replaced.
    #[inline]
    pub fn with(mut self, axis: Axis, value: f32) -> Self {
        self.0[axis.index()] = value;
        self
    }

    /// Euclidean length of the X/Y/Z part.
    #[inline]
    pub fn xyz_length(&self) -> f32 {
        sqrtf(self.0[0] * self.0[0] + self.0[1] * self.0[1] + self.0[2] * self.0[2])
    }
}

impl Index<Axis> for AxisVector {
    type Output = f32;

    fn index(&self, axis: Axis) -> &f32 {
        &self.0[axis.index()]
    }
}

impl IndexMut<Axis> for AxisVector {
    fn index_mut(&mut self, axis: Axis) -> &mut f32 {
        &mut self.0[axis.index()]
    }
}

impl Add for AxisVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let mut out = self;
        for (o, r) in out.0.iter_mut().zip(rhs.0) {
            *o += r;
        }
        out
    }
}

impl Sub for AxisVector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut out = self;
        for (o, r) in out.0.iter_mut().zip(rhs.0) {
            *o -= r;
        }
        out
    }
}
