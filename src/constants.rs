//! Dimensional constants shared across the path pipeline.

/// Cartesian degrees of freedom per atom.
///
/// Every flat coordinate vector in this crate has length
/// `natoms * DIM`, stored as `[x1, y1, z1, x2, y2, z2, ...]`.
pub const DIM: usize = 3;
