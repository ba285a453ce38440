//! End-state data structures for reaction-path calculations.
//!
//! An [`EndState`] bundles everything the solver needs to know about one of
//! the two equilibrium conformations: the Cartesian coordinates, the Hessian
//! eigenvalue spectrum, and the eigenvector (normal-mode) basis. Both end
//! states are computed upstream and are read-only inputs here.
//!
//! Coordinates use a flat representation `[x1, y1, z1, x2, y2, z2, ...]` of
//! length `natoms * 3`, matching the mode-space dimensionality of the
//! spectrum and basis.

use nalgebra::{DMatrix, DVector};

use crate::constants::DIM;

/// One equilibrium conformation together with its local curvature data.
///
/// The eigenvector matrix stores one normal mode per column; the spectrum is
/// ordered to match. Orthonormality of the basis is an upstream guarantee
/// and is not re-validated here.
///
/// # Examples
///
/// ```
/// use nalgebra::DMatrix;
/// use ompath::EndState;
///
/// // Two atoms, six degrees of freedom, one vibrational mode.
/// let state = EndState::new(
///     vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
///     vec![0.0, 0.0, 0.0, 0.0, 0.0, 2.0],
///     DMatrix::identity(6, 6),
/// );
/// assert_eq!(state.num_atoms(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EndState {
    /// Flattened Cartesian coordinates of length `natoms * 3`
    pub coords: DVector<f64>,
    /// Hessian eigenvalues, one per mode, ordered to match `eigenvectors`
    pub eigenvalues: DVector<f64>,
    /// Hessian eigenvectors, one normal mode per column
    pub eigenvectors: DMatrix<f64>,
}

impl EndState {
    /// Create a new `EndState` from flat coordinate and eigenvalue vectors
    /// and the square eigenvector matrix.
    ///
    /// # Panics
    ///
    /// Panics if the eigenvalue count or the eigenvector matrix shape does
    /// not match the coordinate length, ensuring data consistency.
    pub fn new(coords: Vec<f64>, eigenvalues: Vec<f64>, eigenvectors: DMatrix<f64>) -> Self {
        let dof = coords.len();
        assert_eq!(eigenvalues.len(), dof);
        assert_eq!(eigenvectors.nrows(), dof);
        assert_eq!(eigenvectors.ncols(), dof);
        Self {
            coords: DVector::from_vec(coords),
            eigenvalues: DVector::from_vec(eigenvalues),
            eigenvectors,
        }
    }

    /// Number of atoms represented by this end state.
    pub fn num_atoms(&self) -> usize {
        self.coords.len() / DIM
    }

    /// Total number of Cartesian degrees of freedom (`natoms * 3`).
    pub fn dof(&self) -> usize {
        self.coords.len()
    }

    /// Validates that the end state contains meaningful, finite data.
    ///
    /// Catches the common upstream failure modes where a normal-mode
    /// analysis appears to succeed but hands over empty or non-finite data.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the end state is usable
    /// - `Err(String)` with a descriptive message otherwise
    pub fn validate(&self) -> Result<(), String> {
        if self.coords.is_empty() {
            return Err("end state contains no coordinates".to_string());
        }

        if self.coords.len() % DIM != 0 {
            return Err(format!(
                "coordinate vector length {} is not a multiple of {}",
                self.coords.len(),
                DIM
            ));
        }

        if let Some(i) = self.coords.iter().position(|c| !c.is_finite()) {
            return Err(format!("coordinate {} is not finite: {}", i, self.coords[i]));
        }

        if let Some(i) = self.eigenvalues.iter().position(|e| !e.is_finite()) {
            return Err(format!(
                "eigenvalue {} is not finite: {}",
                i, self.eigenvalues[i]
            ));
        }

        if self.eigenvectors.iter().any(|v| !v.is_finite()) {
            return Err("eigenvector matrix contains non-finite entries".to_string());
        }

        Ok(())
    }
}
