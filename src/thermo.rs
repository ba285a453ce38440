//! Boundary trait for the external thermodynamics collaborator.
//!
//! The Onsager-Machlup actions are quadratic forms over a "work" vector
//! relating the candidate transition coordinate to each end-state
//! coordinate. The numeric definition of that vector belongs to the
//! surrounding thermodynamics layer, not to this crate: the actions depend
//! on it directly, so it must be supplied by the caller rather than guessed
//! here.

use nalgebra::DVector;

/// Work function supplied by the surrounding thermodynamics layer.
///
/// Implementations must be pure: the same inputs always produce the same
/// output, with no observable side effects on the path computation.
pub trait ThermoDynamics {
    /// Displacement/force-weighted work vector between a candidate
    /// transition coordinate `xbar` and an end-state coordinate `coord`.
    ///
    /// The returned vector must have the same length as both inputs.
    fn work(&self, xbar: &DVector<f64>, coord: &DVector<f64>) -> DVector<f64>;
}
