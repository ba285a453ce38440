//! Transition-state solve and trajectory synthesis.
//!
//! This module implements the harmonic Onsager-Machlup saddle-point
//! construction. Per mode, each end state contributes a diagonal
//! "stiffness" term and a diagonal "source" term over mode space; both are
//! projected into Cartesian space through the end state's eigenvector basis
//! and combined into a linear system whose solution is the transition-state
//! coordinate:
//!
//! ```text
//! xbar = (B_l x_l - A_r x_r) (B_l - A_r)^-1
//! ```
//!
//! The per-side work vectors (supplied by the external thermodynamics
//! collaborator) then give the action contribution of each half-path as the
//! quadratic form `0.5 w^T S w`.
//!
//! Trajectory synthesis interpolates every scheduled time with per-mode
//! hyperbolic weights, switching from the left basis to the right basis at
//! the left time-to-transition-state. Diagonal structures are kept as plain
//! vectors and projected on demand; no dense diagonal matrices are built.

use std::fmt;

use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::constants::DIM;
use crate::progress::{Progress, Silent};
use crate::state::EndState;
use crate::thermo::ThermoDynamics;
use crate::time_estimator::{Schedule, TimingParams};

/// Which end of the path a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The initial (reactant) end state.
    Left,
    /// The final (product) end state.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Errors raised while solving for the transition state.
#[derive(Debug, Error)]
pub enum SolveError {
    /// An end state's data does not match the declared atom count.
    #[error("{side} end state has {got} degrees of freedom, expected {expected}")]
    DimensionMismatch {
        /// End state the mismatch was found in
        side: Side,
        /// Expected degree-of-freedom count (`natoms * 3`)
        expected: usize,
        /// Actual length found
        got: usize,
    },
    /// The stiffness difference matrix could not be inverted. Typically the
    /// end states are identical or both spectra are degenerate.
    #[error("stiffness difference matrix is singular; end states may be identical or spectra degenerate")]
    SingularSystem,
}

/// Modes with eigenvalues below this are free translation/rotation modes.
const ZERO_MODE_THRESHOLD: f64 = 1e-6;

/// Hyperbolic forms are only evaluated for arguments inside (-700, 700);
/// `sinh` overflows f64 shortly past 709.
const HYPERBOLIC_ARG_LIMIT: f64 = 700.0;

/// The saddle-point structure and its per-side work/action quantities.
#[derive(Debug, Clone)]
pub struct TransitionState {
    /// Transition-state Cartesian coordinates, flat `[x1, y1, z1, ...]`
    pub coords: DVector<f64>,
    /// Work vector from the initial state to the transition state
    pub work_left: DVector<f64>,
    /// Work vector from the final state to the transition state
    pub work_right: DVector<f64>,
    /// Onsager-Machlup action of the left half-path
    pub action_left: f64,
    /// Onsager-Machlup action of the right half-path
    pub action_right: f64,
}

/// Solver for the transition state and the interpolated trajectory.
///
/// Construction is eager: the transition state is solved first, then every
/// scheduled frame is synthesized. Afterwards the solver only hands out
/// references to the finished results, so instances are cheap to share and
/// independent solvers may run concurrently for different paths.
#[derive(Debug)]
pub struct TransitionSolver<'a> {
    left: &'a EndState,
    right: &'a EndState,
    schedule: Schedule,
    tf: f64,
    transition_state: TransitionState,
    trajectory: Vec<DVector<f64>>,
}

impl<'a> TransitionSolver<'a> {
    /// Solve the path between `left` and `right` without progress reporting.
    ///
    /// See [`TransitionSolver::with_progress`] for the full contract.
    #[allow(clippy::too_many_arguments)]
    pub fn new<T: ThermoDynamics>(
        left: &'a EndState,
        right: &'a EndState,
        timing_left: TimingParams,
        timing_right: TimingParams,
        schedule: Schedule,
        natoms: usize,
        thermo: &T,
    ) -> Result<Self, SolveError> {
        Self::with_progress(
            left,
            right,
            timing_left,
            timing_right,
            schedule,
            natoms,
            thermo,
            &mut Silent,
        )
    }

    /// Solve the path between `left` and `right`, reporting per-frame
    /// progress during trajectory synthesis.
    ///
    /// The end states are borrowed read-only; the schedule is consumed and
    /// kept alongside the results. `thermo` supplies the external work
    /// function relating the transition coordinate to each end state.
    ///
    /// # Errors
    ///
    /// - [`SolveError::DimensionMismatch`] if either end state's data does
    ///   not match `natoms * 3` degrees of freedom
    /// - [`SolveError::SingularSystem`] if the stiffness difference matrix
    ///   cannot be inverted
    #[allow(clippy::too_many_arguments)]
    pub fn with_progress<T: ThermoDynamics>(
        left: &'a EndState,
        right: &'a EndState,
        timing_left: TimingParams,
        timing_right: TimingParams,
        schedule: Schedule,
        natoms: usize,
        thermo: &T,
        progress: &mut dyn Progress,
    ) -> Result<Self, SolveError> {
        let dof = natoms * DIM;
        check_dimensions(left, Side::Left, dof)?;
        check_dimensions(right, Side::Right, dof)?;

        let tbar_left = timing_left.tbar;
        let tbar_right = timing_right.tbar;
        let tf = tbar_left + tbar_right;

        // Working copies: zero-mode eigenvalues are clamped to exactly 0
        // during the stiffness construction and the clamped values are what
        // trajectory synthesis sees.
        let mut eval_left = left.eigenvalues.clone();
        let mut eval_right = right.eigenvalues.clone();

        let transition_state = solve_transition_state(
            &mut eval_left,
            &mut eval_right,
            left,
            right,
            tbar_left,
            tf,
            thermo,
        )?;

        info!(
            "transition state solved: action_left = {:.6e}, action_right = {:.6e}",
            transition_state.action_left, transition_state.action_right
        );

        let trajectory = synthesize_trajectory(
            &eval_left,
            &eval_right,
            left,
            right,
            &transition_state,
            &schedule.times,
            tbar_left,
            tbar_right,
            tf,
            progress,
        );

        debug!(
            "synthesized {} frames over transit time {:.6}",
            trajectory.len(),
            tf
        );

        Ok(Self {
            left,
            right,
            schedule,
            tf,
            transition_state,
            trajectory,
        })
    }

    /// The solved transition state with its work vectors and actions.
    pub fn transition_state(&self) -> &TransitionState {
        &self.transition_state
    }

    /// Interpolated coordinate frames, one per schedule entry, in schedule
    /// order.
    pub fn trajectory(&self) -> &[DVector<f64>] {
        &self.trajectory
    }

    /// The schedule the trajectory was synthesized against.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Total transit time between the two end states.
    pub fn total_time(&self) -> f64 {
        self.tf
    }

    /// The initial end state this path starts from.
    pub fn left(&self) -> &EndState {
        self.left
    }

    /// The final end state this path arrives at.
    pub fn right(&self) -> &EndState {
        self.right
    }
}

fn check_dimensions(state: &EndState, side: Side, dof: usize) -> Result<(), SolveError> {
    for got in [
        state.coords.len(),
        state.eigenvalues.len(),
        state.eigenvectors.nrows(),
        state.eigenvectors.ncols(),
    ] {
        if got != dof {
            return Err(SolveError::DimensionMismatch {
                side,
                expected: dof,
                got,
            });
        }
    }
    Ok(())
}

/// Projects a mode-space diagonal into Cartesian space: `V diag(d) V^T`.
fn project_diagonal(modes: &DMatrix<f64>, diagonal: &DVector<f64>) -> DMatrix<f64> {
    let mut scaled = modes.clone();
    for j in 0..scaled.ncols() {
        let mut column = scaled.column_mut(j);
        column *= diagonal[j];
    }
    &scaled * modes.transpose()
}

fn solve_transition_state<T: ThermoDynamics>(
    eval_left: &mut DVector<f64>,
    eval_right: &mut DVector<f64>,
    left: &EndState,
    right: &EndState,
    tbar_left: f64,
    tf: f64,
    thermo: &T,
) -> Result<TransitionState, SolveError> {
    let dof = eval_left.len();

    let mut b_left = DVector::zeros(dof);
    let mut a_right = DVector::zeros(dof);
    let mut s_left = DVector::zeros(dof);
    let mut s_right = DVector::zeros(dof);

    for i in 0..dof {
        // Raw-eigenvalue initialisation; kept as the limiting stiffness for
        // modes whose hyperbolic argument falls outside the safe range.
        b_left[i] = eval_left[i];
        a_right[i] = -eval_right[i];

        let ev = eval_left[i];
        if ev < ZERO_MODE_THRESHOLD {
            b_left[i] = 1.0 / tbar_left;
            s_left[i] = b_left[i];
            eval_left[i] = 0.0;
        } else {
            let x = ev * tbar_left;
            if x.abs() < HYPERBOLIC_ARG_LIMIT {
                b_left[i] = ev * x.cosh() / x.sinh();
                s_left[i] = ev * x.exp() / x.sinh();
            }
        }

        let ev = eval_right[i];
        if ev < ZERO_MODE_THRESHOLD {
            a_right[i] = 1.0 / (tbar_left - tf);
            s_right[i] = -a_right[i];
            eval_right[i] = 0.0;
        } else {
            let x = ev * (tbar_left - tf);
            if x.abs() < HYPERBOLIC_ARG_LIMIT {
                a_right[i] = ev * x.cosh() / x.sinh();
                s_right[i] = ev * (-x).exp() / (-x).sinh();
            }
        }
    }

    let den_left = project_diagonal(&left.eigenvectors, &b_left);
    let den_right = project_diagonal(&right.eigenvectors, &a_right);

    let num = &den_left * &left.coords - &den_right * &right.coords;
    let den = den_left - den_right;

    // den is symmetric, so a direct solve of den * xbar = num is equivalent
    // to the row-vector-times-inverse formulation.
    let xbar = den.lu().solve(&num).ok_or(SolveError::SingularSystem)?;

    let work_left = thermo.work(&xbar, &left.coords);
    let work_right = thermo.work(&xbar, &right.coords);

    let source_left = project_diagonal(&left.eigenvectors, &s_left);
    let source_right = project_diagonal(&right.eigenvectors, &s_right);

    let action_left = 0.5 * work_left.dot(&(&source_left * &work_left));
    let action_right = 0.5 * work_right.dot(&(&source_right * &work_right));

    Ok(TransitionState {
        coords: xbar,
        work_left,
        work_right,
        action_left,
        action_right,
    })
}

/// Interpolation weight for a left-side mode at time `t`.
fn left_weight(eigenvalue: f64, t: f64, tbar_left: f64) -> f64 {
    if eigenvalue < ZERO_MODE_THRESHOLD {
        return t / tbar_left;
    }
    let span = eigenvalue * tbar_left;
    if span.abs() < HYPERBOLIC_ARG_LIMIT {
        (eigenvalue * t).sinh() / span.sinh()
    } else {
        // Asymptotic form of sinh(ev t)/sinh(ev tbar) for large arguments.
        (eigenvalue * (t - tbar_left)).exp()
    }
}

/// Interpolation weight for a right-side mode at time `t`.
fn right_weight(eigenvalue: f64, t: f64, tf: f64, tbar_right: f64) -> f64 {
    if eigenvalue < ZERO_MODE_THRESHOLD {
        return (tf - t) / tbar_right;
    }
    let span = eigenvalue * tbar_right;
    if span.abs() < HYPERBOLIC_ARG_LIMIT {
        -(eigenvalue * (t - tf)).sinh() / span.sinh()
    } else {
        (eigenvalue * (t - tf - tbar_right)).exp()
    }
}

#[allow(clippy::too_many_arguments)]
fn synthesize_trajectory(
    eval_left: &DVector<f64>,
    eval_right: &DVector<f64>,
    left: &EndState,
    right: &EndState,
    transition_state: &TransitionState,
    times: &[f64],
    tbar_left: f64,
    tbar_right: f64,
    tf: f64,
    progress: &mut dyn Progress,
) -> Vec<DVector<f64>> {
    let dof = eval_left.len();
    let total = times.len();
    let mut weights = DVector::zeros(dof);
    let mut frames = Vec::with_capacity(total);

    progress.begin(total);

    for (step, &t) in times.iter().enumerate() {
        // Side selection is fixed per step: weights, basis, work vector and
        // origin all come from the same end state.
        let on_left = t < tbar_left;

        for i in 0..dof {
            weights[i] = if on_left {
                left_weight(eval_left[i], t, tbar_left)
            } else {
                right_weight(eval_right[i], t, tf, tbar_right)
            };
        }

        let (state, work) = if on_left {
            (left, &transition_state.work_left)
        } else {
            (right, &transition_state.work_right)
        };

        let frame = project_diagonal(&state.eigenvectors, &weights) * work + &state.coords;
        frames.push(frame);
        progress.frame(step + 1, total);
    }

    progress.finish();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_left_weight_zero_mode_is_linear() {
        assert_relative_eq!(left_weight(0.0, 1.0, 4.0), 0.25, epsilon = 1e-15);
        assert_relative_eq!(left_weight(0.0, 4.0, 4.0), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_right_weight_zero_mode_is_linear() {
        let tf = 8.0;
        assert_relative_eq!(right_weight(0.0, 6.0, tf, 4.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(right_weight(0.0, tf, tf, 4.0), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_left_weight_vanishes_at_time_zero() {
        assert_eq!(left_weight(2.0, 0.0, 3.5), 0.0);
    }

    #[test]
    fn test_right_weight_vanishes_at_transit_end() {
        assert_eq!(right_weight(2.0, 7.0, 7.0, 3.5), 0.0);
    }

    #[test]
    fn test_left_weight_fallback_matches_hyperbolic_below_limit() {
        // Just below the guard the hyperbolic form is still finite; the
        // exponential fallback must agree with it to high accuracy.
        let tbar = 1.0_f64;
        for ev in [650.0, 680.0, 699.0] {
            let t = 0.9_f64;
            let hyperbolic = (ev * t).sinh() / (ev * tbar).sinh();
            let fallback = (ev * (t - tbar)).exp();
            assert_relative_eq!(hyperbolic, fallback, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_left_weight_continuous_across_guard() {
        // At an argument just past the guard the branch switches to the
        // exponential form; it must still match the (finite) hyperbolic
        // value there.
        let tbar = 1.0_f64;
        let ev = 701.0;
        let t = 0.9_f64;
        let direct = (ev * t).sinh() / (ev * tbar).sinh();
        assert_relative_eq!(left_weight(ev, t, tbar), direct, max_relative = 1e-9);
    }

    #[test]
    fn test_left_weight_finite_past_overflow() {
        // sinh overflows for these arguments; the guarded form must not.
        let w = left_weight(800.0, 0.999, 1.0);
        assert!(w.is_finite());
        assert_relative_eq!(w, (800.0_f64 * -0.001).exp(), max_relative = 1e-12);
    }

    #[test]
    fn test_project_diagonal_identity_basis() {
        let modes = DMatrix::identity(3, 3);
        let diagonal = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let projected = project_diagonal(&modes, &diagonal);
        assert_eq!(projected, DMatrix::from_diagonal(&diagonal));
    }

    #[test]
    fn test_project_diagonal_is_symmetric() {
        // 2x2 rotation basis
        let c = 0.6_f64;
        let s = 0.8_f64;
        let modes = DMatrix::from_row_slice(2, 2, &[c, -s, s, c]);
        let diagonal = DVector::from_vec(vec![1.5, 4.0]);
        let projected = project_diagonal(&modes, &diagonal);
        assert_relative_eq!(projected[(0, 1)], projected[(1, 0)], epsilon = 1e-14);
        // Trace is basis-independent.
        assert_relative_eq!(projected.trace(), 5.5, epsilon = 1e-12);
    }
}
