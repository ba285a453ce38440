#![deny(missing_docs)]

//! ompath - Harmonic Onsager-Machlup reaction-path trajectories
//!
//! ompath computes a least-action transition trajectory connecting two
//! equilibrium molecular conformations, using the harmonic approximation to
//! the Onsager-Machlup action. Each end state is described by its Cartesian
//! coordinates together with the eigenvalue spectrum and eigenvector basis of
//! its Hessian; the crate produces the saddle-point (transition-state)
//! structure between them and the full interpolated coordinate trajectory.
//!
//! # Overview
//!
//! The pipeline runs in three stages, always in the same order:
//!
//! 1. **Timing** - each end state's normal-mode spectrum is reduced to a
//!    single effective force constant and a time-to-transition-state
//!    ([`time_estimator::time_to_transition_state`]).
//! 2. **Scheduling** - the per-side timings and relative energies are turned
//!    into a time/energy schedule for a fixed number of conformations,
//!    logarithmically dense near both equilibria
//!    ([`time_estimator::time_steps`]).
//! 3. **Solving** - [`TransitionSolver`] builds per-mode stiffness and source
//!    terms from both spectra, solves the resulting linear system for the
//!    transition-state coordinate, evaluates the per-side work vectors and
//!    Onsager-Machlup actions, and synthesizes one interpolated coordinate
//!    frame per scheduled time.
//!
//! # Quick Start
//!
//! ```no_run
//! use nalgebra::{DMatrix, DVector};
//! use ompath::thermo::ThermoDynamics;
//! use ompath::{EndState, TransitionSolver};
//! use ompath::time_estimator::{time_steps, time_to_transition_state};
//!
//! struct Work;
//! impl ThermoDynamics for Work {
//!     fn work(&self, xbar: &DVector<f64>, coord: &DVector<f64>) -> DVector<f64> {
//!         xbar - coord
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let left = EndState::new(
//!         vec![0.0; 6],
//!         vec![0.0, 0.0, 0.0, 0.0, 0.0, 2.0],
//!         DMatrix::identity(6, 6),
//!     );
//!     let right = EndState::new(
//!         vec![1.0; 6],
//!         vec![0.0, 0.0, 0.0, 0.0, 0.0, 2.0],
//!         DMatrix::identity(6, 6),
//!     );
//!
//!     let timing =
//!         time_to_transition_state(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0])?;
//!     let schedule = time_steps(timing, timing, 0.0, 0.0, 5)?;
//!
//!     let solver = TransitionSolver::new(&left, &right, timing, timing, schedule, 2, &Work)?;
//!     println!("action (left half): {}", solver.transition_state().action_left);
//!     println!("{} trajectory frames", solver.trajectory().len());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`constants`] - shared dimensional constants
//! - [`state`] - end-state data structures (coordinates + Hessian spectrum)
//! - [`thermo`] - boundary trait for the external work function
//! - [`time_estimator`] - spectral timing and trajectory scheduling
//! - [`transition`] - transition-state solve and trajectory synthesis
//! - [`progress`] - optional progress reporting for long syntheses
//!
//! # References
//!
//! - Onsager, L.; Machlup, S. *Phys. Rev.* **1953**, 91, 1505-1512.
//! - Franklin, J.; Koehl, P.; Doniach, S.; Delarue, M.
//!   *Nucleic Acids Res.* **2007**, 35, W477-W482.

pub mod constants;
pub mod progress;
pub mod state;
pub mod thermo;
pub mod time_estimator;
pub mod transition;

pub use state::EndState;
pub use time_estimator::{Schedule, TimingParams};
pub use transition::{TransitionSolver, TransitionState};
