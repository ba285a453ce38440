//! Spectral timing estimation and trajectory scheduling.
//!
//! This module reduces a Hessian eigenvalue spectrum to a single effective
//! force constant and a time-to-transition-state, then turns the per-side
//! timings into the time/energy schedule for every conformation on the path.
//!
//! # Timing model
//!
//! Within the harmonic approximation each normal mode relaxes exponentially
//! with rate equal to its eigenvalue. The transition is driven by the soft,
//! low-frequency modes, so the spectrum is summarised by the modes that
//! together hold 95% of the total flexibility (sum of eigenvalue
//! reciprocals). The resulting average force constant `k` sets the
//! time-to-transition-state as `7/k`: after seven relaxation times the
//! residual displacement is below a part in a thousand.
//!
//! # Schedule shape
//!
//! Conformations are placed along a tent-shaped progression of amplitude
//! ratios, rising from 0 at the reactant to near 1 at the transition state
//! and back down to 0 at the product. Times follow `(7 + ln r)/k` per side,
//! which makes the schedule dense near both equilibria (matching the
//! logarithmic approach to equilibrium) and sparse near the barrier.

use log::debug;
use thiserror::Error;

/// Errors raised during timing estimation and scheduling.
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// Spectrum has too few eigenvalues left after skipping the zero modes.
    #[error("spectrum has {got} eigenvalues, need more than {skip} after skipping zero modes")]
    SpectrumTooShort {
        /// Number of eigenvalues supplied
        got: usize,
        /// Number of leading zero modes skipped
        skip: usize,
    },
    /// A retained eigenvalue is zero or negative, so its reciprocal
    /// flexibility is undefined.
    #[error("eigenvalue {index} is non-positive ({value}); retained modes must have positive curvature")]
    NonPositiveEigenvalue {
        /// Index into the full spectrum
        index: usize,
        /// Offending eigenvalue
        value: f64,
    },
    /// The first retained mode alone holds 95% of the flexibility, which
    /// leaves the average force constant undefined.
    #[error("first retained mode holds the whole flexibility cutoff; force constant is undefined")]
    DegenerateCutoff,
    /// Fewer than the two endpoint conformations were requested.
    #[error("trajectory needs at least 2 conformations, got {0}")]
    TooFewConformations(usize),
}

/// Per-side timing parameters derived from a normal-mode spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingParams {
    /// Time for this end state to reach the transition state.
    pub tbar: f64,
    /// Effective average force constant of the retained soft modes.
    pub force_constant: f64,
}

/// Time and relative-energy schedule for every conformation on the path.
///
/// Both sequences have the same length and ordering; entry 0 is the
/// reactant at time 0 and the last entry is the product at the total
/// transit time.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Scheduled time of each conformation, non-decreasing.
    pub times: Vec<f64>,
    /// Relative energy assigned to each conformation.
    pub energies: Vec<f64>,
}

impl Schedule {
    /// Number of conformations in the schedule.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the schedule holds no conformations.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Total transit time (the time of the final conformation).
    pub fn total_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

/// Fraction of the total flexibility that the dominant modes must reach.
const FLEXIBILITY_CUTOFF: f64 = 0.95;

/// Relaxation horizon in units of 1/k: exp(-7) leaves less than a part in
/// a thousand of the initial displacement.
const RELAXATION_HORIZON: f64 = 7.0;

/// Reduce a Hessian spectrum to the time-to-transition-state and the
/// effective average force constant of its soft modes.
///
/// The lowest-index modes are global translations/rotations and are
/// skipped: 6 of them when the spectrum has more than 6 entries, 5
/// otherwise. The 5-mode skip for spectra of length 6 or less is a literal
/// small-system special case; no general rule should be inferred from it.
///
/// # Errors
///
/// - [`EstimatorError::SpectrumTooShort`] if nothing remains after the skip
/// - [`EstimatorError::NonPositiveEigenvalue`] if a retained eigenvalue is
///   zero or negative
/// - [`EstimatorError::DegenerateCutoff`] if the first retained mode alone
///   reaches the 95% flexibility cutoff
pub fn time_to_transition_state(eigenvalues: &[f64]) -> Result<TimingParams, EstimatorError> {
    let skip = if eigenvalues.len() > 6 { 6 } else { 5 };
    if eigenvalues.len() <= skip {
        return Err(EstimatorError::SpectrumTooShort {
            got: eigenvalues.len(),
            skip,
        });
    }

    let retained = &eigenvalues[skip..];
    let mut reciprocal = Vec::with_capacity(retained.len());
    for (i, &ev) in retained.iter().enumerate() {
        if ev <= 0.0 {
            return Err(EstimatorError::NonPositiveEigenvalue {
                index: skip + i,
                value: ev,
            });
        }
        reciprocal.push(1.0 / ev);
    }

    let total: f64 = reciprocal.iter().sum();

    // First mode index at which the cumulative flexibility reaches the
    // cutoff. The cumulative fraction ends at exactly 1, so the search
    // always terminates.
    let mut cumulative = 0.0;
    let mut cutoff_index = 0;
    let mut cutoff_fraction = 1.0;
    for (i, r) in reciprocal.iter().enumerate() {
        cumulative += r;
        let fraction = cumulative / total;
        if fraction >= FLEXIBILITY_CUTOFF {
            cutoff_index = i;
            cutoff_fraction = fraction;
            break;
        }
    }

    if cutoff_index == 0 {
        return Err(EstimatorError::DegenerateCutoff);
    }

    let force_constant = 1.0 / (cutoff_fraction / cutoff_index as f64 + 1.0);
    let tbar = RELAXATION_HORIZON / force_constant;

    debug!(
        "spectral timing: {} retained modes, cutoff at mode {}, k = {:.6}, tbar = {:.6}",
        retained.len(),
        cutoff_index,
        force_constant,
        tbar
    );

    Ok(TimingParams {
        tbar,
        force_constant,
    })
}

/// Build the time/energy schedule for `nconf` conformations including both
/// endpoints.
///
/// `energy_left` and `energy_right` are the transition-state energies
/// relative to the initial and final state respectively. The first schedule
/// entry is the reactant at time 0; the last is the product at the total
/// transit time `tbar_left + tbar_right`.
///
/// # Errors
///
/// [`EstimatorError::TooFewConformations`] if `nconf < 2`.
pub fn time_steps(
    left: TimingParams,
    right: TimingParams,
    energy_left: f64,
    energy_right: f64,
    nconf: usize,
) -> Result<Schedule, EstimatorError> {
    if nconf < 2 {
        return Err(EstimatorError::TooFewConformations(nconf));
    }

    let intermediate = nconf - 2;
    let step_size = 2.0 / (intermediate + 1) as f64;
    let tf = left.tbar + right.tbar;

    // Tent-shaped amplitude ratios: endpoints at 0, interior entries step
    // through [0, 2) with values past 1 folded back down.
    let mut ratio = Vec::with_capacity(nconf);
    ratio.push(0.0);
    let mut current = step_size;
    for _ in 0..intermediate {
        if current >= 1.0 {
            ratio.push(2.0 - current);
        } else {
            ratio.push(current);
        }
        current += step_size;
    }
    ratio.push(0.0);

    let mut times = Vec::with_capacity(nconf);
    let mut energies = Vec::with_capacity(nconf);
    let half = nconf as f64 / 2.0;

    for (step, &r) in ratio.iter().enumerate() {
        // The final entry is always the product, even when nconf = 2 puts
        // its index inside the first half.
        let first_half = (step as f64) <= half && step + 1 != nconf;
        if first_half {
            if r == 0.0 {
                times.push(0.0);
                energies.push(energy_right - energy_left);
            } else {
                times.push((RELAXATION_HORIZON + r.ln()) / left.force_constant);
                energies.push(r * energy_left + (energy_right - energy_left));
            }
        } else if r == 0.0 {
            times.push(tf);
            energies.push(0.0);
        } else {
            times.push(tf - (RELAXATION_HORIZON + r.ln()) / right.force_constant);
            energies.push(r * energy_right);
        }
    }

    debug!(
        "schedule: {} conformations over transit time {:.6}",
        nconf, tf
    );

    Ok(Schedule { times, energies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_spectrum(n: usize) -> Vec<f64> {
        let mut spectrum = vec![0.0; 6];
        spectrum.extend(std::iter::repeat(1.0).take(n));
        spectrum
    }

    #[test]
    fn test_timing_positive_for_positive_spectrum() {
        let timing = time_to_transition_state(&flat_spectrum(4)).unwrap();
        assert!(timing.tbar > 0.0);
        assert!(timing.force_constant > 0.0);
    }

    #[test]
    fn test_timing_uniform_spectrum() {
        // Four equal retained modes: cumulative fractions 1/4 .. 4/4, cutoff
        // lands on the last mode with fraction exactly 1.
        let timing = time_to_transition_state(&flat_spectrum(4)).unwrap();
        assert_relative_eq!(timing.force_constant, 0.75, epsilon = 1e-12);
        assert_relative_eq!(timing.tbar, 7.0 / 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_timing_rejects_short_spectrum() {
        let result = time_to_transition_state(&[1.0; 5]);
        assert!(matches!(
            result,
            Err(EstimatorError::SpectrumTooShort { got: 5, skip: 5 })
        ));
    }

    #[test]
    fn test_timing_small_system_skips_five() {
        // Length 6 uses the 5-mode skip, leaving a single retained mode,
        // which is always a degenerate cutoff rather than a length error.
        let result = time_to_transition_state(&[0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
        assert!(matches!(result, Err(EstimatorError::DegenerateCutoff)));
    }

    #[test]
    fn test_timing_rejects_zero_eigenvalue() {
        let mut spectrum = flat_spectrum(4);
        spectrum[7] = 0.0;
        let result = time_to_transition_state(&spectrum);
        assert!(matches!(
            result,
            Err(EstimatorError::NonPositiveEigenvalue { index: 7, .. })
        ));
    }

    #[test]
    fn test_timing_degenerate_cutoff() {
        // One very soft mode dwarfs the rest of the flexibility.
        let mut spectrum = flat_spectrum(4);
        spectrum[6] = 1.0e-9;
        let result = time_to_transition_state(&spectrum);
        assert!(matches!(result, Err(EstimatorError::DegenerateCutoff)));
    }

    fn symmetric_timing() -> TimingParams {
        TimingParams {
            tbar: 3.5,
            force_constant: 2.0,
        }
    }

    #[test]
    fn test_schedule_endpoint_invariants() {
        let timing = symmetric_timing();
        let schedule = time_steps(timing, timing, 1.0, 2.0, 5).unwrap();

        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule.times.len(), schedule.energies.len());
        assert_eq!(schedule.times[0], 0.0);
        assert_relative_eq!(schedule.total_time(), 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_schedule_times_monotone() {
        let timing = symmetric_timing();
        let schedule = time_steps(timing, timing, 0.5, 0.5, 7).unwrap();
        for pair in schedule.times.windows(2) {
            assert!(pair[1] >= pair[0], "times must be non-decreasing: {:?}", pair);
        }
    }

    #[test]
    fn test_schedule_symmetric_for_symmetric_inputs() {
        let timing = symmetric_timing();
        let schedule = time_steps(timing, timing, 0.0, 0.0, 5).unwrap();
        let tf = schedule.total_time();
        let n = schedule.len();
        for i in 0..n {
            assert_relative_eq!(
                schedule.times[i] + schedule.times[n - 1 - i],
                tf,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_schedule_endpoint_energies() {
        let timing = symmetric_timing();
        let schedule = time_steps(timing, timing, 1.0, 3.0, 2).unwrap();
        // Reactant entry carries the energy offset between the two sides,
        // product entry is the zero reference.
        assert_eq!(schedule.energies, vec![2.0, 0.0]);
        assert_eq!(schedule.times, vec![0.0, 7.0]);
    }

    #[test]
    fn test_schedule_rejects_too_few_conformations() {
        let timing = symmetric_timing();
        let result = time_steps(timing, timing, 0.0, 0.0, 1);
        assert!(matches!(result, Err(EstimatorError::TooFewConformations(1))));
    }
}
