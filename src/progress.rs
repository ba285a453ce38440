//! Progress reporting for long trajectory syntheses.
//!
//! Trajectory synthesis is CPU-bound and scales with both the schedule
//! length and the square of the degree-of-freedom count, so large systems
//! can run for a while with no output. The [`Progress`] trait is a cosmetic
//! side-channel for that case: reporters observe per-frame completion but
//! must never alter numeric results.

use log::info;

/// Observer for per-frame trajectory synthesis progress.
pub trait Progress {
    /// Called once before the first frame with the total frame count.
    fn begin(&mut self, _total: usize) {}

    /// Called after each completed frame.
    fn frame(&mut self, completed: usize, total: usize);

    /// Called once after the last frame.
    fn finish(&mut self) {}
}

/// Reporter that discards all updates.
#[derive(Debug, Default)]
pub struct Silent;

impl Progress for Silent {
    fn frame(&mut self, _completed: usize, _total: usize) {}
}

/// Reporter that emits coarse progress through the `log` facade.
///
/// Logs at most one line per 10% of completed frames, so even very long
/// schedules stay readable in the log output.
#[derive(Debug, Default)]
pub struct LogProgress {
    last_decile: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.last_decile = 0;
        info!("synthesizing trajectory: {} frames", total);
    }

    fn frame(&mut self, completed: usize, total: usize) {
        let decile = completed * 10 / total.max(1);
        if decile > self.last_decile {
            self.last_decile = decile;
            info!(
                "trajectory {}% ({}/{} frames)",
                decile * 10,
                completed,
                total
            );
        }
    }

    fn finish(&mut self) {
        info!("trajectory synthesis complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        begun: Option<usize>,
        frames: usize,
        finished: bool,
    }

    impl Progress for Recorder {
        fn begin(&mut self, total: usize) {
            self.begun = Some(total);
        }

        fn frame(&mut self, _completed: usize, _total: usize) {
            self.frames += 1;
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_reporter_observes_every_frame() {
        let mut recorder = Recorder {
            begun: None,
            frames: 0,
            finished: false,
        };

        recorder.begin(3);
        for i in 1..=3 {
            recorder.frame(i, 3);
        }
        recorder.finish();

        assert_eq!(recorder.begun, Some(3));
        assert_eq!(recorder.frames, 3);
        assert!(recorder.finished);
    }

    #[test]
    fn test_log_progress_handles_empty_schedule() {
        // total = 0 must not divide by zero
        let mut progress = LogProgress::default();
        progress.begin(0);
        progress.finish();
    }
}
