use std::thread;
use std::time::{Duration, Instant};

/// Intervalle cible pour une cadence native. `None` si la cadence est inexploitable.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tf_render::pacing::frame_interval;
/// assert_eq!(frame_interval(25.0), Some(Duration::from_millis(40)));
/// assert_eq!(frame_interval(0.0), None);
/// ```
#[must_use]
pub fn frame_interval(fps: f64) -> Option<Duration> {
    (fps.is_finite() && fps > 0.0).then(|| Duration::from_secs_f64(1.0 / fps))
}

/// Temps restant à dormir : `target - elapsed`, ou zéro si la frame est en retard.
///
/// Never negative; a late frame is not compensated on the next one.
#[inline]
#[must_use]
pub fn remaining(target: Duration, elapsed: Duration) -> Duration {
    target.saturating_sub(elapsed)
}

/// Something that can block for a duration.
pub trait Sleeper {
    /// Block for `dur`.
    fn sleep(&mut self, dur: Duration);
}

/// Sleeps the calling thread.
#[derive(Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, dur: Duration) {
        thread::sleep(dur);
    }
}

/// Cale la boucle de lecture sur la cadence native de la source.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tf_render::pacing::{PacingController, ThreadSleeper};
/// let mut pacer = PacingController::new(Duration::from_millis(1), ThreadSleeper);
/// pacer.begin_frame();
/// pacer.pace();
/// ```
pub struct PacingController<S: Sleeper> {
    target: Duration,
    sleeper: S,
    frame_start: Instant,
}

impl<S: Sleeper> PacingController<S> {
    /// Controller for a fixed target interval.
    pub fn new(target: Duration, sleeper: S) -> Self {
        Self {
            target,
            sleeper,
            frame_start: Instant::now(),
        }
    }

    /// Target frame interval.
    pub fn target(&self) -> Duration {
        self.target
    }

    /// Mark the start of a frame iteration.
    pub fn begin_frame(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Sleep for the given elapsed time; returns the duration slept.
    /// The sleeper is not called when nothing remains.
    pub fn pace_after(&mut self, elapsed: Duration) -> Duration {
        let sleep = remaining(self.target, elapsed);
        if !sleep.is_zero() {
            self.sleeper.sleep(sleep);
        }
        sleep
    }

    /// Sleep whatever remains of the interval since [`Self::begin_frame`].
    pub fn pace(&mut self) -> Duration {
        let elapsed = self.frame_start.elapsed();
        self.pace_after(elapsed)
    }

    /// Access the sleeper.
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<Duration>);

    impl Sleeper for Recorder {
        fn sleep(&mut self, dur: Duration) {
            self.0.push(dur);
        }
    }

    #[test]
    fn early_frame_sleeps_the_rest() {
        let mut pacer = PacingController::new(Duration::from_millis(40), Recorder::default());
        let slept = pacer.pace_after(Duration::from_millis(15));
        assert_eq!(slept, Duration::from_millis(25));
        assert_eq!(pacer.sleeper().0, [Duration::from_millis(25)]);
    }

    #[test]
    fn late_frame_does_not_sleep() {
        let mut pacer = PacingController::new(Duration::from_millis(40), Recorder::default());
        assert_eq!(pacer.pace_after(Duration::from_millis(40)), Duration::ZERO);
        assert_eq!(pacer.pace_after(Duration::from_millis(90)), Duration::ZERO);
        assert!(pacer.sleeper().0.is_empty());
    }

    #[test]
    fn pace_measures_from_frame_start() {
        let target = Duration::from_secs(10);
        let mut pacer = PacingController::new(target, Recorder::default());
        pacer.begin_frame();
        let slept = pacer.pace();
        assert!(slept <= target);
        assert!(slept > Duration::from_secs(9));
    }

    #[test]
    fn interval_rejects_bad_rates() {
        assert_eq!(frame_interval(f64::NAN), None);
        assert_eq!(frame_interval(-24.0), None);
        assert_eq!(frame_interval(f64::INFINITY), None);
        let ntsc = frame_interval(30000.0 / 1001.0).unwrap();
        assert!((ntsc.as_secs_f64() - 0.033_366).abs() < 1e-5);
    }
}
