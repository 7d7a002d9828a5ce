use std::collections::VecDeque;
use std::time::Instant;

/// Compteur FPS par fenêtre glissante, plus un total depuis le début de la lecture.
///
/// # Example
/// ```
/// use tf_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(30);
/// counter.tick();
/// assert_eq!(counter.frames(), 1);
/// ```
pub struct FpsCounter {
    /// Timestamps des dernières frames.
    window: VecDeque<Instant>,
    capacity: usize,
    first: Option<Instant>,
    frames: u64,
}

impl FpsCounter {
    /// Counter averaging over the last `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
            first: None,
            frames: 0,
        }
    }

    /// Record a rendered frame now.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Record a rendered frame at `now`.
    pub fn tick_at(&mut self, now: Instant) {
        self.first.get_or_insert(now);
        self.frames += 1;
        self.window.push_back(now);
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// FPS sur la fenêtre glissante.
    #[must_use]
    pub fn fps(&self) -> f64 {
        match (self.window.front(), self.window.back()) {
            (Some(first), Some(last)) if self.window.len() >= 2 => {
                rate(self.window.len() as u64 - 1, last.duration_since(*first).as_secs_f64())
            }
            _ => 0.0,
        }
    }

    /// FPS moyen depuis la première frame jusqu'à la dernière.
    #[must_use]
    pub fn average_fps(&self) -> f64 {
        match (self.first, self.window.back()) {
            (Some(first), Some(last)) if self.frames >= 2 => {
                rate(self.frames - 1, last.duration_since(first).as_secs_f64())
            }
            _ => 0.0,
        }
    }
}

fn rate(intervals: u64, secs: f64) -> f64 {
    if secs > 0.0 { intervals as f64 / secs } else { 0.0 }
}
