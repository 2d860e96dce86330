use std::collections::VecDeque;
use std::time::Instant;

/// Débit glissant d'un compteur monotone. Zéro allocation après init.
///
/// Each observation records `(instant, total)`; the rate is the growth of
/// `total` across the retained window divided by its duration.
struct SlidingRate {
    points: VecDeque<(Instant, u64)>,
    window: usize,
    rate: f64,
}

impl SlidingRate {
    fn new(window: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(window + 1),
            window: window.max(2),
            rate: 0.0,
        }
    }

    fn observe(&mut self, now: Instant, total: u64) {
        // counter went backwards (new session): start over
        if self.points.back().is_some_and(|&(_, last)| total < last) {
            self.points.clear();
        }
        self.points.push_back((now, total));
        if self.points.len() > self.window {
            self.points.pop_front();
        }
        if let (Some(&(t0, c0)), Some(&(t1, c1))) = (self.points.front(), self.points.back()) {
            let secs = t1.duration_since(t0).as_secs_f64();
            if secs > 0.0 {
                self.rate = (c1 - c0) as f64 / secs;
            }
        }
    }
}

/// Render and analysis rates shown in the status panel.
///
/// # Example
/// ```
/// use eeg_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(60);
/// counter.tick();
/// counter.observe_frame(0);
/// assert!(counter.fps() >= 0.0);
/// ```
pub struct FpsCounter {
    render: SlidingRate,
    analysis: SlidingRate,
    ticks: u64,
    last_tick: Option<Instant>,
    /// Temps de la dernière frame rendue en ms.
    pub frame_time_ms: f64,
}

impl FpsCounter {
    /// Average over the last `window` observations.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            render: SlidingRate::new(window),
            analysis: SlidingRate::new(window),
            ticks: 0,
            last_tick: None,
            frame_time_ms: 0.0,
        }
    }

    /// Appeler une fois par image, APRÈS le rendu.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            self.frame_time_ms = now.duration_since(last).as_secs_f64() * 1000.0;
        }
        self.last_tick = Some(now);
        self.ticks += 1;
        self.render.observe(now, self.ticks);
    }

    /// Record the frame index of the latest analysis snapshot.
    pub fn observe_frame(&mut self, frame_index: u64) {
        self.analysis.observe(Instant::now(), frame_index);
    }

    /// Images rendues par seconde.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.render.rate
    }

    /// Analysis frames per second, from the published frame indices.
    #[must_use]
    pub fn analysis_fps(&self) -> f64 {
        self.analysis.rate
    }
}
