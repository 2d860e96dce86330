/// Fixed-length circular accumulator of raw band values.
///
/// Slots start at zero. A write lands at `frame_counter mod L`, so frames that
/// skip their write (artifact frames) leave the previous value in place and
/// the mean decays slowly instead of snapping to zero.
///
/// # Example
/// ```
/// use eeg_audio::smoothing::RunningAverageWindow;
/// let mut window = RunningAverageWindow::new(4);
/// window.write(0, 4.0);
/// assert_eq!(window.mean(), 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct RunningAverageWindow {
    slots: Vec<f32>,
}

impl RunningAverageWindow {
    /// Create a zero-filled window of `len` slots.
    ///
    /// # Panics
    /// Panics if `len` is 0.
    #[must_use]
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "running average window must have at least one slot");
        Self {
            slots: vec![0.0; len],
        }
    }

    /// Store `value` in the slot owned by `frame_counter`.
    #[inline(always)]
    pub fn write(&mut self, frame_counter: u64, value: f32) {
        let slot = (frame_counter % self.slots.len() as u64) as usize;
        self.slots[slot] = value;
    }

    /// Arithmetic mean of all L slots, stale and never-written ones included.
    #[inline]
    #[must_use]
    pub fn mean(&self) -> f32 {
        self.slots.iter().sum::<f32>() / self.slots.len() as f32
    }

    /// Window length L.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always `false`; a window has at least one slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Raw slot contents.
    #[must_use]
    pub fn slots(&self) -> &[f32] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_zero_slots_count_until_overwritten() {
        let mut window = RunningAverageWindow::new(10);
        window.write(0, 5.0);
        window.write(1, 5.0);
        assert!((window.mean() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn full_cycle_mean_ignores_write_order() {
        let values = [3.0f32, 1.0, 4.0, 1.0, 5.0, 9.0];
        let mut forward = RunningAverageWindow::new(values.len());
        let mut shuffled = RunningAverageWindow::new(values.len());
        for (i, v) in values.iter().enumerate() {
            forward.write(i as u64, *v);
        }
        for (i, v) in values.iter().rev().enumerate() {
            shuffled.write(i as u64, *v);
        }
        assert!((forward.mean() - shuffled.mean()).abs() < 1e-6);
        assert!((forward.mean() - 23.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn counter_wraps_onto_oldest_slot() {
        let mut window = RunningAverageWindow::new(3);
        for frame in 0..3 {
            window.write(frame, 1.0);
        }
        window.write(3, 4.0);
        assert_eq!(window.slots(), &[4.0, 1.0, 1.0]);
        assert_eq!(window.len(), 3);
    }
}
