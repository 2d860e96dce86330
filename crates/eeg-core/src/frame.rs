use serde::Serialize;

use crate::band::BandValues;
use crate::config::WindowFunction;

/// Remap a logical index in `0..width` onto a buffer of `len` samples.
///
/// `round(index * len / width)`, clamped to the last sample. Lets a
/// consumer address the buffer at any resolution without resampling.
///
/// # Example
/// ```
/// use eeg_core::frame::remap_index;
/// assert_eq!(remap_index(0, 840, 1024), 0);
/// assert_eq!(remap_index(420, 840, 1024), 512);
/// assert_eq!(remap_index(839, 840, 1024), 1023);
/// ```
#[inline]
#[must_use]
pub fn remap_index(index: usize, width: usize, len: usize) -> usize {
    debug_assert!(width > 0, "logical width must be > 0");
    if len == 0 {
        return 0;
    }
    let mapped = (index as f64 * len as f64 / width.max(1) as f64).round() as usize;
    mapped.min(len - 1)
}

/// The two advisory artifact flags of a frame. Recomputed every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactFlags {
    /// Some sample is off-scale (saturation, motion).
    pub absolute: bool,
    /// Some sample-to-sample jump dwarfs the frame's mean level (blink).
    pub average: bool,
}

impl ArtifactFlags {
    /// Neither flag set: the frame may update the running averages.
    #[inline]
    #[must_use]
    pub fn is_good(self) -> bool {
        !self.absolute && !self.average
    }
}

/// Everything one call to the pipeline produces.
///
/// Écrit par le thread d'analyse, lu par le thread de rendu.
#[derive(Clone, Debug, Default)]
pub struct FrameResult {
    /// Value of the frame counter when this frame was processed.
    pub frame_index: u64,
    /// Time-domain snapshot, N samples, oldest first.
    pub samples: Vec<f32>,
    /// Magnitude per bin, N/2 bins.
    pub spectrum: Vec<f32>,
    /// Smoothed band values (running-average means).
    pub bands: BandValues,
    /// This frame's scaled band powers, before smoothing.
    pub raw_bands: BandValues,
    /// Artifact flags of this frame.
    pub flags: ArtifactFlags,
    /// Window function the transform used.
    pub window_function: WindowFunction,
    /// Total degenerate band ranges clamped since the session started.
    pub degenerate_hits: u64,
}

impl FrameResult {
    /// Sample at logical `index` of a `width`-wide view. 0.0 when empty.
    ///
    /// # Example
    /// ```
    /// use eeg_core::frame::FrameResult;
    /// let frame = FrameResult { samples: vec![0.0, 1.0, 2.0, 3.0], ..FrameResult::default() };
    /// assert_eq!(frame.sample_at(1, 2), 2.0);
    /// ```
    #[must_use]
    pub fn sample_at(&self, index: usize, width: usize) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples[remap_index(index, width, self.samples.len())]
    }

    /// Overwrite `self` with `other`, reusing the sample and spectrum
    /// allocations once their capacities have grown to N and N/2.
    pub fn copy_from(&mut self, other: &FrameResult) {
        self.frame_index = other.frame_index;
        self.samples.clone_from(&other.samples);
        self.spectrum.clone_from(&other.spectrum);
        self.bands = other.bands;
        self.raw_bands = other.raw_bands;
        self.flags = other.flags;
        self.window_function = other.window_function;
        self.degenerate_hits = other.degenerate_hits;
    }
}

/// State of the analysis thread.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AnalysisStatus {
    /// No frame produced yet.
    #[default]
    Starting,
    /// Producing frames.
    Running,
    /// Paused by the user; the last frame is held.
    Paused,
    /// The source failed; the thread has stopped.
    SourceLost(String),
}

/// What the analysis thread publishes through the triple buffer.
#[derive(Clone, Debug, Default)]
pub struct AnalysisSnapshot {
    /// Latest frame.
    pub frame: FrameResult,
    /// Thread state.
    pub status: AnalysisStatus,
}

impl AnalysisSnapshot {
    /// See [`FrameResult::copy_from`].
    pub fn copy_from(&mut self, other: &AnalysisSnapshot) {
        self.frame.copy_from(&other.frame);
        self.status.clone_from(&other.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_identity_when_width_equals_len() {
        for i in 0..64 {
            assert_eq!(remap_index(i, 64, 64), i);
        }
    }

    #[test]
    fn remap_never_points_past_end() {
        for width in [1usize, 3, 840, 1024] {
            for i in 0..width {
                assert!(remap_index(i, width, 1024) < 1024);
            }
        }
        // index beyond the logical width is clamped rather than overflowing
        assert_eq!(remap_index(2000, 840, 1024), 1023);
    }

    #[test]
    fn copy_from_reuses_buffers() {
        let source = FrameResult {
            frame_index: 9,
            samples: vec![1.0; 64],
            spectrum: vec![2.0; 32],
            degenerate_hits: 3,
            ..FrameResult::default()
        };
        let mut target = FrameResult {
            samples: Vec::with_capacity(64),
            spectrum: Vec::with_capacity(32),
            ..FrameResult::default()
        };
        let (samples_ptr, spectrum_ptr) = (target.samples.as_ptr(), target.spectrum.as_ptr());

        target.copy_from(&source);
        assert_eq!(target.frame_index, 9);
        assert_eq!(target.samples, source.samples);
        assert_eq!(target.spectrum, source.spectrum);
        assert_eq!(target.degenerate_hits, 3);
        assert_eq!(target.samples.as_ptr(), samples_ptr);
        assert_eq!(target.spectrum.as_ptr(), spectrum_ptr);
    }

    #[test]
    fn good_frame_needs_both_flags_clear() {
        assert!(ArtifactFlags::default().is_good());
        assert!(!ArtifactFlags { absolute: true, average: false }.is_good());
        assert!(!ArtifactFlags { absolute: false, average: true }.is_good());
    }
}
