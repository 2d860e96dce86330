use eeg_core::frame::remap_index;

/// Fixed-capacity time-domain window.
///
/// Holds the most recent N samples, replaced wholesale each frame. Index 0
/// is the oldest sample, N-1 the newest. Pre-allocated, never resized.
///
/// # Example
/// ```
/// use eeg_audio::buffer::SampleBuffer;
/// let mut buf = SampleBuffer::new(4);
/// buf.refresh(&[1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(buf.get(1, 2), 3.0);
/// ```
pub struct SampleBuffer {
    samples: Vec<f32>,
}

impl SampleBuffer {
    /// Create a zero-filled buffer of `len` samples.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    /// Replace the contents with `block`.
    ///
    /// A block shorter than N is right-aligned (its last sample becomes the
    /// newest) and the head is zeroed; a longer block keeps its last N samples.
    pub fn refresh(&mut self, block: &[f32]) {
        let n = self.samples.len();
        if block.len() >= n {
            self.samples.copy_from_slice(&block[block.len() - n..]);
        } else {
            let pad = n - block.len();
            self.samples[..pad].fill(0.0);
            self.samples[pad..].copy_from_slice(block);
        }
    }

    /// Sample at logical `index` of a `requested_width`-wide view.
    ///
    /// `round(index * N / requested_width)`, clamped to N-1.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize, requested_width: usize) -> f32 {
        self.samples[remap_index(index, requested_width, self.samples.len())]
    }

    /// Copy a `width`-sample view into `out` (cleared first).
    pub fn view_into(&self, width: usize, out: &mut Vec<f32>) {
        out.clear();
        out.extend((0..width).map(|i| self.get(i, width)));
    }

    /// All N samples, oldest first.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// Buffer length N.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` for a zero-length buffer.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
