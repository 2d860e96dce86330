use eeg_core::frame::FrameResult;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Row of each column of a `width` x `height` trace of the frame's samples.
///
/// Column `x` shows [`FrameResult::sample_at`]`(x, width)`; `gain`
/// maps a sample of `1.0 / gain` onto the top row. Values beyond the area
/// are pinned to the first or last row.
///
/// # Example
/// ```
/// use eeg_core::frame::FrameResult;
/// use eeg_render::trace::trace_rows;
/// let frame = FrameResult { samples: vec![0.0, 1.0, -1.0, 0.0], ..FrameResult::default() };
/// let rows = trace_rows(&frame, 4, 5, 1.0);
/// assert_eq!(rows, vec![2, 0, 4, 2]);
/// ```
#[must_use]
pub fn trace_rows(frame: &FrameResult, width: u16, height: u16, gain: f32) -> Vec<u16> {
    if frame.samples.is_empty() || width == 0 || height == 0 {
        return Vec::new();
    }
    let last_row = f32::from(height - 1);
    let mid = last_row / 2.0;
    (0..width)
        .map(|x| {
            let s = frame.sample_at(usize::from(x), usize::from(width));
            (mid - s * gain * mid).round().clamp(0.0, last_row) as u16
        })
        .collect()
}

/// Écrit la trace temporelle directement dans un `ratatui::Buffer`.
///
/// Adjacent columns are joined with vertical strokes so fast transitions
/// stay continuous.
pub fn render_trace(buf: &mut Buffer, area: Rect, frame: &FrameResult, gain: f32, color: Color) {
    let rows = trace_rows(frame, area.width, area.height, gain);
    let mut prev: Option<u16> = None;

    for (x, &row) in rows.iter().enumerate() {
        let buf_x = area.x + x as u16;
        let (from, to) = match prev {
            Some(p) if p < row => (p + 1, row),
            Some(p) if p > row => (row, p - 1),
            _ => (row, row),
        };
        for y in from..=to {
            if let Some(cell) = buf.cell_mut((buf_x, area.y + y)) {
                cell.set_char(if y == row { '•' } else { '│' }).set_fg(color);
            }
        }
        prev = Some(row);
    }
}
