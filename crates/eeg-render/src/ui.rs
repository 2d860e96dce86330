use eeg_core::band::{BAND_COUNT, Band};
use eeg_core::bins::BinMapper;
use eeg_core::frame::{AnalysisSnapshot, AnalysisStatus, FrameResult};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Sparkline};

use crate::fps::FpsCounter;
use crate::trace;

/// Application state enum (mirrored for rendering decisions).
///
/// # Example
/// ```
/// use eeg_render::ui::RenderState;
/// let state = RenderState::Running;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderState {
    /// Normal running state.
    Running,
    /// Analysis paused, last frame held.
    Paused,
    /// Help overlay visible.
    Help,
    /// Quitting (should not reach draw).
    Quitting,
}

/// Session facts the panels need besides the snapshot itself.
#[derive(Clone, Debug)]
pub struct SessionInfo {
    /// Human-readable source ("micro", file name, "sine 10Hz").
    pub source_label: String,
    pub sample_rate: u32,
    pub buffer_len: usize,
    pub scale_factor: f32,
    /// Upper bound of the highest band; the spectrum is shown up to here.
    pub max_band_hz: f32,
    /// Vertical gain of the waveform trace.
    pub waveform_gain: f32,
}

impl SessionInfo {
    /// Bins displayed by the spectrum panel: up to the highest band, inclusive.
    ///
    /// # Example
    /// ```
    /// use eeg_render::ui::SessionInfo;
    /// let info = SessionInfo {
    ///     source_label: "sine".into(),
    ///     sample_rate: 256,
    ///     buffer_len: 1024,
    ///     scale_factor: 1.0,
    ///     max_band_hz: 30.0,
    ///     waveform_gain: 1.0,
    /// };
    /// assert_eq!(info.spectrum_bins(512), 121);
    /// ```
    #[must_use]
    pub fn spectrum_bins(&self, available: usize) -> usize {
        let mapper = BinMapper::new(self.sample_rate, self.buffer_len, self.scale_factor);
        (mapper.hz_to_bin(self.max_band_hz) + 1).min(available)
    }
}

const BAND_COLORS: [Color; BAND_COUNT] = [
    Color::Magenta,
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::LightRed,
    Color::Red,
];

/// Draw the full UI: waveform + spectrum + bands, status sidebar.
pub fn draw(
    frame: &mut Frame,
    snapshot: &AnalysisSnapshot,
    info: &SessionInfo,
    fps_counter: &FpsCounter,
    state: &RenderState,
) {
    let area = frame.area();

    // Horizontal split: [plots | sidebar(26)]
    let h_chunks = Layout::horizontal([Constraint::Min(40), Constraint::Length(26)]).split(area);

    // Vertical split of the left panel: [waveform | spectrum(6) | bands(10)]
    let v_chunks = Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(6),
        Constraint::Length(10),
    ])
    .split(h_chunks[0]);

    draw_waveform(frame, v_chunks[0], &snapshot.frame, info);
    draw_spectrum(frame, v_chunks[1], &snapshot.frame, info);
    draw_bands(frame, v_chunks[2], &snapshot.frame);
    draw_sidebar(frame, h_chunks[1], snapshot, info, fps_counter, state);

    if *state == RenderState::Help {
        draw_help_overlay(frame, area);
    }
}

/// Time-domain trace, border red while the frame is rejected.
fn draw_waveform(frame: &mut Frame, area: Rect, result: &FrameResult, info: &SessionInfo) {
    let border = if result.flags.is_good() {
        Color::DarkGray
    } else {
        Color::Red
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" Signal ({} éch.) ", result.samples.len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    trace::render_trace(
        frame.buffer_mut(),
        inner,
        result,
        info.waveform_gain,
        Color::Cyan,
    );
}

/// Per-column spectrum heights, 0..=100, max over each column's bins.
///
/// # Example
/// ```
/// use eeg_render::ui::spectrum_columns;
/// assert_eq!(spectrum_columns(&[0.0, 2.0, 1.0, 0.5], 4, 2), vec![100, 50]);
/// ```
#[must_use]
pub fn spectrum_columns(spectrum: &[f32], bins: usize, width: usize) -> Vec<u64> {
    let shown = &spectrum[..bins.min(spectrum.len())];
    if shown.is_empty() || width == 0 {
        return Vec::new();
    }
    let peak = shown.iter().copied().fold(0.0f32, f32::max);
    let columns = width.min(shown.len());

    (0..columns)
        .map(|c| {
            let start = c * shown.len() / columns;
            let end = ((c + 1) * shown.len() / columns).max(start + 1);
            let m = shown[start..end].iter().copied().fold(0.0f32, f32::max);
            if peak > 0.0 {
                (m / peak * 100.0).round() as u64
            } else {
                0
            }
        })
        .collect()
}

/// Draw the spectrum sparkline up to the highest band.
fn draw_spectrum(frame: &mut Frame, area: Rect, result: &FrameResult, info: &SessionInfo) {
    let bins = info.spectrum_bins(result.spectrum.len());
    let data = spectrum_columns(&result.spectrum, bins, usize::from(area.width));

    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::TOP).title(format!(
            " Spectre 0-{:.0} Hz ({}) ",
            info.max_band_hz,
            result.window_function.label()
        )))
        .data(&data)
        .max(100)
        .style(Style::default().fg(Color::Yellow));

    frame.render_widget(sparkline, area);
}

/// Six coloured bars of the smoothed band values.
fn draw_bands(frame: &mut Frame, area: Rect, result: &FrameResult) {
    let bars: Vec<Bar> = Band::ALL
        .iter()
        .map(|&band| {
            let value = result.bands[band];
            Bar::default()
                .value((value.max(0.0) * 10_000.0) as u64)
                .text_value(format!("{value:.3}"))
                .label(Line::from(band.label()))
                .style(Style::default().fg(BAND_COLORS[band.index()]))
        })
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::TOP).title(" Bandes "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(1);

    frame.render_widget(chart, area);
}

fn flag_span(label: &'static str, raised: bool) -> Line<'static> {
    let (text, color) = if raised {
        ("BAD", Color::Red)
    } else {
        ("GOOD", Color::Green)
    };
    Line::from(vec![
        Span::raw(format!(" {label}: ")),
        Span::styled(text, Style::default().fg(color)),
    ])
}

/// Draw the status sidebar with all live values.
fn draw_sidebar(
    frame: &mut Frame,
    area: Rect,
    snapshot: &AnalysisSnapshot,
    info: &SessionInfo,
    fps_counter: &FpsCounter,
    state: &RenderState,
) {
    let result = &snapshot.frame;

    let (state_str, state_color) = match (&snapshot.status, state) {
        (AnalysisStatus::SourceLost(_), _) => ("✖ SOURCE PERDUE", Color::Red),
        (AnalysisStatus::Starting, _) => ("… DÉMARRAGE", Color::Yellow),
        (_, RenderState::Paused) | (AnalysisStatus::Paused, _) => ("⏸ PAUSE", Color::Yellow),
        (_, RenderState::Help) => ("? HELP", Color::Green),
        (_, RenderState::Quitting) => ("⏹ QUIT", Color::DarkGray),
        (_, RenderState::Running) => ("▶ RUN", Color::Green),
    };

    let mut lines = vec![Line::from(Span::styled(
        state_str,
        Style::default().fg(state_color),
    ))];
    if let AnalysisStatus::SourceLost(reason) = &snapshot.status {
        lines.push(Line::from(Span::styled(
            format!(" {reason}"),
            Style::default().fg(Color::Red),
        )));
    }

    lines.extend([
        Line::from(""),
        Line::from(Span::styled("─ Frame ───", Style::default().fg(Color::Yellow))),
        Line::from(format!(" #: {}", result.frame_index)),
        Line::from(format!(" Window: {}", result.window_function.label())),
        flag_span("ABS", result.flags.absolute),
        flag_span("AVG", result.flags.average),
        Line::from(format!(" Degen: {}", result.degenerate_hits)),
        Line::from(""),
        Line::from(Span::styled("─ Bands ───", Style::default().fg(Color::Yellow))),
    ]);

    let dominant = result.bands.dominant();
    for (band, value) in result.bands.iter() {
        let marker = if dominant == Some(band) { "◆" } else { " " };
        lines.push(Line::from(Span::styled(
            format!("{marker}{:<6} {value:>9.4}", band.label()),
            Style::default().fg(BAND_COLORS[band.index()]),
        )));
    }

    lines.extend([
        Line::from(""),
        Line::from(Span::styled("─ Info ────", Style::default().fg(Color::Yellow))),
        Line::from(format!(" {}", info.source_label)),
        Line::from(format!(
            " {} Hz, N={}",
            info.sample_rate, info.buffer_len
        )),
        Line::from(format!(
            " {:.3} Hz/bin",
            info.sample_rate as f32 / info.buffer_len.max(1) as f32
        )),
        Line::from(format!(" {:.0} FPS", fps_counter.fps())),
        Line::from(format!(" {:.0} frames/s", fps_counter.analysis_fps())),
        Line::from(format!(" {:.1}ms", fps_counter.frame_time_ms)),
        Line::from(""),
        Line::from(Span::styled(" ? = help", Style::default().fg(Color::DarkGray))),
    ]);

    let sidebar =
        Paragraph::new(lines).block(Block::default().borders(Borders::LEFT).title(" Status "));

    frame.render_widget(sidebar, area);
}

/// Draw the help overlay with all keybindings.
fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            " eegscope : commandes ",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(" q/Esc    Quit"),
        Line::from(" Space    Pause/Resume"),
        Line::from(" w        Hamming / None"),
        Line::from(" ?        Toggle help"),
        Line::from(""),
        Line::from(Span::styled(
            " Press ? or Esc to close ",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_width = 32u16;
    let help_height = help_text.len() as u16 + 2;
    let x = area.x + area.width.saturating_sub(help_width) / 2;
    let y = area.y + area.height.saturating_sub(help_height) / 2;
    let help_area = Rect::new(x, y, help_width, help_height).intersection(area);

    let help = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::default().bg(Color::Black).fg(Color::White)),
    );

    frame.render_widget(Clear, help_area);
    frame.render_widget(help, help_area);
}

#[cfg(test)]
mod tests {
    use eeg_core::band::BandValues;
    use eeg_core::frame::ArtifactFlags;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn info() -> SessionInfo {
        SessionInfo {
            source_label: "sine 10Hz".into(),
            sample_rate: 256,
            buffer_len: 1024,
            scale_factor: 1.0,
            max_band_hz: 30.0,
            waveform_gain: 1.0,
        }
    }

    fn render(snapshot: &AnalysisSnapshot, state: &RenderState) -> String {
        let mut terminal =
            Terminal::new(TestBackend::new(100, 40)).unwrap_or_else(|e| panic!("{e}"));
        let fps = FpsCounter::new(10);
        terminal
            .draw(|f| draw(f, snapshot, &info(), &fps, state))
            .unwrap_or_else(|e| panic!("{e}"));
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    fn snapshot(flags: ArtifactFlags) -> AnalysisSnapshot {
        let mut bands = BandValues::default();
        bands[Band::Alpha] = 0.25;
        AnalysisSnapshot {
            frame: FrameResult {
                frame_index: 42,
                samples: (0..1024).map(|i| (i as f32 * 0.1).sin()).collect(),
                spectrum: vec![0.01; 512],
                bands,
                flags,
                ..FrameResult::default()
            },
            status: AnalysisStatus::Running,
        }
    }

    #[test]
    fn status_panel_reports_flags() {
        let text = render(
            &snapshot(ArtifactFlags {
                absolute: true,
                average: false,
            }),
            &RenderState::Running,
        );
        assert!(text.contains("ABS: BAD"));
        assert!(text.contains("AVG: GOOD"));
        assert!(text.contains("#: 42"));
        assert!(text.contains("◆Alpha"));
    }

    #[test]
    fn lost_source_is_shown() {
        let mut snap = snapshot(ArtifactFlags::default());
        snap.status = AnalysisStatus::SourceLost("câble".into());
        let text = render(&snap, &RenderState::Running);
        assert!(text.contains("SOURCE PERDUE"));
        assert!(text.contains("câble"));
    }

    #[test]
    fn help_overlay_lists_keys() {
        let text = render(&snapshot(ArtifactFlags::default()), &RenderState::Help);
        assert!(text.contains("Pause/Resume"));
        assert!(text.contains("Hamming / None"));
    }

    #[test]
    fn spectrum_extent_follows_the_band_mapping() {
        let config = eeg_core::config::PipelineConfig::default();
        let mapper = config.bin_mapper();
        let info = SessionInfo {
            sample_rate: config.sample_rate,
            buffer_len: config.buffer_len,
            scale_factor: config.scale_factor,
            ..info()
        };
        // same bin the high-beta range ends on, inclusive
        assert_eq!(info.spectrum_bins(8192), mapper.hz_to_bin(30.0) + 1);
        assert_eq!(info.spectrum_bins(4), 4);
    }

    #[test]
    fn spectrum_columns_pool_by_max() {
        let spectrum = [0.0, 1.0, 4.0, 2.0, 8.0, 0.0];
        assert_eq!(spectrum_columns(&spectrum, 6, 3), vec![13, 50, 100]);
        // fewer bins than columns: one column per bin
        assert_eq!(spectrum_columns(&spectrum, 2, 10), vec![0, 100]);
        assert!(spectrum_columns(&[0.0; 4], 4, 4).iter().all(|&v| v == 0));
    }
}
