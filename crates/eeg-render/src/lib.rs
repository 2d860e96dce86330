/// TUI rendering for eegscope.
///
/// Provides the waveform trace, layout, panels and FPS tracking.
pub mod fps;
pub mod trace;
pub mod ui;
