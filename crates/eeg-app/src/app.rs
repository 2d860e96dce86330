use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use eeg_audio::state::AnalysisCommand;
use eeg_core::frame::{AnalysisSnapshot, AnalysisStatus};
use eeg_render::fps::FpsCounter;
use eeg_render::ui::{self, RenderState, SessionInfo};
use ratatui::DefaultTerminal;

/// Application state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Running,
    Paused,
    Help,
    Quitting,
}

/// Boucle principale : lit les snapshots d'analyse, dessine, traite le clavier.
pub struct App {
    pub state: AppState,
    output: triple_buffer::Output<AnalysisSnapshot>,
    cmd_tx: flume::Sender<AnalysisCommand>,
    info: SessionInfo,
    fps_counter: FpsCounter,
    /// Redraw rate of the terminal.
    target_fps: u32,
    /// Paused before the help overlay opened.
    paused_under_help: bool,
}

impl App {
    #[must_use]
    pub fn new(
        output: triple_buffer::Output<AnalysisSnapshot>,
        cmd_tx: flume::Sender<AnalysisCommand>,
        info: SessionInfo,
        target_fps: u32,
    ) -> Self {
        Self {
            state: AppState::Running,
            output,
            cmd_tx,
            info,
            fps_counter: FpsCounter::new(60),
            target_fps: target_fps.max(1),
            paused_under_help: false,
        }
    }

    /// Main event loop.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / f64::from(self.target_fps));
        let mut last_frame = Instant::now();
        let mut lost_logged = false;

        loop {
            if self.state == AppState::Quitting {
                break;
            }

            let elapsed = last_frame.elapsed();
            if elapsed < frame_duration {
                // Dormir le temps restant, mais rester réactif aux événements
                if event::poll(frame_duration.saturating_sub(elapsed))? {
                    self.handle_event(&event::read()?);
                }
                continue;
            }
            last_frame = Instant::now();

            while event::poll(Duration::ZERO)? {
                self.handle_event(&event::read()?);
            }

            let render_state = self.render_state();
            let snapshot = self.output.read();
            if let AnalysisStatus::SourceLost(reason) = &snapshot.status
                && !lost_logged
            {
                log::error!("Analyse arrêtée : {reason}");
                lost_logged = true;
            }
            self.fps_counter.observe_frame(snapshot.frame.frame_index);

            terminal.draw(|f| {
                ui::draw(f, snapshot, &self.info, &self.fps_counter, &render_state);
            })?;
            self.fps_counter.tick();
        }

        Ok(())
    }

    fn render_state(&self) -> RenderState {
        match self.state {
            AppState::Running => RenderState::Running,
            AppState::Paused => RenderState::Paused,
            AppState::Help => RenderState::Help,
            AppState::Quitting => RenderState::Quitting,
        }
    }

    /// Handle a terminal event.
    pub fn handle_event(&mut self, event: &Event) {
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = *event
        {
            if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                self.quit();
                return;
            }
            self.handle_key(code);
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Esc => {
                if self.state == AppState::Help {
                    self.close_help();
                } else {
                    self.quit();
                }
            }
            KeyCode::Char('?') => {
                if self.state == AppState::Help {
                    self.close_help();
                } else {
                    self.paused_under_help = self.state == AppState::Paused;
                    self.state = AppState::Help;
                }
            }
            KeyCode::Char(' ') => {
                if self.state == AppState::Paused {
                    self.send(AnalysisCommand::Resume);
                    self.state = AppState::Running;
                } else if self.state == AppState::Running {
                    self.send(AnalysisCommand::Pause);
                    self.state = AppState::Paused;
                }
            }
            KeyCode::Char('w') => self.send(AnalysisCommand::ToggleWindow),
            _ => {}
        }
    }

    fn close_help(&mut self) {
        self.state = if self.paused_under_help {
            AppState::Paused
        } else {
            AppState::Running
        };
    }

    fn quit(&mut self) {
        self.state = AppState::Quitting;
        self.send(AnalysisCommand::Quit);
    }

    /// The analysis thread may already be gone (source lost); nothing to do then.
    fn send(&self, cmd: AnalysisCommand) {
        if self.cmd_tx.try_send(cmd).is_err() {
            log::debug!("commande ignorée, thread d'analyse arrêté : {cmd:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use triple_buffer::TripleBuffer;

    use super::*;

    fn app() -> (App, flume::Receiver<AnalysisCommand>) {
        let (_input, output) = TripleBuffer::new(&AnalysisSnapshot::default()).split();
        let (tx, rx) = flume::unbounded();
        let info = SessionInfo {
            source_label: "test".into(),
            sample_rate: 256,
            buffer_len: 1024,
            scale_factor: 1.0,
            max_band_hz: 30.0,
            waveform_gain: 0.5,
        };
        (App::new(output, tx, info, 30), rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(&Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn space_pauses_and_resumes_analysis() {
        let (mut app, rx) = app();
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.state, AppState::Paused);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.state, AppState::Running);
        assert_eq!(
            rx.drain().collect::<Vec<_>>(),
            vec![AnalysisCommand::Pause, AnalysisCommand::Resume]
        );
    }

    #[test]
    fn w_toggles_the_window() {
        let (mut app, rx) = app();
        press(&mut app, KeyCode::Char('w'));
        assert_eq!(rx.try_recv().ok(), Some(AnalysisCommand::ToggleWindow));
    }

    #[test]
    fn help_restores_the_previous_state() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state, AppState::Help);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Paused);
    }

    #[test]
    fn quit_stops_the_analysis_thread() {
        let (mut app, rx) = app();
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.state, AppState::Quitting);
        assert_eq!(rx.try_recv().ok(), Some(AnalysisCommand::Quit));
    }

    #[test]
    fn commands_after_the_thread_died_are_ignored() {
        let (mut app, rx) = app();
        drop(rx);
        press(&mut app, KeyCode::Char('w'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Quitting);
    }
}
