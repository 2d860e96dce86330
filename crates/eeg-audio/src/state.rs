use std::thread;
use std::time::{Duration, Instant};

use eeg_core::config::WindowFunction;
use eeg_core::frame::{AnalysisSnapshot, AnalysisStatus};
use eeg_core::traits::SampleSource;
use triple_buffer::TripleBuffer;

use crate::pipeline::Pipeline;

/// Commandes interactives pour le thread d'analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisCommand {
    SetWindow(WindowFunction),
    ToggleWindow,
    Pause,
    Resume,
    Quit,
}

/// Spawn the analysis thread: one frame per `1 / target_fps` seconds.
///
/// The latest [`AnalysisSnapshot`] is published through a triple buffer, so
/// the renderer never waits on analysis. The thread stops on
/// [`AnalysisCommand::Quit`], when every command sender is dropped, or when the
/// source is lost (after publishing [`AnalysisStatus::SourceLost`]).
///
/// # Errors
/// Returns an error if the OS refuses to spawn the thread.
pub fn spawn_analysis_thread(
    pipeline: Pipeline,
    source: Box<dyn SampleSource>,
    cmd_rx: flume::Receiver<AnalysisCommand>,
) -> anyhow::Result<(triple_buffer::Output<AnalysisSnapshot>, thread::JoinHandle<()>)> {
    let (mut buf_input, buf_output) = TripleBuffer::new(&AnalysisSnapshot::default()).split();

    let handle = thread::Builder::new()
        .name("eeg-analysis".to_string())
        .spawn(move || {
            let mut pipeline = pipeline;
            let mut source = source;
            run_analysis_loop(&mut pipeline, source.as_mut(), &mut buf_input, &cmd_rx);
        })?;

    Ok((buf_output, handle))
}

/// Core analysis loop. Returns when asked to quit or when the source is lost.
pub fn run_analysis_loop(
    pipeline: &mut Pipeline,
    source: &mut dyn SampleSource,
    buf_input: &mut triple_buffer::Input<AnalysisSnapshot>,
    cmd_rx: &flume::Receiver<AnalysisCommand>,
) {
    let fps = pipeline.config().target_fps.max(1);
    let frame_period = Duration::from_secs_f64(1.0 / f64::from(fps));
    let mut snapshot = AnalysisSnapshot::default();
    let mut paused = false;

    loop {
        let frame_start = Instant::now();

        loop {
            match cmd_rx.try_recv() {
                Ok(AnalysisCommand::SetWindow(window)) => pipeline.set_window_function(window),
                Ok(AnalysisCommand::ToggleWindow) => {
                    let window = pipeline.window_function().toggled();
                    pipeline.set_window_function(window);
                }
                Ok(AnalysisCommand::Pause) => paused = true,
                Ok(AnalysisCommand::Resume) => paused = false,
                Ok(AnalysisCommand::Quit) | Err(flume::TryRecvError::Disconnected) => {
                    log::debug!("analysis thread: arrêt après {} frames", pipeline.frame_counter());
                    return;
                }
                Err(flume::TryRecvError::Empty) => break,
            }
        }

        if paused {
            snapshot.status = AnalysisStatus::Paused;
        } else if let Err(e) = pipeline.pull_into(source, &mut snapshot.frame) {
            log::error!("Source perdue : {e}");
            snapshot.status = AnalysisStatus::SourceLost(e.to_string());
            publish(buf_input, &snapshot);
            return;
        } else {
            snapshot.status = AnalysisStatus::Running;
        }
        publish(buf_input, &snapshot);

        if let Some(rest) = frame_period.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }
}

/// Copy into the back buffer in place; the frame vectors keep their capacity.
fn publish(buf_input: &mut triple_buffer::Input<AnalysisSnapshot>, snapshot: &AnalysisSnapshot) {
    buf_input.input_buffer_mut().copy_from(snapshot);
    buf_input.publish();
}
