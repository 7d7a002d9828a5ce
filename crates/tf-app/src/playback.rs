use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tf_core::config::{FALLBACK_FPS, PlaybackConfig, clamp_fps};
use tf_core::traits::{FrameRead, GridProbe, RasterSource};
use tf_render::fps::FpsCounter;
use tf_render::pacing::{PacingController, Sleeper, frame_interval};
use tf_render::screen::ScreenWriter;

use crate::pipeline::FramePipeline;

/// Demande d'arrêt partagée avec le handler Ctrl-C.
#[derive(Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    /// Install the Ctrl-C handler and return the flag it raises.
    ///
    /// # Errors
    /// Returns an error if a handler is already installed.
    pub fn install() -> Result<Self> {
        let flag = Self::default();
        let raised = flag.clone();
        ctrlc::set_handler(move || raised.request())
            .context("Impossible d'installer le handler Ctrl-C")?;
        Ok(flag)
    }

    /// Raise the flag.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// `true` once an interrupt was received.
    #[must_use]
    pub fn requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bilan d'une lecture vidéo.
#[derive(Debug, Default, PartialEq)]
pub struct PlaybackReport {
    /// Frames written to the screen.
    pub frames: u64,
    /// Iterations without frame data.
    pub gaps: u64,
    /// Frames whose rendering failed and were not written.
    pub dropped: u64,
    /// Stopped by an interrupt rather than end-of-stream.
    pub interrupted: bool,
}

/// Target interval: configured override, else the source rate, else the fallback.
///
/// Every rate is clamped to `[MIN_FPS, MAX_FPS]` whatever the source reports.
#[must_use]
pub fn target_interval(config: &PlaybackConfig, native_fps: Option<f64>) -> Duration {
    let fps = config.settings().fps_override.or(native_fps);
    fps.and_then(clamp_fps).and_then(frame_interval).unwrap_or_else(|| {
        log::warn!("Cadence inexploitable ({fps:?}), repli sur {FALLBACK_FPS} fps");
        Duration::from_secs_f64(1.0 / FALLBACK_FPS)
    })
}

/// Vue image : une seule lecture, un rendu, une écriture. Ni pacing ni retour curseur.
///
/// # Errors
/// Fails if the source yields no frame, or on render/write failure.
pub fn view_image<S, W>(
    source: &mut S,
    config: &PlaybackConfig,
    probe: &dyn GridProbe,
    pipeline: &mut FramePipeline,
    screen: &mut ScreenWriter<W>,
) -> Result<()>
where
    S: RasterSource + ?Sized,
    W: Write,
{
    let raw = loop {
        match source.read_frame()? {
            FrameRead::Frame(raw) => break raw,
            FrameRead::Gap => {}
            FrameRead::EndOfStream => {
                anyhow::bail!("Aucune image décodée depuis {}", config.source())
            }
        }
    };
    let grid = config.resolve_grid(probe.current_size());
    log::debug!("Vue image : grille {}x{}", grid.cols, grid.rows);
    let buffer = pipeline.render(&raw, grid)?;
    pipeline.paint(screen, &buffer)?;
    source.close();
    Ok(())
}

/// Lecture vidéo : Reading → (Skipped | Rendering → Paced) → … → Closed.
///
/// Gaps are skipped without rendering, writing or sleeping. Each rendered
/// frame goes cursor-home then paint, then the pacer sleeps what is left of
/// the interval. Late frames are never dropped to catch up. The source is
/// closed on every exit path.
///
/// # Errors
/// Decoder I/O failures and write failures are fatal.
pub fn play_video<S, W, Z>(
    source: &mut S,
    config: &PlaybackConfig,
    probe: &dyn GridProbe,
    pipeline: &mut FramePipeline,
    screen: &mut ScreenWriter<W>,
    pacer: &mut PacingController<Z>,
    shutdown: &Shutdown,
) -> Result<PlaybackReport>
where
    S: RasterSource + ?Sized,
    W: Write,
    Z: Sleeper,
{
    let mut report = PlaybackReport::default();
    let mut fps = FpsCounter::new(60);
    let result = run_loop(
        source,
        config,
        probe,
        pipeline,
        screen,
        pacer,
        shutdown,
        &mut report,
        &mut fps,
    );
    source.close();

    log::info!(
        "Lecture terminée : {} frames, {} trous, {} abandonnées, {:.2} fps moyens (cible {:.2})",
        report.frames,
        report.gaps,
        report.dropped,
        fps.average_fps(),
        1.0 / pacer.target().as_secs_f64()
    );
    result.map(|()| report)
}

#[allow(clippy::too_many_arguments)]
fn run_loop<S, W, Z>(
    source: &mut S,
    config: &PlaybackConfig,
    probe: &dyn GridProbe,
    pipeline: &mut FramePipeline,
    screen: &mut ScreenWriter<W>,
    pacer: &mut PacingController<Z>,
    shutdown: &Shutdown,
    report: &mut PlaybackReport,
    fps: &mut FpsCounter,
) -> Result<()>
where
    S: RasterSource + ?Sized,
    W: Write,
    Z: Sleeper,
{
    loop {
        if shutdown.requested() {
            log::info!("Interruption reçue, arrêt de la lecture.");
            report.interrupted = true;
            return Ok(());
        }

        // === Reading ===
        pacer.begin_frame();
        let raw = match source.read_frame()? {
            FrameRead::Frame(raw) => raw,
            FrameRead::Gap => {
                report.gaps += 1;
                log::trace!("Pas de frame cette itération, on continue.");
                continue;
            }
            FrameRead::EndOfStream => {
                // Ctrl-C atteint aussi ffmpeg (même groupe de processus) : l'EOF peut précéder le flag.
                if shutdown.requested() {
                    log::info!("Interruption reçue, arrêt de la lecture.");
                    report.interrupted = true;
                }
                return Ok(());
            }
        };

        // === Rendering ===
        // Taille relue à chaque frame : le terminal peut changer entre deux frames.
        let grid = config.resolve_grid(probe.current_size());
        let buffer = match pipeline.render(&raw, grid) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("Frame abandonnée : {e:#}");
                report.dropped += 1;
                continue;
            }
        };
        screen.cursor_home().context("Écriture du retour curseur impossible")?;
        pipeline.paint(screen, &buffer)?;
        report.frames += 1;
        fps.tick();
        if report.frames.is_multiple_of(120) {
            log::debug!("{:.1} fps sur la fenêtre", fps.fps());
        }

        // === Paced ===
        pacer.pace();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tf_core::config::{MAX_FPS, Settings};
    use tf_core::frame::{ChannelOrder, RawFrame, TargetGrid};
    use tf_core::traits::FixedGrid;

    const HOME: &[u8] = b"\x1b[H";

    /// Source scriptée : rejoue une liste de lectures puis signale la fin.
    struct Scripted {
        reads: VecDeque<FrameRead>,
        fps: Option<f64>,
        reads_done: usize,
        closed: bool,
    }

    impl Scripted {
        fn new(reads: Vec<FrameRead>, fps: Option<f64>) -> Self {
            Self {
                reads: reads.into(),
                fps,
                reads_done: 0,
                closed: false,
            }
        }
    }

    impl RasterSource for Scripted {
        fn read_frame(&mut self) -> Result<FrameRead> {
            self.reads_done += 1;
            Ok(self.reads.pop_front().unwrap_or(FrameRead::EndOfStream))
        }

        fn native_frame_rate(&self) -> Option<f64> {
            self.fps
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<Duration>);

    impl Sleeper for Recorder {
        fn sleep(&mut self, dur: Duration) {
            self.0.push(dur);
        }
    }

    fn frame(px: [u8; 3]) -> FrameRead {
        FrameRead::Frame(RawFrame::from_rows(&vec![vec![px; 4]; 4], ChannelOrder::Bgr).unwrap())
    }

    /// Pas de marge de rangée : la grille sondée 2×2 est rendue telle quelle.
    fn setup() -> (PlaybackConfig, FixedGrid, FramePipeline) {
        let settings = Settings {
            row_headroom: 0,
            ..Settings::default()
        };
        let config = PlaybackConfig::new("scripted", settings, None);
        let probe = FixedGrid(TargetGrid { cols: 2, rows: 2 });
        let pipeline = FramePipeline::new(config.settings());
        (config, probe, pipeline)
    }

    fn count_home(out: &[u8]) -> usize {
        out.windows(HOME.len()).filter(|w| *w == HOME).count()
    }

    #[test]
    fn gaps_are_skipped_without_write_or_sleep() {
        let (config, probe, mut pipeline) = setup();
        let mut source = Scripted::new(
            vec![FrameRead::Gap, FrameRead::Gap, FrameRead::Gap, frame([1, 2, 3])],
            Some(1.0),
        );
        let mut screen = ScreenWriter::new(Vec::new());
        let mut pacer = PacingController::new(Duration::from_secs(1), Recorder::default());

        let report = play_video(
            &mut source,
            &config,
            &probe,
            &mut pipeline,
            &mut screen,
            &mut pacer,
            &Shutdown::default(),
        )
        .unwrap();

        assert_eq!(report.frames, 1);
        assert_eq!(report.gaps, 3);
        assert_eq!(pacer.sleeper().0.len(), 1, "only the rendered frame is paced");
        let out = screen.into_inner();
        assert_eq!(count_home(&out), 1);
        assert!(out.starts_with(HOME));
        assert_eq!(source.reads_done, 5);
        assert!(source.closed);
    }

    #[test]
    fn every_frame_homes_and_paints() {
        let (config, probe, mut pipeline) = setup();
        let mut source = Scripted::new(
            vec![frame([0, 0, 255]), frame([0, 255, 0]), frame([255, 0, 0])],
            Some(1.0),
        );
        let mut screen = ScreenWriter::new(Vec::new());
        let mut pacer = PacingController::new(Duration::from_secs(1), Recorder::default());

        let report = play_video(
            &mut source,
            &config,
            &probe,
            &mut pipeline,
            &mut screen,
            &mut pacer,
            &Shutdown::default(),
        )
        .unwrap();

        assert_eq!(report.frames, 3);
        assert!(!report.interrupted);
        let out = String::from_utf8(screen.into_inner()).unwrap();
        assert_eq!(out.matches("\x1b[H").count(), 3);
        assert_eq!(out.matches('\n').count(), 3 * 2);
        assert!(out.contains("48;2;255;0;0"));
        assert!(out.contains("48;2;0;0;255"));
        for slept in &pacer.sleeper().0 {
            assert!(*slept <= Duration::from_secs(1));
        }
    }

    #[test]
    fn slow_frames_are_not_paced() {
        let (config, probe, mut pipeline) = setup();
        let mut source = Scripted::new(vec![frame([9, 9, 9]), frame([9, 9, 9])], None);
        let mut screen = ScreenWriter::new(Vec::new());
        let mut pacer = PacingController::new(Duration::ZERO, Recorder::default());

        let report = play_video(
            &mut source,
            &config,
            &probe,
            &mut pipeline,
            &mut screen,
            &mut pacer,
            &Shutdown::default(),
        )
        .unwrap();
        assert_eq!(report.frames, 2);
        assert!(pacer.sleeper().0.is_empty());
    }

    #[test]
    fn interrupt_stops_before_next_read() {
        let (config, probe, mut pipeline) = setup();
        let mut source = Scripted::new(vec![frame([1, 1, 1])], Some(24.0));
        let mut screen = ScreenWriter::new(Vec::new());
        let mut pacer = PacingController::new(Duration::from_millis(1), Recorder::default());
        let shutdown = Shutdown::default();
        shutdown.request();

        let report = play_video(
            &mut source,
            &config,
            &probe,
            &mut pipeline,
            &mut screen,
            &mut pacer,
            &shutdown,
        )
        .unwrap();
        assert!(report.interrupted);
        assert_eq!(report.frames, 0);
        assert_eq!(source.reads_done, 0);
        assert!(source.closed);
        assert!(screen.into_inner().is_empty());
    }

    #[test]
    fn single_image_is_one_cycle_without_home() {
        let (config, probe, mut pipeline) = setup();
        let mut source = Scripted::new(vec![frame([10, 20, 30]), frame([0, 0, 0])], None);
        let mut screen = ScreenWriter::new(Vec::new());

        view_image(&mut source, &config, &probe, &mut pipeline, &mut screen).unwrap();

        assert_eq!(source.reads_done, 1);
        let out = String::from_utf8(screen.into_inner()).unwrap();
        assert_eq!(count_home(out.as_bytes()), 0);
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("48;2;30;20;10"));
    }

    #[test]
    fn image_without_frame_is_an_error() {
        let (config, probe, mut pipeline) = setup();
        let mut source = Scripted::new(vec![], None);
        let mut screen = ScreenWriter::new(Vec::new());
        assert!(view_image(&mut source, &config, &probe, &mut pipeline, &mut screen).is_err());
        assert!(screen.into_inner().is_empty());
    }

    #[test]
    fn probed_grid_loses_headroom_rows() {
        let config = PlaybackConfig::new("scripted", Settings::default(), None);
        let probe = FixedGrid(TargetGrid { cols: 3, rows: 4 });
        let mut pipeline = FramePipeline::new(config.settings());
        let mut source = Scripted::new(vec![frame([5, 5, 5]), frame([6, 6, 6])], Some(1.0));
        let mut screen = ScreenWriter::new(Vec::new());
        let mut pacer = PacingController::new(Duration::ZERO, Recorder::default());

        let report = play_video(
            &mut source,
            &config,
            &probe,
            &mut pipeline,
            &mut screen,
            &mut pacer,
            &Shutdown::default(),
        )
        .unwrap();
        assert_eq!(report.frames, 2);
        let out = String::from_utf8(screen.into_inner()).unwrap();
        for painted in out.split("\x1b[H").skip(1) {
            let lines: Vec<&str> = painted.lines().collect();
            assert_eq!(lines.len(), 3);
            assert!(lines.iter().all(|l| l.matches("\x1b[48;2;").count() == 3));
        }
    }

    #[test]
    fn single_image_uses_probed_grid_minus_headroom() {
        let config = PlaybackConfig::new("scripted", Settings::default(), None);
        let probe = FixedGrid(TargetGrid { cols: 2, rows: 3 });
        let mut pipeline = FramePipeline::new(config.settings());
        let mut source = Scripted::new(vec![frame([1, 2, 3])], None);
        let mut screen = ScreenWriter::new(Vec::new());

        view_image(&mut source, &config, &probe, &mut pipeline, &mut screen).unwrap();
        let out = String::from_utf8(screen.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    /// Source dont la fin coïncide avec Ctrl-C : le décodeur meurt avant que le flag soit relu.
    struct KilledWithInterrupt(Shutdown);

    impl RasterSource for KilledWithInterrupt {
        fn read_frame(&mut self) -> Result<FrameRead> {
            self.0.request();
            Ok(FrameRead::EndOfStream)
        }

        fn native_frame_rate(&self) -> Option<f64> {
            Some(25.0)
        }
    }

    #[test]
    fn eof_after_interrupt_is_reported_as_interrupt() {
        let (config, probe, mut pipeline) = setup();
        let shutdown = Shutdown::default();
        let mut source = KilledWithInterrupt(shutdown.clone());
        let mut screen = ScreenWriter::new(Vec::new());
        let mut pacer = PacingController::new(Duration::ZERO, Recorder::default());

        let report = play_video(
            &mut source,
            &config,
            &probe,
            &mut pipeline,
            &mut screen,
            &mut pacer,
            &shutdown,
        )
        .unwrap();
        assert!(report.interrupted);
        assert_eq!(report.frames, 0);
    }

    #[test]
    fn plain_eof_is_not_an_interrupt() {
        let (config, probe, mut pipeline) = setup();
        let mut source = Scripted::new(vec![], Some(25.0));
        let mut screen = ScreenWriter::new(Vec::new());
        let mut pacer = PacingController::new(Duration::ZERO, Recorder::default());
        let report = play_video(
            &mut source,
            &config,
            &probe,
            &mut pipeline,
            &mut screen,
            &mut pacer,
            &Shutdown::default(),
        )
        .unwrap();
        assert!(!report.interrupted);
    }

    #[test]
    fn time_base_rates_are_clamped() {
        let config = PlaybackConfig::new("x", Settings::default(), None);
        let fastest = Duration::from_secs_f64(1.0 / MAX_FPS);
        assert_eq!(target_interval(&config, Some(90_000.0)), fastest);
        assert_eq!(target_interval(&config, Some(1000.0)), fastest);
        assert_eq!(target_interval(&config, Some(0.1)), Duration::from_secs(1));
    }

    #[test]
    fn interval_prefers_override_then_native() {
        let config = PlaybackConfig::new("x", Settings::default(), None);
        assert_eq!(target_interval(&config, Some(25.0)), Duration::from_millis(40));
        let fallback = target_interval(&config, Some(0.0));
        assert!((fallback.as_secs_f64() - 1.0 / FALLBACK_FPS).abs() < 1e-9);

        let settings = Settings {
            fps_override: Some(10.0),
            ..Settings::default()
        };
        let config = PlaybackConfig::new("x", settings, None);
        assert_eq!(target_interval(&config, Some(25.0)), Duration::from_millis(100));
    }
}
