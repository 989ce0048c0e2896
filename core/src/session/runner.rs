use crate::interface::{Frame, RawDetection};
use crate::prelude::{DashResult, Detector, FrameSource};
use crate::session::config::SessionConfig;
use crate::session::control::ControlAction;
use crate::session::handle::{SessionCommand, SessionHandle};
use crate::session::state::{DashboardModel, DashboardState, SessionStatus};
use crate::telemetry::{LogManager, MetricsRecorder};
use ab_glyph::FontArc;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

/// What a single detect → aggregate → render cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Live batch drawn; carries the batch size.
    Rendered(usize),
    /// Batch appended to history while playback was paused.
    Recorded(usize),
    Paused,
    NotReady,
    NotLoaded,
    DetectorError,
}

/// Everything the loop mutates apart from the detector and the camera, so
/// commands can be served while a detection is pending.
struct SessionCore {
    config: SessionConfig,
    state: DashboardState,
    status: watch::Sender<SessionStatus>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
    font: Option<FontArc>,
}

impl SessionCore {
    fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    fn is_ready(&self) -> bool {
        self.status.borrow().is_ready()
    }

    fn set_status(&self, status: SessionStatus) {
        self.status.send_replace(status);
    }

    fn finish_load(&self, result: DashResult<()>) -> DashResult<()> {
        match &result {
            Ok(()) => {
                self.set_status(SessionStatus::Ready);
                self.logger.record("detector loaded");
            }
            Err(err) => {
                self.set_status(SessionStatus::Failed(err.to_string()));
                self.logger.warn(&format!("detector failed to load: {}", err));
            }
        }
        result
    }

    /// Captures the frame for this tick, or says why the tick is skipped.
    fn begin_tick<F: FrameSource>(&self, source: &mut F) -> Result<Frame, TickOutcome> {
        if !self.is_ready() {
            return Err(TickOutcome::NotLoaded);
        }
        if !self.state.playback().is_live() && !self.config.record_while_paused {
            self.metrics.record_paused();
            return Err(TickOutcome::Paused);
        }

        let (width, height) = source.dimensions();
        let frame = if source.is_ready() && width > 0 && height > 0 {
            source.capture().filter(|frame| !frame.is_empty())
        } else {
            None
        };
        frame.ok_or_else(|| {
            self.metrics.record_not_ready();
            self.logger.trace_tick("frame source not ready, tick skipped");
            TickOutcome::NotReady
        })
    }

    fn finish_tick(&mut self, frame: Frame, result: DashResult<Vec<RawDetection>>) -> TickOutcome {
        match result {
            Ok(batch) => {
                let count = batch.len();
                self.metrics.record_tick(count);
                self.logger
                    .trace_tick(&format!("{} detections this tick", count));
                if self.state.playback().is_live() {
                    self.state.record_live(frame, batch);
                    TickOutcome::Rendered(count)
                } else {
                    self.state.record_background(batch, frame.captured_at());
                    TickOutcome::Recorded(count)
                }
            }
            Err(err) => {
                self.metrics.record_error();
                self.logger.warn(&format!("detection failed: {}", err));
                TickOutcome::DetectorError
            }
        }
    }

    fn snapshot(&self) -> DashboardModel {
        self.state.snapshot(self.status(), self.metrics.snapshot())
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Control(action, reply) => {
                let _ = reply.send(self.state.apply(action));
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::ExportCsv(reply) => {
                let _ = reply.send(self.state.export_csv());
            }
            SessionCommand::ExportHeatmap(reply) => {
                let _ = reply.send(self.state.export_heatmap(self.font.as_ref()));
            }
            SessionCommand::FramePreview(reply) => {
                let _ = reply.send(self.state.frame_preview());
            }
        }
    }
}

/// A dashboard session: one detector, one camera, one history.
///
/// Drive it by hand with [`Session::load`] and [`Session::tick`], or hand it
/// to a tokio runtime with [`Session::spawn`].
pub struct Session<D, F> {
    detector: D,
    source: F,
    core: SessionCore,
}

impl<D: Detector, F: FrameSource> Session<D, F> {
    pub fn new(detector: D, source: F, config: SessionConfig) -> Self {
        let (width, height) = source.dimensions();
        let (status, _) = watch::channel(SessionStatus::Loading);
        Self {
            detector,
            source,
            core: SessionCore {
                config,
                state: DashboardState::new(width, height),
                status,
                metrics: Arc::new(MetricsRecorder::new()),
                logger: LogManager::new("session"),
                font: None,
            },
        }
    }

    /// Font for label glyphs in PNG exports.
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.core.font = Some(font);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.core.config
    }

    pub fn state(&self) -> &DashboardState {
        &self.core.state
    }

    pub fn status(&self) -> SessionStatus {
        self.core.status()
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.core.metrics.clone()
    }

    pub fn snapshot(&self) -> DashboardModel {
        self.core.snapshot()
    }

    pub fn apply(&mut self, action: ControlAction) -> DashResult<()> {
        self.core.state.apply(action)
    }

    pub fn export_csv(&self) -> DashResult<Vec<u8>> {
        self.core.state.export_csv()
    }

    pub fn export_heatmap(&self) -> DashResult<Vec<u8>> {
        self.core.state.export_heatmap(self.core.font.as_ref())
    }

    /// One-time model setup gating the first tick.
    pub async fn load(&mut self) -> DashResult<()> {
        let result = self.detector.load().await;
        self.core.finish_load(result)
    }

    pub async fn tick(&mut self) -> TickOutcome {
        let frame = match self.core.begin_tick(&mut self.source) {
            Ok(frame) => frame,
            Err(outcome) => return outcome,
        };
        let result = self
            .detector
            .detect(&frame, self.core.config.min_confidence)
            .await;
        self.core.finish_tick(frame, result)
    }

    /// Starts the periodic loop on the current tokio runtime.
    pub fn spawn(self) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(self.core.config.command_buffer.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let status = self.core.status.subscribe();
        let metrics = self.core.metrics.clone();
        let task = tokio::spawn(self.run(commands_rx, shutdown_rx));
        SessionHandle::new(commands_tx, status, metrics, shutdown_tx, task)
    }

    async fn run(
        self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let Session {
            mut detector,
            mut source,
            mut core,
        } = self;

        let loaded = {
            let load = detector.load();
            tokio::pin!(load);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => {
                        core.set_status(SessionStatus::Stopped);
                        core.logger.record("session stopped while loading");
                        return;
                    }
                    result = &mut load => break result,
                    Some(command) = commands.recv() => core.handle(command),
                }
            }
        };
        let _ = core.finish_load(loaded);

        // Ticks that fire while a detection is pending are dropped, so at
        // most one detector call is ever outstanding.
        let mut ticker = interval(core.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        'session: loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break 'session,
                Some(command) = commands.recv() => core.handle(command),
                _ = ticker.tick(), if core.is_ready() => {
                    let Ok(frame) = core.begin_tick(&mut source) else {
                        continue 'session;
                    };
                    let (result, stopping) = {
                        let detect = detector.detect(&frame, core.config.min_confidence);
                        tokio::pin!(detect);
                        let mut stopping = false;
                        let result = loop {
                            tokio::select! {
                                biased;
                                _ = shutdown.changed(), if !stopping => stopping = true,
                                result = &mut detect => break result,
                                Some(command) = commands.recv() => core.handle(command),
                            }
                        };
                        (result, stopping)
                    };
                    if stopping {
                        core.logger.record("detection resolved after stop, result discarded");
                        break 'session;
                    }
                    core.finish_tick(frame, result);
                }
            }
        }

        core.set_status(SessionStatus::Stopped);
        core.logger.record("session stopped");
    }
}
