use crate::prelude::{DashResult, DashboardError};
use crate::session::control::ControlAction;
use crate::session::state::{DashboardModel, SessionStatus};
use crate::telemetry::{MetricsRecorder, SessionMetrics};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Requests served by the session loop between ticks.
pub(crate) enum SessionCommand {
    Control(ControlAction, oneshot::Sender<DashResult<()>>),
    Snapshot(oneshot::Sender<DashboardModel>),
    ExportCsv(oneshot::Sender<DashResult<Vec<u8>>>),
    ExportHeatmap(oneshot::Sender<DashResult<Vec<u8>>>),
    FramePreview(oneshot::Sender<DashResult<Vec<u8>>>),
}

/// Cloneable front end to a running session, used by UI surfaces.
#[derive(Clone)]
pub struct SessionClient {
    commands: mpsc::Sender<SessionCommand>,
    status: watch::Receiver<SessionStatus>,
    metrics: Arc<MetricsRecorder>,
}

impl SessionClient {
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.metrics.snapshot()
    }

    /// Resolves once the model has finished loading, successfully or not.
    pub async fn wait_until_loaded(&self) -> SessionStatus {
        let mut status = self.status.clone();
        let loaded = status
            .wait_for(|current| *current != SessionStatus::Loading)
            .await
            .map(|current| current.clone());
        loaded.unwrap_or(SessionStatus::Stopped)
    }

    pub async fn control(&self, action: ControlAction) -> DashResult<()> {
        self.request(|reply| SessionCommand::Control(action, reply))
            .await?
    }

    pub async fn snapshot(&self) -> DashResult<DashboardModel> {
        self.request(SessionCommand::Snapshot).await
    }

    pub async fn export_csv(&self) -> DashResult<Vec<u8>> {
        self.request(SessionCommand::ExportCsv).await?
    }

    pub async fn export_heatmap(&self) -> DashResult<Vec<u8>> {
        self.request(SessionCommand::ExportHeatmap).await?
    }

    pub async fn frame_preview(&self) -> DashResult<Vec<u8>> {
        self.request(SessionCommand::FramePreview).await?
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> DashResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| DashboardError::SessionClosed)?;
        response.await.map_err(|_| DashboardError::SessionClosed)
    }
}

/// Owns the session task; stopping or dropping it ends the loop and its timer.
pub struct SessionHandle {
    client: SessionClient,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<SessionCommand>,
        status: watch::Receiver<SessionStatus>,
        metrics: Arc<MetricsRecorder>,
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            client: SessionClient {
                commands,
                status,
                metrics,
            },
            shutdown,
            task,
        }
    }

    pub fn client(&self) -> SessionClient {
        self.client.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.client.status()
    }

    /// Stops ticking and waits for the loop to exit.
    ///
    /// A detection still in flight is allowed to finish; its result is dropped.
    pub async fn stop(self) -> DashResult<()> {
        let _ = self.shutdown.send(true);
        self.task.await.map_err(|_| DashboardError::SessionClosed)
    }
}
