use crate::generator::profile::SyntheticDetector;
use crate::generator::template::SyntheticCamera;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use lookoutcore::export::{CSV_FILE_NAME, HEATMAP_FILE_NAME};
use lookoutcore::session::{ControlAction, Session, TickOutcome};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub type SyntheticSession = Session<SyntheticDetector, SyntheticCamera>;

pub struct WorkflowResult {
    pub ticks_rendered: usize,
    pub ticks_skipped: usize,
    pub history_len: usize,
    pub last_counts: BTreeMap<String, usize>,
    pub csv_path: PathBuf,
    pub heatmap_path: PathBuf,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Builds a session over the synthetic camera and detector.
    pub fn build_session(&self) -> anyhow::Result<SyntheticSession> {
        let generator = &self.config.generator;
        let session = Session::new(
            SyntheticDetector::new(generator.clone()),
            SyntheticCamera::new(generator.width, generator.height),
            self.config.to_session_config(),
        );
        Ok(match self.config.load_font()? {
            Some(font) => session.with_font(font),
            None => session,
        })
    }

    /// Runs `ticks` detection cycles back to back, then writes the CSV
    /// history and the heatmap PNG into the output directory.
    pub async fn execute(&self, ticks: usize) -> anyhow::Result<WorkflowResult> {
        let mut session = self.build_session()?;
        session.load().await.context("loading synthetic detector")?;

        let mut ticks_rendered = 0;
        let mut ticks_skipped = 0;
        for _ in 0..ticks {
            match session.tick().await {
                TickOutcome::Rendered(_) | TickOutcome::Recorded(_) => ticks_rendered += 1,
                _ => ticks_skipped += 1,
            }
        }

        session
            .apply(ControlAction::SetHeatmap { enabled: true })
            .context("enabling heatmap")?;

        fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!("creating output dir {}", self.config.output_dir.display())
        })?;
        let csv_path = self.config.output_dir.join(CSV_FILE_NAME);
        let csv = session.export_csv().context("exporting history csv")?;
        fs::write(&csv_path, csv)
            .with_context(|| format!("writing {}", csv_path.display()))?;

        let heatmap_path = self.config.output_dir.join(HEATMAP_FILE_NAME);
        let png = session.export_heatmap().context("exporting heatmap")?;
        fs::write(&heatmap_path, png)
            .with_context(|| format!("writing {}", heatmap_path.display()))?;

        Ok(WorkflowResult {
            ticks_rendered,
            ticks_skipped,
            history_len: session.state().history().len(),
            last_counts: session.state().counts().clone(),
            csv_path,
            heatmap_path,
        })
    }
}
