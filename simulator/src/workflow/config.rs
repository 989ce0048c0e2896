use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use lookoutcore::render::RasterSurface;
use lookoutcore::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub session: SessionConfig,
    pub generator: GeneratorConfig,
    /// Where the HTTP bridge listens in serve mode.
    pub bind_address: SocketAddr,
    /// TrueType font for label glyphs in exported PNGs.
    pub font_path: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            generator: GeneratorConfig::default(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9000)),
            font_path: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        interval_ms: u64,
        min_confidence: f32,
        width: u32,
        height: u32,
        seed: u64,
    ) -> Self {
        let defaults = Self::default();
        Self {
            session: SessionConfig {
                poll_interval_ms: interval_ms,
                min_confidence,
                ..defaults.session
            },
            generator: GeneratorConfig {
                seed,
                width,
                height,
                ..defaults.generator
            },
            ..defaults
        }
    }

    pub fn to_session_config(&self) -> SessionConfig {
        self.session.clone()
    }

    pub fn load_font(&self) -> anyhow::Result<Option<ab_glyph::FontArc>> {
        self.font_path
            .as_ref()
            .map(|path| {
                RasterSurface::load_font(path)
                    .with_context(|| format!("loading label font {}", path.display()))
            })
            .transpose()
    }
}
