use lookoutcore::interface::{BBox, Frame, RawDetection, PERSON_CLASS};
use lookoutcore::{DashResult, DashboardError, Detector};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the synthetic scene the fake detector "sees".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub classes: Vec<String>,
    /// Objects wandering around the scene.
    pub objects: usize,
    /// Simulated model warm-up before the first detection.
    pub load_delay_ms: u64,
    /// Simulated inference latency per frame.
    pub detect_delay_ms: u64,
    /// Pixels per tick an object may move along each axis.
    pub max_speed: f32,
    pub fail_load: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            width: 640,
            height: 480,
            classes: vec![
                PERSON_CLASS.into(),
                "car".into(),
                "dog".into(),
                "cup".into(),
            ],
            objects: 5,
            load_delay_ms: 500,
            detect_delay_ms: 20,
            max_speed: 12.0,
            fail_load: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Track {
    class: String,
    bbox: BBox,
    vx: f32,
    vy: f32,
}

impl Track {
    fn advance(&mut self, width: f32, height: f32) {
        self.bbox.x += self.vx;
        self.bbox.y += self.vy;
        if self.bbox.x < 0.0 || self.bbox.x + self.bbox.width > width {
            self.vx = -self.vx;
            self.bbox.x = self.bbox.x.clamp(0.0, (width - self.bbox.width).max(0.0));
        }
        if self.bbox.y < 0.0 || self.bbox.y + self.bbox.height > height {
            self.vy = -self.vy;
            self.bbox.y = self.bbox.y.clamp(0.0, (height - self.bbox.height).max(0.0));
        }
    }
}

/// Seeded stand-in for a pretrained model: objects drift across the frame
/// and are reported with a noisy confidence score.
pub struct SyntheticDetector {
    config: GeneratorConfig,
    rng: StdRng,
    tracks: Vec<Track>,
    loaded: bool,
}

impl SyntheticDetector {
    pub fn new(config: GeneratorConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let tracks = spawn_tracks(&config, &mut rng);
        Self {
            config,
            rng,
            tracks,
            loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

fn spawn_tracks(config: &GeneratorConfig, rng: &mut StdRng) -> Vec<Track> {
    if config.classes.is_empty() || config.width < 8 || config.height < 8 {
        return Vec::new();
    }
    let width = config.width as f32;
    let height = config.height as f32;
    let speed = config.max_speed.abs().max(f32::EPSILON);

    (0..config.objects)
        .map(|index| {
            let box_w = rng.gen_range(width * 0.05..width * 0.25);
            let box_h = rng.gen_range(height * 0.1..height * 0.4);
            Track {
                class: config.classes[index % config.classes.len()].clone(),
                bbox: BBox::new(
                    rng.gen_range(0.0..width - box_w),
                    rng.gen_range(0.0..height - box_h),
                    box_w,
                    box_h,
                ),
                vx: rng.gen_range(-speed..speed),
                vy: rng.gen_range(-speed..speed),
            }
        })
        .collect()
}

impl Detector for SyntheticDetector {
    async fn load(&mut self) -> DashResult<()> {
        tokio::time::sleep(Duration::from_millis(self.config.load_delay_ms)).await;
        if self.config.fail_load {
            return Err(DashboardError::DetectorUnavailable(
                "synthetic model configured to fail".into(),
            ));
        }
        self.loaded = true;
        Ok(())
    }

    async fn detect(
        &mut self,
        frame: &Frame,
        min_confidence: f32,
    ) -> DashResult<Vec<RawDetection>> {
        if !self.is_loaded() {
            return Err(DashboardError::Detection("model not loaded".into()));
        }
        if self.config.detect_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.detect_delay_ms)).await;
        }

        let width = frame.width() as f32;
        let height = frame.height() as f32;
        let mut batch = Vec::with_capacity(self.tracks.len());
        for track in &mut self.tracks {
            track.advance(width, height);
            let score: f32 = self.rng.gen_range(0.3..1.0);
            if score >= min_confidence {
                batch.push(RawDetection::new(track.class.clone(), score, track.bbox));
            }
        }
        Ok(batch)
    }
}
