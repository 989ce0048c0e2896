use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Class label that receives the person styling and privacy treatment.
pub const PERSON_CLASS: &str = "person";

/// Bounding box in pixel coordinates, origin top-left.
///
/// Serialized as a `[x, y, width, height]` array, the shape detectors emit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> DensityPoint {
        DensityPoint {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

impl From<[f32; 4]> for BBox {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BBox> for [f32; 4] {
    fn from(bbox: BBox) -> Self {
        [bbox.x, bbox.y, bbox.width, bbox.height]
    }
}

/// Unstamped model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class: String,
    pub score: f32,
    pub bbox: BBox,
}

impl RawDetection {
    pub fn new(class: impl Into<String>, score: f32, bbox: BBox) -> Self {
        Self {
            class: class.into(),
            score,
            bbox,
        }
    }

    pub fn stamp(self, timestamp: DateTime<Local>) -> Detection {
        Detection {
            class: self.class,
            score: self.score,
            bbox: self.bbox,
            timestamp,
        }
    }
}

/// Detection record kept in the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub score: f32,
    pub bbox: BBox,
    pub timestamp: DateTime<Local>,
}

impl Detection {
    pub fn is_person(&self) -> bool {
        self.class == PERSON_CLASS
    }

    pub fn center(&self) -> DensityPoint {
        self.bbox.center()
    }

    /// Wall-clock label used in exports and the history panel.
    pub fn timestamp_label(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

/// Bounding-box center feeding the density grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_serializes_as_array() {
        let bbox = BBox::new(10.0, 12.5, 50.0, 40.0);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[10.0,12.5,50.0,40.0]");
        let back: BBox = serde_json::from_str("[1,2,3,4]").unwrap();
        assert_eq!(back, BBox::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn center_is_box_midpoint() {
        let point = BBox::new(10.0, 10.0, 50.0, 30.0).center();
        assert_eq!(point, DensityPoint { x: 35.0, y: 25.0 });
    }

    #[test]
    fn stamping_keeps_model_fields() {
        let now = Local::now();
        let detection = RawDetection::new("person", 0.9, BBox::new(1.0, 2.0, 3.0, 4.0)).stamp(now);
        assert!(detection.is_person());
        assert_eq!(detection.score, 0.9);
        assert_eq!(detection.timestamp, now);
    }
}
