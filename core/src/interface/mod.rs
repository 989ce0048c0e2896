pub mod detection;
pub mod frame;

pub use detection::{BBox, DensityPoint, Detection, RawDetection, PERSON_CLASS};
pub use frame::Frame;
