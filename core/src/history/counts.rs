use crate::interface::Detection;
use std::collections::BTreeMap;

/// Occurrences of each class within one detection batch.
pub fn count_by_class(detections: &[Detection]) -> BTreeMap<String, usize> {
    detections.iter().fold(BTreeMap::new(), |mut counts, detection| {
        *counts.entry(detection.class.clone()).or_insert(0) += 1;
        counts
    })
}
