use crate::interface::{DensityPoint, Detection, RawDetection};
use chrono::{DateTime, Local};

/// Append-only log of every detection seen during the session.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<Detection>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps the batch with its capture time and appends it in order.
    pub fn append<I>(&mut self, detections: I, captured_at: DateTime<Local>) -> usize
    where
        I: IntoIterator<Item = RawDetection>,
    {
        let before = self.entries.len();
        self.entries
            .extend(detections.into_iter().map(|raw| raw.stamp(captured_at)));
        self.entries.len() - before
    }

    /// Appends already stamped detections.
    pub fn extend<I>(&mut self, detections: I)
    where
        I: IntoIterator<Item = Detection>,
    {
        self.entries.extend(detections);
    }

    /// Entries in `[start, end)`, both ends clamped to `[0, len]`.
    pub fn slice(&self, start: usize, end: usize) -> &[Detection] {
        let len = self.entries.len();
        let end = end.min(len);
        let start = start.min(end);
        &self.entries[start..end]
    }

    pub fn get(&self, index: usize) -> Option<&Detection> {
        self.entries.get(index)
    }

    /// Up to `count` entries, newest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Detection> {
        self.entries.iter().rev().take(count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Detection] {
        &self.entries
    }

    pub fn density_points(&self) -> impl Iterator<Item = DensityPoint> + '_ {
        self.entries.iter().map(Detection::center)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::BBox;
    use chrono::Duration;

    fn raw(class: &str) -> RawDetection {
        RawDetection::new(class, 0.8, BBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn append_preserves_insertion_order_and_grows_by_batch() {
        let mut log = HistoryLog::new();
        let start = Local::now();
        let batches = [vec!["person", "cup"], vec![], vec!["dog", "dog", "person"]];
        let mut expected = 0;

        for (tick, batch) in batches.iter().enumerate() {
            let added = log.append(
                batch.iter().map(|c| raw(c)),
                start + Duration::milliseconds(tick as i64 * 100),
            );
            assert_eq!(added, batch.len());
            expected += batch.len();
            assert_eq!(log.len(), expected);
        }

        let classes: Vec<_> = log.iter().map(|d| d.class.as_str()).collect();
        assert_eq!(classes, vec!["person", "cup", "dog", "dog", "person"]);
        assert!(log
            .as_slice()
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }

    #[test]
    fn slice_clamps_to_bounds() {
        let mut log = HistoryLog::new();
        log.append((0..5).map(|_| raw("cup")), Local::now());

        assert_eq!(log.slice(1, 3).len(), 2);
        assert_eq!(log.slice(3, 100).len(), 2);
        assert_eq!(log.slice(7, 9).len(), 0);
        assert_eq!(log.slice(4, 2).len(), 0);
    }

    #[test]
    fn recent_is_newest_first() {
        let mut log = HistoryLog::new();
        log.append(vec![raw("a"), raw("b"), raw("c")], Local::now());
        let recent: Vec<_> = log.recent(2).map(|d| d.class.clone()).collect();
        assert_eq!(recent, vec!["c", "b"]);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = HistoryLog::new();
        log.append(vec![raw("a")], Local::now());
        log.clear();
        assert!(log.is_empty());
    }
}
