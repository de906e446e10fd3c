//! Time-aligned transcript segments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One unit of recognized speech, in source-relative seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    /// Create a segment, swapping bounds given in the wrong order.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Inclusive overlap test against `[start, end]`.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.end >= start && self.start <= end
    }
}

/// Sort segments ascending by start time (stable for equal starts).
pub fn sort_segments(segments: &mut [TranscriptSegment]) {
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_bounds() {
        let seg = TranscriptSegment::new(5.0, 2.0, "x");
        assert_eq!(seg.start, 2.0);
        assert_eq!(seg.end, 5.0);
        assert!((seg.duration() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlaps_is_inclusive() {
        let seg = TranscriptSegment::new(5.0, 10.0, "x");
        assert!(seg.overlaps(10.0, 20.0));
        assert!(seg.overlaps(0.0, 5.0));
        assert!(!seg.overlaps(10.5, 20.0));
    }

    #[test]
    fn test_sort_segments() {
        let mut segs = vec![
            TranscriptSegment::new(3.0, 4.0, "b"),
            TranscriptSegment::new(1.0, 2.0, "a"),
        ];
        sort_segments(&mut segs);
        assert_eq!(segs[0].text, "a");
    }
}
