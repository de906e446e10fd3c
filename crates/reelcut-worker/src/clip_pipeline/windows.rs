//! Deterministic clip window placement.
//!
//! Each target length is centered on a fixed relative anchor of the source
//! and then clamped into `[0, duration]`.

use reelcut_models::{AspectRatio, ClipWindow};

use crate::error::{WorkerError, WorkerResult};

/// Relative positions for three windows: early, middle, late.
pub const DEFAULT_ANCHORS: [f64; 3] = [0.12, 0.45, 0.75];

/// Anchors for `n` windows.
///
/// Three windows use [`DEFAULT_ANCHORS`]; any other count is spread evenly
/// over the source at `(i + 0.5) / n`.
pub fn default_anchors(n: usize) -> Vec<f64> {
    if n == DEFAULT_ANCHORS.len() {
        return DEFAULT_ANCHORS.to_vec();
    }
    (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect()
}

/// Place one window per entry of `lengths`, in order.
///
/// Window `i` is centered on `anchors[i] * duration`, then its start is
/// clamped to `[0, max(0, duration - length)]` and its end to `duration`.
/// A window never extends past the source, so sources shorter than a
/// target length produce a shorter window.
pub fn select_windows(
    duration: f64,
    lengths: &[f64],
    anchors: &[f64],
    aspect: AspectRatio,
) -> WorkerResult<Vec<ClipWindow>> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(WorkerError::invalid_input(format!(
            "video duration must be positive, got {}",
            duration
        )));
    }
    if anchors.len() != lengths.len() {
        return Err(WorkerError::invalid_input(format!(
            "{} clip lengths but {} anchors",
            lengths.len(),
            anchors.len()
        )));
    }

    lengths
        .iter()
        .zip(anchors)
        .enumerate()
        .map(|(i, (&length, &anchor))| {
            if !length.is_finite() || length <= 0.0 {
                return Err(WorkerError::invalid_input(format!(
                    "clip length must be positive, got {}",
                    length
                )));
            }
            if !anchor.is_finite() {
                return Err(WorkerError::invalid_input("clip anchor must be finite"));
            }

            let latest_start = (duration - length).max(0.0);
            let start = (anchor * duration - length / 2.0).clamp(0.0, latest_start);
            let end = (start + length).min(duration);

            Ok(ClipWindow {
                index: i as u32 + 1,
                start,
                end,
                aspect,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_window(window: &ClipWindow, start: f64, end: f64) {
        assert!(
            (window.start - start).abs() < EPS && (window.end - end).abs() < EPS,
            "expected [{}, {}), got [{}, {})",
            start,
            end,
            window.start,
            window.end
        );
    }

    #[test]
    fn test_three_minute_source() {
        let windows =
            select_windows(180.0, &[30.0, 30.0, 30.0], &DEFAULT_ANCHORS, AspectRatio::PORTRAIT)
                .unwrap();

        assert_eq!(windows.len(), 3);
        assert_window(&windows[0], 6.6, 36.6);
        assert_window(&windows[1], 66.0, 96.0);
        assert_window(&windows[2], 120.0, 150.0);
        assert_eq!(
            windows.iter().map(|w| w.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(windows.iter().all(|w| w.aspect == AspectRatio::PORTRAIT));
    }

    #[test]
    fn test_clamps_to_source_bounds() {
        // 0.12*60 - 15 < 0 and 0.75*60 + 15 > 60
        let windows =
            select_windows(60.0, &[30.0, 30.0, 30.0], &DEFAULT_ANCHORS, AspectRatio::PORTRAIT)
                .unwrap();

        assert_window(&windows[0], 0.0, 30.0);
        assert_window(&windows[2], 30.0, 60.0);
    }

    #[test]
    fn test_source_shorter_than_target() {
        let windows =
            select_windows(10.0, &[30.0, 45.0, 60.0], &DEFAULT_ANCHORS, AspectRatio::PORTRAIT)
                .unwrap();

        for window in &windows {
            assert_window(window, 0.0, 10.0);
        }
    }

    #[test]
    fn test_windows_stay_inside_source() {
        let lengths = [30.0, 45.0, 60.0];
        for duration in [0.5, 1.0, 29.9, 30.0, 44.0, 61.0, 90.0, 180.0, 3601.7] {
            let windows =
                select_windows(duration, &lengths, &DEFAULT_ANCHORS, AspectRatio::LANDSCAPE)
                    .unwrap();
            assert_eq!(windows.len(), 3);
            for w in &windows {
                assert!(w.start >= 0.0, "start {} for D={}", w.start, duration);
                assert!(w.start < w.end, "empty window for D={}", duration);
                assert!(w.end <= duration + EPS, "end {} for D={}", w.end, duration);
            }
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        let anchors = DEFAULT_ANCHORS;
        assert!(select_windows(0.0, &[30.0; 3], &anchors, AspectRatio::PORTRAIT).is_err());
        assert!(select_windows(f64::NAN, &[30.0; 3], &anchors, AspectRatio::PORTRAIT).is_err());
        assert!(select_windows(90.0, &[30.0, 0.0, 30.0], &anchors, AspectRatio::PORTRAIT).is_err());
        assert!(select_windows(90.0, &[30.0; 2], &anchors, AspectRatio::PORTRAIT).is_err());
    }

    #[test]
    fn test_default_anchors() {
        assert_eq!(default_anchors(3), DEFAULT_ANCHORS.to_vec());
        assert_eq!(default_anchors(1), vec![0.5]);
        assert_eq!(default_anchors(4), vec![0.125, 0.375, 0.625, 0.875]);
        assert!(default_anchors(0).is_empty());
    }
}
