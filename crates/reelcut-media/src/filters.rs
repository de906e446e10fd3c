//! FFmpeg filter graph pieces for clip rendering.

use std::path::Path;

use reelcut_models::encoding::{
    PROGRESS_BAR_COLOR, PROGRESS_BAR_HEIGHT, PROGRESS_BAR_MARGIN, SUBTITLE_FORCE_STYLE,
};

/// Escape a value embedded in a filter graph.
///
/// Two passes: once for the filter option parser, once for the graph parser.
pub fn escape_filter_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Burn an SRT file into the picture with the fixed caption style.
pub fn subtitles_filter(srt_path: &Path) -> String {
    format!(
        "subtitles=filename={}:force_style='{}'",
        escape_filter_value(&srt_path.to_string_lossy()),
        SUBTITLE_FORCE_STYLE
    )
}

/// Fit the picture inside `width`x`height` without stretching; pad the rest black.
pub fn letterbox_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1",
        w = width,
        h = height
    )
}

/// Solid bar source as wide as the frame, lasting the whole clip.
pub fn progress_bar_source(width: u32, fps: u32, duration: f64) -> String {
    format!(
        "color=c={}:s={}x{}:r={}:d={:.3}",
        PROGRESS_BAR_COLOR, width, PROGRESS_BAR_HEIGHT, fps, duration
    )
}

/// Slide the bar in from the left so its visible width tracks elapsed time.
pub fn progress_bar_overlay(duration: f64) -> String {
    format!(
        "overlay=x=-w+w*t/{:.3}:y=H-h-{}:eval=frame:shortest=1",
        duration, PROGRESS_BAR_MARGIN
    )
}

/// Audio chain applied to every clip that has sound.
pub const AUDIO_FILTER: &str = "dynaudnorm";

/// Full `-filter_complex` graph for one clip.
///
/// Produces `[v]`, and `[a]` when `with_audio` is set.
pub fn clip_filter_graph(
    srt_path: &Path,
    width: u32,
    height: u32,
    fps: u32,
    duration: f64,
    with_audio: bool,
) -> String {
    let mut graph = format!(
        "[0:v]{},{}[base];{}[bar];[base][bar]{}[v]",
        subtitles_filter(srt_path),
        letterbox_filter(width, height),
        progress_bar_source(width, fps, duration),
        progress_bar_overlay(duration),
    );
    if with_audio {
        graph.push_str(";[0:a:0]");
        graph.push_str(AUDIO_FILTER);
        graph.push_str("[a]");
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths_are_untouched() {
        assert_eq!(escape_filter_value("/tmp/job/clip1.srt"), "/tmp/job/clip1.srt");
    }

    #[test]
    fn test_special_characters_are_escaped() {
        assert_eq!(escape_filter_value("/tmp/a:b.srt"), "/tmp/a\\\\:b.srt");
        assert_eq!(escape_filter_value("/tmp/a,b.srt"), "/tmp/a\\,b.srt");
        assert_eq!(escape_filter_value("/tmp/it's.srt"), "/tmp/it\\\\\\'s.srt");
    }

    #[test]
    fn test_letterbox_never_stretches() {
        let f = letterbox_filter(1080, 1920);
        assert!(f.starts_with("scale=1080:1920:force_original_aspect_ratio=decrease"));
        assert!(f.contains("pad=1080:1920:(ow-iw)/2:(oh-ih)/2"));
    }

    #[test]
    fn test_subtitles_filter_uses_fixed_style() {
        let f = subtitles_filter(Path::new("/w/clip2.srt"));
        assert!(f.starts_with("subtitles=filename=/w/clip2.srt:force_style='Fontsize=28,"));
        assert!(f.ends_with("Shadow=0'"));
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(
            progress_bar_source(1080, 30, 30.0),
            "color=c=0xF08640@0.85:s=1080x8:r=30:d=30.000"
        );
        let overlay = progress_bar_overlay(45.0);
        assert!(overlay.contains("x=-w+w*t/45.000"));
        assert!(overlay.contains("y=H-h-2"));
    }

    #[test]
    fn test_graph_with_and_without_audio() {
        let with = clip_filter_graph(Path::new("/w/c.srt"), 1080, 1080, 30, 20.0, true);
        assert!(with.starts_with("[0:v]subtitles="));
        assert!(with.contains("[base][bar]overlay="));
        assert!(with.ends_with(";[0:a:0]dynaudnorm[a]"));

        let without = clip_filter_graph(Path::new("/w/c.srt"), 1080, 1080, 30, 20.0, false);
        assert!(without.ends_with("[v]"));
        assert!(!without.contains("dynaudnorm"));
    }
}
