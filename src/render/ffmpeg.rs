//! ffmpeg invocation details.
//!
//! Builds the argument list that turns a [`SceneSpec`] into an mp4 and
//! parses the machine-readable status stream ffmpeg emits under
//! `-progress pipe:1`.

use super::scene::SceneSpec;
use std::path::Path;

/// Canvas size for recap videos.
const FRAME_SIZE: &str = "1280x720";

/// Background color (lavfi color source syntax).
const BACKGROUND: &str = "0x1d2021";

const HEADING_FONT_SIZE: u32 = 64;
const BODY_FONT_SIZE: u32 = 36;
const BODY_COLOR: &str = "0xd5c4a1";

/// Builds the full ffmpeg argument list for a scene.
///
/// The video is a solid-color lavfi source with one or two drawtext filters
/// per card, each enabled for its card's time window. `-progress pipe:1`
/// makes ffmpeg report status blocks on stdout for the pipeline to parse.
#[must_use]
pub fn recap_args(scene: &SceneSpec, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!(
            "color=c={BACKGROUND}:s={FRAME_SIZE}:d={:.3}",
            scene.duration_secs()
        ),
        "-vf".to_string(),
        filter_graph(scene),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

fn filter_graph(scene: &SceneSpec) -> String {
    let mut filters = Vec::new();
    for card in &scene.cards {
        let end = card.start + card.duration;
        filters.push(format!(
            "drawtext=expansion=none:font=Sans:fontsize={HEADING_FONT_SIZE}:fontcolor=white:\
             x=(w-text_w)/2:y=(h-text_h)/2-60:text='{}':enable='between(t,{:.3},{:.3})'",
            escape_drawtext(&card.heading),
            card.start,
            end
        ));
        if !card.body.is_empty() {
            filters.push(format!(
                "drawtext=expansion=none:font=Sans:fontsize={BODY_FONT_SIZE}:fontcolor={BODY_COLOR}:\
                 x=(w-text_w)/2:y=(h-text_h)/2+40:text='{}':enable='between(t,{:.3},{:.3})'",
                escape_drawtext(&card.body),
                card.start,
                end
            ));
        }
    }
    filters.join(",")
}

/// Escapes card text for a single-quoted drawtext `text=` option.
///
/// The text sits inside filtergraph quotes and expansion is off, so only
/// backslashes and the quote character itself need rewriting. Newlines
/// become spaces; cards are single lines.
#[must_use]
pub fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("'\\''"),
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Incremental parser for `-progress pipe:1` output.
///
/// ffmpeg writes blocks of `key=value` lines terminated by a `progress=`
/// line. Within a block `out_time_us` is authoritative; `out_time_ms` is
/// kept as a fallback and, despite the name, also carries microseconds.
/// Ratios come out clamped to `[0, 1]` and strictly increasing, so feeding
/// a stalled or rewinding stream produces silence rather than regressions.
#[derive(Debug)]
pub struct ProgressParser {
    total_us: i64,
    block_us: Option<i64>,
    block_ms_us: Option<i64>,
    last_ratio: f64,
}

impl ProgressParser {
    /// Creates a parser for a video of the given duration.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(total_secs: f64) -> Self {
        Self {
            total_us: (total_secs * 1_000_000.0) as i64,
            block_us: None,
            block_ms_us: None,
            last_ratio: -1.0,
        }
    }

    /// Feeds one status line, returning a new progress ratio when a block
    /// ends with a later position than anything reported so far.
    pub fn feed_line(&mut self, line: &str) -> Option<f64> {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("out_time_us=") {
            if let Ok(us) = value.parse::<i64>() {
                self.block_us = Some(us);
            }
            return None;
        }
        if let Some(value) = line.strip_prefix("out_time_ms=") {
            if let Ok(us) = value.parse::<i64>() {
                self.block_ms_us = Some(us);
            }
            return None;
        }
        if line.starts_with("progress=") {
            return self.end_block();
        }
        None
    }

    /// Marks the stream finished, returning the final `1.0` if it was never
    /// reached through status blocks.
    pub fn finish(&mut self) -> Option<f64> {
        if self.last_ratio < 1.0 {
            self.last_ratio = 1.0;
            Some(1.0)
        } else {
            None
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn end_block(&mut self) -> Option<f64> {
        let us = self.block_us.take().or_else(|| self.block_ms_us.take())?;
        self.block_us = None;
        self.block_ms_us = None;

        let ratio = if self.total_us <= 0 {
            1.0
        } else {
            (us as f64 / self.total_us as f64).clamp(0.0, 1.0)
        };
        if ratio > self.last_ratio {
            self.last_ratio = ratio;
            Some(ratio)
        } else {
            None
        }
    }
}
