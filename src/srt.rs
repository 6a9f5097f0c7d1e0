use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// How the narration time is divided between sentences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingStrategy {
    /// Every sentence gets the same slice.
    #[default]
    Uniform,
    /// Slices proportional to the sentence's character count.
    Weighted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleTrack {
    pub cues: Vec<SubtitleCue>,
}

/// Largest renderable offset, `99:59:59,999`.
pub const MAX_TIMESTAMP_MS: u64 = 100 * 3600 * 1000 - 1;

/// Renders seconds as `HH:MM:SS,mmm`, rounded to the nearest millisecond. Offsets past
/// [`MAX_TIMESTAMP_MS`] are clamped so the hour field stays two digits wide.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_ms = ((seconds * 1000.0).round() as u64).min(MAX_TIMESTAMP_MS);
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

impl SubtitleTrack {
    /// Lays the sentences end to end across `total_duration` seconds.
    ///
    /// Boundaries are computed once and shared by neighbouring cues, so cues are
    /// contiguous and the last cue always ends exactly at `total_duration`.
    pub fn build(sentences: &[String], total_duration: f64, strategy: TimingStrategy) -> Self {
        let total = if total_duration.is_finite() {
            total_duration.max(0.0)
        } else {
            0.0
        };
        let n = sentences.len();
        if n == 0 {
            return Self::default();
        }

        let boundaries = match strategy {
            TimingStrategy::Uniform => uniform_boundaries(n, total),
            TimingStrategy::Weighted => weighted_boundaries(sentences, total),
        };

        let cues = sentences
            .iter()
            .enumerate()
            .map(|(i, text)| SubtitleCue {
                index: i + 1,
                start: boundaries[i],
                end: boundaries[i + 1],
                text: text.clone(),
            })
            .collect();

        Self { cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// SubRip text: index, `start --> end`, text, blank line, per cue.
    pub fn to_srt_string(&self) -> String {
        let mut out = String::new();
        for cue in &self.cues {
            out.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                cue.index,
                format_timestamp(cue.start),
                format_timestamp(cue.end),
                cue.text
            ));
        }
        out
    }

    /// Writes the track to a uniquely named `.srt` file in `dir`. The file is removed
    /// when the returned handle is dropped.
    pub fn write_temp(&self, dir: &Path) -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("storyshort_")
            .suffix(".srt")
            .tempfile_in(dir)?;
        file.write_all(self.to_srt_string().as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

fn uniform_boundaries(n: usize, total: f64) -> Vec<f64> {
    let per_sentence = total / n.max(1) as f64;
    let mut boundaries: Vec<f64> = (0..n)
        .map(|k| (k as f64 * per_sentence).min(total))
        .collect();
    boundaries.push(total);
    boundaries
}

fn weighted_boundaries(sentences: &[String], total: f64) -> Vec<f64> {
    let weights: Vec<usize> = sentences.iter().map(|s| s.chars().count().max(1)).collect();
    let sum: usize = weights.iter().sum();

    let mut boundaries = Vec::with_capacity(sentences.len() + 1);
    let mut acc = 0usize;
    boundaries.push(0.0);
    for w in &weights[..weights.len() - 1] {
        acc += w;
        boundaries.push((total * acc as f64 / sum as f64).min(total));
    }
    boundaries.push(total);
    boundaries
}
