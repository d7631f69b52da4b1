//! Lyrics text normalisation and LRC parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `[mm:ss.xx]text` or `[mm:ss.xxx]text`.
static LRC_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{2,}):(\d{2})\.(\d{2,3})\](.*)$").expect("static LRC regex is valid")
});

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</?p(\s[^>]*)?>").expect("static break regex is valid"));

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static tag regex is valid"));

/// Entities decoded by [`normalize_lyrics_text`]. `&amp;` goes last so
/// `&amp;quot;` decodes to the literal `&quot;`.
const ENTITIES: [(&str, &str); 4] = [
    ("&nbsp;", " "),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// A timestamped lyric line. `time` is in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedLine {
    pub time: f64,
    pub text: String,
}

impl TimedLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// A parsed lyrics document.
///
/// The variant is the document-wide sync flag: a document is either fully
/// timed or fully plain, never mixed.
#[derive(Debug, Clone, PartialEq)]
pub enum LyricsDocument {
    Synced(Vec<TimedLine>),
    Unsynced(Vec<String>),
}

impl Default for LyricsDocument {
    fn default() -> Self {
        LyricsDocument::Unsynced(Vec::new())
    }
}

impl LyricsDocument {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, LyricsDocument::Synced(_))
    }

    pub fn len(&self) -> usize {
        match self {
            LyricsDocument::Synced(lines) => lines.len(),
            LyricsDocument::Unsynced(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timed lines, empty for unsynced documents.
    pub fn timed_lines(&self) -> &[TimedLine] {
        match self {
            LyricsDocument::Synced(lines) => lines,
            LyricsDocument::Unsynced(_) => &[],
        }
    }

    /// Display text of each line, in order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            LyricsDocument::Synced(lines) => lines.iter().map(|l| l.text.as_str()).collect(),
            LyricsDocument::Unsynced(lines) => lines.iter().map(String::as_str).collect(),
        }
    }
}

/// Turn provider HTML into plain text.
///
/// Line break and paragraph tags become newlines, a fixed set of entities is
/// decoded, then every remaining tag is stripped.
pub fn normalize_lyrics_text(raw: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(raw, "\n");

    let mut decoded = with_breaks.into_owned();
    for (entity, replacement) in ENTITIES {
        decoded = decoded.replace(entity, replacement);
    }

    ANY_TAG.replace_all(&decoded, "").into_owned()
}

/// Parse one `[mm:ss.xx]text` line into `(seconds, text)`.
fn parse_lrc_line(line: &str) -> Option<(f64, &str)> {
    let caps = LRC_LINE.captures(line)?;

    let minutes: u64 = caps.get(1)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(2)?.as_str().parse().ok()?;
    let fraction = caps.get(3)?.as_str();
    // right-pad to milliseconds: "50" -> 500, "505" -> 505
    let millis: u64 = format!("{:0<3}", fraction).parse().ok()?;

    // absurd minute counts from provider text are rejected, not wrapped
    let total_ms = minutes
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)?;
    let text = caps.get(4)?.as_str().trim();
    Some((total_ms as f64 / 1000.0, text))
}

/// Parse normalised lyrics text.
///
/// Lines matching `[mm:ss.xx]text` with non-empty text form a synced
/// document (other lines are dropped). When no line qualifies, every
/// non-blank line becomes a plain line in original order.
pub fn parse_lyrics(text: &str) -> LyricsDocument {
    let mut timed: Vec<TimedLine> = text
        .lines()
        .filter_map(|line| parse_lrc_line(line.trim()))
        .filter(|(_, text)| !text.is_empty())
        .map(|(time, text)| TimedLine::new(time, text))
        .collect();

    if !timed.is_empty() {
        // stable: equal timestamps keep file order
        timed.sort_by(|a, b| a.time.total_cmp(&b.time));
        return LyricsDocument::Synced(timed);
    }

    LyricsDocument::Unsynced(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// [`normalize_lyrics_text`] followed by [`parse_lyrics`].
pub fn parse_raw_lyrics(raw: &str) -> LyricsDocument {
    parse_lyrics(&normalize_lyrics_text(raw))
}
