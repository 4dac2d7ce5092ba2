//! Display strategies
//!
//! A [`Formatter`] turns a [`PlaybackSnapshot`] into the string pushed to the
//! display. Two strategies exist, one per display surface:
//!
//! - [`ChatboxFormatter`]: play/pause marker, `track by artists`, and a
//!   fixed-width progress bar that is never truncated away
//! - [`CompactFormatter`]: a short `>track-artists` line for profile statuses
//!
//! Both pass their text through a [`Charset`] so surfaces that only render
//! ASCII get `?` instead of glyphs they cannot draw.

use crate::snapshot::PlaybackSnapshot;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Number of cells between the progress bar brackets
pub const PROGRESS_BAR_WIDTH: usize = 26;

/// Default limit of the chatbox text portion, in characters
pub const DEFAULT_MAX_TEXT_LEN: usize = 115;

const ELLIPSIS: &str = "...";
const PLAYING_MARKER: &str = "[>]Listening to: ";
const PAUSED_MARKER: &str = "[||]Paused: ";
const BAR_FILL: char = '=';
const BAR_HEAD: char = 'O';

const COMPACT_MAX_LEN: usize = 30;
const COMPACT_KEEP_LEN: usize = 28;
const COMPACT_PREFIX: &str = ">";

/// Converts a snapshot into a display message
pub trait Formatter: Send + Sync {
    fn format(&self, snapshot: &PlaybackSnapshot) -> String;
}

/// Characters the display surface can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// Everything UTF-8 can carry
    Utf8,
    /// ASCII only, other characters become `?`
    #[default]
    Ascii,
}

impl Charset {
    pub const PLACEHOLDER: char = '?';

    pub fn apply(&self, text: &str) -> String {
        match self {
            Charset::Utf8 => text.to_string(),
            Charset::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c } else { Self::PLACEHOLDER })
                .collect(),
        }
    }
}

impl FromStr for Charset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Charset::Utf8),
            "ascii" => Ok(Charset::Ascii),
            other => Err(format!("unknown charset '{}'", other)),
        }
    }
}

/// Which display strategy to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayStyle {
    #[default]
    Chatbox,
    Compact,
}

impl DisplayStyle {
    /// Builds the formatter; `message_limit` is the largest message the
    /// transport accepts, in characters
    pub fn formatter(
        self,
        charset: Charset,
        max_text_len: usize,
        message_limit: Option<usize>,
    ) -> Box<dyn Formatter> {
        match self {
            DisplayStyle::Chatbox => {
                let formatter = ChatboxFormatter::default()
                    .with_charset(charset)
                    .with_max_text_len(max_text_len);
                Box::new(match message_limit {
                    Some(limit) => formatter.fit_within(limit),
                    None => formatter,
                })
            }
            DisplayStyle::Compact => Box::new(CompactFormatter::new(charset)),
        }
    }
}

impl FromStr for DisplayStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chatbox" => Ok(DisplayStyle::Chatbox),
            "compact" | "status" => Ok(DisplayStyle::Compact),
            other => Err(format!("unknown display style '{}'", other)),
        }
    }
}

impl fmt::Display for DisplayStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayStyle::Chatbox => f.write_str("chatbox"),
            DisplayStyle::Compact => f.write_str("compact"),
        }
    }
}

/// Number of filled cells before the bar head, in `[0, width - 1]`
pub fn filled_cells(progress_ms: u64, duration_ms: u64, width: usize) -> usize {
    if duration_ms == 0 || width == 0 {
        return 0;
    }
    let filled = (progress_ms as u128 * width as u128) / duration_ms as u128;
    (filled as usize).min(width - 1)
}

/// Renders `[===O====]` with exactly `width` cells between the brackets
pub fn progress_bar(progress_ms: u64, duration_ms: u64, width: usize) -> String {
    let width = width.max(1);
    let filled = filled_cells(progress_ms, duration_ms, width);

    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.extend(std::iter::repeat_n(BAR_FILL, filled));
    bar.push(BAR_HEAD);
    bar.extend(std::iter::repeat_n(BAR_FILL, width - filled - 1));
    bar.push(']');
    bar
}

/// Keeps the first `keep` characters and appends `...` when `text` exceeds `limit`
fn truncate_with_ellipsis(text: &str, limit: usize, keep: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Chatbox line: `[>]Listening to: Song by Artist [======O===================]`
#[derive(Debug, Clone)]
pub struct ChatboxFormatter {
    max_text_len: usize,
    bar_width: usize,
    charset: Charset,
}

impl Default for ChatboxFormatter {
    fn default() -> Self {
        Self {
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            bar_width: PROGRESS_BAR_WIDTH,
            charset: Charset::default(),
        }
    }
}

impl ChatboxFormatter {
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Limit of the text portion; at least room for one character and the ellipsis
    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = max_text_len.max(ELLIPSIS.len() + 2);
        self
    }

    pub fn with_bar_width(mut self, bar_width: usize) -> Self {
        self.bar_width = bar_width.max(1);
        self
    }

    /// Longest message this formatter can produce, in characters
    pub fn max_message_len(&self) -> usize {
        self.max_text_len + self.bar_width + 2
    }

    /// Shrinks the text portion so a whole message fits in `limit` characters
    pub fn fit_within(self, limit: usize) -> Self {
        let allowed = limit.saturating_sub(self.bar_width + 2);
        if self.max_text_len <= allowed {
            return self;
        }
        warn!(
            max_text_len = self.max_text_len,
            limit, "Display text too long for the transport, using {} characters", allowed
        );
        self.with_max_text_len(allowed)
    }
}

impl Formatter for ChatboxFormatter {
    fn format(&self, snapshot: &PlaybackSnapshot) -> String {
        let marker = if snapshot.is_playing {
            PLAYING_MARKER
        } else {
            PAUSED_MARKER
        };
        let text = self.charset.apply(&format!(
            "{}{} by {} ",
            marker,
            snapshot.track_name,
            snapshot.joined_artists()
        ));

        let keep = self.max_text_len - ELLIPSIS.len() - 1;
        let mut message = truncate_with_ellipsis(&text, self.max_text_len, keep);
        message.push_str(&progress_bar(
            snapshot.progress_ms,
            snapshot.duration_ms,
            self.bar_width,
        ));
        message
    }
}

/// Profile status line: `>Song-Artist`, at most 32 characters
#[derive(Debug, Clone, Default)]
pub struct CompactFormatter {
    charset: Charset,
}

impl CompactFormatter {
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }
}

impl Formatter for CompactFormatter {
    fn format(&self, snapshot: &PlaybackSnapshot) -> String {
        let text = self.charset.apply(&format!(
            "{}-{}",
            snapshot.track_name,
            snapshot.joined_artists()
        ));
        format!(
            "{}{}",
            COMPACT_PREFIX,
            truncate_with_ellipsis(&text, COMPACT_MAX_LEN, COMPACT_KEEP_LEN)
        )
    }
}
